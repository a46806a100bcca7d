// ABOUTME: Invocation parameters, parameter files, and connection settings
// ABOUTME: Merges file and command-line values and applies driver defaults

use crate::error::ExtensionError;
use crate::postgres::extensions::{DesiredState, ExtensionSpec};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

/// Port used when none is supplied
pub const DEFAULT_PORT: u16 = 5432;

/// Role used when no login user is supplied
pub const DEFAULT_USER: &str = "postgres";

/// Host used when none is supplied: the local socket directory on Unix
#[cfg(unix)]
pub const DEFAULT_HOST: &str = "/var/run/postgresql";
#[cfg(not(unix))]
pub const DEFAULT_HOST: &str = "localhost";

/// Parameters as supplied by the invoking framework, before validation.
///
/// Every field is optional here so that a parameter file and the command line
/// can each provide a subset. Empty strings count as "not supplied", which lets
/// the driver defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParams {
    #[serde(alias = "ext")]
    pub name: Option<String>,
    pub version: Option<String>,
    pub db: Option<String>,
    pub login_user: Option<String>,
    pub login_password: Option<String>,
    pub login_host: Option<String>,
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<String>,
    pub state: Option<DesiredState>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

// Frameworks hand the port over as a string; hand-written files tend to use a number
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<PortValue>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        PortValue::Number(n) => n.to_string(),
        PortValue::Text(s) => s,
    }))
}

impl RawParams {
    /// Load parameters from a TOML file, or JSON when the path ends in `.json`
    pub fn from_file(path: &Path) -> Result<Self, ExtensionError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtensionError::invalid_parameter(
                "params",
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            serde_json::from_str(&contents).map_err(|e| {
                ExtensionError::invalid_parameter(
                    "params",
                    format!("invalid JSON in {}: {}", path.display(), e),
                )
            })
        } else {
            toml::from_str(&contents).map_err(|e| {
                ExtensionError::invalid_parameter(
                    "params",
                    format!("invalid TOML in {}: {}", path.display(), e),
                )
            })
        }
    }

    /// Layer `overrides` on top of `self`. Non-empty override values win.
    pub fn overlay(self, overrides: RawParams) -> RawParams {
        RawParams {
            name: pick(overrides.name, self.name),
            version: pick(overrides.version, self.version),
            db: pick(overrides.db, self.db),
            login_user: pick(overrides.login_user, self.login_user),
            login_password: pick(overrides.login_password, self.login_password),
            login_host: pick(overrides.login_host, self.login_host),
            port: pick(overrides.port, self.port),
            state: overrides.state.or(self.state),
        }
    }

    /// Validate and normalize into the parameters of one invocation
    pub fn resolve(self) -> Result<InvocationParams, ExtensionError> {
        let name = non_empty(self.name)
            .ok_or_else(|| ExtensionError::invalid_parameter("name", "is required"))?;
        let database = non_empty(self.db)
            .ok_or_else(|| ExtensionError::invalid_parameter("db", "is required"))?;

        let port = match non_empty(self.port) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                ExtensionError::invalid_parameter("port", format!("{:?} is not a valid port", raw))
            })?),
            None => None,
        };

        Ok(InvocationParams {
            extension: ExtensionSpec {
                name,
                version: non_empty(self.version),
                state: self.state.unwrap_or_default(),
            },
            connection: ConnectionParams {
                database,
                host: non_empty(self.login_host),
                user: non_empty(self.login_user),
                password: non_empty(self.login_password),
                port,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn pick(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    non_empty(preferred).or(fallback)
}

/// Fully validated parameters for one invocation
#[derive(Debug, Clone)]
pub struct InvocationParams {
    pub extension: ExtensionSpec,
    pub connection: ConnectionParams,
}

/// Connection settings; `None` means the default applies
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub database: String,
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
}

impl ConnectionParams {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_USER)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Build the driver configuration.
    ///
    /// A host starting with `/` is treated by the driver as a Unix socket
    /// directory.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .dbname(&self.database)
            .host(self.host())
            .port(self.port())
            .user(self.user())
            .application_name(env!("CARGO_PKG_NAME"));

        if let Some(password) = &self.password {
            config.password(password);
        }

        config
    }

    /// `user@host:port/db` for log lines, never including the password
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user(),
            self.host(),
            self.port(),
            self.database
        )
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal() -> RawParams {
        RawParams {
            name: Some("pg_trgm".to_string()),
            db: Some("acme".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let params = minimal().resolve().unwrap();

        assert_eq!(params.extension.name, "pg_trgm");
        assert_eq!(params.extension.version, None);
        assert_eq!(params.extension.state, DesiredState::Present);
        assert_eq!(params.connection.host(), DEFAULT_HOST);
        assert_eq!(params.connection.user(), "postgres");
        assert_eq!(params.connection.port(), 5432);
        assert!(params.connection.password.is_none());
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let raw = RawParams {
            version: Some(String::new()),
            login_host: Some(String::new()),
            login_user: Some(String::new()),
            login_password: Some(String::new()),
            port: Some(String::new()),
            ..minimal()
        };
        let params = raw.resolve().unwrap();

        assert_eq!(params.extension.version, None);
        assert_eq!(params.connection.host, None);
        assert_eq!(params.connection.user, None);
        assert_eq!(params.connection.password, None);
        assert_eq!(params.connection.port, None);
    }

    #[test]
    fn test_missing_required_values() {
        let err = RawParams {
            db: Some("acme".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert!(err.to_string().contains("'name'"));

        let err = RawParams {
            name: Some("hstore".to_string()),
            db: Some(String::new()),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert!(err.to_string().contains("'db'"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let raw = RawParams {
            port: Some("54x2".to_string()),
            ..minimal()
        };
        let err = raw.resolve().unwrap_err();
        assert!(matches!(
            err,
            ExtensionError::InvalidParameter { name: "port", .. }
        ));
    }

    #[test]
    fn test_overlay_prefers_non_empty_overrides() {
        let file = RawParams {
            login_host: Some("db.internal".to_string()),
            port: Some("6432".to_string()),
            state: Some(DesiredState::Absent),
            ..minimal()
        };
        let cli = RawParams {
            login_host: Some(String::new()),
            port: Some("5433".to_string()),
            ..Default::default()
        };

        let merged = file.overlay(cli);
        assert_eq!(merged.login_host.as_deref(), Some("db.internal"));
        assert_eq!(merged.port.as_deref(), Some("5433"));
        assert_eq!(merged.state, Some(DesiredState::Absent));
        assert_eq!(merged.name.as_deref(), Some("pg_trgm"));
    }

    #[test]
    fn test_from_toml_file_accepts_ext_alias_and_numeric_port() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "ext = \"postgis\"\nversion = \"3.4.0\"\ndb = \"gis\"\nport = 6543\nstate = \"present\""
        )
        .unwrap();

        let params = RawParams::from_file(file.path()).unwrap().resolve().unwrap();
        assert_eq!(params.extension.name, "postgis");
        assert_eq!(params.extension.version.as_deref(), Some("3.4.0"));
        assert_eq!(params.connection.port, Some(6543));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"name": "hstore", "db": "acme", "port": "5432", "state": "absent", "login_password": "s3cret"}}"#
        )
        .unwrap();

        let params = RawParams::from_file(file.path()).unwrap().resolve().unwrap();
        assert_eq!(params.extension.state, DesiredState::Absent);
        assert_eq!(params.connection.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "name = \"hstore\"\ndb = \"acme\"\ncascade = true").unwrap();

        assert!(RawParams::from_file(file.path()).is_err());
    }

    #[test]
    fn test_pg_config_carries_connection_values() {
        let conn = ConnectionParams {
            database: "acme".to_string(),
            host: Some("db.internal".to_string()),
            user: Some("admin".to_string()),
            password: Some("pw".to_string()),
            port: Some(6432),
        };
        let config = conn.to_pg_config();

        assert_eq!(config.get_dbname(), Some("acme"));
        assert_eq!(config.get_user(), Some("admin"));
        assert_eq!(config.get_ports(), &[6432]);
        assert_eq!(config.get_password(), Some(&b"pw"[..]));
        assert_eq!(config.get_hosts().len(), 1);
    }

    #[test]
    fn test_debug_and_describe_hide_password() {
        let conn = ConnectionParams {
            database: "acme".to_string(),
            host: None,
            user: None,
            password: Some("hunter2".to_string()),
            port: None,
        };
        assert!(!format!("{:?}", conn).contains("hunter2"));
        assert!(!conn.describe().contains("hunter2"));
        assert!(conn.describe().ends_with(":5432/acme"));
    }
}
