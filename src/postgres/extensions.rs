// ABOUTME: Extension catalog lookups and state reconciliation
// ABOUTME: Plans at most one CREATE, ALTER, or DROP and applies it unless checking

use crate::error::ExtensionError;
use crate::postgres::quoting::{quote_literal, IdentifierQuoter, QuotedIdentifier};
use crate::postgres::session::Session;
use crate::utils::sanitize_identifier;
use serde::Deserialize;

const SELECT_BY_NAME: &str = "SELECT extname, extversion FROM pg_extension WHERE extname = $1";
const SELECT_BY_NAME_AND_VERSION: &str =
    "SELECT extname, extversion FROM pg_extension WHERE extname = $1 AND extversion = $2";

/// Whether the extension should be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// The requested end state for one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpec {
    pub name: String,
    /// `None` means "latest available, or whatever is already installed"
    pub version: Option<String>,
    pub state: DesiredState,
}

/// A row of `pg_extension`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub name: String,
    pub version: String,
}

/// The single DDL operation needed to converge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionAction {
    Create { version: Option<String> },
    Update { version: String },
    Drop,
}

impl ExtensionAction {
    fn render(&self, name: &QuotedIdentifier) -> String {
        match self {
            ExtensionAction::Create { version: None } => format!("CREATE EXTENSION {}", name),
            ExtensionAction::Create {
                version: Some(version),
            } => format!("CREATE EXTENSION {} VERSION {}", name, quote_literal(version)),
            ExtensionAction::Update { version } => {
                format!("ALTER EXTENSION {} UPDATE TO {}", name, quote_literal(version))
            }
            ExtensionAction::Drop => format!("DROP EXTENSION {}", name),
        }
    }
}

/// An action together with its finished statement text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub action: ExtensionAction,
    pub statement: String,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub changed: bool,
    /// Statements executed, or that would have been in check mode
    pub statements: Vec<String>,
}

/// Check whether exactly one installation matches `name`, and `version` when given.
///
/// Both values are bound as query parameters.
pub async fn extension_exists(
    session: &dyn Session,
    name: &str,
    version: Option<&str>,
) -> Result<bool, ExtensionError> {
    let rows = match version {
        Some(version) => {
            session
                .query_text(SELECT_BY_NAME_AND_VERSION, &[name, version])
                .await?
        }
        None => session.query_text(SELECT_BY_NAME, &[name]).await?,
    };

    Ok(rows.len() == 1)
}

/// Look up the installation record for `name`, if any
pub async fn find_installation(
    session: &dyn Session,
    name: &str,
) -> Result<Option<Installation>, ExtensionError> {
    let rows = session.query_text(SELECT_BY_NAME, &[name]).await?;

    // pg_extension has a unique index on extname
    Ok(rows.into_iter().next().map(|row| {
        let mut columns = row.into_iter();
        Installation {
            name: columns.next().flatten().unwrap_or_else(|| name.to_string()),
            version: columns.next().flatten().unwrap_or_default(),
        }
    }))
}

/// Decide which action, if any, moves `current` to `spec`
pub fn decide(spec: &ExtensionSpec, current: Option<&Installation>) -> Option<ExtensionAction> {
    match (spec.state, current) {
        (DesiredState::Absent, Some(_)) => Some(ExtensionAction::Drop),
        (DesiredState::Absent, None) => None,
        (DesiredState::Present, None) => Some(ExtensionAction::Create {
            version: spec.version.clone(),
        }),
        (DesiredState::Present, Some(installed)) => match &spec.version {
            Some(wanted) if *wanted != installed.version => Some(ExtensionAction::Update {
                version: wanted.clone(),
            }),
            // Without a requested version an existing installation is left alone
            _ => None,
        },
    }
}

/// Read the current state and work out the statement that would converge it.
///
/// Performs exactly one catalog read and never writes. The identifier is
/// quoted here, so an invalid name fails the same way in check mode as in a
/// real run.
pub async fn plan(
    session: &dyn Session,
    quoter: IdentifierQuoter,
    spec: &ExtensionSpec,
) -> Result<Option<PlannedChange>, ExtensionError> {
    let current = find_installation(session, &spec.name).await?;

    match &current {
        Some(installed) => tracing::info!(
            "Extension '{}' is installed at version {}",
            sanitize_identifier(&installed.name),
            sanitize_identifier(&installed.version)
        ),
        None => tracing::info!(
            "Extension '{}' is not installed",
            sanitize_identifier(&spec.name)
        ),
    }

    let Some(action) = decide(spec, current.as_ref()) else {
        return Ok(None);
    };

    let quoted = quoter.quote(&spec.name)?;
    let statement = action.render(&quoted);
    tracing::debug!("Planned statement: {}", statement);

    Ok(Some(PlannedChange { action, statement }))
}

/// Converge the extension to `spec`.
///
/// One read, then at most one DDL statement. With `check_mode` set the DDL is
/// skipped and the result reports what would have changed.
pub async fn reconcile(
    session: &dyn Session,
    quoter: IdentifierQuoter,
    spec: &ExtensionSpec,
    check_mode: bool,
) -> Result<Reconciliation, ExtensionError> {
    let Some(change) = plan(session, quoter, spec).await? else {
        tracing::info!(
            "✓ Extension '{}' already in desired state",
            sanitize_identifier(&spec.name)
        );
        return Ok(Reconciliation {
            changed: false,
            statements: Vec::new(),
        });
    };

    if check_mode {
        tracing::warn!("Check mode: not executing '{}'", change.statement);
    } else {
        session.execute(&change.statement).await?;
        tracing::info!("✓ {}", change.statement);
    }

    Ok(Reconciliation {
        changed: true,
        statements: vec![change.statement],
    })
}
