// ABOUTME: PostgreSQL session setup for extension management
// ABOUTME: Handles TLS negotiation, connect-failure diagnostics, and driver lifecycle

use crate::config::ConnectionParams;
use crate::error::ExtensionError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Client;

/// Open a session to the configured database.
///
/// The returned client runs in autocommit mode: statements are sent outside any
/// explicit transaction, so each DDL statement takes effect on its own. The
/// session is released when the client is dropped. There is no retry; a
/// failure here aborts the invocation before anything is read.
pub async fn connect(params: &ConnectionParams) -> Result<Client, ExtensionError> {
    let config = params.to_pg_config();

    // TLS is negotiated when the server offers it; Unix sockets skip it
    let tls_connector = TlsConnector::builder()
        .danger_accept_invalid_certs(false)
        .build()
        .map_err(|e| {
            ExtensionError::connection(format!("failed to build TLS connector: {}", e))
        })?;
    let tls = MakeTlsConnector::new(tls_connector);

    tracing::info!("Connecting to {}...", params.describe());

    let (client, connection) = config
        .connect(tls)
        .await
        .map_err(|e| ExtensionError::Connection {
            message: explain_connect_error(&connect_error_detail(&e)),
            source: Some(e),
        })?;

    // The connection object drives the socket; it ends when the client is dropped
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    tracing::info!("✓ Connected to database '{}'", params.database);
    Ok(client)
}

/// The server's own message when it rejected us, e.g. `FATAL: database "x" does not exist`.
///
/// The driver's `Display` only says `db error` in that case.
fn connect_error_detail(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => format!("{}: {}", db.severity(), db.message()),
        None => error.to_string(),
    }
}

/// Turn a raw driver error into a message that points at the likely cause
fn explain_connect_error(error_msg: &str) -> String {
    let hint = if error_msg.contains("password authentication failed") {
        Some("invalid username or password")
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        Some("the target database does not exist")
    } else if error_msg.contains("no pg_hba.conf entry") {
        Some("the server's pg_hba.conf does not accept connections from this host")
    } else if error_msg.contains("Connection refused")
        || error_msg.contains("could not connect")
        || error_msg.contains("No such file or directory")
    {
        Some("no server is listening on the given host and port")
    } else if error_msg.contains("timeout") || error_msg.contains("timed out") {
        Some("the server did not respond in time")
    } else if error_msg.contains("SSL") || error_msg.contains("TLS") {
        Some("the secure connection could not be established")
    } else {
        None
    };

    match hint {
        Some(hint) => format!("{} ({})", error_msg, hint),
        None => error_msg.to_string(),
    }
}
