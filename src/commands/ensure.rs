// ABOUTME: Ensure command: bring one extension to its desired state
// ABOUTME: Connects, reconciles over the session, and builds the result record

use crate::config::InvocationParams;
use crate::postgres::{self, reconcile, IdentifierQuoter, Session};
use crate::report::ExtensionReport;
use crate::utils::sanitize_identifier;
use anyhow::Result;

/// Run one invocation against a fresh session.
///
/// The session lives only for the duration of this call. A connection failure
/// aborts before anything is read.
pub async fn ensure(
    params: &InvocationParams,
    quoter: IdentifierQuoter,
    check_mode: bool,
) -> Result<ExtensionReport> {
    let client = postgres::connect(&params.connection).await?;
    ensure_with_session(&client, params, quoter, check_mode).await
}

/// Run one invocation over an already-open session
pub async fn ensure_with_session(
    session: &dyn Session,
    params: &InvocationParams,
    quoter: IdentifierQuoter,
    check_mode: bool,
) -> Result<ExtensionReport> {
    let spec = &params.extension;
    tracing::info!(
        "Ensuring extension '{}' is {:?}{}{}",
        sanitize_identifier(&spec.name),
        spec.state,
        spec.version
            .as_deref()
            .map(|v| format!(" at version {}", sanitize_identifier(v)))
            .unwrap_or_default(),
        if check_mode { " (check mode)" } else { "" }
    );

    let outcome = reconcile(session, quoter, spec, check_mode).await?;

    Ok(ExtensionReport {
        changed: outcome.changed,
        db: params.connection.database.clone(),
        ext: spec.name.clone(),
        queries: outcome.statements,
    })
}
