// ABOUTME: Minimal database session interface used by the reconciler
// ABOUTME: Parameterized text queries plus raw statement execution over tokio-postgres

use crate::error::ExtensionError;
use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;

/// One result row, every column read as text
pub type TextRow = Vec<Option<String>>;

/// What the reconciler needs from a live database session.
///
/// Queries always take bind parameters for user-supplied values. `execute`
/// accepts finished statement text and is only used for DDL, whose
/// identifiers have already been quoted.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a read query with text parameters bound to `$1`, `$2`, ...
    async fn query_text(&self, sql: &str, params: &[&str]) -> Result<Vec<TextRow>, ExtensionError>;

    /// Run a statement that takes no parameters and return the affected row count
    async fn execute(&self, sql: &str) -> Result<u64, ExtensionError>;
}

#[async_trait]
impl Session for Client {
    async fn query_text(&self, sql: &str, params: &[&str]) -> Result<Vec<TextRow>, ExtensionError> {
        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = self
            .query(sql, &bound)
            .await
            .map_err(|e| ExtensionError::query("catalog query failed", e))?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|idx| {
                        row.try_get::<_, Option<String>>(idx)
                            .map_err(|e| ExtensionError::query("unexpected column type", e))
                    })
                    .collect::<Result<TextRow, _>>()
            })
            .collect()
    }

    async fn execute(&self, sql: &str) -> Result<u64, ExtensionError> {
        // Extended protocol: the server refuses more than one command per statement
        Client::execute(self, sql, &[])
            .await
            .map_err(|e| ExtensionError::query("statement failed", e))
    }
}
