// ABOUTME: Result records printed for the invoking framework
// ABOUTME: JSON success and failure shapes with the full error chain on failure

use serde::Serialize;

/// Printed on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionReport {
    pub changed: bool,
    pub db: String,
    pub ext: String,
    /// DDL executed, or that would have been executed in check mode
    pub queries: Vec<String>,
}

/// Printed on failure
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    /// Error and every cause below it, one per line
    pub exception: String,
}

impl FailureReport {
    pub fn from_error(error: &anyhow::Error) -> Self {
        FailureReport {
            failed: true,
            msg: error.to_string(),
            exception: format!("{:?}", error),
        }
    }
}
