// ABOUTME: Identifier and literal quoting for DDL statement text
// ABOUTME: Two interchangeable identifier strategies selected once at startup

use crate::error::ExtensionError;
use once_cell::sync::Lazy;
use postgres_protocol::escape::{escape_identifier, escape_literal};
use regex::Regex;
use std::fmt;

/// Names accepted by the strict strategy: a letter or underscore, then at least
/// one word character or `$`.
static STRICT_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\W\d][\w$]+$").expect("strict identifier pattern is valid")
});

/// How extension names are turned into SQL identifiers.
///
/// DDL statements cannot take identifiers as bind parameters, so this is the
/// only thing standing between a user-supplied name and the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IdentifierQuoter {
    /// Escape embedded quotes with the driver's own quoting routine
    #[default]
    Native,
    /// Reject anything outside a conservative pattern, then wrap in quotes
    Strict,
}

/// An identifier that is safe to splice into statement text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedIdentifier(String);

impl QuotedIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuotedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl IdentifierQuoter {
    pub fn quote(&self, identifier: &str) -> Result<QuotedIdentifier, ExtensionError> {
        match self {
            IdentifierQuoter::Native => Ok(QuotedIdentifier(escape_identifier(identifier))),
            IdentifierQuoter::Strict => {
                if STRICT_IDENTIFIER.is_match(identifier) {
                    Ok(QuotedIdentifier(format!("\"{}\"", identifier)))
                } else {
                    Err(ExtensionError::InvalidIdentifier(identifier.to_string()))
                }
            }
        }
    }
}

/// Render a value as a SQL string literal, e.g. an extension version
pub fn quote_literal(value: &str) -> String {
    escape_literal(value)
}
