// ABOUTME: Small helpers shared across modules
// ABOUTME: Display-safe rendering of user-supplied identifiers

/// Sanitize an identifier (extension name, version) for display
///
/// Removes control characters and limits length to prevent log injection
/// and keep messages readable.
///
/// **Note**: This is for display purposes only. SQL text is built from
/// [`IdentifierQuoter`](crate::postgres::IdentifierQuoter) output.
///
/// # Examples
///
/// ```
/// # use postgres_ext_manager::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("pg_trgm"), "pg_trgm");
/// assert_eq!(sanitize_identifier("ext\nname"), "extname");
///
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("uuid-ossp"), "uuid-ossp");
        assert_eq!(sanitize_identifier("ext\x00name"), "extname");
        assert_eq!(sanitize_identifier("ext\r\nname"), "extname");
        assert_eq!(sanitize_identifier(&"b".repeat(150)).len(), 100);
    }
}
