//! SQL safety helpers for generated DDL
//!
//! Migration SQL is assembled from configured names, so every identifier is
//! validated and double-quoted and every literal is single-quoted.

use crate::error::OrmError;

/// Characters allowed in SQL identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// PostgreSQL truncates identifiers beyond this many bytes
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// SQL keywords rejected as bare identifiers
static SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "UNION", "DROP", "CREATE",
    "ALTER", "GRANT", "REVOKE", "TRUNCATE", "TABLE", "INDEX", "CONSTRAINT", "UNIQUE", "PRIMARY",
    "USER", "CURRENT_USER", "SESSION_USER",
];

/// Escape a SQL identifier (table name, column name, etc.)
///
/// ```
/// use smc_orm::security::escape_identifier;
///
/// assert_eq!(escape_identifier("social_media_connections"), "\"social_media_connections\"");
/// assert_eq!(escape_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn escape_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Quote a string literal for inline use in DDL, e.g. an index predicate
///
/// ```
/// use smc_orm::security::quote_literal;
///
/// assert_eq!(quote_literal("facebook"), "'facebook'");
/// assert_eq!(quote_literal("o'brien"), "'o''brien'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Validate that an identifier is safe for use in SQL
pub fn validate_identifier(identifier: &str) -> Result<(), OrmError> {
    let first = identifier
        .chars()
        .next()
        .ok_or_else(|| OrmError::Validation("Identifier cannot be empty".to_string()))?;

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(OrmError::Validation(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier
        .chars()
        .find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c))
    {
        return Err(OrmError::Validation(format!(
            "Identifier '{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() || first == '$' {
        return Err(OrmError::Validation(format!(
            "Identifier '{}' must start with a letter or underscore",
            identifier
        )));
    }

    let upper_identifier = identifier.to_uppercase();
    if SQL_KEYWORDS.contains(&upper_identifier.as_str()) {
        return Err(OrmError::Validation(format!(
            "Identifier '{}' is a reserved SQL keyword",
            identifier
        )));
    }

    Ok(())
}
