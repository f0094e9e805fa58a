//! Column name validation for builder configuration.
//!
//! Whitelists, writable columns and returning columns are written into SQL
//! verbatim, so they are checked once when a builder is configured.

/// Maximum length for SQL identifiers (`PostgreSQL` limit is 63).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Validate that a string is a safe SQL identifier.
///
/// A valid SQL identifier:
/// - Starts with a letter (a-z, A-Z) or underscore
/// - Contains only letters, digits (0-9), and underscores
/// - Is not empty and not longer than 63 characters
///
/// # Examples
///
/// ```
/// use mik_where::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("user_id"));
/// assert!(!is_valid_sql_identifier("123abc"));
/// assert!(!is_valid_sql_identifier("user; DROP"));
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a column name, optionally qualified once (`table.column`).
///
/// ```
/// use mik_where::is_valid_column_name;
///
/// assert!(is_valid_column_name("name"));
/// assert!(is_valid_column_name("users.name"));
/// assert!(!is_valid_column_name("a.b.c"));
/// assert!(!is_valid_column_name("users."));
/// ```
#[must_use]
pub fn is_valid_column_name(s: &str) -> bool {
    match s.split_once('.') {
        Some((table, column)) => is_valid_sql_identifier(table) && is_valid_sql_identifier(column),
        None => is_valid_sql_identifier(s),
    }
}

/// Assert that a string is a valid column name.
///
/// # Panics
///
/// Panics if the name is invalid. This is intended for programmer errors
/// (column names written in code), not for user input validation.
///
/// ```should_panic
/// use mik_where::assert_valid_column;
///
/// assert_valid_column("name; DROP TABLE users", "returning column"); // Panics!
/// ```
#[inline]
pub fn assert_valid_column(s: &str, context: &str) {
    assert!(
        is_valid_column_name(s),
        "Invalid SQL {context} name '{s}': must be an identifier or table.identifier, \
             each part starting with letter/underscore, ASCII alphanumeric/underscore, 1-63 chars"
    );
}
