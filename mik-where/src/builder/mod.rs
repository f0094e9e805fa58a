//! Statement builders on top of the WHERE compiler.
//!
//! Each builder is configured once with its table and column whitelists,
//! then turned into SQL per request. Diagnostics from the compiler are
//! logged through `tracing` and also returned on the [`Query`].

mod delete;
mod sanitize;
mod select;
mod update;

pub use delete::{BatchRemove, Remove, batch_remove, remove, remove_one};
pub use sanitize::{
    Selector, batch_parameters, combine_filters, sanitize_identifier, sanitize_parameter,
};
pub use select::{Select, SelectFilters, SortDir, select};
pub use update::{Update, update, update_one};

use crate::compile::Parameters;
use crate::diagnostic::Diagnostic;
use crate::validate::assert_valid_column;
use thiserror::Error;

/// Statement with its named parameters.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "Query must be used to execute the statement"]
#[non_exhaustive]
pub struct Query {
    /// The SQL statement with `$name` placeholders.
    pub sql: String,
    /// One binding per placeholder.
    pub parameters: Parameters,
    /// Whether the caller expects a single row back.
    pub return_one: bool,
    /// Diagnostics produced while compiling the filters.
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors raised while building a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The update data contains no writable column.
    #[error("no valid column to set")]
    NoValidColumn,
    /// A SET placeholder is already bound to a different filter value.
    #[error("placeholder ${0} is already bound by a filter")]
    PlaceholderConflict(String),
}

/// Level at which a builder reports compiler diagnostics.
#[derive(Debug, Clone, Copy)]
enum Report {
    Warn,
    Debug,
}

fn report(table: &str, diagnostics: &[Diagnostic], level: Report) {
    for diagnostic in diagnostics {
        match level {
            Report::Warn => tracing::warn!(
                table,
                kind = diagnostic.kind.as_str(),
                "{}",
                diagnostic.message
            ),
            Report::Debug => tracing::debug!(
                table,
                kind = diagnostic.kind.as_str(),
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Validate and own a list of column names.
fn columns(names: &[&str], context: &str) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            assert_valid_column(name, context);
            (*name).to_string()
        })
        .collect()
}

/// `RETURNING a, b`, or nothing for an empty list.
///
/// ```
/// use mik_where::returning_clause;
///
/// assert_eq!(returning_clause(&["id", "name"]), "RETURNING id, name");
/// assert_eq!(returning_clause::<&str>(&[]), "");
/// ```
#[must_use]
pub fn returning_clause<S: AsRef<str>>(columns: &[S]) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let list = columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!("RETURNING {list}")
}

/// Validate returning columns; `*` is allowed on its own.
fn returning_columns(names: &[&str]) -> Vec<String> {
    if names == ["*"] {
        return vec!["*".to_string()];
    }
    columns(names, "returning column")
}

/// Join statement parts with single spaces, skipping empty ones.
fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
