// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs - extensive doc changes needed
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self by design
#![allow(clippy::must_use_candidate)] // Builder methods - fluent API doesn't need must_use
#![allow(clippy::format_push_string)] // String building style preference
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
// Test-only indexing after explicit length checks
#![cfg_attr(test, allow(clippy::indexing_slicing, clippy::unwrap_used))]

//! # mik-where - Whitelisted WHERE Clauses from Filter Maps
//!
//! Compiles an untyped map of filter names to values into a parameterized
//! `WHERE` clause. Every key is checked against a whitelist of columns;
//! anything else is dropped and reported, never written into the SQL.
//!
//! ## Quick Start
//!
//! ```
//! # use mik_where::prelude::*;
//! let filters = Filters::new()
//!     .with("status", "active")
//!     .with("not_role", Value::Null)
//!     .with("from_created", "2024-01-01")
//!     .with("password", "hunter2");
//!
//! let compiled = compile(&filters, &["status", "role", "created"]);
//!
//! assert_eq!(
//!     compiled.clause,
//!     "WHERE status = $status AND role IS NOT NULL \
//!      AND created::timestamp >= $from_created::timestamp"
//! );
//! assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::Ignoring);
//! ```
//!
//! ## Filter Keys
//!
//! | Key | SQL |
//! |-----|-----|
//! | `col` | `col = $col`, `col IS NULL`, `col IN ($col1, ...)` |
//! | `not_col` | `col != $not_col`, `col IS NOT NULL`, `col NOT IN (...)` |
//! | `from_col` | `col::timestamp >= $from_col::timestamp` |
//! | `to_col` | `col::timestamp <= $to_col::timestamp` |
//! | `like_col` | `col::text ILIKE $like_col` |
//! | `not_like_col` | `col::text NOT ILIKE $not_like_col` |
//! | `match` | `(a::text ILIKE $match OR b::text ILIKE $match ...)` |
//!
//! Placeholders are named after the full key, with the first `.` of a
//! qualified column replaced by `__` (`user.id` binds `$user__id`).
//! Range and pattern filters cast the column, so they only apply to
//! timestamp- and text-castable columns.
//!
//! ## Statements
//!
//! ```
//! # use mik_where::prelude::*;
//! let posts = select("posts")
//!     .return_cols(&["id", "title", "author_id"])
//!     .permanent_filters(Filters::new().with("published", true));
//!
//! let query = posts.query(
//!     &SelectFilters::new()
//!         .filters(Filters::new().with("author_id", vec![1, 2]))
//!         .limit(20),
//! );
//!
//! assert!(query.sql.starts_with(
//!     "SELECT id, title, author_id FROM posts \
//!      WHERE author_id IN ($author_id1, $author_id2) AND published = $published"
//! ));
//! assert_eq!(query.parameters.len(), 5);
//! ```

mod builder;
mod classify;
mod compile;
mod diagnostic;
mod fragment;
mod validate;
mod value;

pub use builder::{
    BatchRemove, BuildError, Query, Remove, Select, SelectFilters, Selector, SortDir, Update,
    batch_parameters, batch_remove, combine_filters, remove, remove_one, returning_clause,
    sanitize_identifier, sanitize_parameter, select, update, update_one,
};
pub use classify::{ClassifiedEntry, MATCH_KEY, Operation, PREFIX_RULES, classify, classify_all};
pub use compile::{Compiled, Parameters, WhereClause, compile, where_query};
pub use diagnostic::{Carrier, Diagnostic, DiagnosticKind};
pub use fragment::{Fragment, NULL_SENTINELS, generate, placeholder_name};
pub use validate::{assert_valid_column, is_valid_column_name, is_valid_sql_identifier};
pub use value::{Filters, ParseError, Value, parse_filters};

/// Re-export miniserde's json module for runtime filter parsing.
///
/// ```
/// use mik_where::{Filters, json};
///
/// let value: json::Value = json::from_str(r#"{"id": 1}"#).unwrap();
/// let filters = Filters::from_json(&value).unwrap();
/// assert_eq!(filters.len(), 1);
/// ```
pub use miniserde::json;

/// Per-operation fragment generators.
///
/// [`generate`] dispatches to these; they are exposed for callers composing
/// their own clauses.
pub mod generators {
    pub use crate::fragment::{from, full_text_match, like, not, not_like, query, to};
}

/// Prelude module for convenient imports.
///
/// ```
/// use mik_where::prelude::*;
/// let compiled = compile(&Filters::new().with("id", 1), &["id"]);
/// assert_eq!(compiled.clause, "WHERE id = $id");
/// ```
pub mod prelude {
    pub use crate::{
        BatchRemove, BuildError, Carrier, Compiled, Diagnostic, DiagnosticKind, Filters,
        Operation, Parameters, ParseError, Query, Remove, Select, SelectFilters, Selector,
        SortDir, Update, Value, batch_remove, classify, compile, parse_filters, remove,
        remove_one, select, update, update_one, where_query,
    };
}


// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
