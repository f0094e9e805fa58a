//! DELETE statement builders.

use crate::compile::compile;
use crate::validate::assert_valid_column;
use crate::value::{Filters, Value};

use super::sanitize::{Selector, batch_parameters, combine_filters, sanitize_identifier};
use super::{Query, Report, columns, join_parts, report, returning_clause, returning_columns};

/// Configured DELETE statement selecting rows by filters.
///
/// ```
/// use mik_where::{Filters, remove};
///
/// let purge = remove("sessions").filter_cols(&["user_id", "expires_at"]);
/// let query = purge.query(Filters::new().with("user_id", 3).with("to_expires_at", "now"));
///
/// // Only exact filter columns survive sanitizing.
/// assert_eq!(query.sql, "DELETE FROM sessions WHERE user_id = $user_id");
/// ```
#[derive(Debug, Clone)]
pub struct Remove {
    table: String,
    filter_cols: Vec<String>,
    returning: Vec<String>,
    permanent_filters: Filters,
    return_one: bool,
}

/// Start a DELETE builder for many rows.
pub fn remove(table: impl Into<String>) -> Remove {
    Remove::new(table, false)
}

/// Start a DELETE builder for one row, selected by primary key `id`.
///
/// Change the key with [`Remove::filter_cols`]; the first column receives
/// bare ids.
pub fn remove_one(table: impl Into<String>) -> Remove {
    Remove::new(table, true).filter_cols(&["id"])
}

impl Remove {
    fn new(table: impl Into<String>, return_one: bool) -> Self {
        Self {
            table: table.into(),
            filter_cols: Vec::new(),
            returning: Vec::new(),
            permanent_filters: Filters::new(),
            return_one,
        }
    }

    /// Columns rows may be selected by.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn filter_cols(mut self, names: &[&str]) -> Self {
        self.filter_cols = columns(names, "filter column");
        self
    }

    /// `RETURNING` columns (`*` allowed on its own).
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn returning(mut self, names: &[&str]) -> Self {
        self.returning = returning_columns(names);
        self
    }

    /// Filters applied to every delete, overriding the selector.
    ///
    /// # Panics
    ///
    /// Panics if any key is not a valid column name.
    pub fn permanent_filters(mut self, filters: Filters) -> Self {
        for key in filters.keys() {
            assert_valid_column(key, "permanent filter");
        }
        self.permanent_filters = filters;
        self
    }

    /// Build the statement for one selector.
    pub fn query(&self, selector: impl Into<Selector>) -> Query {
        let whitelist: Vec<&str> = self
            .filter_cols
            .iter()
            .map(String::as_str)
            .chain(self.permanent_filters.keys())
            .collect();

        let filters =
            sanitize_identifier(&whitelist, &selector.into()).merged(&self.permanent_filters);

        let compiled = compile(&filters, &whitelist);
        report(&self.table, &compiled.diagnostics, Report::Debug);

        let sql = join_parts(&[
            &format!("DELETE FROM {}", self.table),
            &compiled.clause,
            &returning_clause(&self.returning),
        ]);

        Query {
            sql,
            parameters: compiled.parameters,
            return_one: self.return_one,
            diagnostics: compiled.diagnostics,
        }
    }
}

/// Configured DELETE statement for a list of ids.
///
/// ```
/// use mik_where::batch_remove;
///
/// let query = batch_remove("users").query([1, 2, 3]);
/// assert_eq!(query.sql, "DELETE FROM users WHERE id IN ($id1, $id2, $id3);");
/// assert_eq!(query.parameters.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct BatchRemove {
    table: String,
    primary_key: Vec<String>,
    returning: Vec<String>,
    permanent_filters: Filters,
}

/// Start a batch DELETE builder keyed by `id`.
pub fn batch_remove(table: impl Into<String>) -> BatchRemove {
    BatchRemove {
        table: table.into(),
        primary_key: vec!["id".to_string()],
        returning: Vec::new(),
        permanent_filters: Filters::new(),
    }
}

impl BatchRemove {
    /// Primary key columns; bare ids bind to the first one.
    ///
    /// # Panics
    ///
    /// Panics if `names` is empty or any column name is invalid.
    pub fn primary_key(mut self, names: &[&str]) -> Self {
        assert!(
            !names.is_empty(),
            "Batch delete on '{}' needs at least one primary key column",
            self.table
        );
        self.primary_key = columns(names, "primary key");
        self
    }

    /// `RETURNING` columns (`*` allowed on its own).
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn returning(mut self, names: &[&str]) -> Self {
        self.returning = returning_columns(names);
        self
    }

    /// Filters applied to every delete.
    ///
    /// # Panics
    ///
    /// Panics if any key is not a valid column name.
    pub fn permanent_filters(mut self, filters: Filters) -> Self {
        for key in filters.keys() {
            assert_valid_column(key, "permanent filter");
        }
        self.permanent_filters = filters;
        self
    }

    /// Build the statement for a list of ids or key maps.
    ///
    /// Each key column becomes one `IN` list.
    pub fn query<I>(&self, ids: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<Selector>,
    {
        let rows: Vec<Filters> = ids
            .into_iter()
            .map(|id| sanitize_identifier(&self.primary_key, &id.into()))
            .collect();

        let whitelist: Vec<&str> = self
            .primary_key
            .iter()
            .map(String::as_str)
            .chain(self.permanent_filters.keys())
            .collect();
        let mut combined = combine_filters(&rows);
        if combined.is_empty() {
            // An empty batch must not turn into an unfiltered delete.
            if let Some(key) = self.primary_key.first() {
                combined.insert(key.clone(), Value::Array(Vec::new()));
            }
        }
        let filters = combined.merged(&self.permanent_filters);

        let compiled = compile(&filters, &whitelist);
        report(&self.table, &compiled.diagnostics, Report::Debug);

        let mut parameters = batch_parameters(&self.primary_key, &rows);
        parameters.extend(compiled.parameters);

        let mut sql = join_parts(&[
            &format!("DELETE FROM {}", self.table),
            &compiled.clause,
            &returning_clause(&self.returning),
        ]);
        sql.push(';');

        Query {
            sql,
            parameters,
            return_one: false,
            diagnostics: compiled.diagnostics,
        }
    }
}
