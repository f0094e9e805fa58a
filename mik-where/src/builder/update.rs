//! UPDATE statement builder.

use crate::compile::compile;
use crate::fragment::placeholder_name;
use crate::validate::assert_valid_column;
use crate::value::Filters;

use super::sanitize::{Selector, sanitize_identifier, sanitize_parameter};
use super::{
    BuildError, Query, Report, columns, join_parts, report, returning_clause, returning_columns,
};

/// Suffix of SET placeholders, keeping them apart from filter placeholders.
///
/// A filter column literally named `<col>_u` can still clash with it; such a
/// statement is rejected with [`BuildError::PlaceholderConflict`].
const SET_SUFFIX: &str = "_u";

/// Configured UPDATE statement.
///
/// ```
/// use mik_where::{Filters, update};
///
/// let rename = update("users")
///     .writable_cols(&["name", "email"])
///     .filter_cols(&["id"])
///     .returning(&["id"]);
///
/// let query = rename
///     .query(7, &Filters::new().with("name", "Ann").with("is_admin", true))
///     .unwrap();
///
/// assert_eq!(query.sql, "UPDATE users SET name=$name_u WHERE id = $id RETURNING id");
/// assert_eq!(query.parameters.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    writable_cols: Vec<String>,
    filter_cols: Vec<String>,
    returning: Vec<String>,
    permanent_filters: Filters,
    return_one: bool,
}

/// Start an UPDATE builder for many rows.
pub fn update(table: impl Into<String>) -> Update {
    Update::new(table, false)
}

/// Start an UPDATE builder for one row, selected by primary key `id`.
///
/// Change the key with [`Update::filter_cols`]; the first column receives
/// bare ids.
pub fn update_one(table: impl Into<String>) -> Update {
    Update::new(table, true).filter_cols(&["id"])
}

impl Update {
    fn new(table: impl Into<String>, return_one: bool) -> Self {
        Self {
            table: table.into(),
            writable_cols: Vec::new(),
            filter_cols: Vec::new(),
            returning: Vec::new(),
            permanent_filters: Filters::new(),
            return_one,
        }
    }

    /// Columns the data may set.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn writable_cols(mut self, names: &[&str]) -> Self {
        self.writable_cols = columns(names, "writable column");
        self
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

    /// Filters applied to every update, overriding the selector.
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

    /// Build the statement for one selector and data set.
    ///
    /// Filter keys outside the filter columns and data keys outside the
    /// writable columns are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NoValidColumn`] when no writable column is left
    /// in `data`, and [`BuildError::PlaceholderConflict`] when a SET
    /// placeholder is already bound to a different filter value.
    pub fn query(&self, selector: impl Into<Selector>, data: &Filters) -> Result<Query, BuildError> {
        let whitelist: Vec<&str> = self
            .filter_cols
            .iter()
            .map(String::as_str)
            .chain(self.permanent_filters.keys())
            .collect();

        let filters =
            sanitize_identifier(&whitelist, &selector.into()).merged(&self.permanent_filters);
        let writes = sanitize_parameter(&self.writable_cols, data);
        if writes.is_empty() {
            return Err(BuildError::NoValidColumn);
        }

        let compiled = compile(&filters, &whitelist);
        report(&self.table, &compiled.diagnostics, Report::Debug);

        let mut parameters = compiled.parameters;
        let mut sets = Vec::new();
        for column in &self.writable_cols {
            if let Some(value) = writes.get(column) {
                let name = format!("{}{SET_SUFFIX}", placeholder_name(column));
                if parameters.get(&name).is_some_and(|bound| bound != value) {
                    return Err(BuildError::PlaceholderConflict(name));
                }
                sets.push(format!("{column}=${name}"));
                parameters.insert(name, value.clone());
            }
        }

        let sql = join_parts(&[
            &format!("UPDATE {} SET {}", self.table, sets.join(", ")),
            &compiled.clause,
            &returning_clause(&self.returning),
        ]);

        Ok(Query {
            sql,
            parameters,
            return_one: self.return_one,
            diagnostics: compiled.diagnostics,
        })
    }
}
