//! SELECT statement builder.

use crate::compile::{Parameters, compile};
use crate::validate::assert_valid_column;
use crate::value::{Filters, Value};

use super::{Query, Report, columns, join_parts, report};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDir {
    /// `ASC` or `DESC`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<&str> for SortDir {
    /// Case-insensitive `asc`; anything else sorts descending.
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

/// Per-request input of a [`Select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectFilters {
    /// Page size; `None` or `0` disables paging.
    pub limit: Option<u32>,
    /// Rows to skip, default `0` when paging.
    pub offset: Option<u32>,
    /// Caller filters, compiled against the searchable columns.
    pub filters: Filters,
    /// Column (or specific sort name) to sort by.
    pub sort: Option<String>,
    /// Direction of `sort`.
    pub sort_dir: SortDir,
}

impl SelectFilters {
    /// Empty request: no filters, no paging, default ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the caller filters.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Set the page size.
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the number of rows to skip.
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sort by a column.
    pub fn sort(mut self, sort: impl Into<String>, dir: SortDir) -> Self {
        self.sort = Some(sort.into());
        self.sort_dir = dir;
        self
    }
}

/// Configured SELECT statement.
///
/// ```
/// use mik_where::{Filters, SelectFilters, SortDir, select};
///
/// let users = select("users")
///     .return_cols(&["id", "name", "status"])
///     .permanent_filters(Filters::new().with("deleted", false));
///
/// let query = users.query(
///     &SelectFilters::new()
///         .filters(Filters::new().with("status", "active"))
///         .sort("name", SortDir::Desc)
///         .limit(10),
/// );
///
/// assert_eq!(
///     query.sql,
///     "SELECT id, name, status FROM users WHERE status = $status AND deleted = $deleted \
///      ORDER BY name DESC, id ASC LIMIT $limit OFFSET $offset"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    primary_key: Vec<String>,
    return_cols: Vec<String>,
    searchable_cols: Option<Vec<String>>,
    specific_sorts: Vec<(String, Vec<String>)>,
    group_by_cols: Vec<String>,
    with_query: Option<bool>,
    permanent_filters: Filters,
    return_one: bool,
}

/// Start a SELECT builder.
///
/// The table is trusted code and may contain joins; column lists are
/// validated as they are set.
pub fn select(table: impl Into<String>) -> Select {
    Select::new(table)
}

impl Select {
    /// Create a builder with primary key `id` and no columns (`SELECT *`).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: vec!["id".to_string()],
            return_cols: Vec::new(),
            searchable_cols: None,
            specific_sorts: Vec::new(),
            group_by_cols: Vec::new(),
            with_query: None,
            permanent_filters: Filters::new(),
            return_one: false,
        }
    }

    /// Primary key columns; they always close the `ORDER BY`.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn primary_key(mut self, names: &[&str]) -> Self {
        self.primary_key = columns(names, "primary key");
        self
    }

    /// Columns to return; also the default searchable and sortable set.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn return_cols(mut self, names: &[&str]) -> Self {
        self.return_cols = columns(names, "return column");
        self
    }

    /// Columns callers may filter on, replacing the return columns default.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn searchable_cols(mut self, names: &[&str]) -> Self {
        self.searchable_cols = Some(columns(names, "searchable column"));
        self
    }

    /// Sort `column` by an explicit value order instead of its natural one.
    ///
    /// # Panics
    ///
    /// Panics if the column name is invalid.
    pub fn specific_sort(mut self, column: &str, order: &[&str]) -> Self {
        assert_valid_column(column, "sort column");
        let column = column.to_lowercase();
        let order = order.iter().map(|v| (*v).to_string()).collect();
        self.specific_sorts.retain(|(c, _)| *c != column);
        self.specific_sorts.push((column, order));
        self
    }

    /// `GROUP BY` columns.
    ///
    /// # Panics
    ///
    /// Panics if any column name is invalid.
    pub fn group_by(mut self, names: &[&str]) -> Self {
        self.group_by_cols = columns(names, "group by column");
        self
    }

    /// Wrap the statement in `WITH result AS (...)`.
    ///
    /// Defaults to on when the table contains a `JOIN`.
    pub const fn with_query(mut self, enabled: bool) -> Self {
        self.with_query = Some(enabled);
        self
    }

    /// Filters applied to every query; they override caller filters and
    /// their keys join the whitelist.
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

    /// Mark the statement as returning a single row.
    pub const fn return_one(mut self, return_one: bool) -> Self {
        self.return_one = return_one;
        self
    }

    fn whitelist(&self) -> Vec<&str> {
        self.searchable_cols
            .as_ref()
            .unwrap_or(&self.return_cols)
            .iter()
            .map(String::as_str)
            .chain(self.permanent_filters.keys())
            .collect()
    }

    fn order_by(&self, sort: Option<&str>, dir: SortDir) -> String {
        let mut order: Vec<String> = vec![
            self.primary_key
                .iter()
                .map(|column| format!("{column} ASC"))
                .collect::<Vec<_>>()
                .join(", "),
        ];

        if let Some(sort) = sort {
            let sort = sort.to_lowercase();
            if let Some((column, values)) = self.specific_sorts.iter().find(|(c, _)| *c == sort) {
                let cases: String = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!(" WHEN '{}' THEN {}", v.replace('\'', "''"), i + 1))
                    .collect();
                order.insert(0, format!("CASE {column}{cases} END {}", dir.as_sql()));
            } else if self.return_cols.contains(&sort) {
                order.insert(0, format!("{sort} {}", dir.as_sql()));
            }
        }

        format!("ORDER BY {}", order.join(", "))
    }

    /// Build the statement for one request.
    pub fn query(&self, request: &SelectFilters) -> Query {
        let filters = request.filters.clone().merged(&self.permanent_filters);
        let whitelist = self.whitelist();
        let compiled = compile(&filters, &whitelist);
        report(&self.table, &compiled.diagnostics, Report::Warn);

        let selected = if self.return_cols.is_empty() {
            "*".to_string()
        } else {
            self.return_cols.join(", ")
        };
        let group_by = if self.group_by_cols.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", self.group_by_cols.join(", "))
        };

        let mut sql = join_parts(&[
            &format!("SELECT {selected} FROM {}", self.table),
            &compiled.clause,
            &group_by,
        ]);

        // Lets callers filter and sort on joined or computed columns.
        if self.with_query.unwrap_or_else(|| self.table.contains("JOIN")) {
            sql = format!("WITH result AS (\n{sql}\n) SELECT * FROM result");
        }

        sql = join_parts(&[&sql, &self.order_by(request.sort.as_deref(), request.sort_dir)]);

        let mut parameters: Parameters = compiled.parameters;
        if let Some(limit) = request.limit.filter(|limit| *limit > 0) {
            sql.push_str(" LIMIT $limit OFFSET $offset");
            parameters.insert("limit", Value::Int(i64::from(limit)));
            parameters.insert("offset", Value::Int(i64::from(request.offset.unwrap_or(0))));
        }

        Query {
            sql,
            parameters,
            return_one: self.return_one,
            diagnostics: compiled.diagnostics,
        }
    }
}
