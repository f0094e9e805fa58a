//! Key stripping and batch reshaping for builder inputs.

use crate::compile::Parameters;
use crate::fragment::placeholder_name;
use crate::value::{Filters, Value};

/// A row selector: a bare id, or a map of column values.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Value for the first selector column (usually the primary key).
    Id(Value),
    /// Column to value map.
    Fields(Filters),
}

impl From<Filters> for Selector {
    fn from(filters: Filters) -> Self {
        Self::Fields(filters)
    }
}

impl From<Value> for Selector {
    fn from(value: Value) -> Self {
        Self::Id(value)
    }
}

impl From<i64> for Selector {
    fn from(id: i64) -> Self {
        Self::Id(Value::Int(id))
    }
}

impl From<i32> for Selector {
    fn from(id: i32) -> Self {
        Self::Id(Value::from(id))
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Self::Id(Value::from(id))
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Self::Id(Value::String(id))
    }
}

fn contains<S: AsRef<str>>(columns: &[S], key: &str) -> bool {
    columns.iter().any(|column| column.as_ref() == key)
}

/// Keep only the filters whose key is one of `columns`.
///
/// ```
/// use mik_where::{Filters, sanitize_parameter};
///
/// let data = Filters::new().with("name", "a").with("is_admin", true);
/// let clean = sanitize_parameter(&["name"], &data);
/// assert_eq!(clean.keys().collect::<Vec<_>>(), vec!["name"]);
/// ```
#[must_use]
pub fn sanitize_parameter<S: AsRef<str>>(columns: &[S], filters: &Filters) -> Filters {
    let mut clean = filters.clone();
    clean.retain(|key, _| contains(columns, key));
    clean
}

/// Turn a selector into filters restricted to `columns`.
///
/// A bare id is bound to the first column; with no columns it is dropped.
#[must_use]
pub fn sanitize_identifier<S: AsRef<str>>(columns: &[S], selector: &Selector) -> Filters {
    match selector {
        Selector::Id(value) => columns
            .first()
            .map(|column| Filters::new().with(column.as_ref(), value.clone()))
            .unwrap_or_default(),
        Selector::Fields(filters) => sanitize_parameter(columns, filters),
    }
}

/// Merge many selectors into one filter map of arrays, key by key.
///
/// `[{id: 1}, {id: 2}]` becomes `{id: [1, 2]}`, which compiles to an `IN`.
#[must_use]
pub fn combine_filters(rows: &[Filters]) -> Filters {
    let mut keys: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    keys.into_iter()
        .map(|key| {
            let values: Vec<Value> = rows.iter().filter_map(|row| row.get(key)).cloned().collect();
            (key, Value::Array(values))
        })
        .collect()
}

/// Bindings for the `IN` placeholders of a combined batch.
///
/// Numbering matches what the compiler generates for [`combine_filters`]:
/// `id1`, `id2`, ... per column, counting only rows that carry the column.
#[must_use]
pub fn batch_parameters<S: AsRef<str>>(columns: &[S], rows: &[Filters]) -> Parameters {
    let mut parameters = Parameters::new();
    for column in columns {
        let column = column.as_ref();
        let name = placeholder_name(column);
        for (index, value) in rows.iter().filter_map(|row| row.get(column)).enumerate() {
            parameters.insert(format!("{name}{}", index + 1), value.clone());
        }
    }
    parameters
}
