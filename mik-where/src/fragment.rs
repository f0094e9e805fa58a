//! SQL condition generators, one per [`Operation`].
//!
//! Generators trust the classifier: the column is already known to be
//! whitelisted and is never re-checked here.

use crate::classify::{ClassifiedEntry, MATCH_KEY, Operation};
use crate::diagnostic::{Carrier, DEPRECATED_NULL_SENTINEL_MESSAGE, Diagnostic};
use crate::value::Value;

/// Legacy string values standing in for a null test.
pub const NULL_SENTINELS: [&str; 4] = ["IS_NULL", "IS NULL", "IS_NOT_NULL", "IS NOT NULL"];

/// One SQL condition with the parameters its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The condition, e.g. `status = $status`.
    pub sql: String,
    /// Placeholder name and bound value, in placeholder order.
    pub bindings: Vec<(String, Value)>,
}

impl Fragment {
    fn bare(sql: String) -> Self {
        Self {
            sql,
            bindings: Vec::new(),
        }
    }

    fn bound(sql: String, name: String, value: &Value) -> Self {
        Self {
            sql,
            bindings: vec![(name, value.clone())],
        }
    }
}

/// Placeholder name for a filter key: the first `.` becomes `__`.
///
/// ```
/// assert_eq!(mik_where::placeholder_name("user.name"), "user__name");
/// assert_eq!(mik_where::placeholder_name("not_status"), "not_status");
/// ```
#[must_use]
pub fn placeholder_name(key: &str) -> String {
    key.replacen('.', "__", 1)
}

fn is_null_sentinel(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| NULL_SENTINELS.contains(&s))
}

/// Shared `=` / `!=` / `IN` / `IS NULL` logic for `Query` and `Not`.
fn comparison(key: &str, column: &str, value: &Value, negated: bool) -> Carrier<Fragment> {
    let name = placeholder_name(key);

    match value {
        Value::Null => {
            let test = if negated { "IS NOT NULL" } else { "IS NULL" };
            Carrier::of(Fragment::bare(format!("{column} {test}")))
        },
        Value::Array(values) if values.is_empty() => {
            // `IN ()` is not valid SQL; keep the meaning instead.
            let sql = if negated {
                "1=1 /* NOT IN requires at least one value */"
            } else {
                "1=0 /* IN requires at least one value */"
            };
            Carrier::of(Fragment::bare(sql.to_string()))
        },
        Value::Array(values) => {
            let bindings: Vec<(String, Value)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("{name}{}", i + 1), v.clone()))
                .collect();
            let placeholders = bindings
                .iter()
                .map(|(n, _)| format!("${n}"))
                .collect::<Vec<_>>()
                .join(", ");
            let op = if negated { "NOT IN" } else { "IN" };
            Carrier::of(Fragment {
                sql: format!("{column} {op} ({placeholders})"),
                bindings,
            })
        },
        Value::String(sentinel) if is_null_sentinel(value) => Carrier::new(
            Fragment::bare(format!("{column} {sentinel}")),
            vec![Diagnostic::warn(DEPRECATED_NULL_SENTINEL_MESSAGE)],
        ),
        _ => {
            let op = if negated { "!=" } else { "=" };
            Carrier::of(Fragment::bound(
                format!("{column} {op} ${name}"),
                name,
                value,
            ))
        },
    }
}

/// `<col> = $<key>`, `<col> IS NULL` or `<col> IN ($<key>1, ...)`.
pub fn query(key: &str, value: &Value) -> Carrier<Fragment> {
    comparison(key, Operation::Query.column(key), value, false)
}

/// `<col> != $<key>`, `<col> IS NOT NULL` or `<col> NOT IN ($<key>1, ...)`.
pub fn not(key: &str, value: &Value) -> Carrier<Fragment> {
    comparison(key, Operation::Not.column(key), value, true)
}

/// `<col>::timestamp >= $<key>::timestamp`
pub fn from(key: &str, value: &Value) -> Fragment {
    let name = placeholder_name(key);
    let column = Operation::From.column(key);
    Fragment::bound(
        format!("{column}::timestamp >= ${name}::timestamp"),
        name,
        value,
    )
}

/// `<col>::timestamp <= $<key>::timestamp`
pub fn to(key: &str, value: &Value) -> Fragment {
    let name = placeholder_name(key);
    let column = Operation::To.column(key);
    Fragment::bound(
        format!("{column}::timestamp <= ${name}::timestamp"),
        name,
        value,
    )
}

/// `<col>::text ILIKE $<key>`; the value carries its own wildcards.
pub fn like(key: &str, value: &Value) -> Fragment {
    let name = placeholder_name(key);
    let column = Operation::Like.column(key);
    Fragment::bound(format!("{column}::text ILIKE ${name}"), name, value)
}

/// `<col>::text NOT ILIKE $<key>`
pub fn not_like(key: &str, value: &Value) -> Fragment {
    let name = placeholder_name(key);
    let column = Operation::NotLike.column(key);
    Fragment::bound(format!("{column}::text NOT ILIKE ${name}"), name, value)
}

/// Disjunction of `::text ILIKE $match` over every whitelisted column.
///
/// Returns `None` for an empty whitelist.
pub fn full_text_match<S: AsRef<str>>(value: &Value, whitelist: &[S]) -> Option<Fragment> {
    if whitelist.is_empty() {
        return None;
    }
    let alternatives = whitelist
        .iter()
        .map(|column| format!("{}::text ILIKE ${MATCH_KEY}", column.as_ref()))
        .collect::<Vec<_>>()
        .join(" OR ");
    Some(Fragment::bound(
        format!("({alternatives})"),
        MATCH_KEY.to_string(),
        value,
    ))
}

/// Generate the fragment for a classified entry.
///
/// `Discarded` entries produce no fragment.
pub fn generate<S: AsRef<str>>(
    entry: &ClassifiedEntry,
    whitelist: &[S],
) -> Carrier<Option<Fragment>> {
    let ClassifiedEntry {
        operation,
        column: key,
        value,
    } = entry;

    match operation {
        Operation::Query => query(key, value).map(Some),
        Operation::Not => not(key, value).map(Some),
        Operation::From => Carrier::of(Some(from(key, value))),
        Operation::To => Carrier::of(Some(to(key, value))),
        Operation::Like => Carrier::of(Some(like(key, value))),
        Operation::NotLike => Carrier::of(Some(not_like(key, value))),
        Operation::Match => Carrier::of(full_text_match(value, whitelist)),
        Operation::Discarded => Carrier::of(None),
    }
}
