//! WHERE clause compiler.
//!
//! Classifies every filter key, generates its condition, and folds the
//! result into one clause plus parameters. Nothing here fails: dropped keys
//! and deprecated values only show up as diagnostics.

use crate::classify::{ClassifiedEntry, classify_all};
use crate::diagnostic::{Carrier, Diagnostic, DiagnosticKind};
use crate::fragment::{Fragment, generate};
use crate::value::{Filters, Value};

/// Ordered placeholder-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, Value)>,
}

impl Parameters {
    /// Create an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind a placeholder, replacing an earlier binding with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value bound to a placeholder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// `true` if the placeholder is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Placeholder names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Bindings in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every binding of `other`, later names win.
    pub fn extend(&mut self, other: Self) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// A compiled `WHERE` clause.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct WhereClause {
    /// Empty, or `WHERE ` followed by the conditions joined with `AND`.
    pub clause: String,
    /// One binding per placeholder in `clause`.
    pub parameters: Parameters,
}

/// Compilation result with its diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Compiled must be used to build the query"]
#[non_exhaustive]
pub struct Compiled {
    /// Empty, or `WHERE ` followed by the conditions joined with `AND`.
    pub clause: String,
    /// One binding per placeholder in `clause`.
    pub parameters: Parameters,
    /// Warnings, ignored keys, and empty-whitelist notes.
    pub diagnostics: Vec<Diagnostic>,
}

/// `true` if any binding of `fragment` reuses a bound name for another value.
fn conflicts(parameters: &Parameters, fragment: &Fragment) -> bool {
    fragment
        .bindings
        .iter()
        .any(|(name, value)| parameters.get(name).is_some_and(|bound| bound != value))
}

/// Join fragments with `AND`, merging their bindings.
///
/// A fragment whose placeholder is already bound to a different value (an
/// `IN` list on `id` next to a column named `id1`) is dropped with a warning,
/// never rebound.
fn assemble(fragments: Vec<Option<Fragment>>) -> Carrier<WhereClause> {
    let mut conditions = Vec::new();
    let mut parameters = Parameters::new();
    let mut diagnostics = Vec::new();

    for fragment in fragments.into_iter().flatten() {
        if fragment.sql.is_empty() {
            continue;
        }
        if conflicts(&parameters, &fragment) {
            diagnostics.push(Diagnostic::warn(format!(
                "Placeholder already bound to another value, dropping `{}`",
                fragment.sql
            )));
            continue;
        }
        conditions.push(fragment.sql);
        for (name, value) in fragment.bindings {
            parameters.insert(name, value);
        }
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    Carrier::new(WhereClause { clause, parameters }, diagnostics)
}

/// Fold raw per-key diagnostics into the reported set.
///
/// Warnings are kept as encountered, ignored keys collapse into one summary
/// listing the allowed columns, and `no searchable` is kept at most once.
fn summarize<S: AsRef<str>>(diagnostics: Vec<Diagnostic>, whitelist: &[S]) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();
    let mut ignored = Vec::new();
    let mut no_searchable = None;

    for diagnostic in diagnostics {
        match diagnostic.kind {
            DiagnosticKind::Warn => warnings.push(diagnostic),
            DiagnosticKind::Ignoring => ignored.push(diagnostic.message),
            DiagnosticKind::NoSearchable => {
                no_searchable.get_or_insert(diagnostic);
            },
        }
    }

    if !ignored.is_empty() {
        let allowed = whitelist
            .iter()
            .map(AsRef::<str>::as_ref)
            .collect::<Vec<_>>()
            .join(", ");
        warnings.push(Diagnostic::new(
            DiagnosticKind::Ignoring,
            format!(
                "Ignoring columns: [{}]. Allowed columns: [{allowed}]",
                ignored.join(", ")
            ),
        ));
    }
    warnings.extend(no_searchable);
    warnings
}

/// Compile a filter map into a `WHERE` clause, carrying its diagnostics.
///
/// ```
/// use mik_where::{Filters, where_query};
///
/// let filters = Filters::new().with("status", "active").with("password", "x");
/// let (clause, diagnostics) = where_query(&filters, &["status"]).into_parts();
///
/// assert_eq!(clause.clause, "WHERE status = $status");
/// assert_eq!(
///     diagnostics[0].message,
///     "Ignoring columns: [password]. Allowed columns: [status]"
/// );
/// ```
pub fn where_query<S: AsRef<str>>(filters: &Filters, whitelist: &[S]) -> Carrier<WhereClause> {
    if whitelist.is_empty() {
        return Carrier::new(WhereClause::default(), vec![Diagnostic::no_searchable()]);
    }

    let per_key = classify_all(filters, whitelist)
        .into_iter()
        .map(|classified| classified.chain(|entry: ClassifiedEntry| generate(&entry, whitelist)));

    let (fragments, mut diagnostics) = Carrier::sequence(per_key).into_parts();
    let (clause, conflicts) = assemble(fragments).into_parts();
    diagnostics.extend(conflicts);
    Carrier::new(clause, summarize(diagnostics, whitelist))
}

/// Compile a filter map against a whitelist.
///
/// ```
/// use mik_where::{Filters, Value, compile};
///
/// let filters = Filters::new().with("id", vec![1, 2, 3]);
/// let compiled = compile(&filters, &["id"]);
///
/// assert_eq!(compiled.clause, "WHERE id IN ($id1, $id2, $id3)");
/// assert_eq!(compiled.parameters.get("id2"), Some(&Value::Int(2)));
/// assert!(compiled.diagnostics.is_empty());
/// ```
pub fn compile<S: AsRef<str>>(filters: &Filters, whitelist: &[S]) -> Compiled {
    let (WhereClause { clause, parameters }, diagnostics) =
        where_query(filters, whitelist).into_parts();
    Compiled {
        clause,
        parameters,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_whitelist() {
        let empty: [&str; 0] = [];
        let filters = Filters::new().with("id", 1).with("match", "x");
        let compiled = compile(&filters, &empty);

        assert_eq!(compiled.clause, "");
        assert!(compiled.parameters.is_empty());
        assert_eq!(compiled.diagnostics, vec![Diagnostic::no_searchable()]);
    }

    #[test]
    fn test_no_filters() {
        let compiled = compile(&Filters::new(), &["id"]);
        assert_eq!(compiled, Compiled::default());
    }

    #[test]
    fn test_null() {
        let compiled = compile(&Filters::new().with("status", Value::Null), &["status"]);
        assert_eq!(compiled.clause, "WHERE status IS NULL");
        assert!(!compiled.parameters.contains("status"));
    }

    #[test]
    fn test_in_expansion() {
        let compiled = compile(&Filters::new().with("id", vec![1, 2, 3]), &["id"]);
        assert_eq!(compiled.clause, "WHERE id IN ($id1, $id2, $id3)");
        let expected: Parameters = [("id1", 1), ("id2", 2), ("id3", 3)].into_iter().collect();
        assert_eq!(compiled.parameters, expected);
    }

    #[test]
    fn test_negated_prefix() {
        let compiled = compile(&Filters::new().with("not_status", "active"), &["status"]);
        assert_eq!(compiled.clause, "WHERE status != $not_status");
        assert_eq!(
            compiled.parameters.get("not_status"),
            Some(&Value::from("active"))
        );
    }

    #[test]
    fn test_range_pair_binds_distinct_placeholders() {
        let filters = Filters::new()
            .with("from_created", "2020-01-01")
            .with("to_created", "2020-12-31");
        let compiled = compile(&filters, &["created"]);

        assert_eq!(
            compiled.clause,
            "WHERE created::timestamp >= $from_created::timestamp \
             AND created::timestamp <= $to_created::timestamp"
        );
        assert_eq!(compiled.parameters.len(), 2);
        assert_eq!(
            compiled.parameters.get("from_created"),
            Some(&Value::from("2020-01-01"))
        );
        assert_eq!(
            compiled.parameters.get("to_created"),
            Some(&Value::from("2020-12-31"))
        );
    }

    #[test]
    fn test_equality_and_negation_do_not_collide() {
        let filters = Filters::new().with("status", "a").with("not_status", "b");
        let compiled = compile(&filters, &["status"]);
        assert_eq!(
            compiled.clause,
            "WHERE status = $status AND status != $not_status"
        );
        assert_eq!(compiled.parameters.len(), 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let ab = compile(&Filters::new().with("a", 1).with("b", 2), &["a", "b"]);
        let ba = compile(&Filters::new().with("b", 2).with("a", 1), &["a", "b"]);
        assert_eq!(ab.clause, "WHERE a = $a AND b = $b");
        assert_eq!(ba.clause, "WHERE b = $b AND a = $a");
    }

    #[test]
    fn test_multiple_discards_aggregate() {
        let compiled = compile(&Filters::new().with("x", 1).with("y", 2), &["id"]);
        assert_eq!(compiled.clause, "");
        assert_eq!(compiled.diagnostics.len(), 1);
        assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::Ignoring);
        assert_eq!(
            compiled.diagnostics[0].message,
            "Ignoring columns: [x, y]. Allowed columns: [id]"
        );
    }

    #[test]
    fn test_warnings_come_before_ignored_summary() {
        let filters = Filters::new()
            .with("bogus", 1)
            .with("status", "IS_NOT_NULL")
            .with("deleted", "IS NULL");
        let compiled = compile(&filters, &["status", "deleted"]);

        assert_eq!(
            compiled.clause,
            "WHERE status IS_NOT_NULL AND deleted IS NULL"
        );
        let kinds: Vec<_> = compiled.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::Warn,
                DiagnosticKind::Warn,
                DiagnosticKind::Ignoring
            ]
        );
    }

    #[test]
    fn test_match_over_whitelist() {
        let filters = Filters::new().with("match", "%ann%").with("status", "a");
        let compiled = compile(&filters, &["name", "status"]);
        assert_eq!(
            compiled.clause,
            "WHERE (name::text ILIKE $match OR status::text ILIKE $match) AND status = $status"
        );
        assert_eq!(compiled.parameters.get("match"), Some(&Value::from("%ann%")));
    }

    #[test]
    fn test_summarize_keeps_one_no_searchable() {
        let diagnostics = vec![
            Diagnostic::no_searchable(),
            Diagnostic::warn("w"),
            Diagnostic::no_searchable(),
        ];
        let summary = summarize(diagnostics, &["id"]);
        assert_eq!(
            summary,
            vec![Diagnostic::warn("w"), Diagnostic::no_searchable()]
        );
    }

    #[test]
    fn test_conflicting_placeholder_is_dropped() {
        let filters = Filters::new().with("id", vec![1, 2]).with("id1", 9);
        let compiled = compile(&filters, &["id", "id1"]);

        assert_eq!(compiled.clause, "WHERE id IN ($id1, $id2)");
        let expected: Parameters = [("id1", 1), ("id2", 2)].into_iter().collect();
        assert_eq!(compiled.parameters, expected);
        assert_eq!(compiled.diagnostics.len(), 1);
        assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::Warn);
        assert_eq!(
            compiled.diagnostics[0].message,
            "Placeholder already bound to another value, dropping `id1 = $id1`"
        );
    }

    #[test]
    fn test_qualified_and_underscored_columns_conflict() {
        let filters = Filters::new().with("a__b", 2).with("a.b", 1);
        let compiled = compile(&filters, &["a.b", "a__b"]);
        assert_eq!(compiled.clause, "WHERE a__b = $a__b");
        assert_eq!(compiled.parameters.get("a__b"), Some(&Value::Int(2)));
        assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::Warn);
    }

    #[test]
    fn test_shared_placeholder_with_equal_value_is_kept() {
        let filters = Filters::new().with("id", vec![7]).with("id1", 7);
        let compiled = compile(&filters, &["id", "id1"]);
        assert_eq!(compiled.clause, "WHERE id IN ($id1) AND id1 = $id1");
        assert_eq!(compiled.parameters.len(), 1);
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn test_every_placeholder_is_bound() {
        let filters = Filters::new()
            .with("id", vec![1, 2])
            .with("not_user.role", "admin")
            .with("like_name", "%a%")
            .with("match", "x")
            .with("deleted_at", Value::Null);
        let compiled = compile(&filters, &["id", "user.role", "name", "deleted_at"]);

        for name in compiled.parameters.names() {
            assert!(compiled.clause.contains(&format!("${name}")), "{name}");
        }
        let placeholders = compiled.clause.matches('$').count();
        // `match` appears once per whitelisted column
        assert_eq!(placeholders, 2 + 1 + 1 + 4);
        assert_eq!(compiled.parameters.len(), 5);
    }
}
