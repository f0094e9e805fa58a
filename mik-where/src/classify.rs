//! Filter key grammar.
//!
//! A filter key either names a whitelisted column directly, names one behind
//! an operation prefix (`not_status`, `from_created`, ...), is the full-text
//! key `match`, or is discarded.

use crate::diagnostic::{Carrier, Diagnostic};
use crate::value::{Filters, Value};

/// Semantic operation denoted by a filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Full-text match over every whitelisted column: `match`
    Match,
    /// Equality, `IS NULL` or `IN`: `<col>`
    Query,
    /// Inequality, `IS NOT NULL` or `NOT IN`: `not_<col>`
    Not,
    /// Range lower bound: `from_<col>`
    From,
    /// Range upper bound: `to_<col>`
    To,
    /// Case-insensitive pattern match: `like_<col>`
    Like,
    /// Negated case-insensitive pattern match: `not_like_<col>`
    NotLike,
    /// Not a recognised filter, dropped from the query.
    Discarded,
}

impl Operation {
    /// Key prefix of the operation, if it has one.
    #[must_use]
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Not => Some("not_"),
            Self::From => Some("from_"),
            Self::To => Some("to_"),
            Self::Like => Some("like_"),
            Self::NotLike => Some("not_like_"),
            Self::Match | Self::Query | Self::Discarded => None,
        }
    }

    /// Column targeted by `key` once the operation prefix is removed.
    #[must_use]
    pub fn column(self, key: &str) -> &str {
        self.prefix()
            .and_then(|prefix| key.strip_prefix(prefix))
            .unwrap_or(key)
    }
}

/// Prefixed operations, in match precedence order.
///
/// `not_like_` is checked on its own after `like_`; it is not derived from
/// `not_` + `like_`. A column literally named `like_foo` in the whitelist
/// shadows `foo` for the key `like_foo`.
pub const PREFIX_RULES: [(&str, Operation); 5] = [
    ("not_", Operation::Not),
    ("from_", Operation::From),
    ("to_", Operation::To),
    ("like_", Operation::Like),
    ("not_like_", Operation::NotLike),
];

/// The full-text key.
pub const MATCH_KEY: &str = "match";

/// A filter entry tagged with its operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntry {
    /// Operation denoted by the key.
    pub operation: Operation,
    /// The raw filter key, prefix included.
    pub column: String,
    /// The raw filter value.
    pub value: Value,
}

fn is_whitelisted<S: AsRef<str>>(column: &str, whitelist: &[S]) -> bool {
    whitelist.iter().any(|allowed| allowed.as_ref() == column)
}

/// Determine which operation a filter key denotes.
///
/// First match wins:
/// 1. empty whitelist: `Discarded` with a `no searchable` diagnostic
/// 2. `match`
/// 3. exact whitelisted column
/// 4. each prefix of [`PREFIX_RULES`] whose remainder is whitelisted
/// 5. otherwise `Discarded` with an `ignoring` diagnostic naming the key
///
/// ```
/// use mik_where::{Operation, classify};
///
/// let whitelist = ["status"];
/// assert_eq!(*classify("not_status", &whitelist).value(), Operation::Not);
/// assert_eq!(*classify("not_like_status", &whitelist).value(), Operation::NotLike);
/// assert_eq!(*classify("password", &whitelist).value(), Operation::Discarded);
/// ```
pub fn classify<S: AsRef<str>>(key: &str, whitelist: &[S]) -> Carrier<Operation> {
    if whitelist.is_empty() {
        return Carrier::new(Operation::Discarded, vec![Diagnostic::no_searchable()]);
    }
    if key == MATCH_KEY {
        return Carrier::of(Operation::Match);
    }
    if is_whitelisted(key, whitelist) {
        return Carrier::of(Operation::Query);
    }

    PREFIX_RULES
        .iter()
        .find(|(prefix, _)| {
            key.strip_prefix(prefix)
                .is_some_and(|column| is_whitelisted(column, whitelist))
        })
        .map_or_else(
            || Carrier::new(Operation::Discarded, vec![Diagnostic::ignoring(key)]),
            |(_, operation)| Carrier::of(*operation),
        )
}

/// Classify every key of a filter map, in order.
pub fn classify_all<S: AsRef<str>>(
    filters: &Filters,
    whitelist: &[S],
) -> Vec<Carrier<ClassifiedEntry>> {
    filters
        .iter()
        .map(|(key, value)| {
            classify(key, whitelist).map(|operation| ClassifiedEntry {
                operation,
                column: key.to_string(),
                value: value.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    const WHITELIST: [&str; 3] = ["status", "created", "user.name"];

    fn op(key: &str) -> Operation {
        *classify(key, &WHITELIST).value()
    }

    #[test]
    fn test_exact_and_prefixed() {
        assert_eq!(op("status"), Operation::Query);
        assert_eq!(op("user.name"), Operation::Query);
        assert_eq!(op("not_status"), Operation::Not);
        assert_eq!(op("from_created"), Operation::From);
        assert_eq!(op("to_created"), Operation::To);
        assert_eq!(op("like_user.name"), Operation::Like);
        assert_eq!(op("not_like_status"), Operation::NotLike);
    }

    #[test]
    fn test_match_key() {
        assert_eq!(op("match"), Operation::Match);
    }

    #[test]
    fn test_empty_whitelist_discards_everything() {
        let empty: [&str; 0] = [];
        for key in ["match", "status", "not_status"] {
            let (operation, diagnostics) = classify(key, &empty).into_parts();
            assert_eq!(operation, Operation::Discarded);
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::NoSearchable);
        }
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let (operation, diagnostics) = classify("password", &WHITELIST).into_parts();
        assert_eq!(operation, Operation::Discarded);
        assert_eq!(diagnostics, vec![Diagnostic::ignoring("password")]);

        // Prefix without a whitelisted remainder
        assert_eq!(op("from_status_x"), Operation::Discarded);
        assert_eq!(op("not_"), Operation::Discarded);
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        // `like_status` is itself whitelisted, so the key is a plain equality.
        let whitelist = ["status", "like_status"];
        assert_eq!(*classify("like_status", &whitelist).value(), Operation::Query);

        // `not_like_status` hits `not_` first because `like_status` is whitelisted.
        assert_eq!(*classify("not_like_status", &whitelist).value(), Operation::Not);
    }

    #[test]
    fn test_classification_is_pure() {
        for key in ["status", "not_status", "nope", "match"] {
            assert_eq!(classify(key, &WHITELIST), classify(key, &WHITELIST));
        }
    }

    #[test]
    fn test_column_strips_prefix() {
        assert_eq!(Operation::NotLike.column("not_like_name"), "name");
        assert_eq!(Operation::Not.column("not_name"), "name");
        assert_eq!(Operation::Query.column("name"), "name");
        assert_eq!(Operation::From.column("from_a.b"), "a.b");
    }

    #[test]
    fn test_classify_all_keeps_order() {
        let filters = Filters::new()
            .with("to_created", "2020")
            .with("bogus", 1)
            .with("status", "a");
        let entries = classify_all(&filters, &WHITELIST);
        let ops: Vec<_> = entries.iter().map(|c| c.value().operation).collect();
        assert_eq!(
            ops,
            vec![Operation::To, Operation::Discarded, Operation::Query]
        );
        assert_eq!(entries[0].value().column, "to_created");
    }
}
