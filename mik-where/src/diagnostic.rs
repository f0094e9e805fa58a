//! Diagnostics and the value-plus-diagnostics carrier.
//!
//! Every compilation step returns a [`Carrier`]: the computed value together
//! with the notes collected so far. Composition only ever appends, so a
//! pipeline can report everything it skipped without failing.
//!
//! ```
//! use mik_where::{Carrier, Diagnostic};
//!
//! let carrier = Carrier::new(2, vec![Diagnostic::ignoring("x")])
//!     .chain(|n| Carrier::new(n * 10, vec![Diagnostic::ignoring("y")]));
//!
//! let (value, diagnostics) = carrier.into_parts();
//! assert_eq!(value, 20);
//! assert_eq!(diagnostics[0].message, "x");
//! assert_eq!(diagnostics[1].message, "y");
//! ```

use std::fmt;

/// Message for an empty whitelist.
pub(crate) const NO_SEARCHABLE_MESSAGE: &str =
    "There are no allowed columns, all columns will be ignored";

/// Message for the deprecated `IS (NOT) NULL` sentinel values.
pub(crate) const DEPRECATED_NULL_SENTINEL_MESSAGE: &str = "Passing `IS (NOT) NULL` to filter value is deprecated, please pass null directly with not_ prefix if needed";

/// Kind of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Deprecated usage, the input still compiled.
    Warn,
    /// Filter keys that matched no rule and were dropped.
    Ignoring,
    /// The whitelist is empty, every filter was dropped.
    NoSearchable,
}

impl DiagnosticKind {
    /// Stable name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Ignoring => "ignoring",
            Self::NoSearchable => "no searchable",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal note about how an input was treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What happened.
    pub kind: DiagnosticKind,
    /// Human readable details.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Deprecated usage warning.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warn, message)
    }

    /// One ignored filter key.
    pub fn ignoring(key: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Ignoring, key)
    }

    /// Empty whitelist.
    #[must_use]
    pub fn no_searchable() -> Self {
        Self::new(DiagnosticKind::NoSearchable, NO_SEARCHABLE_MESSAGE)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// A value paired with the diagnostics collected while computing it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "diagnostics are lost if the carrier is dropped"]
pub struct Carrier<T> {
    value: T,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Carrier<T> {
    /// Create a carrier from a value and its diagnostics.
    pub const fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Wrap a value with no diagnostics.
    pub const fn of(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    /// Turn a plain function into one returning a carrier.
    pub fn lift<A, F>(f: F) -> impl Fn(A) -> Self
    where
        F: Fn(A) -> T,
    {
        move |arg| Self::of(f(arg))
    }

    /// Borrow the held value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Borrow the diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Split into value and diagnostics.
    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    /// Transform the held value, keeping the diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Carrier<U> {
        Carrier::new(f(self.value), self.diagnostics)
    }

    /// Feed the value into a step returning a carrier.
    ///
    /// The result holds the inner value; diagnostics are the outer ones
    /// followed by the inner ones.
    pub fn chain<U>(self, f: impl FnOnce(T) -> Carrier<U>) -> Carrier<U> {
        let Carrier {
            value,
            mut diagnostics,
        } = f(self.value);
        let mut merged = self.diagnostics;
        merged.append(&mut diagnostics);
        Carrier::new(value, merged)
    }

    /// Collapse carriers into one carrier of the ordered values.
    ///
    /// Diagnostics are concatenated in sequence order.
    pub fn sequence(carriers: impl IntoIterator<Item = Self>) -> Carrier<Vec<T>> {
        carriers
            .into_iter()
            .fold(Carrier::of(Vec::new()), |acc, carrier| {
                acc.chain(|mut values| {
                    carrier.map(|value| {
                        values.push(value);
                        values
                    })
                })
            })
    }
}

impl<T> From<T> for Carrier<T> {
    fn from(value: T) -> Self {
        Self::of(value)
    }
}
