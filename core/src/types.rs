//! Value model for bindable option slots.
//!
//! This module defines the typed values an options record can hold, the
//! coercion from raw command-line tokens into those values, and the
//! [`CollectionStore`] seam backing collection-typed slots.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the most recent successful write to a slot came from.
///
/// Direct tokens are the ones the user typed on the command line; options-file
/// tokens were spliced in while expanding an `OPTIONS_FILE=<path>` directive.
/// The binder uses this to forbid an options file from silently overriding a
/// value the user supplied directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Supplied directly on the command line.
    Direct,
    /// Spliced in from an expanded options file.
    OptionsFile,
}

/// Value type accepted by an option slot.
///
/// Describes how a raw token is coerced before it is written into the slot.
///
/// # Examples
///
/// ```
/// use optbind_core::{Value, ValueKind};
///
/// let kind = ValueKind::Integer;
/// assert_eq!(kind.coerce("17").unwrap(), Value::Int(17));
/// assert!(kind.coerce("seventeen").is_err());
///
/// let mode = ValueKind::choice(&["FAST", "SMALL", "KEEP"]);
/// assert_eq!(mode.coerce("SMALL").unwrap(), Value::Symbol("SMALL".into()));
/// assert!(mode.coerce("small").is_err()); // symbols are case-sensitive
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// `true` or `false`, matched case-insensitively.
    Boolean,
    /// A whole number.
    Integer,
    /// Free-form text, passed through unchanged.
    Text,
    /// A filesystem path, wrapped without any existence check.
    Path,
    /// One of a fixed set of symbolic values, matched case-sensitively.
    Choice(Vec<String>),
}

impl ValueKind {
    /// Builds a [`ValueKind::Choice`] from string slices.
    pub fn choice(values: &[&str]) -> Self {
        ValueKind::Choice(values.iter().map(|v| v.to_string()).collect())
    }

    /// Coerces a raw token into a typed [`Value`].
    ///
    /// # Examples
    ///
    /// ```
    /// use optbind_core::{Value, ValueKind};
    ///
    /// assert_eq!(ValueKind::Boolean.coerce("False").unwrap(), Value::Bool(false));
    /// assert_eq!(ValueKind::Text.coerce("x y").unwrap(), Value::Text("x y".into()));
    /// ```
    pub fn coerce(&self, raw: &str) -> Result<Value, CoercionError> {
        match self {
            ValueKind::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(CoercionError::Boolean(raw.to_string()))
                }
            }
            ValueKind::Integer => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CoercionError::Integer(raw.to_string())),
            ValueKind::Text => Ok(Value::Text(raw.to_string())),
            ValueKind::Path => Ok(Value::Path(PathBuf::from(raw))),
            ValueKind::Choice(choices) => {
                if choices.iter().any(|c| c == raw) {
                    Ok(Value::Symbol(raw.to_string()))
                } else {
                    Err(CoercionError::Choice {
                        value: raw.to_string(),
                        choices: choices.clone(),
                    })
                }
            }
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Boolean => write!(f, "Boolean"),
            ValueKind::Integer => write!(f, "Integer"),
            ValueKind::Text => write!(f, "Text"),
            ValueKind::Path => write!(f, "Path"),
            ValueKind::Choice(_) => write!(f, "Choice"),
        }
    }
}

/// Failure to coerce a raw token into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Token is not `true` or `false` (any casing).
    #[error("'{0}' is not a legal boolean value (expected true or false)")]
    Boolean(String),
    /// Token does not lex as a whole number.
    #[error("'{0}' is not a whole number")]
    Integer(String),
    /// Token is not one of the declared symbolic values.
    #[error("'{value}' is not a legal value (legal values: {})", .choices.join(", "))]
    Choice { value: String, choices: Vec<String> },
}

/// A typed value held by a slot.
///
/// The `Display` impl renders the token form used when a bound command line is
/// reconstructed, so `coerce` followed by `to_string` round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
    Path(PathBuf),
    /// A matched [`ValueKind::Choice`] symbol.
    Symbol(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    /// Returns the inner path for path-valued slots.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// Mutable storage backing a collection-typed slot.
///
/// This is the seam through which the engine appends, clears, and reads
/// accumulated values. The engine ships two implementations
/// ([`SequenceStore`], [`UniqueSetStore`]) and record authors may supply
/// their own for collection kinds the engine cannot auto-initialize.
pub trait CollectionStore: fmt::Debug {
    /// Appends one value in encounter order.
    fn append(&mut self, value: Value);

    /// Discards every accumulated value, including compiled-in defaults.
    fn clear(&mut self);

    /// Current contents, in the order the store preserves them.
    fn values(&self) -> &[Value];

    fn len(&self) -> usize {
        self.values().len()
    }

    fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

/// Insertion-ordered, duplicate-keeping store. The default backing for
/// abstract ordered-sequence slots.
#[derive(Debug, Default)]
pub struct SequenceStore {
    values: Vec<Value>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for SequenceStore {
    fn append(&mut self, value: Value) {
        self.values.push(value);
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Insertion-ordered store that drops duplicate values.
#[derive(Debug, Default)]
pub struct UniqueSetStore {
    values: Vec<Value>,
    seen: HashSet<Value>,
}

impl UniqueSetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for UniqueSetStore {
    fn append(&mut self, value: Value) {
        if self.seen.insert(value.clone()) {
            self.values.push(value);
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.seen.clear();
    }

    fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_coercion_is_case_insensitive() {
        assert_eq!(ValueKind::Boolean.coerce("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(ValueKind::Boolean.coerce("False").unwrap(), Value::Bool(false));
        assert!(matches!(
            ValueKind::Boolean.coerce("yes"),
            Err(CoercionError::Boolean(_))
        ));
    }

    #[test]
    fn test_integer_coercion_rejects_non_numbers() {
        assert_eq!(ValueKind::Integer.coerce("-40").unwrap(), Value::Int(-40));
        assert!(matches!(
            ValueKind::Integer.coerce("17.5"),
            Err(CoercionError::Integer(_))
        ));
        assert!(matches!(
            ValueKind::Integer.coerce("ABC"),
            Err(CoercionError::Integer(_))
        ));
    }

    #[test]
    fn test_choice_coercion_is_case_sensitive() {
        let kind = ValueKind::choice(&["FAST", "SMALL"]);
        assert_eq!(kind.coerce("FAST").unwrap(), Value::Symbol("FAST".into()));
        let err = kind.coerce("fast").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'fast' is not a legal value (legal values: FAST, SMALL)"
        );
    }

    #[test]
    fn test_value_display_round_trips_tokens() {
        assert_eq!(ValueKind::Integer.coerce("17").unwrap().to_string(), "17");
        assert_eq!(ValueKind::Boolean.coerce("TRUE").unwrap().to_string(), "true");
        assert_eq!(ValueKind::Path.coerce("a/b.dat").unwrap().to_string(), "a/b.dat");
    }

    #[test]
    fn test_sequence_store_keeps_duplicates_in_order() {
        let mut store = SequenceStore::new();
        store.append(Value::Text("a".into()));
        store.append(Value::Text("b".into()));
        store.append(Value::Text("a".into()));
        let rendered: Vec<String> = store.values().iter().map(Value::to_string).collect();
        assert_eq!(rendered, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_unique_set_store_drops_duplicates() {
        let mut store = UniqueSetStore::new();
        store.append(Value::Text("a".into()));
        store.append(Value::Text("a".into()));
        store.append(Value::Text("b".into()));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        store.append(Value::Text("a".into()));
        assert_eq!(store.len(), 1);
    }
}
