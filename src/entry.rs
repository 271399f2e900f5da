//! Records stored in and returned from a [`Dictionary`](crate::Dictionary).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The searchable side of an entry: the word itself and what it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// The word an entry is filed under.
    pub key: String,
    /// Human-readable note about the key.
    #[serde(default)]
    pub description: String,
}

impl Term {
    /// Create a term.
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }
}

/// The stored side of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// The translation or meaning of the term.
    pub value: String,
    /// Human-readable note about the value.
    #[serde(default)]
    pub description: String,
}

impl Definition {
    /// Create a definition.
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

/// A side effect attached to an entry, run by whoever presents the entry.
///
/// The dictionary only stores and hands back gimmicks; it never calls them. Clones share the
/// same closure.
///
/// ```rust
/// use rbdict::Gimmick;
/// use serde_json::json;
///
/// let coin = Gimmick::new(|| json!({ "message": "heads" }));
/// assert_eq!(coin.call()["message"], "heads");
/// ```
#[derive(Clone)]
pub struct Gimmick(Arc<dyn Fn() -> JsonValue + Send + Sync>);

impl Gimmick {
    /// Wrap a closure.
    pub fn new(f: impl Fn() -> JsonValue + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the gimmick.
    pub fn call(&self) -> JsonValue {
        (self.0)()
    }

    /// Whether two handles share the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Gimmick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gimmick(..)")
    }
}

/// A complete, validated record ready to go into a dictionary.
#[derive(Debug, Clone)]
pub struct Entry<G = Gimmick> {
    /// The key and its description.
    pub term: Term,
    /// The value and its description.
    pub definition: Definition,
    /// Optional side effect attached to the entry.
    pub gimmick: Option<G>,
}

impl<G> Entry<G> {
    /// Create an entry without a gimmick.
    pub fn new(
        key: impl Into<String>,
        key_description: impl Into<String>,
        value: impl Into<String>,
        value_description: impl Into<String>,
    ) -> Self {
        Self {
            term: Term::new(key, key_description),
            definition: Definition::new(value, value_description),
            gimmick: None,
        }
    }

    /// Attach a gimmick.
    pub fn with_gimmick(mut self, gimmick: G) -> Self {
        self.gimmick = Some(gimmick);
        self
    }
}

/// One search result, borrowed from the dictionary.
#[derive(Debug, Clone)]
pub struct SearchHit<'a, G = Gimmick> {
    /// Key of the matching entry.
    pub key: &'a str,
    /// Value of the matching entry.
    pub value: &'a str,
    /// Key description for key searches, value description for value searches.
    pub description: &'a str,
    /// The entry's gimmick, if it has one.
    pub gimmick: Option<&'a G>,
}
