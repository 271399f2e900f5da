//! The dictionary facade over [`RbTree`].

use std::convert::Infallible;
use std::fmt::{self, Debug};

use crate::entry::{Definition, Entry, Gimmick, SearchHit, Term};
use crate::tree::RbTree;

/// What a node holds besides its key.
#[derive(Clone)]
struct Record<G> {
    key_description: String,
    definition: Definition,
    gimmick: Option<G>,
}

/// A term/definition dictionary ordered by key.
///
/// `G` is the type of gimmick entries may carry. [`PlainDictionary`] is the variant whose entries
/// never carry one.
///
/// ```rust
/// use rbdict::{Definition, Dictionary, Term};
///
/// let mut dict: Dictionary = Dictionary::new();
/// dict.insert(Term::new("cat", ""), Definition::new("a feline", ""), None);
/// dict.insert(Term::new("car", ""), Definition::new("a vehicle", ""), None);
/// dict.insert(Term::new("cart", ""), Definition::new("a wheeled container", ""), None);
///
/// let keys: Vec<_> = dict.prefix_search_key("car").iter().map(|hit| hit.key).collect();
/// assert_eq!(keys, ["car", "cart"]);
/// assert_eq!(dict.lookup("cat").map(|d| d.value.as_str()), Some("a feline"));
/// assert!(dict.lookup("dog").is_none());
/// ```
#[derive(Clone)]
pub struct Dictionary<G = Gimmick> {
    tree: RbTree<String, Record<G>>,
}

/// A dictionary whose entries can never carry a gimmick.
pub type PlainDictionary = Dictionary<Infallible>;

impl<G> Dictionary<G> {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            tree: RbTree::new(),
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Add an entry.
    ///
    /// If the key is already present its definition and gimmick are replaced; the description
    /// recorded when the key was first inserted is kept.
    pub fn insert(&mut self, term: Term, definition: Definition, gimmick: Option<G>) {
        let Term { key, description } = term;
        if let Some(record) = self.tree.get_mut(key.as_str()) {
            record.definition = definition;
            record.gimmick = gimmick;
            return;
        }
        self.tree.insert(
            key,
            Record {
                key_description: description,
                definition,
                gimmick,
            },
        );
    }

    /// Add an already assembled entry. See [`Dictionary::insert`].
    pub fn insert_entry(&mut self, entry: Entry<G>) {
        self.insert(entry.term, entry.definition, entry.gimmick);
    }

    /// Insert entries one after the other, later duplicates overwriting earlier ones.
    pub fn import<I: IntoIterator<Item = Entry<G>>>(&mut self, entries: I) {
        for entry in entries {
            self.insert_entry(entry);
        }
    }

    /// The definition stored under exactly `key`.
    pub fn lookup(&self, key: &str) -> Option<&Definition> {
        self.tree.get(key).map(|record| &record.definition)
    }

    /// Whether `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.tree.contains_key(key)
    }

    /// The smallest key whose value equals `value` exactly.
    pub fn search_by_value(&self, value: &str) -> Option<&str> {
        self.tree
            .iter()
            .find(|(_, record)| record.definition.value == value)
            .map(|(key, _)| key.as_str())
    }

    /// Every entry whose key starts with `query`, ignoring case, in ascending key order.
    pub fn prefix_search_key(&self, query: &str) -> Vec<SearchHit<'_, G>> {
        let query = query.to_lowercase();
        self.tree
            .iter()
            .filter(|(key, _)| starts_with_ignore_case(key, &query))
            .map(|(key, record)| SearchHit {
                key,
                value: &record.definition.value,
                description: &record.key_description,
                gimmick: record.gimmick.as_ref(),
            })
            .collect()
    }

    /// Every entry whose value starts with `query`, ignoring case.
    ///
    /// Results come in ascending key order, not value order.
    pub fn prefix_search_value(&self, query: &str) -> Vec<SearchHit<'_, G>> {
        let query = query.to_lowercase();
        self.tree
            .iter()
            .filter(|(_, record)| starts_with_ignore_case(&record.definition.value, &query))
            .map(|(key, record)| SearchHit {
                key,
                value: &record.definition.value,
                description: &record.definition.description,
                gimmick: record.gimmick.as_ref(),
            })
            .collect()
    }

    /// All entries in ascending key order, described by their key descriptions.
    pub fn iter(&self) -> impl Iterator<Item = SearchHit<'_, G>> + '_ {
        self.tree.iter().map(|(key, record)| SearchHit {
            key,
            value: &record.definition.value,
            description: &record.key_description,
            gimmick: record.gimmick.as_ref(),
        })
    }
}

/// `lowered_query` must already be lower-cased.
fn starts_with_ignore_case(haystack: &str, lowered_query: &str) -> bool {
    haystack.to_lowercase().starts_with(lowered_query)
}

impl<G> Default for Dictionary<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Debug> Debug for Dictionary<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.tree
                    .iter()
                    .map(|(key, record)| (key, (&record.definition, &record.gimmick))),
            )
            .finish()
    }
}

impl<G> FromIterator<Entry<G>> for Dictionary<G> {
    fn from_iter<T: IntoIterator<Item = Entry<G>>>(iter: T) -> Self {
        let mut dict = Self::new();
        dict.import(iter);
        dict
    }
}

impl<G> Extend<Entry<G>> for Dictionary<G> {
    fn extend<T: IntoIterator<Item = Entry<G>>>(&mut self, iter: T) {
        self.import(iter);
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn animals() -> Dictionary {
        Dictionary::from_iter([
            Entry::new("cat", "noun", "a feline", "animal"),
            Entry::new("car", "noun", "a vehicle", "machine"),
            Entry::new("cart", "noun", "a wheeled container", "object"),
            Entry::new("Catalog", "noun", "A list", "document"),
        ])
    }

    #[test]
    fn prefix_search_on_key_is_ordered() {
        let mut dict: Dictionary = Dictionary::new();
        dict.insert(Term::new("cat", ""), Definition::new("a feline", ""), None);
        dict.insert(Term::new("car", ""), Definition::new("a vehicle", ""), None);
        dict.insert(
            Term::new("cart", ""),
            Definition::new("a wheeled container", ""),
            None,
        );

        let keys: Vec<_> = dict.prefix_search_key("car").iter().map(|h| h.key).collect();
        assert_eq!(keys, ["car", "cart"]);
    }

    #[test]
    fn prefix_search_ignores_case() {
        let dict = animals();

        let keys: Vec<_> = dict.prefix_search_key("CAT").iter().map(|h| h.key).collect();
        // Byte order puts the capitalised key first.
        assert_eq!(keys, ["Catalog", "cat"]);

        let hits = dict.prefix_search_key("cart");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "a wheeled container");
        assert_eq!(hits[0].description, "noun");

        assert_eq!(dict.prefix_search_key("").len(), dict.len());
        assert!(dict.prefix_search_key("dog").is_empty());
    }

    #[test]
    fn prefix_search_on_value_is_ordered_by_key() {
        let dict = animals();

        let hits = dict.prefix_search_value("a");
        let keys: Vec<_> = hits.iter().map(|h| h.key).collect();
        assert_eq!(keys, ["Catalog", "car", "cart", "cat"]);
        // Value searches describe the value.
        assert_eq!(hits[0].description, "document");

        let keys: Vec<_> = dict
            .prefix_search_value("A W")
            .iter()
            .map(|h| h.key)
            .collect();
        assert_eq!(keys, ["cart"]);
    }

    #[test]
    fn lookup_and_search_by_value() {
        let dict = animals();

        assert_eq!(dict.lookup("car"), Some(&Definition::new("a vehicle", "machine")));
        assert!(dict.lookup("Car").is_none());
        assert!(dict.contains("cat"));
        assert!(!dict.contains("ca"));

        assert_eq!(dict.search_by_value("a vehicle"), Some("car"));
        assert_eq!(dict.search_by_value("a Vehicle"), None);
    }

    #[test]
    fn search_by_value_returns_smallest_key() {
        let mut dict = PlainDictionary::new();
        dict.import([
            Entry::new("b", "", "same", ""),
            Entry::new("a", "", "same", ""),
        ]);
        assert_eq!(dict.search_by_value("same"), Some("a"));
    }

    #[test]
    fn overwrite_keeps_one_entry_and_first_description() {
        let first = Gimmick::new(|| json!("first"));
        let second = Gimmick::new(|| json!("second"));

        let mut dict: Dictionary = Dictionary::new();
        dict.insert(
            Term::new("a", "original"),
            Definition::new("v1", "d1"),
            Some(first),
        );
        dict.insert(
            Term::new("a", "ignored"),
            Definition::new("v2", "d2"),
            Some(second.clone()),
        );

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.lookup("a"), Some(&Definition::new("v2", "d2")));
        let hits = dict.prefix_search_key("a");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "original");
        assert!(hits[0].gimmick.is_some_and(|g| g.ptr_eq(&second)));

        dict.insert(Term::new("a", ""), Definition::new("v3", ""), None);
        assert!(dict.prefix_search_key("a")[0].gimmick.is_none());
    }

    #[test]
    fn import_order_decides_duplicates() {
        let mut dict = PlainDictionary::new();
        dict.import([Entry::new("a", "", "v1", ""), Entry::new("a", "", "v2", "")]);
        assert_eq!(dict.lookup("a").map(|d| d.value.as_str()), Some("v2"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn gimmicks_are_stored_not_called() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let gimmick = Gimmick::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            json!({ "message": "It's a tie!", "resultClass": "info-notification" })
        });

        let mut dict: Dictionary = Dictionary::new();
        dict.insert_entry(Entry::new("batu", "", "rock", "").with_gimmick(gimmick));
        dict.insert_entry(Entry::new("gunting", "", "scissors", ""));
        let _ = dict.prefix_search_key("");
        let _ = dict.prefix_search_value("r");
        let _ = format!("{dict:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let hits = dict.prefix_search_value("ROCK");
        let result = hits[0].gimmick.map(Gimmick::call);
        assert_eq!(result.map(|r| r["resultClass"].clone()), Some(json!("info-notification")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn iter_walks_keys_in_order() {
        let dict = animals();
        let keys: Vec<_> = dict.iter().map(|h| h.key).collect();
        assert_eq!(keys, ["Catalog", "car", "cart", "cat"]);
        assert!(dict.iter().all(|h| h.description == "noun"));
    }

    mod proptests {
        use std::collections::BTreeMap;

        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn prefix_search_matches_model(
                entries in proptest::collection::vec(("[a-cA-C]{0,4}", "[a-c]{0,3}"), 0..200),
                query in "[a-cA-C]{0,2}",
            ) {
                let mut dict = PlainDictionary::new();
                let mut model = BTreeMap::new();
                for (key, value) in &entries {
                    dict.insert(Term::new(key.as_str(), ""), Definition::new(value.as_str(), ""), None);
                    model.insert(key.clone(), value.clone());
                }

                let lowered = query.to_lowercase();
                let expected: Vec<_> = model
                    .keys()
                    .filter(|k| k.to_lowercase().starts_with(&lowered))
                    .map(String::as_str)
                    .collect();
                let found: Vec<_> = dict.prefix_search_key(&query).iter().map(|h| h.key).collect();
                prop_assert_eq!(found, expected);

                for (key, value) in &model {
                    prop_assert_eq!(dict.lookup(key).map(|d| &d.value), Some(value));
                }
                prop_assert_eq!(dict.len(), model.len());
            }
        }
    }
}
