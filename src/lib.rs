//! This crate implements a term/definition dictionary on top of a Red-Black tree.
//!
//! [`RbTree`] is the ordered index: a Red-Black tree kept in an arena, giving logarithmic insert
//! and lookup and in-order traversal. [`Dictionary`] files [`Term`]/[`Definition`] pairs in it by
//! key and adds the searches a dictionary front end needs: exact lookup, case-insensitive prefix
//! search over keys or values, and reverse lookup by value. Entries may carry a [`Gimmick`], an
//! opaque callback the dictionary stores but never runs.
//!
//! Nothing here deletes entries; a key, once inserted, stays until the dictionary is dropped.
//! The types are `Send` and `Sync` when the gimmick type is, so a dictionary shared between
//! threads can be wrapped in a reader-writer lock.
//!
//! ```rust
//! use rbdict::{Dictionary, Entry, Gimmick};
//! use serde_json::json;
//!
//! let mut dict = Dictionary::new();
//! dict.import([
//!     Entry::new("kucing", "noun", "cat", "animal"),
//!     Entry::new("kuda", "noun", "horse", "animal"),
//!     Entry::new("batu", "noun", "rock", "object")
//!         .with_gimmick(Gimmick::new(|| json!({ "message": "It's a tie!" }))),
//! ]);
//!
//! let hits = dict.prefix_search_key("KU");
//! assert_eq!(hits.iter().map(|h| h.key).collect::<Vec<_>>(), ["kucing", "kuda"]);
//!
//! let rock = &dict.prefix_search_value("rock")[0];
//! assert_eq!(rock.gimmick.map(|g| g.call()["message"].clone()), Some(json!("It's a tie!")));
//! ```

#![deny(missing_docs)]

mod dictionary;
mod entry;
mod error;
mod import;
pub mod tree;

pub use dictionary::{Dictionary, PlainDictionary};
pub use entry::{Definition, Entry, Gimmick, SearchHit, Term};
pub use error::{Error, Result};
pub use import::{ImportPolicy, ImportReport, RawRecord, Rejection};
pub use tree::RbTree;
