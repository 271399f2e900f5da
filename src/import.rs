//! Bulk loading of raw, possibly incomplete records.
//!
//! Records arrive as loose JSON-shaped data. Each one is validated on its own: a bad record is
//! reported in the [`ImportReport`] and skipped, and the rest of the batch still goes in.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::dictionary::Dictionary;
use crate::entry::{Definition, Entry, Term};
use crate::error::{Error, Result};

/// How strictly incomplete records are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Records without a key or a value are rejected.
    #[default]
    Reject,
    /// A missing value becomes the empty string. Records without a key are still rejected.
    Coerce,
}

/// A record as it appears in import data.
///
/// The gimmick, if any, is referred to by name and resolved while importing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// The entry key.
    pub key: Option<String>,
    /// Description of the key, empty when absent.
    pub key_description: Option<String>,
    /// The entry value.
    pub value: Option<String>,
    /// Description of the value, empty when absent.
    pub value_description: Option<String>,
    /// Name of the gimmick to attach.
    pub gimmick: Option<String>,
}

impl RawRecord {
    /// Turn the record into an entry, resolving the gimmick name through `resolver`.
    pub fn validate<G>(
        self,
        policy: ImportPolicy,
        mut resolver: impl FnMut(&str) -> Option<G>,
    ) -> Result<Entry<G>> {
        let key = self.key.ok_or(Error::MissingField("key"))?;
        let value = match (self.value, policy) {
            (Some(value), _) => value,
            (None, ImportPolicy::Coerce) => String::new(),
            (None, ImportPolicy::Reject) => return Err(Error::MissingField("value")),
        };
        let gimmick = match self.gimmick {
            Some(name) => match resolver(&name) {
                Some(gimmick) => Some(gimmick),
                None => return Err(Error::UnknownGimmick(name)),
            },
            None => None,
        };

        Ok(Entry {
            term: Term::new(key, self.key_description.unwrap_or_default()),
            definition: Definition::new(value, self.value_description.unwrap_or_default()),
            gimmick,
        })
    }
}

/// A record that did not make it into the dictionary.
#[derive(Debug)]
pub struct Rejection {
    /// Position of the record in the input.
    pub index: usize,
    /// Why it was rejected.
    pub error: Error,
}

/// Outcome of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Records inserted, overwrites included.
    pub inserted: usize,
    /// Records skipped, in input order.
    pub rejected: Vec<Rejection>,
}

impl ImportReport {
    /// Whether every record was inserted.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl<G> Dictionary<G> {
    /// Validate and insert raw records in order.
    ///
    /// ```rust
    /// use rbdict::{ImportPolicy, PlainDictionary, RawRecord};
    ///
    /// let mut dict = PlainDictionary::new();
    /// let report = dict.import_records(
    ///     [
    ///         RawRecord { key: Some("a".into()), value: Some("v1".into()), ..Default::default() },
    ///         RawRecord { key: Some("b".into()), ..Default::default() },
    ///     ],
    ///     ImportPolicy::Reject,
    ///     |_| None,
    /// );
    /// assert_eq!(report.inserted, 1);
    /// assert_eq!(report.rejected[0].index, 1);
    /// assert!(dict.lookup("b").is_none());
    /// ```
    pub fn import_records<I, F>(
        &mut self,
        records: I,
        policy: ImportPolicy,
        mut resolver: F,
    ) -> ImportReport
    where
        I: IntoIterator<Item = RawRecord>,
        F: FnMut(&str) -> Option<G>,
    {
        self.import_validated(
            records
                .into_iter()
                .map(|record| record.validate(policy, &mut resolver)),
        )
    }

    /// Validate and insert the records of a JSON array.
    ///
    /// Only input that is not a JSON array fails the whole call; elements that do not describe a
    /// record are rejected one by one.
    pub fn import_json<F>(
        &mut self,
        json: &str,
        policy: ImportPolicy,
        mut resolver: F,
    ) -> Result<ImportReport>
    where
        F: FnMut(&str) -> Option<G>,
    {
        let values: Vec<JsonValue> = serde_json::from_str(json)?;
        Ok(self.import_validated(values.into_iter().map(
            |value| -> Result<Entry<G>> {
                serde_json::from_value::<RawRecord>(value)?.validate(policy, &mut resolver)
            },
        )))
    }

    fn import_validated(
        &mut self,
        entries: impl Iterator<Item = Result<Entry<G>>>,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for (index, entry) in entries.enumerate() {
            match entry {
                Ok(entry) => {
                    self.insert_entry(entry);
                    report.inserted += 1;
                }
                Err(error) => {
                    warn!(index, error = %error, "rejected import record");
                    report.rejected.push(Rejection { index, error });
                }
            }
        }
        debug!(
            inserted = report.inserted,
            rejected = report.rejected.len(),
            entries = self.len(),
            "import finished"
        );
        report
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::entry::Gimmick;
    use crate::PlainDictionary;

    fn raw(key: Option<&str>, value: Option<&str>) -> RawRecord {
        RawRecord {
            key: key.map(String::from),
            value: value.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn reject_policy_skips_incomplete_records() {
        let mut dict = PlainDictionary::new();
        let report = dict.import_records(
            [
                raw(Some("a"), Some("v1")),
                raw(None, Some("orphan")),
                raw(Some("b"), None),
                raw(Some("c"), Some("v3")),
            ],
            ImportPolicy::Reject,
            |_| None,
        );

        assert_eq!(report.inserted, 2);
        assert!(!report.is_clean());
        let rejected: Vec<_> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, [1, 2]);
        assert!(matches!(report.rejected[0].error, Error::MissingField("key")));
        assert!(matches!(report.rejected[1].error, Error::MissingField("value")));
        assert_eq!(dict.len(), 2);
        assert!(dict.lookup("c").is_some());
    }

    #[test]
    fn coerce_policy_fills_missing_value() {
        let mut dict = PlainDictionary::new();
        let report = dict.import_records(
            [raw(Some("b"), None), raw(None, None)],
            ImportPolicy::Coerce,
            |_| None,
        );

        assert_eq!(report.inserted, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(dict.lookup("b"), Some(&Definition::default()));
    }

    #[test]
    fn import_json_resolves_gimmicks_by_name() {
        let json = json!([
            { "key": "batu", "keyDescription": "noun", "value": "rock", "valueDescription": "id", "gimmick": "rps" },
            { "key": "cuaca", "value": "weather", "gimmick": "weather" },
            { "key": 7, "value": "not a string key" },
            { "key": "gunting", "value": "scissors" },
            { "key": "batu", "value": "stone" }
        ])
        .to_string();

        let rps = Gimmick::new(|| json!({ "message": "You win!", "titleColor": "green" }));
        let mut dict: Dictionary = Dictionary::new();
        let report = dict
            .import_json(&json, ImportPolicy::default(), |name| {
                (name == "rps").then(|| rps.clone())
            })
            .unwrap();

        assert_eq!(report.inserted, 3);
        let rejected: Vec<_> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, [1, 2]);
        assert!(matches!(&report.rejected[0].error, Error::UnknownGimmick(name) if name == "weather"));
        assert!(matches!(report.rejected[1].error, Error::Json(_)));

        // The later "batu" record overwrote the value and dropped the gimmick.
        let hits = dict.prefix_search_key("batu");
        assert_eq!(hits[0].value, "stone");
        assert_eq!(hits[0].description, "noun");
        assert!(hits[0].gimmick.is_none());
        assert_eq!(dict.search_by_value("scissors"), Some("gunting"));
    }

    #[test]
    fn import_json_rejects_non_arrays() {
        let mut dict = PlainDictionary::new();
        let err = dict
            .import_json(r#"{ "key": "a" }"#, ImportPolicy::Reject, |_| None)
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(dict.is_empty());
    }

    #[test]
    fn policy_reads_from_config() {
        let policy: ImportPolicy = serde_json::from_str(r#""coerce""#).unwrap();
        assert_eq!(policy, ImportPolicy::Coerce);
        assert_eq!(ImportPolicy::default(), ImportPolicy::Reject);
    }
}
