//! Label Normalization
//!
//! Disk telemetry is full of optional fields. Label sets keep the raw optional
//! values until a metric family's key schema is known, then normalize every key
//! of that schema to a string, replacing absent values with [`NOT_AVAILABLE`].

use regex::Regex;
use std::sync::LazyLock;

/// Literal used for absent label values
pub const NOT_AVAILABLE: &str = "N/A";

static RAID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*megaraid,(\d+)").expect("valid megaraid pattern"));

/// Conversion of a telemetry field into an optional label value
pub trait LabelValue {
    fn label_value(&self) -> Option<String>;
}

impl LabelValue for str {
    fn label_value(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl LabelValue for String {
    fn label_value(&self) -> Option<String> {
        Some(self.clone())
    }
}

// Booleans keep the capitalised spelling existing dashboards match on.
impl LabelValue for bool {
    fn label_value(&self) -> Option<String> {
        Some(if *self { "True" } else { "False" }.to_string())
    }
}

macro_rules! display_label_value {
    ($($t:ty),*) => {
        $(impl LabelValue for $t {
            fn label_value(&self) -> Option<String> {
                Some(self.to_string())
            }
        })*
    };
}

display_label_value!(u16, u32, u64, i32, i64, f64);

impl<T: LabelValue + ?Sized> LabelValue for &T {
    fn label_value(&self) -> Option<String> {
        (**self).label_value()
    }
}

impl<T: LabelValue> LabelValue for Option<T> {
    fn label_value(&self) -> Option<String> {
        self.as_ref().and_then(LabelValue::label_value)
    }
}

/// Insertion-ordered label map whose values may be absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    entries: Vec<(String, Option<String>)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value while keeping its position
    pub fn insert(&mut self, key: &str, value: impl LabelValue) {
        let value = value.label_value();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Set `key` only if it is not already present
    pub fn insert_default(&mut self, key: &str, value: &str) {
        if !self.contains_key(key) {
            self.entries.push((key.to_string(), Some(value.to_string())));
        }
    }

    /// Copy every entry of `other` into this set
    pub fn extend(&mut self, other: &LabelSet) {
        for (key, value) in &other.entries {
            self.insert(key, value.as_deref());
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Raw value of `key`; `None` if the key is missing, `Some(None)` if present but absent
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalize this set's own keys, in insertion order
    pub fn normalized(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), normalize_value(v.as_deref())))
            .collect()
    }

    /// Label values ordered by `schema`, with keys missing from this set normalized to `N/A`
    pub fn values_for(&self, schema: &[String]) -> Vec<String> {
        schema
            .iter()
            .map(|key| normalize_value(self.get(key).flatten()))
            .collect()
    }
}

fn normalize_value(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Extract the controller slot from a `megaraid,<N>` passthrough interface
///
/// Returns `None` for every other interface, including malformed megaraid strings.
pub fn raid_id(interface: &str) -> Option<String> {
    RAID_ID
        .captures(interface)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
