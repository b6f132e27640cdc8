use serde::{Deserialize, Serialize};

/// Label substituted for keys that are blank after trimming.
pub const UNNAMED_FIELD: &str = "Unnamed";

/// One entry of the literal list returned by the response parser.
///
/// Entries are kept as untyped literals until normalization decides which of
/// them are real `(field, value)` pairs.
pub type RawEntry = serde_json::Value;

/// The fields extracted from one slip, in first-seen order with unique keys.
///
/// Serializes as a list of `[field, value]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: Vec<(String, String)>,
}

impl ExtractedRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Insert a field. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Exact (case-sensitive) lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.fields
    }
}

impl<K, V> FromIterator<(K, V)> for ExtractedRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// The ordered header row of a worksheet. Grows only by appending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetSchema {
    headers: Vec<String>,
}

impl WorksheetSchema {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn contains(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }

    /// Append every record key the schema does not have yet, in record order.
    /// Returns the headers that were added.
    pub fn extend_from(&mut self, record: &ExtractedRecord) -> Vec<String> {
        let added: Vec<String> = record
            .keys()
            .filter(|k| !self.contains(k))
            .map(str::to_string)
            .collect();
        self.headers.extend(added.iter().cloned());
        added
    }

    /// Build a row aligned to this schema, `""` where the record has no value.
    pub fn row_for(&self, record: &ExtractedRecord) -> WorksheetRow {
        WorksheetRow(
            self.headers
                .iter()
                .map(|h| record.get(h).unwrap_or_default().to_string())
                .collect(),
        )
    }
}

/// Cells aligned positionally to a [`WorksheetSchema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorksheetRow(pub Vec<String>);

impl WorksheetRow {
    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
