//! Clean raw parsed entries into an [`ExtractedRecord`].

use scaleslip_core::{ExtractedRecord, RawEntry, UNNAMED_FIELD};
use serde_json::Value;
use tracing::warn;

/// Keep the well-formed pairs, trim keys and values, collapse duplicate keys.
///
/// Entries that are not exactly two elements long are skipped. Blank keys
/// become [`UNNAMED_FIELD`]; falsy values (`None`, `""`, `0`, `False`, empty
/// sequences) become `""`. A later duplicate overwrites the earlier value.
pub fn normalize_entries(entries: &[RawEntry]) -> ExtractedRecord {
    let mut record = ExtractedRecord::new();
    let mut skipped = 0usize;

    for entry in entries {
        let Some([key, value]) = entry
            .as_array()
            .and_then(|items| <&[Value; 2]>::try_from(items.as_slice()).ok())
        else {
            skipped += 1;
            continue;
        };

        let key = literal_text(key);
        let key = match key.trim() {
            "" => UNNAMED_FIELD.to_string(),
            trimmed => trimmed.to_string(),
        };
        let value = if is_falsy(value) {
            String::new()
        } else {
            literal_text(value).trim().to_string()
        };
        record.insert(key, value);
    }

    if skipped > 0 {
        warn!(skipped, kept = record.len(), "Skipped malformed extraction entries");
    }
    record
}

/// Text form of a literal: strings verbatim, scalars as written, nested
/// lists in the quoted form a model would write them back.
fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => repr_text(other),
    }
}

fn repr_text(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr_text).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), repr_text(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Single quotes unless the text holds a single quote and no double quote.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
