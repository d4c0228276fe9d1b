//! Response envelope parsing
//!
//! Every REST v2 response is wrapped as `{ "Result": ..., "@nextpage"?: url }`.
//! A missing or unusable `Result` is "no data", not an error.

use caspio_proxy_core::Envelope;
use caspio_proxy_domain::constants::{ENVELOPE_NEXT_PAGE_FIELD, ENVELOPE_RESULT_FIELD};
use caspio_proxy_domain::Record;
use serde_json::Value;
use tracing::warn;

/// Extract records and the continuation link from a 2xx response body
pub fn parse_envelope(body: &str, context: &str) -> Envelope {
    if body.trim().is_empty() {
        return Envelope::default();
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(target_path = %context, error = %err, "Response body is not JSON; treating as empty page");
            return Envelope::default();
        }
    };

    let Value::Object(mut envelope) = value else {
        warn!(target_path = %context, "Response body is not a JSON object; treating as empty page");
        return Envelope::default();
    };

    let next_page = match envelope.remove(ENVELOPE_NEXT_PAGE_FIELD) {
        Some(Value::String(url)) if !url.trim().is_empty() => Some(url),
        _ => None,
    };

    let records = match envelope.remove(ENVELOPE_RESULT_FIELD) {
        Some(Value::Array(items)) => into_records(items, context),
        Some(Value::Object(record)) => vec![record],
        Some(Value::Null) | None => {
            warn!(target_path = %context, "Response envelope has no Result field; treating as empty page");
            Vec::new()
        }
        Some(other) => {
            warn!(target_path = %context, kind = %kind_of(&other), "Result field is not a list; treating as empty page");
            Vec::new()
        }
    };

    Envelope { records, next_page }
}

fn into_records(items: Vec<Value>, context: &str) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect();

    if records.len() != total {
        warn!(
            target_path = %context,
            dropped = total - records.len(),
            "Dropped non-object entries from Result"
        );
    }
    records
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
