//! Shared test helpers for `caspio-proxy-core` integration tests.
//!
//! In-memory fakes for the token and transport ports so engine and token
//! cache behaviour can be checked without a network.

#![allow(dead_code)]

pub mod fakes;

use caspio_proxy_domain::Record;
use serde_json::json;

/// Records `{"ID": start}` .. `{"ID": start + count - 1}`
pub fn records(start: u64, count: u64) -> Vec<Record> {
    (start..start + count)
        .map(|id| {
            let mut record = Record::new();
            record.insert("ID".into(), json!(id));
            record
        })
        .collect()
}

pub fn ids(records: &[Record]) -> Vec<u64> {
    records.iter().filter_map(|r| r.get("ID").and_then(|v| v.as_u64())).collect()
}
