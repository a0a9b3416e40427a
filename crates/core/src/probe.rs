use serde_json::Value;

use crate::client::Fetch;
use crate::error::Result;
use crate::query::QueryParams;

const PROBE_RECORDS: i64 = 5;

/// What a connectivity check found upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub feature_count: usize,
    pub sample: Option<Value>,
}

pub fn probe_url(base_url: &str) -> String {
    QueryParams {
        return_geometry: false,
        max_records: PROBE_RECORDS,
        ..QueryParams::default()
    }
    .to_url(base_url)
}

pub fn summarize(response: &Value) -> ProbeReport {
    let features = response
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    ProbeReport {
        feature_count: features.len(),
        sample: features.first().and_then(|f| f.get("attributes")).cloned(),
    }
}

pub fn run(fetcher: &dyn Fetch, base_url: &str) -> Result<ProbeReport> {
    let response = fetcher.fetch(&probe_url(base_url))?;
    Ok(summarize(&response))
}
