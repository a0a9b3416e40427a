//! Query-string front end mirroring the `GET /api?tool=...` serverless contract.
//!
//! This is framework-free: a host parses the query string into a map, calls
//! [`HttpHandler::handle`] (or [`HttpHandler::preflight`] for `OPTIONS`),
//! and writes back the status, [`CORS_HEADERS`] and JSON body. A null body
//! means the response has none.

use serde_json::{json, Value};
use sf_parking_core::{Config, Fetch, ParkingClient, ParkingError, QueryBuilder, QueryRequest};
use std::collections::HashMap;

/// Serverless handlers never asked the upstream for geometry.
pub const DEFAULT_RETURN_GEOMETRY: bool = false;

pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn from_error(error: &ParkingError) -> Self {
        let status = if error.is_client_error() { 400 } else { 500 };
        Self {
            status,
            body: json!({ "error": error.to_string() }),
        }
    }
}

pub struct HttpHandler {
    builder: QueryBuilder,
    fetcher: Box<dyn Fetch>,
}

impl HttpHandler {
    pub fn new(builder: QueryBuilder, fetcher: Box<dyn Fetch>) -> Self {
        Self { builder, fetcher }
    }

    pub fn from_config(config: &Config) -> sf_parking_core::Result<Self> {
        let client = ParkingClient::from_config(config)?;
        Ok(Self::new(
            config.query_builder(DEFAULT_RETURN_GEOMETRY),
            Box::new(client),
        ))
    }

    /// CORS preflight: 200 with no body. Hosts send [`CORS_HEADERS`] alongside.
    pub fn preflight(&self) -> HttpResponse {
        HttpResponse::ok(Value::Null)
    }

    pub fn handle(&self, params: &HashMap<String, String>) -> HttpResponse {
        let Some(tool) = params.get("tool") else {
            return HttpResponse::ok(index_document());
        };

        let result = parse_request(tool, params).and_then(|request| {
            let url = self.builder.build(&request);
            tracing::info!(%tool, "calling parking api");
            self.fetcher.fetch(&url)
        });

        match result {
            Ok(data) => HttpResponse::ok(data),
            Err(e) => {
                tracing::warn!(%tool, error = %e, "request failed");
                HttpResponse::from_error(&e)
            }
        }
    }
}

fn index_document() -> Value {
    json!({
        "name": "sf-parking-api",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "San Francisco parking data API",
        "tools": {
            "bbox": "Get parking in a bounding box",
            "street": "Search by street name",
            "location": "Find parking near coordinates"
        },
        "examples": {
            "bbox": "/api?tool=bbox&min_lat=37.77&min_lon=-122.42&max_lat=37.78&max_lon=-122.41",
            "street": "/api?tool=street&name=Market",
            "location": "/api?tool=location&lat=37.7833&lon=-122.4167"
        }
    })
}

fn parse_request(
    tool: &str,
    params: &HashMap<String, String>,
) -> Result<QueryRequest, ParkingError> {
    match tool {
        "bbox" => {
            require(params, &["min_lat", "min_lon", "max_lat", "max_lon"])?;
            Ok(QueryRequest::BoundingBox {
                min_lat: coordinate(params, "min_lat")?,
                min_lon: coordinate(params, "min_lon")?,
                max_lat: coordinate(params, "max_lat")?,
                max_lon: coordinate(params, "max_lon")?,
                max_records: record_count(params)?,
            })
        }
        "street" => {
            require(params, &["name"])?;
            Ok(QueryRequest::StreetSearch {
                street_name: params["name"].clone(),
                max_records: record_count(params)?,
            })
        }
        "location" => {
            require(params, &["lat", "lon"])?;
            Ok(QueryRequest::PointRadius {
                latitude: coordinate(params, "lat")?,
                longitude: coordinate(params, "lon")?,
                max_records: record_count(params)?,
            })
        }
        other => Err(ParkingError::InvalidOperation(format!(
            "Invalid tool: {}. Use: bbox, street, or location",
            other
        ))),
    }
}

/// Missing or blank keys are reported by naming the tool's full parameter set.
fn require(params: &HashMap<String, String>, keys: &[&str]) -> Result<(), ParkingError> {
    let complete = keys
        .iter()
        .all(|k| params.get(*k).is_some_and(|v| !v.trim().is_empty()));

    match (complete, keys.len()) {
        (true, _) => Ok(()),
        (false, 1) => Err(ParkingError::MalformedInput(format!(
            "Missing required parameter: {}",
            keys[0]
        ))),
        (false, _) => Err(ParkingError::MalformedInput(format!(
            "Missing required parameters: {}",
            keys.join(", ")
        ))),
    }
}

fn coordinate(params: &HashMap<String, String>, key: &str) -> Result<f64, ParkingError> {
    let raw = params.get(key).map(|v| v.trim()).unwrap_or_default();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ParkingError::MalformedInput(format!("{} must be a number, got '{}'", key, raw))
        })
}

fn record_count(params: &HashMap<String, String>) -> Result<Option<i64>, ParkingError> {
    params
        .get("max_records")
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                ParkingError::MalformedInput(format!("max_records must be an integer, got '{}'", raw))
            })
        })
        .transpose()
}
