use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use sf_parking_core::{Fetch, ParkingError, QueryBuilder, QueryRequest};

use super::ToolDefinition;

pub const BBOX_TOOL: &str = "get_parking_by_bbox";
pub const STREET_TOOL: &str = "get_parking_by_street";
pub const LOCATION_TOOL: &str = "get_parking_by_location";

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: BBOX_TOOL.to_string(),
            description: "Get parking blockface data within a bounding box (lat/lon coordinates). Returns street parking availability, rates, and location information for SF parking zones.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "min_lat": {
                        "type": "number",
                        "description": "Minimum latitude (south boundary)"
                    },
                    "min_lon": {
                        "type": "number",
                        "description": "Minimum longitude (west boundary)"
                    },
                    "max_lat": {
                        "type": "number",
                        "description": "Maximum latitude (north boundary)"
                    },
                    "max_lon": {
                        "type": "number",
                        "description": "Maximum longitude (east boundary)"
                    },
                    "max_records": {
                        "type": "number",
                        "description": "Maximum number of records to return (default: 100, max: 1000)",
                        "default": 100
                    }
                },
                "required": ["min_lat", "min_lon", "max_lat", "max_lon"]
            }),
        },
        ToolDefinition {
            name: STREET_TOOL.to_string(),
            description: "Search for parking blockface data by street name. Returns availability, rates, and location information for matching streets in San Francisco.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "street_name": {
                        "type": "string",
                        "description": "Street name to search for (e.g., 'Market', 'Mission')"
                    },
                    "max_records": {
                        "type": "number",
                        "description": "Maximum number of records to return (default: 50, max: 1000)",
                        "default": 50
                    }
                },
                "required": ["street_name"]
            }),
        },
        ToolDefinition {
            name: LOCATION_TOOL.to_string(),
            description: "Get parking blockface data near a specific point (lat/lon). Searches within approximately 200 meters of the given coordinates.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "latitude": {
                        "type": "number",
                        "description": "Latitude of the location"
                    },
                    "longitude": {
                        "type": "number",
                        "description": "Longitude of the location"
                    },
                    "max_records": {
                        "type": "number",
                        "description": "Maximum number of records to return (default: 20, max: 1000)",
                        "default": 20
                    }
                },
                "required": ["latitude", "longitude"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct BboxArgs {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    #[serde(default, deserialize_with = "record_count")]
    max_records: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StreetArgs {
    street_name: String,
    #[serde(default, deserialize_with = "record_count")]
    max_records: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LocationArgs {
    latitude: f64,
    longitude: f64,
    #[serde(default, deserialize_with = "record_count")]
    max_records: Option<i64>,
}

/// Accepts `20` and `20.0`; rejects fractional counts.
fn record_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Some(n) = number.as_i64() {
        return Ok(Some(n));
    }

    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
        _ => Err(serde::de::Error::custom(format!(
            "max_records must be a whole number, got {}",
            number
        ))),
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ParkingError> {
    serde_json::from_value(arguments)
        .map_err(|e| ParkingError::MalformedInput(format!("invalid arguments: {}", e)))
}

pub fn parse_request(name: &str, arguments: Value) -> Result<QueryRequest, ParkingError> {
    match name {
        BBOX_TOOL => {
            let args: BboxArgs = parse_args(arguments)?;
            Ok(QueryRequest::BoundingBox {
                min_lat: args.min_lat,
                min_lon: args.min_lon,
                max_lat: args.max_lat,
                max_lon: args.max_lon,
                max_records: args.max_records,
            })
        }
        STREET_TOOL => {
            let args: StreetArgs = parse_args(arguments)?;
            Ok(QueryRequest::StreetSearch {
                street_name: args.street_name,
                max_records: args.max_records,
            })
        }
        LOCATION_TOOL => {
            let args: LocationArgs = parse_args(arguments)?;
            Ok(QueryRequest::PointRadius {
                latitude: args.latitude,
                longitude: args.longitude,
                max_records: args.max_records,
            })
        }
        _ => Err(ParkingError::InvalidOperation(format!(
            "unknown tool: {}",
            name
        ))),
    }
}

/// Runs one parking tool and returns the upstream document unchanged.
pub fn call(
    name: &str,
    arguments: Value,
    builder: &QueryBuilder,
    fetcher: &dyn Fetch,
) -> Result<Value, ParkingError> {
    let request = parse_request(name, arguments)?;
    let url = builder.build(&request);
    tracing::info!(tool = name, max_records = request.max_records(), "calling parking api");
    fetcher.fetch(&url)
}
