use serde_json::Value;

pub const DEFAULT_BASE_URL: &str =
    "https://services.sfmta.com/arcgis/rest/services/Parking/sfpark_ODS/MapServer/4/query";

/// Upper bound applied to every caller-supplied record count.
pub const MAX_RECORDS_LIMIT: i64 = 1000;

/// Half-width of the box drawn around a point, roughly 200m at SF's latitude.
pub const POINT_OFFSET_DEGREES: f64 = 0.0018;

const WGS84: &str = "4326";
const MATCH_ALL: &str = "1=1";

/// Axis-aligned rectangle in WGS84 degrees. Ordering of min/max is not checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Envelope {
    pub fn around_point(latitude: f64, longitude: f64) -> Self {
        Self {
            xmin: longitude - POINT_OFFSET_DEGREES,
            ymin: latitude - POINT_OFFSET_DEGREES,
            xmax: longitude + POINT_OFFSET_DEGREES,
            ymax: latitude + POINT_OFFSET_DEGREES,
        }
    }

    /// Serializes as `{"xmin": .., "ymin": .., "xmax": .., "ymax": ..}`.
    pub fn to_geometry_json(&self) -> String {
        format!(
            "{{\"xmin\": {}, \"ymin\": {}, \"xmax\": {}, \"ymax\": {}}}",
            json_number(self.xmin),
            json_number(self.ymin),
            json_number(self.xmax),
            json_number(self.ymax)
        )
    }
}

fn json_number(n: f64) -> String {
    Value::from(n).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    BoundingBox {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
        max_records: Option<i64>,
    },
    StreetSearch {
        street_name: String,
        max_records: Option<i64>,
    },
    PointRadius {
        latitude: f64,
        longitude: f64,
        max_records: Option<i64>,
    },
}

impl QueryRequest {
    pub fn default_max_records(&self) -> i64 {
        match self {
            Self::BoundingBox { .. } => 100,
            Self::StreetSearch { .. } => 50,
            Self::PointRadius { .. } => 20,
        }
    }

    /// Record count sent upstream. Only the upper bound is enforced.
    pub fn max_records(&self) -> i64 {
        let requested = match self {
            Self::BoundingBox { max_records, .. }
            | Self::StreetSearch { max_records, .. }
            | Self::PointRadius { max_records, .. } => *max_records,
        };
        requested
            .unwrap_or_else(|| self.default_max_records())
            .min(MAX_RECORDS_LIMIT)
    }

    pub fn where_clause(&self) -> String {
        match self {
            Self::StreetSearch { street_name, .. } => street_clause(street_name),
            _ => MATCH_ALL.to_string(),
        }
    }

    pub fn envelope(&self) -> Option<Envelope> {
        match *self {
            Self::BoundingBox {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
                ..
            } => Some(Envelope {
                xmin: min_lon,
                ymin: min_lat,
                xmax: max_lon,
                ymax: max_lat,
            }),
            Self::PointRadius {
                latitude,
                longitude,
                ..
            } => Some(Envelope::around_point(latitude, longitude)),
            Self::StreetSearch { .. } => None,
        }
    }
}

/// Quotes are doubled so a name like O'Farrell stays inside the string literal.
fn street_clause(street_name: &str) -> String {
    let name = street_name.to_uppercase().replace('\'', "''");
    format!("STREET_NAME LIKE '%{}%'", name)
}

/// Resolved parameter set for one upstream `query` call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub where_clause: String,
    pub out_fields: String,
    pub return_geometry: bool,
    pub max_records: i64,
    pub geometry: Option<Envelope>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            where_clause: MATCH_ALL.to_string(),
            out_fields: "*".to_string(),
            return_geometry: true,
            max_records: MAX_RECORDS_LIMIT,
            geometry: None,
        }
    }
}

impl QueryParams {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("f", "json".to_string()),
            ("where", self.where_clause.clone()),
            ("outFields", self.out_fields.clone()),
            ("returnGeometry", self.return_geometry.to_string()),
            ("outSR", WGS84.to_string()),
            ("resultRecordCount", self.max_records.to_string()),
        ];

        if let Some(envelope) = &self.geometry {
            pairs.push(("geometry", envelope.to_geometry_json()));
            pairs.push(("geometryType", "esriGeometryEnvelope".to_string()));
            pairs.push(("spatialRel", "esriSpatialRelIntersects".to_string()));
            pairs.push(("inSR", WGS84.to_string()));
        }

        pairs
    }

    pub fn to_url(&self, base_url: &str) -> String {
        let query = self
            .pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", base_url, query)
    }
}

/// Turns a [`QueryRequest`] into an upstream URL.
///
/// `return_geometry` differs between front ends: the MCP server asks for
/// geometry, the HTTP handler does not.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    return_geometry: bool,
}

impl QueryBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            return_geometry: true,
        }
    }

    pub fn with_return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn return_geometry(&self) -> bool {
        self.return_geometry
    }

    pub fn params(&self, request: &QueryRequest) -> QueryParams {
        QueryParams {
            where_clause: request.where_clause(),
            out_fields: "*".to_string(),
            return_geometry: self.return_geometry,
            max_records: request.max_records(),
            geometry: request.envelope(),
        }
    }

    pub fn build(&self, request: &QueryRequest) -> String {
        self.params(request).to_url(&self.base_url)
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::query_pairs;

    fn bbox(max_records: Option<i64>) -> QueryRequest {
        QueryRequest::BoundingBox {
            min_lat: 37.77,
            min_lon: -122.42,
            max_lat: 37.78,
            max_lon: -122.41,
            max_records,
        }
    }

    fn street(name: &str, max_records: Option<i64>) -> QueryRequest {
        QueryRequest::StreetSearch {
            street_name: name.to_string(),
            max_records,
        }
    }

    fn point(max_records: Option<i64>) -> QueryRequest {
        QueryRequest::PointRadius {
            latitude: 37.7833,
            longitude: -122.4167,
            max_records,
        }
    }

    #[test]
    fn bbox_envelope_keeps_caller_order() {
        let envelope = bbox(None).envelope().unwrap();
        assert_eq!(envelope.xmin, -122.42);
        assert_eq!(envelope.ymin, 37.77);
        assert_eq!(envelope.xmax, -122.41);
        assert_eq!(envelope.ymax, 37.78);
    }

    #[test]
    fn inverted_bbox_is_passed_through() {
        let request = QueryRequest::BoundingBox {
            min_lat: 37.78,
            min_lon: -122.41,
            max_lat: 37.77,
            max_lon: -122.42,
            max_records: None,
        };
        let envelope = request.envelope().unwrap();
        assert_eq!(envelope.xmin, -122.41);
        assert_eq!(envelope.xmax, -122.42);
    }

    #[test]
    fn point_envelope_uses_fixed_offset() {
        let envelope = point(None).envelope().unwrap();
        assert!((envelope.xmin - (-122.4167 - 0.0018)).abs() < 1e-9);
        assert!((envelope.ymin - (37.7833 - 0.0018)).abs() < 1e-9);
        assert!((envelope.xmax - (-122.4167 + 0.0018)).abs() < 1e-9);
        assert!((envelope.ymax - (37.7833 + 0.0018)).abs() < 1e-9);
    }

    #[test]
    fn street_search_has_no_envelope() {
        assert!(street("Market", None).envelope().is_none());
    }

    #[test]
    fn street_clause_is_uppercased() {
        assert_eq!(
            street("market", None).where_clause(),
            "STREET_NAME LIKE '%MARKET%'"
        );
    }

    #[test]
    fn street_clause_doubles_single_quotes() {
        assert_eq!(
            street("O'Farrell", None).where_clause(),
            "STREET_NAME LIKE '%O''FARRELL%'"
        );
    }

    #[test]
    fn spatial_requests_match_everything() {
        assert_eq!(bbox(None).where_clause(), "1=1");
        assert_eq!(point(None).where_clause(), "1=1");
    }

    #[test]
    fn defaults_apply_only_when_omitted() {
        assert_eq!(bbox(None).max_records(), 100);
        assert_eq!(street("x", None).max_records(), 50);
        assert_eq!(point(None).max_records(), 20);

        assert_eq!(bbox(Some(0)).max_records(), 0);
        assert_eq!(point(Some(-5)).max_records(), -5);
        assert_eq!(street("x", Some(7)).max_records(), 7);
    }

    #[test]
    fn max_records_never_exceeds_limit() {
        for request in [bbox(Some(5000)), street("x", Some(1001)), point(Some(i64::MAX))] {
            assert_eq!(request.max_records(), 1000);
        }
        assert_eq!(bbox(Some(1000)).max_records(), 1000);
    }

    #[test]
    fn geometry_json_format() {
        let envelope = bbox(None).envelope().unwrap();
        assert_eq!(
            envelope.to_geometry_json(),
            r#"{"xmin": -122.42, "ymin": 37.77, "xmax": -122.41, "ymax": 37.78}"#
        );
    }

    #[test]
    fn bbox_url_end_to_end() {
        let url = QueryBuilder::default().build(&bbox(None));
        assert!(url.starts_with(&format!("{}?", DEFAULT_BASE_URL)));

        let pairs = query_pairs(&url);
        assert_eq!(
            pairs["geometry"],
            r#"{"xmin": -122.42, "ymin": 37.77, "xmax": -122.41, "ymax": 37.78}"#
        );
        assert_eq!(pairs["resultRecordCount"], "100");
        assert_eq!(pairs["where"], "1=1");
        assert_eq!(pairs["f"], "json");
        assert_eq!(pairs["outFields"], "*");
        assert_eq!(pairs["outSR"], "4326");
        assert_eq!(pairs["inSR"], "4326");
        assert_eq!(pairs["geometryType"], "esriGeometryEnvelope");
        assert_eq!(pairs["spatialRel"], "esriSpatialRelIntersects");
        assert_eq!(pairs["returnGeometry"], "true");
    }

    #[test]
    fn street_url_end_to_end() {
        let url = QueryBuilder::default().build(&street("Mission", None));
        assert!(url.contains("where=STREET_NAME%20LIKE%20%27%25MISSION%25%27"));

        let pairs = query_pairs(&url);
        assert_eq!(pairs["where"], "STREET_NAME LIKE '%MISSION%'");
        assert_eq!(pairs["resultRecordCount"], "50");
        for key in ["geometry", "geometryType", "spatialRel", "inSR"] {
            assert!(!pairs.contains_key(key), "unexpected key {}", key);
        }
    }

    #[test]
    fn clamped_value_reaches_url() {
        let url = QueryBuilder::default().build(&point(Some(5000)));
        assert_eq!(query_pairs(&url)["resultRecordCount"], "1000");
    }

    #[test]
    fn return_geometry_follows_builder_setting() {
        let builder = QueryBuilder::default().with_return_geometry(false);
        let url = builder.build(&point(None));
        assert_eq!(query_pairs(&url)["returnGeometry"], "false");
    }

    #[test]
    fn custom_base_url_is_used() {
        let builder = QueryBuilder::new("http://localhost:8080/query");
        assert_eq!(builder.base_url(), "http://localhost:8080/query");
        let url = builder.build(&street("Pine", None));
        assert!(url.starts_with("http://localhost:8080/query?f=json&"));
    }
}
