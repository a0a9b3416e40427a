pub mod client;
pub mod config;
pub mod error;
pub mod probe;
pub mod query;
#[cfg(any(test, feature = "test-utils"))]
pub mod testutils;

pub use client::{Fetch, ParkingClient};
pub use config::Config;
pub use error::{ParkingError, Result};
pub use probe::ProbeReport;
pub use query::{
    Envelope, QueryBuilder, QueryParams, QueryRequest, DEFAULT_BASE_URL, MAX_RECORDS_LIMIT,
    POINT_OFFSET_DEGREES,
};
