use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    MalformedInput(String),
    #[error("{0}")]
    Upstream(String),
    #[error("config error: {0}")]
    Config(String),
}

impl ParkingError {
    /// True for errors caused by the caller's request rather than the upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidOperation(_) | Self::MalformedInput(_))
    }
}

impl From<reqwest::Error> for ParkingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Upstream(format!("request timed out: {}", e))
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ParkingError>;
