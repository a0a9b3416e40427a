use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ParkingError, Result};

/// Single-shot GET of an upstream query URL.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Value>;
}

pub struct ParkingClient {
    client: Client,
}

impl ParkingClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ParkingError::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.timeout(), &config.user_agent)
    }
}

impl Fetch for ParkingClient {
    fn fetch(&self, url: &str) -> Result<Value> {
        tracing::debug!(%url, "querying parking api");

        let response = self.client.get(url).send().map_err(|e| {
            tracing::warn!(error = %e, "parking api request failed");
            ParkingError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "parking api returned an error status");
            return Err(ParkingError::Upstream(format!(
                "ArcGIS API error: {}",
                status
            )));
        }

        response.json().map_err(|e| {
            tracing::warn!(error = %e, "parking api returned an unreadable body");
            ParkingError::Upstream(format!("invalid response body: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{}/query?f=json", addr)
    }

    /// Accept one connection and hold it open without answering.
    fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            thread::sleep(Duration::from_secs(3));
        });

        format!("http://{}/query?f=json", addr)
    }

    fn client() -> ParkingClient {
        ParkingClient::new(Duration::from_secs(5), "sf-parking-test").unwrap()
    }

    #[test]
    fn success_body_is_passed_through() {
        let url = serve_once("200 OK", r#"{"features":[{"attributes":{"STREET_NAME":"MARKET ST"}}]}"#);
        let value = client().fetch(&url).unwrap();
        assert_eq!(value["features"][0]["attributes"]["STREET_NAME"], "MARKET ST");
    }

    #[test]
    fn server_error_is_upstream_failure() {
        let url = serve_once("500 Internal Server Error", "{}");
        let err = client().fetch(&url).unwrap_err();
        assert!(matches!(err, ParkingError::Upstream(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn non_json_body_is_upstream_failure() {
        let url = serve_once("200 OK", "<html>maintenance</html>");
        let err = client().fetch(&url).unwrap_err();
        assert!(matches!(err, ParkingError::Upstream(_)));
    }

    #[test]
    fn connection_refused_is_upstream_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client().fetch(&format!("http://{}/query", addr)).unwrap_err();
        assert!(matches!(err, ParkingError::Upstream(_)));
    }

    #[test]
    fn slow_upstream_times_out() {
        let url = serve_silence();
        let client = ParkingClient::new(Duration::from_millis(300), "sf-parking-test").unwrap();

        let err = client.fetch(&url).unwrap_err();
        assert!(matches!(err, ParkingError::Upstream(_)));
        assert!(err.to_string().contains("timed out"), "got: {}", err);
    }

    #[test]
    #[ignore] // Requires network
    fn live_probe() {
        let client = ParkingClient::from_config(&Config::default()).unwrap();
        let url = crate::probe::probe_url(crate::query::DEFAULT_BASE_URL);
        let value = client.fetch(&url).unwrap();
        assert!(value.get("features").is_some());
    }
}
