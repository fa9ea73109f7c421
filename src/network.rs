use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::model::{
    DetailEnvelope, Interface, InterfacesEnvelope, Record, RecordsEnvelope, StartRequest,
    StatusEnvelope,
};

/// Thin request/response adapter over the capture server's HTTP API.
///
/// Every call is a single exchange. Nothing is retried or cached here.
#[derive(Debug, Clone)]
pub struct SessionClient {
    base_url: String,
    http: reqwest::Client,
}

impl SessionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MonitorError::from)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    pub async fn list_interfaces(&self) -> Result<Vec<Interface>> {
        let resp = self.http.get(self.url("get_interfaces")).send().await?;
        let envelope: InterfacesEnvelope = decode(resp).await?;
        Ok(envelope.interfaces)
    }

    pub async fn start(&self, request: &StartRequest) -> Result<()> {
        if request.interface.trim().is_empty() {
            return Err(MonitorError::precondition(
                "Please select a network interface",
            ));
        }
        let resp = self
            .http
            .post(self.url("start_capture"))
            .json(request)
            .send()
            .await?;
        let envelope: StatusEnvelope = decode(resp).await?;
        status_result(envelope, "capture could not be started")
    }

    pub async fn stop(&self) -> Result<()> {
        let resp = self.http.post(self.url("stop_capture")).send().await?;
        let envelope: StatusEnvelope = decode(resp).await?;
        status_result(envelope, "capture could not be stopped")
    }

    pub async fn fetch_records(&self) -> Result<Vec<Record>> {
        let resp = self.http.get(self.url("get_packets")).send().await?;
        let envelope: RecordsEnvelope = decode(resp).await?;
        Ok(envelope.packets)
    }

    /// Out-of-range indices are answered by the server with its own text,
    /// which is returned untouched.
    pub async fn fetch_detail(&self, index: usize) -> Result<String> {
        let resp = self
            .http
            .get(self.url(&format!("get_packet_details/{index}")))
            .send()
            .await?;
        let envelope: DetailEnvelope = decode(resp).await?;
        Ok(envelope.details)
    }

    /// Raw pcap bytes. The server answers with a JSON error envelope
    /// instead when it has nothing to save.
    pub async fn export_capture(&self) -> Result<Vec<u8>> {
        let resp = checked(self.http.get(self.url("save_capture")).send().await?)?;
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            let envelope: StatusEnvelope = resp.json().await?;
            status_result(envelope, "capture could not be exported")?;
            return Err(MonitorError::Transport(
                "expected capture bytes, got a JSON body".to_string(),
            ));
        }
        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "capture export received");
        Ok(bytes.to_vec())
    }
}

/// `capture_<epoch-ms>.pcap`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("capture_{}.pcap", at.timestamp_millis())
}

fn checked(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(MonitorError::Transport(format!("HTTP {}", resp.status())))
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = checked(resp)?;
    Ok(resp.json::<T>().await?)
}

fn status_result(envelope: StatusEnvelope, fallback: &str) -> Result<()> {
    if envelope.status == "success" {
        Ok(())
    } else {
        Err(MonitorError::Rejected(
            envelope.message.unwrap_or_else(|| fallback.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn export_name_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(export_file_name(at), "capture_1700000000123.pcap");
    }

    #[test]
    fn error_status_maps_to_rejected() {
        let envelope = StatusEnvelope {
            status: "error".to_string(),
            message: Some("Capture already running".to_string()),
        };
        assert_eq!(
            status_result(envelope, "fallback"),
            Err(MonitorError::Rejected("Capture already running".to_string()))
        );
    }

    #[test]
    fn error_status_without_message_uses_fallback() {
        let envelope = StatusEnvelope {
            status: "error".to_string(),
            message: None,
        };
        assert_eq!(
            status_result(envelope, "fallback"),
            Err(MonitorError::Rejected("fallback".to_string()))
        );
    }

    #[tokio::test]
    async fn start_rejects_empty_interface_locally() {
        // Nothing listens on this port; a request would surface as Transport.
        let client = SessionClient::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client");
        let err = client
            .start(&StartRequest {
                interface: "  ".to_string(),
                filter: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::LocalPrecondition);
    }
}
