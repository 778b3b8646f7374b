use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Side, UserId},
    protocol::{DeviceResultPayload, StartQuery},
};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::DeviceSettings,
    error::{ClientBuildError, TrialError},
};

/// Network face of the sensing device. Each call is attempted exactly once:
/// start/stop pairs govern the device's acquisition window, so a silent retry
/// could leave the device out of step with the session.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Opens the acquisition window for `side`. Returns the device's textual
    /// acknowledgement.
    async fn request_start(&self, side: Side, user_id: &UserId) -> Result<String, TrialError>;

    /// Closes the acquisition window and returns whatever the device measured.
    async fn request_stop(&self) -> Result<DeviceResultPayload, TrialError>;
}

pub struct HttpDeviceClient {
    http: Client,
    start_url: Url,
    stop_url: Url,
}

impl HttpDeviceClient {
    pub fn new(settings: &DeviceSettings) -> Result<Self, ClientBuildError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Self::with_client(http, &settings.device_url)
    }

    pub fn with_client(http: Client, device_url: &str) -> Result<Self, ClientBuildError> {
        let base = Url::parse(&format!("{}/", device_url.trim().trim_end_matches('/')))?;
        Ok(Self {
            http,
            start_url: base.join("start")?,
            stop_url: base.join("stop")?,
        })
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn stop_url(&self) -> &Url {
        &self.stop_url
    }
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    async fn request_start(&self, side: Side, user_id: &UserId) -> Result<String, TrialError> {
        let query = StartQuery {
            side,
            user_id: user_id.clone(),
        };

        let ack = self
            .http
            .get(self.start_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(TrialError::from_transport)?
            .error_for_status()
            .map_err(TrialError::from_transport)?
            .text()
            .await
            .map_err(TrialError::from_transport)?;
        info!(%side, ack = %ack.trim(), "device acknowledged start");
        Ok(ack)
    }

    async fn request_stop(&self) -> Result<DeviceResultPayload, TrialError> {
        let body = self
            .http
            .get(self.stop_url.clone())
            .send()
            .await
            .map_err(TrialError::from_transport)?
            .error_for_status()
            .map_err(TrialError::from_transport)?
            .text()
            .await
            .map_err(TrialError::from_transport)?;
        debug!(%body, "raw stop response");

        let payload = parse_result_body(&body)?;
        debug!(?payload, "parsed stop response");
        Ok(payload)
    }
}

/// The body must be a JSON object; known fields must carry the right JSON
/// type, unknown ones are ignored.
pub fn parse_result_body(body: &str) -> Result<DeviceResultPayload, TrialError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| TrialError::MalformedResponse(format!("body is not json: {e}")))?;
    if !value.is_object() {
        return Err(TrialError::MalformedResponse(
            "body is not a json object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| TrialError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
#[path = "tests/device_tests.rs"]
mod tests;
