use crate::app_config::FleetControllerConfig;
use async_trait::async_trait;
use fleetsim_core::{NotificationSink, SinkError};
use fleetsim_shared::{Notification, Payload};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Posts notifications to the fleet controller as JSON
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(config: &FleetControllerConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// `{endpoint}/ws/invers/21/{orga_no}/{channel}`
    pub fn url_for(&self, notification: &Notification) -> String {
        format!(
            "{}/ws/invers/21/{}/{}",
            self.endpoint,
            notification.orga_no,
            notification.channel.path_segment()
        )
    }
}

/// The document posted on the wire: the event itself, without its envelope
pub fn body_of(payload: &Payload) -> Result<serde_json::Value, serde_json::Error> {
    match payload {
        Payload::StatusChanged(body) => serde_json::to_value(body),
        Payload::UsageEvent(body) => serde_json::to_value(body),
        Payload::UsageProblemEvent(body) => serde_json::to_value(body),
        Payload::TripData(body) => serde_json::to_value(body),
        Payload::CallCenterRequest(body) => serde_json::to_value(body),
    }
}

#[async_trait]
impl NotificationSink for HttpSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        let url = self.url_for(notification);
        let body = body_of(&notification.payload).map_err(|e| SinkError::Transport(e.to_string()))?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                path: url,
            });
        }
        Ok(())
    }
}
