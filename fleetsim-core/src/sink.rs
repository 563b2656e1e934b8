use async_trait::async_trait;
use fleetsim_shared::{EventKind, Notification};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Delivery failed: {0}")]
    Transport(String),

    #[error("Fleet controller answered {status} for {path}")]
    Rejected { status: u16, path: String },
}

/// Delivers notifications to the fleet controller.
///
/// Implementations own serialization and transport. Callers treat delivery as
/// fire-and-forget: an error is logged, never retried.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Keeps every notification in memory
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<Notification> {
        self.delivered()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        tracing::debug!(
            "Recorded {:?} for orga {}",
            notification.kind(),
            notification.orga_no
        );

        let mut guard = self
            .delivered
            .lock()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        guard.push(notification.clone());
        Ok(())
    }
}

/// Rejects everything; used to check that failed deliveries stay contained
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        Err(SinkError::Rejected {
            status: 503,
            path: notification.channel.path_segment().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fleetsim_shared::TechStatus;

    #[tokio::test]
    async fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let now = Utc::now();

        sink.deliver(&Notification::status("1", "21", TechStatus::SentToCenter, now))
            .await
            .unwrap();
        sink.deliver(&Notification::status("1", "21", TechStatus::AcceptedByCenter, now))
            .await
            .unwrap();

        assert_eq!(sink.count(EventKind::StatusChanged), 2);
        assert_eq!(sink.delivered()[0].orga_no, "21");
    }

    #[tokio::test]
    async fn test_failing_sink_reports_rejection() {
        let result = FailingSink
            .deliver(&Notification::status("1", "21", TechStatus::New, Utc::now()))
            .await;

        assert!(matches!(result, Err(SinkError::Rejected { status: 503, .. })));
    }
}
