use chrono::{DateTime, Utc};
use fleetsim_reservation::TaskAck;
use fleetsim_shared::TechStatus;
use serde::{Deserialize, Serialize};

/// Synchronous acknowledgement body returned by every POST route
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskAckResponse {
    pub task_number: String,
    pub task_send_status: TechStatus,
    pub orga_no: String,
    pub timestamp: DateTime<Utc>,
}

impl From<TaskAck> for TaskAckResponse {
    fn from(ack: TaskAck) -> Self {
        Self {
            task_number: ack.request_id,
            task_send_status: ack.status,
            orga_no: ack.orga_no,
            timestamp: ack.timestamp,
        }
    }
}
