use serde::{Deserialize, Serialize};

/// Delivery-acknowledgement status of a request sent towards the vehicle.
///
/// Variants are declared in sequence order so the derived ordering can be used
/// to keep the status from ever moving backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TechStatus {
    #[default]
    #[serde(rename = "New")]
    New,
    #[serde(rename = "SendToCUCM")]
    SentToCenter,
    #[serde(rename = "AcceptedFromCUCM")]
    AcceptedByCenter,
    #[serde(rename = "Done")]
    Received,
}

impl TechStatus {
    /// The following step, or `None` once the sequence is finished
    pub fn next(self) -> Option<TechStatus> {
        match self {
            TechStatus::New => Some(TechStatus::SentToCenter),
            TechStatus::SentToCenter => Some(TechStatus::AcceptedByCenter),
            TechStatus::AcceptedByCenter => Some(TechStatus::Received),
            TechStatus::Received => None,
        }
    }

    /// Move to `target` unless the status is already at or past it.
    /// Returns whether anything changed.
    pub fn advance_to(&mut self, target: TechStatus) -> bool {
        if target > *self {
            *self = target;
            true
        } else {
            false
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TechStatus::Received
    }

    /// Wire spelling used by the fleet controller
    pub fn as_str(self) -> &'static str {
        match self {
            TechStatus::New => "New",
            TechStatus::SentToCenter => "SendToCUCM",
            TechStatus::AcceptedByCenter => "AcceptedFromCUCM",
            TechStatus::Received => "Done",
        }
    }
}

impl std::fmt::Display for TechStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
