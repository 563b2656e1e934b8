use serde::{Deserialize, Serialize};

/// Card types that identify the driver by card number and issuing organisation
/// rather than by serial number.
const CARD_BASED_TYPES: [&str; 2] = ["Hitag_16", "Hitag_32"];

/// The telematics unit installed in a vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VehicleDevice {
    pub orga_no: String,
    pub phone_no: String,
}

impl VehicleDevice {
    pub fn new(orga_no: impl Into<String>, phone_no: impl Into<String>) -> Self {
        Self {
            orga_no: orga_no.into(),
            phone_no: phone_no.into(),
        }
    }
}

/// Credential presented at the vehicle (smartcard or virtual card)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AccessDevice {
    pub serial_no: String,
    pub card_no: String,
    pub card_orga: String,
    pub card_type: String,
}

impl AccessDevice {
    /// Card type in its canonical spelling (`Hitag16` becomes `Hitag_16`)
    pub fn normalized_type(&self) -> String {
        normalize_card_type(&self.card_type)
    }

    /// True when the credential is matched on card number and card organisation
    pub fn is_card_based(&self) -> bool {
        CARD_BASED_TYPES.contains(&self.normalized_type().as_str())
    }

    /// Whether `other` identifies the same credential as `self`.
    ///
    /// Types must agree first. Card-based types then compare card number and
    /// issuing organisation; every other type compares the serial number.
    pub fn identifies_same_credential(&self, other: &AccessDevice) -> bool {
        if self.normalized_type() != other.normalized_type() {
            return false;
        }

        if self.is_card_based() {
            self.card_no == other.card_no && self.card_orga == other.card_orga
        } else {
            self.serial_no == other.serial_no
        }
    }
}

pub fn normalize_card_type(card_type: &str) -> String {
    match card_type {
        "Hitag16" => "Hitag_16".to_string(),
        "Hitag32" => "Hitag_32".to_string(),
        other => other.to_string(),
    }
}
