use serde::{Deserialize, Serialize};

use crate::core::unit::PositionState;

// https://github.com/homebridge/HAP-NodeJS/blob/latest/src/lib/definitions/ServiceDefinitions.ts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomekitService {
    AccessoryInformation,
    WindowCovering,
}

// https://github.com/homebridge/HAP-NodeJS/blob/latest/src/lib/definitions/CharacteristicDefinitions.ts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomekitCharacteristic {
    Manufacturer,
    Model,
    SerialNumber,
    CurrentPosition,
    TargetPosition,
    PositionState,
}

impl HomekitCharacteristic {
    /// Field name homebridge-mqtt uses for accessory information in the `to/add` payload.
    pub fn information_key(&self) -> Option<&'static str> {
        match self {
            HomekitCharacteristic::Manufacturer => Some("manufacturer"),
            HomekitCharacteristic::Model => Some("model"),
            HomekitCharacteristic::SerialNumber => Some("serialnumber"),
            _ => None,
        }
    }
}

impl PositionState {
    pub fn characteristic_value(self) -> u8 {
        match self {
            PositionState::Decreasing => 0,
            PositionState::Increasing => 1,
            PositionState::Stopped => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_state_uses_hap_values() {
        assert_eq!(PositionState::Decreasing.characteristic_value(), 0);
        assert_eq!(PositionState::Increasing.characteristic_value(), 1);
        assert_eq!(PositionState::Stopped.characteristic_value(), 2);
    }

    #[test]
    fn characteristics_serialize_with_hap_names() {
        assert_eq!(
            serde_json::to_value(HomekitCharacteristic::TargetPosition).unwrap(),
            serde_json::json!("TargetPosition")
        );
        assert_eq!(
            serde_json::from_str::<HomekitService>("\"WindowCovering\"").unwrap(),
            HomekitService::WindowCovering
        );
    }
}
