mod accessory;
mod hap;
mod runtime;

use derive_more::derive::{Display, Error};
use infrastructure::Mqtt;
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::esp_window::EspWindowError;

pub use self::{
    accessory::{HomekitRegistry, WindowCovering},
    hap::{HomekitCharacteristic, HomekitService},
    runtime::HomebridgeRunner,
};

/// How the host may access a characteristic.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacteristicBinding {
    Static(Value),
    Get,
    GetSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomekitCharacteristicConfig {
    pub characteristic: HomekitCharacteristic,
    pub binding: CharacteristicBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomekitServiceConfig {
    pub service: HomekitService,
    pub characteristics: Vec<HomekitCharacteristicConfig>,
}

impl HomekitServiceConfig {
    pub fn new(service: HomekitService) -> Self {
        Self {
            service,
            characteristics: vec![],
        }
    }

    pub fn with(mut self, characteristic: HomekitCharacteristic, binding: CharacteristicBinding) -> Self {
        self.characteristics.push(HomekitCharacteristicConfig {
            characteristic,
            binding,
        });
        self
    }

    pub fn binding(&self, characteristic: &HomekitCharacteristic) -> Option<&CharacteristicBinding> {
        self.characteristics
            .iter()
            .find(|c| &c.characteristic == characteristic)
            .map(|c| &c.binding)
    }
}

#[derive(Debug, Display, Error)]
pub enum AccessoryError {
    #[display("{operation} of {service:?}.{characteristic:?} is not supported")]
    Unsupported {
        service: HomekitService,
        characteristic: HomekitCharacteristic,
        operation: &'static str,
    },

    #[display("Invalid value for {characteristic:?}: {value}")]
    InvalidValue {
        characteristic: HomekitCharacteristic,
        value: Value,
    },

    #[display("Device request failed: {_0}")]
    Device(EspWindowError),
}

/// Accessory as seen by the host. The host calls these methods directly for every
/// characteristic read, write or identify request.
pub trait Accessory: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn services(&self) -> Vec<HomekitServiceConfig>;

    fn identify(&self);

    fn get(
        &self,
        service: &HomekitService,
        characteristic: &HomekitCharacteristic,
    ) -> impl Future<Output = Result<Value, AccessoryError>> + Send;

    fn set(
        &self,
        service: &HomekitService,
        characteristic: &HomekitCharacteristic,
        value: &Value,
    ) -> impl Future<Output = Result<(), AccessoryError>> + Send;
}

#[derive(Clone, Deserialize, Debug)]
pub struct Homebridge {
    pub base_topic: String,
}

impl Homebridge {
    pub async fn new_runner<A: Accessory>(
        &self,
        mqtt_client: &mut Mqtt,
        registry: HomekitRegistry<A>,
    ) -> anyhow::Result<HomebridgeRunner<A>> {
        let mqtt_receiver = mqtt_client
            .subscribe_all(&[
                format!("{}/from/get", &self.base_topic),
                format!("{}/from/set", &self.base_topic),
                format!("{}/from/identify", &self.base_topic),
            ])
            .await?;

        Ok(HomebridgeRunner::new(
            registry,
            mqtt_client.sender(&self.base_topic),
            mqtt_receiver,
        ))
    }
}
