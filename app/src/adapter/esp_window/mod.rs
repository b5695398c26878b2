mod client;
mod error;

use infrastructure::HttpClientConfig;
use serde::Deserialize;
use serde_json::Value;

use crate::core::unit::{Position, PositionState};
use client::EspWindowHttpClient;

pub use error::EspWindowError;

const TARGET_SET_POSITION: &str = "targetSetPosition";
const TARGET_POSITION: &str = "targetPosition";
const CURRENT_POSITION: &str = "currentPosition";
const POSITION_STATE: &str = "positionState";

#[derive(Debug, Clone, Deserialize)]
pub struct EspWindowConfig {
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub window: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInformation {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub serial_number: &'static str,
}

const DEVICE_INFORMATION: DeviceInformation = DeviceInformation {
    manufacturer: "ESP_Klu",
    model: "ESP8266 Window",
    serial_number: "A0123456789",
};

/// HTTP adapter for a single window driven by an ESP8266 controller.
///
/// Every call is exactly one request against the device. Nothing is cached and nothing is retried.
#[derive(Debug, Clone)]
pub struct EspWindow {
    name: String,
    window: String,
    client: EspWindowHttpClient,
}

impl EspWindow {
    pub fn new(config: &EspWindowConfig, http_config: &HttpClientConfig) -> anyhow::Result<Self> {
        let http = http_config.new_tracing_client()?;
        let client = EspWindowHttpClient::new(http, &config.hostname, config.port, &config.window)?;

        Ok(Self {
            name: config.name.clone(),
            window: config.window.clone(),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn information(&self) -> DeviceInformation {
        DEVICE_INFORMATION
    }

    pub fn identify(&self) {
        tracing::info!("Identify requested for window {}", self.name);
    }

    #[tracing::instrument(skip(self), fields(window = %self.window))]
    pub async fn set_target_position(&self, value: Position) -> Result<(), EspWindowError> {
        tracing::info!("Setting target position of {} to {}", self.name, value);

        let result = self.client.post_value(TARGET_SET_POSITION, value.value()).await;
        self.observe(TARGET_SET_POSITION, result)
    }

    #[tracing::instrument(skip(self), fields(window = %self.window))]
    pub async fn get_target_position(&self) -> Result<Position, EspWindowError> {
        tracing::debug!("Getting target position of {}", self.name);
        let result = self.get_position(TARGET_POSITION).await;
        self.observe(TARGET_POSITION, result)
    }

    #[tracing::instrument(skip(self), fields(window = %self.window))]
    pub async fn get_current_position(&self) -> Result<Position, EspWindowError> {
        tracing::debug!("Getting current position of {}", self.name);
        let result = self.get_position(CURRENT_POSITION).await;
        self.observe(CURRENT_POSITION, result)
    }

    #[tracing::instrument(skip(self), fields(window = %self.window))]
    pub async fn get_position_state(&self) -> Result<PositionState, EspWindowError> {
        tracing::debug!("Getting position state of {}", self.name);

        let result = self
            .client
            .get_json::<Value>(POSITION_STATE)
            .await
            .map(|raw| self.position_state_from_device(&raw));

        self.observe(POSITION_STATE, result)
    }

    async fn get_position(&self, suffix: &str) -> Result<Position, EspWindowError> {
        let body = self.client.get_json::<Value>(suffix).await?;

        let raw = match whole_number(&body) {
            Some(raw) => raw,
            None => serde_json::from_value::<i64>(body).map_err(EspWindowError::Parse)?,
        };

        Position::try_from(raw).map_err(EspWindowError::InvalidPosition)
    }

    //any valid JSON is accepted, everything but 0, 1 and 2 counts as stopped
    fn position_state_from_device(&self, raw: &Value) -> PositionState {
        match whole_number(raw) {
            Some(0) => PositionState::Decreasing,
            Some(1) => PositionState::Increasing,
            Some(2) => PositionState::Stopped,
            _ => {
                tracing::warn!("Window {} reported unknown position state {}, assuming stopped", self.name, raw);
                PositionState::Stopped
            }
        }
    }

    fn observe<T>(&self, operation: &'static str, result: Result<T, EspWindowError>) -> Result<T, EspWindowError> {
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                tracing::error!("Request {} to window {} failed: {}", operation, self.name, e);
                e.kind()
            }
        };

        infrastructure::meter::increment(
            "esp_window_requests",
            &[("window", self.window.as_str()), ("operation", operation), ("outcome", outcome)],
        );

        result
    }
}

//firmware may encode integers as 42.0
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
