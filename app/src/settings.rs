use config::{Config, ConfigError, Environment, File};
use infrastructure::{HttpClientConfig, MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::{adapter::esp_window::EspWindowConfig, frontends::homekit::Homebridge};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    pub mqtt: MqttConfig,
    pub homebridge: Homebridge,
    #[serde(default)]
    pub http_client: HttpClientConfig,
    pub windows: Vec<EspWindowConfig>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("config.toml"))
    }

    fn load(source: impl config::Source + Send + Sync + 'static) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix("ESP").separator("__").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}
