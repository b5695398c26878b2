mod http;
mod monitoring;
mod mqtt;

pub use monitoring::MonitoringConfig;

pub use http::client::HttpClientConfig;
pub use mqtt::{Mqtt, MqttConfig, MqttInMessage, MqttSender, MqttSubscription};

pub mod meter {
    pub use super::monitoring::meter::increment;
}
