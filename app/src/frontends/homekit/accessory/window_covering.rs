use serde_json::{Value, json};

use crate::{
    adapter::esp_window::EspWindow,
    core::unit::Position,
    frontends::homekit::{
        Accessory, AccessoryError, CharacteristicBinding, HomekitCharacteristic, HomekitService, HomekitServiceConfig,
    },
};

pub struct WindowCovering {
    window: EspWindow,
}

impl WindowCovering {
    pub fn new(window: EspWindow) -> Self {
        Self { window }
    }

    fn information_service(&self) -> HomekitServiceConfig {
        let info = self.window.information();

        HomekitServiceConfig::new(HomekitService::AccessoryInformation)
            .with(
                HomekitCharacteristic::Manufacturer,
                CharacteristicBinding::Static(json!(info.manufacturer)),
            )
            .with(HomekitCharacteristic::Model, CharacteristicBinding::Static(json!(info.model)))
            .with(
                HomekitCharacteristic::SerialNumber,
                CharacteristicBinding::Static(json!(info.serial_number)),
            )
    }

    fn window_covering_service(&self) -> HomekitServiceConfig {
        HomekitServiceConfig::new(HomekitService::WindowCovering)
            .with(HomekitCharacteristic::TargetPosition, CharacteristicBinding::GetSet)
            .with(HomekitCharacteristic::CurrentPosition, CharacteristicBinding::Get)
            .with(HomekitCharacteristic::PositionState, CharacteristicBinding::Get)
    }
}

impl Accessory for WindowCovering {
    fn name(&self) -> &str {
        self.window.name()
    }

    fn services(&self) -> Vec<HomekitServiceConfig> {
        vec![self.information_service(), self.window_covering_service()]
    }

    fn identify(&self) {
        self.window.identify();
    }

    async fn get(
        &self,
        service: &HomekitService,
        characteristic: &HomekitCharacteristic,
    ) -> Result<Value, AccessoryError> {
        match (service, characteristic) {
            (HomekitService::WindowCovering, HomekitCharacteristic::TargetPosition) => {
                let position = self.window.get_target_position().await.map_err(AccessoryError::Device)?;
                Ok(json!(position.value()))
            }
            (HomekitService::WindowCovering, HomekitCharacteristic::CurrentPosition) => {
                let position = self.window.get_current_position().await.map_err(AccessoryError::Device)?;
                Ok(json!(position.value()))
            }
            (HomekitService::WindowCovering, HomekitCharacteristic::PositionState) => {
                let state = self.window.get_position_state().await.map_err(AccessoryError::Device)?;
                Ok(json!(state.characteristic_value()))
            }
            (HomekitService::AccessoryInformation, _) => match self.information_service().binding(characteristic) {
                Some(CharacteristicBinding::Static(value)) => Ok(value.clone()),
                _ => Err(unsupported(service, characteristic, "get")),
            },
            _ => Err(unsupported(service, characteristic, "get")),
        }
    }

    async fn set(
        &self,
        service: &HomekitService,
        characteristic: &HomekitCharacteristic,
        value: &Value,
    ) -> Result<(), AccessoryError> {
        match (service, characteristic) {
            (HomekitService::WindowCovering, HomekitCharacteristic::TargetPosition) => {
                let position = value_to_position(value).ok_or_else(|| AccessoryError::InvalidValue {
                    characteristic: characteristic.clone(),
                    value: value.clone(),
                })?;

                self.window
                    .set_target_position(position)
                    .await
                    .map_err(AccessoryError::Device)
            }
            _ => Err(unsupported(service, characteristic, "set")),
        }
    }
}

fn unsupported(
    service: &HomekitService,
    characteristic: &HomekitCharacteristic,
    operation: &'static str,
) -> AccessoryError {
    AccessoryError::Unsupported {
        service: service.clone(),
        characteristic: characteristic.clone(),
        operation,
    }
}

fn value_to_position(value: &Value) -> Option<Position> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse::<i64>().ok()))
        .and_then(|raw| Position::try_from(raw).ok())
}

#[cfg(test)]
mod tests {
    use infrastructure::HttpClientConfig;
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;
    use crate::adapter::esp_window::{EspWindowConfig, EspWindowError};

    fn covering(hostname: String, port: u16) -> WindowCovering {
        let config = EspWindowConfig {
            name: "Schlafzimmer Rollo".to_string(),
            hostname,
            port,
            window: "bedroom".to_string(),
        };
        WindowCovering::new(EspWindow::new(&config, &HttpClientConfig::default()).unwrap())
    }

    fn covering_for(server: &ServerGuard) -> WindowCovering {
        let address = server.socket_address();
        covering(address.ip().to_string(), address.port())
    }

    #[test]
    fn services_describe_information_and_window_covering() {
        let services = covering("192.168.1.51".to_string(), 80).services();

        assert_eq!(services.len(), 2);

        let info = &services[0];
        assert_eq!(info.service, HomekitService::AccessoryInformation);
        assert_eq!(
            info.binding(&HomekitCharacteristic::Manufacturer),
            Some(&CharacteristicBinding::Static(json!("ESP_Klu")))
        );
        assert_eq!(
            info.binding(&HomekitCharacteristic::SerialNumber),
            Some(&CharacteristicBinding::Static(json!("A0123456789")))
        );

        let window = &services[1];
        assert_eq!(window.service, HomekitService::WindowCovering);
        assert_eq!(
            window.binding(&HomekitCharacteristic::TargetPosition),
            Some(&CharacteristicBinding::GetSet)
        );
        assert_eq!(
            window.binding(&HomekitCharacteristic::CurrentPosition),
            Some(&CharacteristicBinding::Get)
        );
        assert_eq!(
            window.binding(&HomekitCharacteristic::PositionState),
            Some(&CharacteristicBinding::Get)
        );
    }

    #[tokio::test]
    async fn get_position_state_returns_characteristic_value() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/window/bedroom/positionState")
            .with_body("1")
            .create_async()
            .await;

        let value = covering_for(&server)
            .get(&HomekitService::WindowCovering, &HomekitCharacteristic::PositionState)
            .await
            .unwrap();

        assert_eq!(value, json!(1));
    }

    #[tokio::test]
    async fn get_current_position_returns_number() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/window/bedroom/currentPosition")
            .with_body("64")
            .create_async()
            .await;

        let value = covering_for(&server)
            .get(&HomekitService::WindowCovering, &HomekitCharacteristic::CurrentPosition)
            .await
            .unwrap();

        assert_eq!(value, json!(64));
    }

    #[tokio::test]
    async fn get_static_information_without_device() {
        let value = covering("192.168.1.51".to_string(), 80)
            .get(&HomekitService::AccessoryInformation, &HomekitCharacteristic::Model)
            .await
            .unwrap();

        assert_eq!(value, json!("ESP8266 Window"));
    }

    #[tokio::test]
    async fn set_target_position_accepts_numeric_strings() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/window/bedroom/targetSetPosition")
            .match_body("value=75")
            .expect(1)
            .create_async()
            .await;

        covering_for(&server)
            .set(&HomekitService::WindowCovering, &HomekitCharacteristic::TargetPosition, &json!("75"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn set_target_position_rejects_invalid_values_before_request() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;
        let covering = covering_for(&server);

        for value in [json!(101), json!(-5), json!(12.5), json!("open"), json!(null), json!(true)] {
            let result = covering
                .set(&HomekitService::WindowCovering, &HomekitCharacteristic::TargetPosition, &value)
                .await;

            assert!(
                matches!(result, Err(AccessoryError::InvalidValue { .. })),
                "{value} should be rejected"
            );
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn set_read_only_characteristic_is_unsupported() {
        let result = covering("192.168.1.51".to_string(), 80)
            .set(&HomekitService::WindowCovering, &HomekitCharacteristic::CurrentPosition, &json!(10))
            .await;

        assert!(matches!(result, Err(AccessoryError::Unsupported { operation: "set", .. })));
    }

    #[tokio::test]
    async fn device_failure_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/window/bedroom/targetPosition")
            .with_status(500)
            .create_async()
            .await;

        let result = covering_for(&server)
            .get(&HomekitService::WindowCovering, &HomekitCharacteristic::TargetPosition)
            .await;

        assert!(matches!(
            result,
            Err(AccessoryError::Device(EspWindowError::Remote { status: 500 }))
        ));
    }
}
