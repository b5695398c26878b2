use std::{collections::HashMap, sync::Arc};

use infrastructure::{MqttInMessage, MqttSender, MqttSubscription};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frontends::homekit::{
    Accessory, CharacteristicBinding, HomekitCharacteristic, HomekitRegistry, HomekitService, HomekitServiceConfig,
};

//example
// {"name": "Wohnzimmer Rollo", "service_name": "WindowCovering", "characteristic": "CurrentPosition", "value": 40}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CharacteristicMessage {
    name: String,
    #[serde(rename = "service_name")]
    service: HomekitService,
    characteristic: HomekitCharacteristic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IdentifyMessage {
    name: String,
}

enum HomebridgeRequest<A> {
    Get(Arc<A>, CharacteristicMessage),
    Set(Arc<A>, CharacteristicMessage),
    Identify(Arc<A>),
}

pub struct HomebridgeRunner<A> {
    registry: HomekitRegistry<A>,
    mqtt_sender: MqttSender,
    mqtt_receiver: MqttSubscription,
}

impl<A: Accessory> HomebridgeRunner<A> {
    pub fn new(registry: HomekitRegistry<A>, mqtt_sender: MqttSender, mqtt_receiver: MqttSubscription) -> Self {
        Self {
            registry,
            mqtt_sender,
            mqtt_receiver,
        }
    }

    pub async fn run(mut self) {
        self.register_accessories().await;

        loop {
            let Some(msg) = self.mqtt_receiver.recv().await else {
                tracing::error!("Homebridge MQTT subscription closed");
                return;
            };

            self.handle_mqtt_message(msg);
        }
    }

    fn handle_mqtt_message(&self, msg: MqttInMessage) {
        let Some(sub_topic) = self.mqtt_sender.sub_topic(&msg.topic) else {
            tracing::debug!("Ignoring Homebridge message on topic {}", msg.topic);
            return;
        };

        //every request runs in its own task, requests to the same window are not serialized
        match route(&self.registry, sub_topic, &msg.payload) {
            Some(HomebridgeRequest::Get(accessory, request)) => {
                let sender = self.mqtt_sender.clone();
                tokio::spawn(async move {
                    if let Some(response) = process_get(accessory.as_ref(), request).await {
                        publish(&sender, "to/set", &response).await;
                    }
                });
            }
            Some(HomebridgeRequest::Set(accessory, request)) => {
                tokio::spawn(async move {
                    process_set(accessory.as_ref(), request).await;
                });
            }
            Some(HomebridgeRequest::Identify(accessory)) => accessory.identify(),
            None => {}
        }
    }

    async fn register_accessories(&self) {
        for accessory in self.registry.all() {
            for (sub_topic, payload) in registration_payloads(accessory.name(), &accessory.services()) {
                //make sure accessory is created before service is added
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;

                tracing::info!("Registering {} at Homebridge via {}", accessory.name(), sub_topic);
                publish(&self.mqtt_sender, sub_topic, &payload).await;
            }
        }
    }
}

fn route<A: Accessory>(registry: &HomekitRegistry<A>, sub_topic: &str, payload: &str) -> Option<HomebridgeRequest<A>> {
    match sub_topic {
        "from/get" | "from/set" => {
            let request: CharacteristicMessage = match serde_json::from_str(payload) {
                Ok(request) => request,
                Err(e) => {
                    tracing::error!("Error parsing incoming Homebridge message: {:?} -- {:?}", payload, e);
                    return None;
                }
            };

            tracing::debug!("Processing Homebridge MQTT event on {}: {:?}", sub_topic, request);

            let Some(accessory) = registry.find(&request.name) else {
                tracing::warn!("Homebridge request for unknown accessory {}", request.name);
                return None;
            };

            if sub_topic == "from/get" {
                Some(HomebridgeRequest::Get(accessory, request))
            } else {
                Some(HomebridgeRequest::Set(accessory, request))
            }
        }
        "from/identify" => match serde_json::from_str::<IdentifyMessage>(payload) {
            Ok(identify) => match registry.find(&identify.name) {
                Some(accessory) => Some(HomebridgeRequest::Identify(accessory)),
                None => {
                    tracing::warn!("Identify requested for unknown accessory {}", identify.name);
                    None
                }
            },
            Err(e) => {
                tracing::error!("Error parsing Homebridge identify message: {:?} -- {:?}", payload, e);
                None
            }
        },
        _ => {
            tracing::debug!("Ignoring Homebridge message on {}", sub_topic);
            None
        }
    }
}

async fn process_get<A: Accessory>(accessory: &A, request: CharacteristicMessage) -> Option<CharacteristicMessage> {
    match accessory.get(&request.service, &request.characteristic).await {
        Ok(value) => Some(CharacteristicMessage {
            value: Some(value),
            ..request
        }),
        Err(e) => {
            tracing::error!(
                "Error getting {:?} of {}: {}",
                request.characteristic,
                accessory.name(),
                e
            );
            None
        }
    }
}

async fn process_set<A: Accessory>(accessory: &A, request: CharacteristicMessage) {
    let Some(value) = &request.value else {
        tracing::warn!(
            "Homebridge set request for {:?} of {} without value",
            request.characteristic,
            accessory.name()
        );
        return;
    };

    if let Err(e) = accessory.set(&request.service, &request.characteristic, value).await {
        tracing::error!(
            "Error setting {:?} of {} to {}: {}",
            request.characteristic,
            accessory.name(),
            value,
            e
        );
    }
}

async fn publish<T: Serialize + std::fmt::Debug>(sender: &MqttSender, sub_topic: &str, message: &T) {
    let payload = match serde_json::to_string(message) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Error serializing Homebridge message: {:?} -- {:?}", message, e);
            return;
        }
    };

    if let Err(e) = sender.send_transient(sub_topic, payload).await {
        tracing::error!("Error sending MQTT message to Homebridge: {} -- {:?}", sub_topic, e);
    }
}

/// First service creates the accessory together with its information, every further
/// service is added to the existing accessory.
fn registration_payloads(name: &str, services: &[HomekitServiceConfig]) -> Vec<(&'static str, Value)> {
    #[derive(Serialize)]
    struct Payload {
        name: String,
        service_name: HomekitService,
        service: HomekitService,
        #[serde(flatten)]
        information: HashMap<&'static str, Value>,
        #[serde(flatten)]
        config: HashMap<HomekitCharacteristic, Value>,
    }

    let information: HashMap<&'static str, Value> = services
        .iter()
        .filter(|s| s.service == HomekitService::AccessoryInformation)
        .flat_map(|s| s.characteristics.iter())
        .filter_map(|c| match (&c.binding, c.characteristic.information_key()) {
            (CharacteristicBinding::Static(value), Some(key)) => Some((key, value.clone())),
            _ => None,
        })
        .collect();

    services
        .iter()
        .filter(|s| s.service != HomekitService::AccessoryInformation)
        .enumerate()
        .map(|(index, s)| {
            let config = s
                .characteristics
                .iter()
                .map(|c| (c.characteristic.clone(), Value::String("default".to_string())))
                .collect();

            let (sub_topic, information) = if index == 0 {
                ("to/add", information.clone())
            } else {
                ("to/add/service", HashMap::new())
            };

            let payload = Payload {
                name: name.to_string(),
                service_name: s.service.clone(),
                service: s.service.clone(),
                information,
                config,
            };

            (
                sub_topic,
                serde_json::to_value(payload).unwrap_or_else(|e| {
                    tracing::error!("Error serializing Homebridge registration payload for {}: {:?}", name, e);
                    Value::Null
                }),
            )
        })
        .collect()
}
