use std::{sync::Arc, time::Duration};

use rumqttc::v5::{
    AsyncClient, Event, EventLoop, MqttOptions,
    mqttbytes::{
        QoS,
        v5::{ConnectProperties, Packet, Publish, SubscribeProperties},
    },
};
use tokio::sync::mpsc;

use super::*;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Mqtt {
    client: Arc<AsyncClient>,
    event_loop: EventLoop,
    subscriptions: Vec<TopicSubscribers>,
}

//position in Mqtt::subscriptions + 1 is the MQTT subscription identifier
struct TopicSubscribers {
    topic: String,
    txs: Vec<mpsc::Sender<MqttInMessage>>,
}

impl Mqtt {
    pub fn connect(host: &str, port: u16, client_id: &str) -> Self {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(5));
        options.set_clean_start(false);

        let mut connect_props = ConnectProperties::new();
        connect_props.session_expiry_interval = 60.into();
        connect_props.max_packet_size = Some(1024 * 1024);
        options.set_connect_properties(connect_props);

        let (client, event_loop) = AsyncClient::new(options, 32);

        Mqtt {
            client: Arc::new(client),
            event_loop,
            subscriptions: vec![],
        }
    }

    pub async fn subscribe_all(&mut self, topics: &[String]) -> anyhow::Result<MqttSubscription> {
        let (tx, rx) = mpsc::channel::<MqttInMessage>(32);

        for topic in topics {
            if let Some(existing) = self.subscriptions.iter_mut().find(|s| s.topic == *topic) {
                tracing::info!("Adding subscriber to existing subscription: {:?}", topic);
                existing.txs.push(tx.clone());
                continue;
            }

            tracing::info!("Creating new subscription for topic: {:?}", topic);

            self.subscriptions.push(TopicSubscribers {
                topic: topic.clone(),
                txs: vec![tx.clone()],
            });

            let properties = SubscribeProperties {
                id: Some(self.subscriptions.len()),
                user_properties: vec![],
            };

            self.client
                .subscribe_with_properties(topic, QoS::AtLeastOnce, properties)
                .await?;
        }

        Ok(MqttSubscription::new(rx))
    }

    pub fn sender(&self, base_topic: impl Into<String>) -> MqttSender {
        MqttSender::new(self.client.clone(), base_topic)
    }

    /// Drives the connection. Must run for subscriptions to receive anything and for
    /// published messages to leave the process.
    pub async fn process(mut self) {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => self.forward(publish).await,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT connection error, retrying: {}", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    async fn forward(&self, publish: Publish) {
        let msg = match MqttInMessage::try_from(&publish) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("Error parsing MQTT message: {}", e);
                return;
            }
        };

        let Some(properties) = publish.properties else {
            tracing::error!("No subscription identifiers in MQTT message on {}", msg.topic);
            return;
        };

        for id in properties.subscription_identifiers {
            let Some(subscribers) = id.checked_sub(1).and_then(|index| self.subscriptions.get(index)) else {
                tracing::error!("No subscription for id: {}", id);
                continue;
            };

            for tx in subscribers.txs.iter() {
                tracing::trace!("Forwarding MQTT message to subscriber {}: {:?}", subscribers.topic, msg);

                if let Err(e) = tx.send_timeout(msg.clone(), FORWARD_TIMEOUT).await {
                    tracing::error!("Failed to forward MQTT message to subscriber {}: {}", subscribers.topic, e);
                }
            }
        }
    }
}
