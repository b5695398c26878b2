use std::sync::Arc;

use rumqttc::v5::{AsyncClient, mqttbytes::QoS};

#[derive(Clone)]
pub struct MqttSender {
    client: Arc<AsyncClient>,
    base_topic: String,
}

impl MqttSender {
    pub(super) fn new(client: Arc<AsyncClient>, base_topic: impl Into<String>) -> Self {
        Self {
            client,
            base_topic: base_topic.into(),
        }
    }

    pub fn topic(&self, sub_topic: &str) -> String {
        format!("{}/{}", self.base_topic, sub_topic)
    }

    /// Part of `topic` below the base topic, if the topic belongs to it.
    pub fn sub_topic<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic.strip_prefix(self.base_topic.as_str())?.strip_prefix('/')
    }

    pub async fn send_transient(&self, sub_topic: &str, payload: impl Into<String>) -> anyhow::Result<()> {
        self.send(self.topic(sub_topic), payload.into(), false).await
    }

    #[tracing::instrument(skip_all, fields(topic = %topic, otel.name = format!("MQTT publish {}", topic)))]
    async fn send(&self, topic: String, payload: String, retain: bool) -> anyhow::Result<()> {
        tracing::debug!("Publishing MQTT message to {topic} (retain={retain}): {:?}", payload);

        self.client
            .publish(topic.clone(), QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| {
                tracing::error!("Error publishing MQTT message to {}: {}", topic, e);
                e.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::v5::MqttOptions;

    use super::*;

    fn sender(base_topic: &str) -> MqttSender {
        let (client, _event_loop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 1);
        MqttSender::new(Arc::new(client), base_topic)
    }

    #[tokio::test]
    async fn topic_is_prefixed_with_base() {
        assert_eq!(sender("homebridge").topic("to/add"), "homebridge/to/add");
    }

    #[tokio::test]
    async fn sub_topic_strips_base() {
        let sender = sender("homebridge");

        assert_eq!(sender.sub_topic("homebridge/from/get"), Some("from/get"));
        assert_eq!(sender.sub_topic("homebridge2/from/get"), None);
        assert_eq!(sender.sub_topic("other/from/get"), None);
    }
}
