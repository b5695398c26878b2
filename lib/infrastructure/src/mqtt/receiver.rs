use std::str::Utf8Error;

use rumqttc::v5::mqttbytes::v5::Publish;
use tokio::sync::mpsc;

/// Message received on one of the subscribed topics. Payloads are expected to be UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttInMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug)]
pub struct MqttSubscription {
    rx: mpsc::Receiver<MqttInMessage>,
}

impl MqttSubscription {
    pub(super) fn new(rx: mpsc::Receiver<MqttInMessage>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<MqttInMessage> {
        self.rx.recv().await
    }
}

impl TryFrom<&Publish> for MqttInMessage {
    type Error = Utf8Error;

    fn try_from(publish: &Publish) -> Result<Self, Self::Error> {
        Ok(MqttInMessage {
            topic: std::str::from_utf8(&publish.topic)?.to_owned(),
            payload: std::str::from_utf8(&publish.payload)?.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_yields_forwarded_messages() {
        let (tx, rx) = mpsc::channel(4);
        let mut subscription = MqttSubscription::new(rx);

        let msg = MqttInMessage {
            topic: "homebridge/from/get".to_string(),
            payload: r#"{"name": "Wohnzimmer Rollo"}"#.to_string(),
        };
        tx.send(msg.clone()).await.unwrap();
        drop(tx);

        assert_eq!(subscription.recv().await, Some(msg));
        assert_eq!(subscription.recv().await, None);
    }
}
