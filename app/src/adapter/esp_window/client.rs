use reqwest::{StatusCode, header};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;

use super::EspWindowError;

const WINDOW_PATH: &str = "/window";

#[derive(Debug, Clone)]
pub struct EspWindowHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
    window: String,
}

impl EspWindowHttpClient {
    pub fn new(client: ClientWithMiddleware, hostname: &str, port: u16, window: &str) -> Result<Self, EspWindowError> {
        validate_window_id(window)?;

        Ok(Self {
            client,
            base_url: format!("http://{}:{}", hostname, port),
            window: window.to_owned(),
        })
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}/{}/{}", WINDOW_PATH, self.window, suffix)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}", self.base_url, self.path(suffix))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, suffix: &str) -> Result<T, EspWindowError> {
        let url = self.url(suffix);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(EspWindowError::Transport)?;
        check_status(response.status())?;

        //device may send the body in several chunks, decode only once complete
        let body = response.text().await?;
        tracing::trace!("Response body from {}: {:?}", suffix, body);

        serde_json::from_str(&body).map_err(EspWindowError::Parse)
    }

    pub async fn post_value(&self, suffix: &str, value: impl std::fmt::Display) -> Result<(), EspWindowError> {
        let url = self.url(suffix);
        let body = format!("value={}", value);
        tracing::debug!("POST {} with {:?}", url, body);

        // deployed firmware expects this exact header even though the body is not JSON
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(EspWindowError::Transport)?;

        check_status(response.status())
    }
}

fn check_status(status: StatusCode) -> Result<(), EspWindowError> {
    match status {
        StatusCode::OK => Ok(()),
        _ => Err(EspWindowError::Remote {
            status: status.as_u16(),
        }),
    }
}

fn validate_window_id(window: &str) -> Result<(), EspWindowError> {
    let forbidden = ['/', '\\', '?', '#', '%'];

    if window.is_empty() || window == "." || window == ".." || window.contains(forbidden) {
        return Err(EspWindowError::InvalidWindowId(window.to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_window_ids() {
        assert!(validate_window_id("living-room").is_ok());
        assert!(validate_window_id("1").is_ok());
        assert!(validate_window_id("bedroom_left").is_ok());
    }

    #[test]
    fn rejects_traversal_and_reserved_characters() {
        for window in ["", ".", "..", "../admin", "a/b", "a\\b", "a?b=1", "a#b", "%2e%2e"] {
            assert!(
                matches!(validate_window_id(window), Err(EspWindowError::InvalidWindowId(_))),
                "{window:?} should be rejected"
            );
        }
    }

    #[test]
    fn builds_path_from_window_and_suffix() {
        let http = reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build();
        let client = EspWindowHttpClient::new(http, "192.168.1.50", 80, "living-room").unwrap();

        assert_eq!(client.path("targetSetPosition"), "/window/living-room/targetSetPosition");
        assert_eq!(
            client.url("currentPosition"),
            "http://192.168.1.50:80/window/living-room/currentPosition"
        );
    }
}
