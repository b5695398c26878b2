use std::time::Duration;

use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientConfig {
    //zero would make reqwest fail every request immediately
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn new_tracing_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let client = reqwest::Client::builder().timeout(self.timeout()).build()?;

        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_ten_seconds() {
        assert_eq!(HttpClientConfig::default().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn zero_timeout_is_raised_to_one_second() {
        let config = HttpClientConfig { timeout_secs: 0 };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn tracing_client_reaches_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/ping").with_status(200).create_async().await;

        let client = HttpClientConfig::default().new_tracing_client().unwrap();
        let response = client.get(format!("{}/ping", server.url())).send().await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        mock.assert_async().await;
    }
}
