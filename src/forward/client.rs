//! reqwest-backed transport for forwarded orders

use super::{ForwardError, ForwardPayload, ForwardResult, ForwardTransport};
use crate::config::ForwardConfig;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// Posts each payload as JSON to a fixed endpoint.
pub struct HttpForwardTransport {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpForwardTransport {
    pub fn new(config: &ForwardConfig) -> ForwardResult<Self> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ForwardError::Configuration("forward URL is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ForwardError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ForwardTransport for HttpForwardTransport {
    async fn send(&self, payload: &ForwardPayload) -> ForwardResult<()> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Forwarded order '{}' ({})", payload.order_id, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_url() {
        let config = ForwardConfig::default();
        assert!(matches!(
            HttpForwardTransport::new(&config),
            Err(ForwardError::Configuration(_))
        ));
    }

    #[test]
    fn keeps_trimmed_url() {
        let config = ForwardConfig {
            url: Some(" https://partner.test/orders ".to_string()),
            ..Default::default()
        };
        let transport = HttpForwardTransport::new(&config).unwrap();
        assert_eq!(transport.url(), "https://partner.test/orders");
    }
}
