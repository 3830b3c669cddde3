use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::ExchangeRateApiConfig;
use crate::core::currency::CurrencyCode;
use crate::core::error::{FxError, Result};
use crate::core::provider::{RateProvider, RateTable};

/// Fetches the latest rates for a base currency from an exchangerate-api
/// style endpoint (`GET {base_url}/{BASE}`).
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xrate/1.0")
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::ProviderUnavailable(format!("Failed to build client: {e}")))?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_config(config: &ExchangeRateApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.api_key.clone(), config.timeout())
    }

    fn url_for(&self, base: &CurrencyCode) -> String {
        match &self.api_key {
            Some(key) => format!("{}/{}?api_key={}", self.base_url, base, key),
            None => format!("{}/{}", self.base_url, base),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

fn parse_rates(base: &CurrencyCode, body: &str) -> Result<RateTable> {
    let data: LatestRatesResponse = serde_json::from_str(body).map_err(|e| {
        FxError::ProviderDataInvalid(format!("Failed to parse rates response for {base}: {e}"))
    })?;

    data.rates
        .into_iter()
        .map(|(code, rate)| {
            let code = CurrencyCode::new(&code).map_err(|_| {
                FxError::ProviderDataInvalid(format!(
                    "Malformed currency code {code:?} in rates for {base}"
                ))
            })?;
            Ok((code, rate))
        })
        .collect()
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates_for(&self, base: &CurrencyCode) -> Result<RateTable> {
        let url = self.url_for(base);
        debug!("Requesting rates from {}/{}", self.base_url, base);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                "Timeout"
            } else {
                "Request error"
            };
            FxError::ProviderUnavailable(format!("{kind} for base currency {base}: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(FxError::ProviderUnavailable(format!(
                "HTTP error: {} for base currency {}",
                response.status(),
                base
            )));
        }

        let text = response.text().await.map_err(|e| {
            FxError::ProviderUnavailable(format!("Failed to read response for {base}: {e}"))
        })?;

        let rates = parse_rates(base, &text)?;
        debug!(count = rates.len(), "Received rates");
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    fn provider(server: &MockServer, timeout: Duration) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(&server.uri(), None, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "base": "USD",
            "date": "2026-10-16",
            "time_last_updated": 1791590401,
            "rates": { "USD": 1, "EUR": 0.92, "JPY": 148.5 }
        }"#;

        Mock::given(method("GET"))
            .and(path("/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let rates = provider(&mock_server, Duration::from_secs(5))
            .fetch_rates_for(&usd())
            .await
            .expect("Failed to fetch rates");

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[&CurrencyCode::new("EUR").unwrap()], 0.92);
        assert_eq!(rates[&CurrencyCode::new("JPY").unwrap()], 148.5);
    }

    #[tokio::test]
    async fn test_api_key_is_sent_when_configured() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/EUR"))
            .and(query_param("api_key", "secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"USD": 1.08}}"#),
            )
            .mount(&mock_server)
            .await;

        let provider = ExchangeRateApiProvider::new(
            &format!("{}/", mock_server.uri()),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let rates = provider
            .fetch_rates_for(&CurrencyCode::new("EUR").unwrap())
            .await
            .unwrap();
        assert_eq!(rates[&usd()], 1.08);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/USD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server, Duration::from_secs(5))
            .fetch_rates_for(&usd())
            .await;
        assert_eq!(
            result.unwrap_err(),
            FxError::ProviderUnavailable(
                "HTTP error: 500 Internal Server Error for base currency USD".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/USD"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"rates": {"EUR": 0.92}}"#)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server, Duration::from_millis(50))
            .fetch_rates_for(&usd())
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, FxError::ProviderUnavailable(_)), "{err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_rates_field_is_invalid() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result": "error"}"#))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server, Duration::from_secs(5))
            .fetch_rates_for(&usd())
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, FxError::ProviderDataInvalid(_)), "{err:?}");
        assert!(
            err.to_string()
                .contains("Failed to parse rates response for USD")
        );
    }

    #[test]
    fn test_malformed_code_is_invalid() {
        let result = parse_rates(&usd(), r#"{"rates": {"EURO": 0.9}}"#);
        assert!(matches!(result, Err(FxError::ProviderDataInvalid(_))));
    }
}
