//! Bitfinex public trades client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::api_types::{parse_error_message, parse_trades};
use crate::application::ports::{FetchError, FetchRequest, TradeSourcePort};
use crate::config::SourceConfig;
use crate::domain::Trade;
use crate::retry::parse_retry_after;

/// Exchange identifier stamped on every trade from this client.
pub const BITFINEX_EXCHANGE: &str = "bitfinex";

/// Client for `GET /v2/trades/{symbol}/hist`.
///
/// Performs exactly one HTTP request per call. Pacing and retries live in
/// [`ThrottledFetcher`](crate::application::services::ThrottledFetcher).
#[derive(Debug, Clone)]
pub struct BitfinexClient {
    client: Client,
    base_url: String,
}

impl BitfinexClient {
    /// Create a client for `base_url` (e.g. `https://api-pub.bitfinex.com`).
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                message: e.to_string(),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client from the `source` config section.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    fn trades_url(&self, symbol: &str) -> String {
        format!("{}/v2/trades/{symbol}/hist", self.base_url)
    }

    /// Query string for a page request. Bitfinex bounds are inclusive on
    /// both ends, so the exclusive lower bound is shifted by one.
    fn query(request: &FetchRequest) -> [(&'static str, String); 4] {
        [
            ("start", request.from_exclusive.saturating_add(1).to_string()),
            ("end", request.to_inclusive.to_string()),
            ("limit", request.limit.to_string()),
            ("sort", request.sort.as_signum().to_string()),
        ]
    }
}

#[async_trait]
impl TradeSourcePort for BitfinexClient {
    async fn fetch_trades(&self, request: &FetchRequest) -> Result<Vec<Trade>, FetchError> {
        let response = self
            .client
            .get(self.trades_url(&request.symbol))
            .query(&Self::query(request))
            .send()
            .await
            .map_err(|e| FetchError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(FetchError::RateLimited { retry_after_secs });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = parse_error_message(&body).unwrap_or(body);
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let trades: Vec<Trade> = parse_trades(&body)
            .map_err(|message| FetchError::Decode { message })?
            .into_iter()
            .map(|row| row.into_trade(BITFINEX_EXCHANGE, &request.symbol))
            .collect();

        debug!(
            symbol = %request.symbol,
            count = trades.len(),
            first_mts = trades.first().map(|t| t.mts),
            last_mts = trades.last().map(|t| t.mts),
            "Received trade page"
        );

        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SortDirection;

    #[test]
    fn trailing_slash_trimmed() {
        let client = BitfinexClient::new("http://localhost:1/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.trades_url("tBTCUSD"),
            "http://localhost:1/v2/trades/tBTCUSD/hist"
        );
    }

    #[test]
    fn query_shifts_exclusive_start() {
        let request = FetchRequest::ascending("tBTCUSD", 999, 2_000, 5_000);
        let query = BitfinexClient::query(&request);

        assert_eq!(query[0], ("start", "1000".to_string()));
        assert_eq!(query[1], ("end", "2000".to_string()));
        assert_eq!(query[2], ("limit", "5000".to_string()));
        assert_eq!(query[3], ("sort", "1".to_string()));
    }

    #[test]
    fn descending_sort_is_negative() {
        let request = FetchRequest {
            sort: SortDirection::Descending,
            ..FetchRequest::ascending("tETHUSD", 0, 1, 1)
        };
        assert_eq!(BitfinexClient::query(&request)[3].1, "-1");
    }

    #[test]
    fn from_config_uses_base_url() {
        let config = SourceConfig::default();
        let client = BitfinexClient::from_config(&config).unwrap();
        assert_eq!(
            client.trades_url("tBTCUSD"),
            "https://api-pub.bitfinex.com/v2/trades/tBTCUSD/hist"
        );
    }
}
