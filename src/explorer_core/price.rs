//! Spot price feed (CoinGecko-style simple price endpoint)
//!
//! The price is optional everywhere: a failed or malformed response logs a
//! warning and degrades to `None`, and the cycle carries on with display
//! currency fields marked unavailable.

use async_trait::async_trait;
use std::time::Duration;

/// Display-currency-per-native-unit rate, or None when unavailable.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn spot(&self) -> Option<f64>;
}

pub struct PriceClient {
    http: reqwest::Client,
    url: String,
    coin_id: String,
    vs_currency: String,
}

impl PriceClient {
    /// `url` is the full simple-price endpoint (ids/vs_currencies already in
    /// the query string); `coin_id`/`vs_currency` pick the value out of the
    /// response, e.g. `{"base-eth": {"usd": 3245.1}}`.
    pub fn new(url: &str, coin_id: &str, vs_currency: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url: url.to_string(),
            coin_id: coin_id.to_string(),
            vs_currency: vs_currency.to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for PriceClient {
    async fn spot(&self) -> Option<f64> {
        let value: serde_json::Value = match self.http.get(&self.url).send().await {
            Ok(resp) => match resp.json().await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("price feed returned unparseable body: {}", e);
                    return None;
                }
            },
            Err(e) => {
                log::warn!("price feed unavailable: {}", e);
                return None;
            }
        };

        let rate = value.get(&self.coin_id)?.get(&self.vs_currency)?.as_f64();
        if rate.is_none() {
            log::warn!(
                "price feed response missing {}.{}",
                self.coin_id,
                self.vs_currency
            );
        }
        rate
    }
}
