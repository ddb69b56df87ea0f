//! Blockscout etherscan-compatible API client
//!
//! Transfer feeds are paged: each query asks for `page_size` rows and
//! pagination continues until a page comes back shorter than requested.
//! Transport errors are retried with a short backoff; a feed that still
//! fails after the retry budget surfaces a [`FetchError`] naming nothing
//! more than the transport problem - the fetch cycle attaches the source
//! name.
//!
//! Blockscout quirk: on "no records found" the envelope's `result` is a
//! message string instead of an array. That decodes to an empty list here,
//! matching how the upstream UI treated it.

use crate::engine_core::normalizer::{RawNativeTx, RawNftTx, RawTokenTx};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "http error: {}", e),
            FetchError::Status(code) => write!(f, "unexpected status: {}", code),
            FetchError::Decode(msg) => write!(f, "decode error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e)
    }
}

/// The explorer surface the fetch cycle depends on.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn native_transfers(&self, address: &str) -> Result<Vec<RawNativeTx>, FetchError>;
    async fn token_transfers(&self, address: &str) -> Result<Vec<RawTokenTx>, FetchError>;
    async fn nft_transfers(&self, address: &str) -> Result<Vec<RawNftTx>, FetchError>;
    /// Raw smallest-unit balance as a decimal string.
    async fn balance(&self, address: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: serde_json::Value,
}

pub struct ExplorerClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    max_pages: usize,
    max_retries: u32,
}

impl ExplorerClient {
    pub fn new(base_url: &str, page_size: usize, max_pages: usize, max_retries: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
            max_retries,
        }
    }

    async fn get_envelope(&self, url: &str) -> Result<Envelope, FetchError> {
        let mut attempt = 0;
        loop {
            let result = async {
                let resp = self.http.get(url).send().await?;
                if !resp.status().is_success() {
                    return Err(FetchError::Status(resp.status().as_u16()));
                }
                let envelope: Envelope = resp.json().await?;
                Ok(envelope)
            }
            .await;

            match result {
                Ok(envelope) => return Ok(envelope),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!("explorer request failed (attempt {}): {}", attempt, e);
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Page through one transfer action until a short page ends the feed.
    /// `max_pages` bounds a provider that keeps returning full pages.
    async fn paged_transfers<T: DeserializeOwned>(
        &self,
        action: &str,
        address: &str,
    ) -> Result<Vec<T>, FetchError> {
        let mut all = Vec::new();
        for page in 1..=self.max_pages {
            let url = format!(
                "{}?module=account&action={}&address={}&page={}&offset={}&sort=desc",
                self.base_url, action, address, page, self.page_size
            );
            let envelope = self.get_envelope(&url).await?;
            let rows: Vec<T> = decode_result_rows(envelope.result)?;
            let row_count = rows.len();
            all.extend(rows);
            if row_count < self.page_size {
                break;
            }
            if page == self.max_pages {
                log::warn!(
                    "{} feed for {} truncated at {} pages",
                    action,
                    address,
                    self.max_pages
                );
            }
        }
        Ok(all)
    }
}

/// An array decodes to rows; anything else (Blockscout's "no records"
/// message string) is an empty feed.
fn decode_result_rows<T: DeserializeOwned>(result: serde_json::Value) -> Result<Vec<T>, FetchError> {
    if !result.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(result).map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl ExplorerApi for ExplorerClient {
    async fn native_transfers(&self, address: &str) -> Result<Vec<RawNativeTx>, FetchError> {
        self.paged_transfers("txlist", address).await
    }

    async fn token_transfers(&self, address: &str) -> Result<Vec<RawTokenTx>, FetchError> {
        self.paged_transfers("tokentx", address).await
    }

    async fn nft_transfers(&self, address: &str) -> Result<Vec<RawNftTx>, FetchError> {
        self.paged_transfers("tokennfttx", address).await
    }

    async fn balance(&self, address: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}?module=account&action=balance&address={}",
            self.base_url, address
        );
        let envelope = self.get_envelope(&url).await?;
        match envelope.result.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(FetchError::Decode(
                "balance result was not a string".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rows_from_array() {
        let value = serde_json::json!([
            {
                "hash": "0xabc",
                "from": "0xaaaa000000000000000000000000000000000001",
                "to": "0xbbbb000000000000000000000000000000000002",
                "value": "1000",
                "timeStamp": "1700000000",
                "isError": "0",
                "gasPrice": "1000000000",
                "gasUsed": "21000"
            }
        ]);
        let rows: Vec<RawNativeTx> = decode_result_rows(value).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hash, "0xabc");
    }

    #[test]
    fn test_message_string_result_is_empty_feed() {
        let value = serde_json::json!("No transactions found");
        let rows: Vec<RawNativeTx> = decode_result_rows(value).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_array_is_decode_error() {
        let value = serde_json::json!([{"nonsense": true}]);
        let rows: Result<Vec<RawNativeTx>, _> = decode_result_rows(value);
        assert!(matches!(rows, Err(FetchError::Decode(_))));
    }
}
