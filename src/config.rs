//! Environment-backed configuration
//!
//! All knobs come from the environment (with `.env` support in the binary).
//! Score targets and weights are deliberately configuration, not constants:
//! they encode a judgment call about engagement, so deployments can tune
//! them without touching code.

use crate::engine_core::scorer::ScoreConfig;
use std::env;

const DEFAULT_EXPLORER_URL: &str = "https://base.blockscout.com/api";
const DEFAULT_PRICE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=base-eth&vs_currencies=usd";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub explorer_url: String,
    pub price_url: String,
    pub price_coin_id: String,
    pub price_vs_currency: String,
    /// Lookback window in days, clamped to 1..=365.
    pub lookback_days: u32,
    pub page_size: usize,
    pub max_pages: usize,
    pub max_retries: u32,
    pub score: ScoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let explorer_url =
            env::var("EXPLORER_API_URL").unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string());
        if !explorer_url.starts_with("http://") && !explorer_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "EXPLORER_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let price_url = env::var("PRICE_API_URL").unwrap_or_else(|_| DEFAULT_PRICE_URL.to_string());

        let lookback_days = env::var("LOOKBACK_DAYS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(30)
            .clamp(1, 365);

        let page_size = env::var("EXPLORER_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(100)
            .max(1);

        let max_pages = env::var("EXPLORER_MAX_PAGES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(25)
            .max(1);

        let max_retries = env::var("EXPLORER_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);

        let score = score_config_from_env()?;

        Ok(Self {
            explorer_url,
            price_url,
            price_coin_id: env::var("PRICE_COIN_ID").unwrap_or_else(|_| "base-eth".to_string()),
            price_vs_currency: env::var("PRICE_VS_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            lookback_days,
            page_size,
            max_pages,
            max_retries,
            score,
        })
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(default)
}

/// Score targets/weights, overridable via SCORE_* variables. The weight
/// vector must still sum to 1.0 after overrides.
fn score_config_from_env() -> Result<ScoreConfig, ConfigError> {
    let defaults = ScoreConfig::default();
    let score = ScoreConfig {
        tx_count_target: env_f64("SCORE_TX_TARGET", defaults.tx_count_target),
        token_transfer_target: env_f64("SCORE_TOKEN_TARGET", defaults.token_transfer_target),
        volume_display_target: env_f64("SCORE_VOLUME_TARGET", defaults.volume_display_target),
        peer_target: env_f64("SCORE_PEER_TARGET", defaults.peer_target),
        active_day_target: env_f64("SCORE_DAY_TARGET", defaults.active_day_target),
        balance_target: env_f64("SCORE_BALANCE_TARGET", defaults.balance_target),
        tx_count_weight: env_f64("SCORE_TX_WEIGHT", defaults.tx_count_weight),
        token_transfer_weight: env_f64("SCORE_TOKEN_WEIGHT", defaults.token_transfer_weight),
        volume_weight: env_f64("SCORE_VOLUME_WEIGHT", defaults.volume_weight),
        peer_weight: env_f64("SCORE_PEER_WEIGHT", defaults.peer_weight),
        active_day_weight: env_f64("SCORE_DAY_WEIGHT", defaults.active_day_weight),
        balance_weight: env_f64("SCORE_BALANCE_WEIGHT", defaults.balance_weight),
    };

    let sum = score.weight_sum();
    if (sum - 1.0).abs() > 1e-9 {
        return Err(ConfigError::InvalidValue(format!(
            "SCORE_*_WEIGHT values must sum to 1.0, got {}",
            sum
        )));
    }
    Ok(score)
}
