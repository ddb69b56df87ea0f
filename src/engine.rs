//! One fetch-and-aggregate cycle
//!
//! A cycle validates the subject address, issues the independent explorer
//! fetches concurrently, and runs the pure pipeline (normalize -> classify
//! -> aggregate -> score) over whatever survives the lookback window.
//!
//! Optional feeds (balance, spot price) may fail; their fields degrade to
//! None and the score treats them as zero. The three transfer feeds are
//! required: if one fails after retries, the whole cycle aborts with an
//! error naming the source.
//!
//! Overlapping cycles: every cycle carries a sequence number from a shared
//! [`CycleCounter`], and [`Session::commit`] discards any report whose
//! sequence is no longer the latest issued. A slow stale cycle can never
//! overwrite a newer one.

use crate::config::Config;
use crate::engine_core::aggregator::{aggregate, ActivitySummary, TokenLedger};
use crate::engine_core::classifier::{ClassifiedRecord, Classifier, KnownContracts};
use crate::engine_core::normalizer::{
    normalize_native, normalize_nft, normalize_token, NormalizeStats, TransferKind,
};
use crate::engine_core::paginator::{paginate, Page};
use crate::engine_core::scorer::{
    suggested_criteria, Criterion, EngagementScorer, ScoreConfig, ScoreInputs,
};
use crate::explorer_core::client::ExplorerApi;
use crate::explorer_core::price::PriceSource;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
pub enum CycleError {
    InvalidAddress(String),
    Source { source: &'static str, message: String },
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::InvalidAddress(addr) => {
                write!(f, "not a valid 0x address: {}", addr)
            }
            CycleError::Source { source, message } => {
                write!(f, "failed to fetch {}: {}", source, message)
            }
        }
    }
}

impl std::error::Error for CycleError {}

/// 20-byte hex address with the 0x marker, any case.
pub fn is_valid_address(s: &str) -> bool {
    let s = s.trim();
    s.len() == 42
        && s.starts_with("0x")
        && hex::decode(&s[2..]).map(|b| b.len() == 20).unwrap_or(false)
}

/// The subset of [`Config`] a cycle needs.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub lookback_days: u32,
    pub score: ScoreConfig,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            score: ScoreConfig::default(),
        }
    }
}

impl From<&Config> for CycleConfig {
    fn from(config: &Config) -> Self {
        Self {
            lookback_days: config.lookback_days,
            score: config.score.clone(),
        }
    }
}

/// Everything one completed cycle produced. A plain value: owned by the
/// cycle that computed it and replaced wholesale by the next one.
#[derive(Debug, Clone, Serialize)]
pub struct WalletReport {
    pub address: String,
    pub sequence: u64,
    pub since: i64,
    pub lookback_days: u32,
    pub summary: ActivitySummary,
    pub score: u8,
    pub score_inputs: ScoreInputs,
    pub criteria: Vec<Criterion>,
    /// Spot price in display currency, when the feed answered.
    pub price_display: Option<f64>,
    /// Held native balance, when the feed answered.
    pub balance_native: Option<f64>,
    pub dropped_records: u64,
    /// Non-failed native transfers inside the window, provider order.
    pub native_records: Vec<ClassifiedRecord>,
}

impl WalletReport {
    pub fn native_page(&self, page: usize, page_size: usize) -> Page<'_, ClassifiedRecord> {
        paginate(&self.native_records, page, page_size)
    }

    pub fn token_page(&self, page: usize, page_size: usize) -> Page<'_, TokenLedger> {
        paginate(&self.summary.token_ledgers, page, page_size)
    }

    pub fn native_volume_display(&self) -> Option<f64> {
        self.price_display.map(|p| self.summary.native_total * p)
    }
}

/// Run one cycle against the given collaborators. Pure apart from the
/// fetches themselves; the stale-cycle guard lives in [`Session`].
pub async fn run_cycle(
    explorer: &dyn ExplorerApi,
    price: &dyn PriceSource,
    contracts: &KnownContracts,
    config: &CycleConfig,
    address: &str,
    sequence: u64,
) -> Result<WalletReport, CycleError> {
    if !is_valid_address(address) {
        return Err(CycleError::InvalidAddress(address.to_string()));
    }
    let subject = address.trim().to_lowercase();
    let since = chrono::Utc::now().timestamp() - config.lookback_days as i64 * 86_400;

    log::info!(
        "cycle {}: fetching activity for {} (lookback {} days)",
        sequence,
        subject,
        config.lookback_days
    );

    let (native_res, token_res, nft_res, balance_res, spot) = tokio::join!(
        explorer.native_transfers(&subject),
        explorer.token_transfers(&subject),
        explorer.nft_transfers(&subject),
        explorer.balance(&subject),
        price.spot(),
    );

    let raw_native = native_res.map_err(|e| CycleError::Source {
        source: "native transfer list",
        message: e.to_string(),
    })?;
    let raw_token = token_res.map_err(|e| CycleError::Source {
        source: "token transfer list",
        message: e.to_string(),
    })?;
    let raw_nft = nft_res.map_err(|e| CycleError::Source {
        source: "non-fungible transfer list",
        message: e.to_string(),
    })?;

    let balance_native = match balance_res {
        Ok(raw) => decode_balance(&raw),
        Err(e) => {
            log::warn!("balance unavailable: {}", e);
            None
        }
    };

    let mut stats = NormalizeStats::new();
    let classifier = Classifier::new(&subject, contracts);
    let mut records: Vec<ClassifiedRecord> = Vec::new();

    for raw in &raw_native {
        if let Some(rec) = normalize_native(raw, &mut stats) {
            if rec.failed || rec.timestamp < since {
                continue;
            }
            records.push(classifier.classify(rec));
        }
    }
    for raw in &raw_token {
        if let Some(rec) = normalize_token(raw, &mut stats) {
            if rec.timestamp >= since {
                records.push(classifier.classify(rec));
            }
        }
    }
    for raw in &raw_nft {
        if let Some(rec) = normalize_nft(raw, &mut stats) {
            if rec.timestamp >= since {
                records.push(classifier.classify(rec));
            }
        }
    }

    if stats.dropped > 0 {
        log::warn!(
            "cycle {}: dropped {} malformed records during normalization",
            sequence,
            stats.dropped
        );
    }

    let summary = aggregate(&records, &subject);
    let score_inputs = ScoreInputs::from_summary(&summary, spot, balance_native);
    let score = EngagementScorer::new(config.score.clone()).score(&score_inputs);
    let criteria = suggested_criteria(&summary, spot.map(|p| summary.native_total * p));

    let native_records: Vec<ClassifiedRecord> = records
        .into_iter()
        .filter(|r| r.record.kind == TransferKind::Native)
        .collect();

    log::info!(
        "cycle {}: {} native / {} token / {} nft records, score {}",
        sequence,
        summary.native_tx_count,
        summary.token_transfer_count,
        summary.nft_transfer_count,
        score
    );

    Ok(WalletReport {
        address: subject,
        sequence,
        since,
        lookback_days: config.lookback_days,
        summary,
        score,
        score_inputs,
        criteria,
        price_display: spot,
        balance_native,
        dropped_records: stats.dropped,
        native_records,
    })
}

/// Wei string to native units, or None for anything non-numeric.
fn decode_balance(raw: &str) -> Option<f64> {
    let wei: u128 = raw.trim().parse().ok()?;
    Some(wei as f64 / 1e18)
}

/// Monotonically increasing cycle sequence. `begin` issues the next
/// sequence; `is_current` is true only for the latest issued one.
#[derive(Debug, Default)]
pub struct CycleCounter {
    issued: AtomicU64,
}

impl CycleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == sequence
    }
}

/// Holds the latest committed report across user-triggered cycles.
///
/// The committed value is replaced wholesale; there is no shared mutable
/// aggregate to lock beyond the replacement itself.
#[derive(Debug, Default)]
pub struct Session {
    counter: CycleCounter,
    latest: Mutex<Option<WalletReport>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self) -> &CycleCounter {
        &self.counter
    }

    /// Run a full cycle and commit it. Returns Ok(None) when the result was
    /// stale on arrival (a newer cycle started while this one was in
    /// flight) and had to be discarded.
    pub async fn check(
        &self,
        explorer: &dyn ExplorerApi,
        price: &dyn PriceSource,
        contracts: &KnownContracts,
        config: &CycleConfig,
        address: &str,
    ) -> Result<Option<WalletReport>, CycleError> {
        let sequence = self.counter.begin();
        let report = run_cycle(explorer, price, contracts, config, address, sequence).await?;
        Ok(self.commit(report))
    }

    /// Commit a finished report unless it has been superseded.
    pub fn commit(&self, report: WalletReport) -> Option<WalletReport> {
        if !self.counter.is_current(report.sequence) {
            log::debug!(
                "discarding stale cycle {} for {}",
                report.sequence,
                report.address
            );
            return None;
        }
        let mut latest = self.latest.lock().unwrap();
        *latest = Some(report.clone());
        Some(report)
    }

    pub fn latest(&self) -> Option<WalletReport> {
        self.latest.lock().unwrap().clone()
    }
}
