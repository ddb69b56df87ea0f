//! Record normalization from raw explorer shapes to canonical TransferRecord
//!
//! Blockscout's etherscan-compatible endpoints encode every numeric field as
//! a string (`value`, `timeStamp`, `tokenDecimal`, `gasPrice`, `gasUsed`),
//! and the three transfer kinds carry different field sets. The normalizer
//! resolves all of that at the boundary so downstream stages never branch on
//! loose provider shapes.
//!
//! Records that cannot be decoded (non-numeric amount, missing hash, bad
//! timestamp) are dropped and counted in [`NormalizeStats`]; a malformed
//! record never fabricates a zero-amount entry and never aborts a cycle.

use serde::{Deserialize, Serialize};

/// Native transfer row from `module=account&action=txlist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNativeTx {
    #[serde(default)]
    pub hash: String,
    pub from: String,
    /// Empty or missing for contract creation transactions.
    #[serde(default)]
    pub to: Option<String>,
    /// Amount in wei, as a decimal string.
    pub value: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// "1" marks a failed transaction.
    #[serde(rename = "isError", default)]
    pub is_error: Option<String>,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: Option<String>,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: Option<String>,
}

/// ERC-20 transfer row from `module=account&action=tokentx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTokenTx {
    #[serde(default)]
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "tokenName", default)]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: String,
    /// e.g. "6", "18". Absent or non-numeric falls back to 18.
    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: Option<String>,
    /// Raw integer amount in the token's smallest unit.
    pub value: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

/// ERC-721 transfer row from `module=account&action=tokennfttx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNftTx {
    #[serde(default)]
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "tokenName", default)]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: String,
    #[serde(rename = "tokenID", default)]
    pub token_id: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    Native,
    FungibleToken,
    NonFungibleToken,
}

/// Canonical transfer record, one per raw row that survives decoding.
///
/// Addresses are lowercased; an absent/empty `to` becomes `None` (contract
/// creation). `display_amount` is `raw_amount / 10^decimals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub kind: TransferKind,
    pub raw_amount: String,
    pub decimals: u8,
    pub display_amount: f64,
    pub timestamp: i64,
    pub failed: bool,
    pub gas_price_wei: Option<u128>,
    pub gas_used_units: Option<u128>,
    pub contract_address: Option<String>,
    pub token_symbol: String,
    pub token_name: String,
    pub token_id: Option<String>,
}

/// Counts records dropped during normalization. Never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub dropped: u64,
}

impl NormalizeStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The canonical 18-decimal scaling for native amounts (wei per coin).
pub const NATIVE_DECIMALS: u8 = 18;

const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Decode an integer smallest-unit string to display scale.
///
/// Returns None for anything that is not a plain non-negative integer.
/// Native amounts always fit in u128; ERC-20 amounts are u256 on chain and
/// can overflow it, so digit strings too large for u128 fall back to a
/// float parse. Only display precision is needed at that magnitude.
fn decode_amount(raw: &str, decimals: u8) -> Option<f64> {
    let raw = raw.trim();
    let divisor = 10f64.powi(decimals as i32);
    match raw.parse::<u128>() {
        Ok(units) => Some(units as f64 / divisor),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => {
            raw.parse::<f64>().ok().map(|units| units / divisor)
        }
        Err(_) => None,
    }
}

fn decode_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn lower(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Empty `to` means contract creation; keep it as None.
fn lower_opt(s: &Option<String>) -> Option<String> {
    match s {
        Some(v) if !v.trim().is_empty() => Some(lower(v)),
        _ => None,
    }
}

pub fn normalize_native(raw: &RawNativeTx, stats: &mut NormalizeStats) -> Option<TransferRecord> {
    if raw.hash.trim().is_empty() {
        stats.dropped += 1;
        return None;
    }
    let display_amount = match decode_amount(&raw.value, NATIVE_DECIMALS) {
        Some(v) => v,
        None => {
            stats.dropped += 1;
            return None;
        }
    };
    let timestamp = match decode_timestamp(&raw.time_stamp) {
        Some(t) => t,
        None => {
            stats.dropped += 1;
            return None;
        }
    };

    Some(TransferRecord {
        hash: raw.hash.clone(),
        from: lower(&raw.from),
        to: lower_opt(&raw.to),
        kind: TransferKind::Native,
        raw_amount: raw.value.clone(),
        decimals: NATIVE_DECIMALS,
        display_amount,
        timestamp,
        failed: raw.is_error.as_deref() == Some("1"),
        gas_price_wei: raw.gas_price.as_deref().and_then(|s| s.trim().parse().ok()),
        gas_used_units: raw.gas_used.as_deref().and_then(|s| s.trim().parse().ok()),
        contract_address: None,
        token_symbol: String::new(),
        token_name: String::new(),
        token_id: None,
    })
}

pub fn normalize_token(raw: &RawTokenTx, stats: &mut NormalizeStats) -> Option<TransferRecord> {
    if raw.hash.trim().is_empty() {
        stats.dropped += 1;
        return None;
    }
    let decimals = raw
        .token_decimal
        .as_deref()
        .and_then(|s| s.trim().parse::<u8>().ok())
        .unwrap_or(DEFAULT_TOKEN_DECIMALS);
    let display_amount = match decode_amount(&raw.value, decimals) {
        Some(v) => v,
        None => {
            stats.dropped += 1;
            return None;
        }
    };
    let timestamp = match decode_timestamp(&raw.time_stamp) {
        Some(t) => t,
        None => {
            stats.dropped += 1;
            return None;
        }
    };

    Some(TransferRecord {
        hash: raw.hash.clone(),
        from: lower(&raw.from),
        to: lower_opt(&raw.to),
        kind: TransferKind::FungibleToken,
        raw_amount: raw.value.clone(),
        decimals,
        display_amount,
        timestamp,
        failed: false,
        gas_price_wei: None,
        gas_used_units: None,
        contract_address: Some(lower(&raw.contract_address)),
        token_symbol: raw.token_symbol.clone(),
        token_name: raw.token_name.clone(),
        token_id: None,
    })
}

pub fn normalize_nft(raw: &RawNftTx, stats: &mut NormalizeStats) -> Option<TransferRecord> {
    if raw.hash.trim().is_empty() {
        stats.dropped += 1;
        return None;
    }
    let timestamp = match decode_timestamp(&raw.time_stamp) {
        Some(t) => t,
        None => {
            stats.dropped += 1;
            return None;
        }
    };

    // One ERC-721 transfer moves exactly one token.
    Some(TransferRecord {
        hash: raw.hash.clone(),
        from: lower(&raw.from),
        to: lower_opt(&raw.to),
        kind: TransferKind::NonFungibleToken,
        raw_amount: "1".to_string(),
        decimals: 0,
        display_amount: 1.0,
        timestamp,
        failed: false,
        gas_price_wei: None,
        gas_used_units: None,
        contract_address: Some(lower(&raw.contract_address)),
        token_symbol: raw.token_symbol.clone(),
        token_name: raw.token_name.clone(),
        token_id: Some(raw.token_id.clone()),
    })
}
