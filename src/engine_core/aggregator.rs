//! Single-pass aggregation of classified records into an ActivitySummary
//!
//! One [`Aggregator`] folds the full classified record set for a subject and
//! window; each record is visited once. Every accumulation is a commutative
//! sum or a set union, so the finished summary is bit-reproducible for a
//! given record set regardless of input order. Ledger orderings break ties
//! on contract address for the same reason.
//!
//! Failed native transactions are skipped entirely; they contribute to no
//! aggregate, not even the fee total.

use super::classifier::{ClassifiedRecord, Direction};
use super::normalizer::TransferKind;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Wei per native coin, as a float divisor applied once after summation.
const WEI_PER_NATIVE: f64 = 1e18;

/// Per-contract aggregate over fungible-token records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub contract: String,
    pub name: String,
    pub symbol: String,
    pub inflow: f64,
    pub outflow: f64,
    pub total: f64,
    pub transfer_count: u64,
}

/// Root aggregate for one fetch cycle. A value object: recomputed in full
/// every cycle, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub native_inflow: f64,
    pub native_outflow: f64,
    pub native_total: f64,
    pub native_tx_count: u64,
    pub fee_spent_native: f64,
    pub unique_peer_count: u64,
    pub distinct_active_days: u64,
    pub contracts_deployed: u64,
    pub token_transfer_count: u64,
    pub nft_transfer_count: u64,
    pub bridged_native_inflow: f64,
    pub bridged_token_inflows: Vec<TokenLedger>,
    pub token_ledgers: Vec<TokenLedger>,
}

#[derive(Debug, Clone, Default)]
struct LedgerAccum {
    name: String,
    symbol: String,
    inflow: f64,
    outflow: f64,
    count: u64,
}

/// Streaming accumulator: `add` every record, then `finish`.
pub struct Aggregator {
    subject: String,
    native_inflow: f64,
    native_outflow: f64,
    native_tx_count: u64,
    fee_wei: u128,
    peers: HashSet<String>,
    active_days: HashSet<String>,
    contracts_deployed: u64,
    token_transfer_count: u64,
    nft_transfer_count: u64,
    bridged_native_inflow: f64,
    ledgers: HashMap<String, LedgerAccum>,
    bridged_ledgers: HashMap<String, LedgerAccum>,
}

impl Aggregator {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_lowercase(),
            native_inflow: 0.0,
            native_outflow: 0.0,
            native_tx_count: 0,
            fee_wei: 0,
            peers: HashSet::new(),
            active_days: HashSet::new(),
            contracts_deployed: 0,
            token_transfer_count: 0,
            nft_transfer_count: 0,
            bridged_native_inflow: 0.0,
            ledgers: HashMap::new(),
            bridged_ledgers: HashMap::new(),
        }
    }

    pub fn add(&mut self, rec: &ClassifiedRecord) {
        let r = &rec.record;
        if r.failed {
            return;
        }

        self.active_days.insert(day_key(r.timestamp));
        self.add_peer(&r.from);
        if let Some(to) = &r.to {
            self.add_peer(to);
        }

        match r.kind {
            TransferKind::Native => {
                self.native_tx_count += 1;
                match rec.direction {
                    Direction::Inbound => self.native_inflow += r.display_amount,
                    Direction::Outbound => self.native_outflow += r.display_amount,
                }

                // Gas is only paid by the sender; sum in wei, divide once
                // at the end so rounding does not compound per record.
                if r.from == self.subject {
                    if let (Some(price), Some(used)) = (r.gas_price_wei, r.gas_used_units) {
                        self.fee_wei += price * used;
                    }
                }

                let deploys_contract = match r.to.as_deref() {
                    None => true,
                    Some(to) => to == ZERO_ADDRESS,
                };
                if deploys_contract {
                    self.contracts_deployed += 1;
                }

                if rec.direction == Direction::Inbound && rec.counterparty_is_bridge {
                    self.bridged_native_inflow += r.display_amount;
                }
            }
            TransferKind::FungibleToken => {
                self.token_transfer_count += 1;
                let contract = match &r.contract_address {
                    Some(c) => c.clone(),
                    None => return,
                };

                let entry = self.ledgers.entry(contract.clone()).or_insert_with(|| {
                    LedgerAccum {
                        name: r.token_name.clone(),
                        symbol: r.token_symbol.clone(),
                        ..Default::default()
                    }
                });
                entry.count += 1;
                match rec.direction {
                    Direction::Inbound => entry.inflow += r.display_amount,
                    Direction::Outbound => entry.outflow += r.display_amount,
                }

                if rec.direction == Direction::Inbound && rec.counterparty_is_bridge {
                    let bridged = self
                        .bridged_ledgers
                        .entry(contract)
                        .or_insert_with(|| LedgerAccum {
                            name: r.token_name.clone(),
                            symbol: r.token_symbol.clone(),
                            ..Default::default()
                        });
                    bridged.count += 1;
                    bridged.inflow += r.display_amount;
                }
            }
            TransferKind::NonFungibleToken => {
                self.nft_transfer_count += 1;
            }
        }
    }

    pub fn finish(self) -> ActivitySummary {
        ActivitySummary {
            native_inflow: self.native_inflow,
            native_outflow: self.native_outflow,
            native_total: self.native_inflow + self.native_outflow,
            native_tx_count: self.native_tx_count,
            fee_spent_native: self.fee_wei as f64 / WEI_PER_NATIVE,
            unique_peer_count: self.peers.len() as u64,
            distinct_active_days: self.active_days.len() as u64,
            contracts_deployed: self.contracts_deployed,
            token_transfer_count: self.token_transfer_count,
            nft_transfer_count: self.nft_transfer_count,
            bridged_native_inflow: self.bridged_native_inflow,
            bridged_token_inflows: sorted_ledgers(self.bridged_ledgers),
            token_ledgers: sorted_ledgers(self.ledgers),
        }
    }

    fn add_peer(&mut self, address: &str) {
        if address.is_empty() || address == self.subject {
            return;
        }
        self.peers.insert(address.to_string());
    }
}

/// Fold a complete classified record set into one summary.
pub fn aggregate(records: &[ClassifiedRecord], subject: &str) -> ActivitySummary {
    let mut agg = Aggregator::new(subject);
    for rec in records {
        agg.add(rec);
    }
    agg.finish()
}

/// UTC calendar-day bucket, e.g. "2024-3-7" (no zero padding).
fn day_key(timestamp: i64) -> String {
    use chrono::Datelike;
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => format!("{}-{}-{}", dt.year(), dt.month(), dt.day()),
        None => format!("epoch-{}", timestamp),
    }
}

/// Descending by total volume; contract address breaks ties so output is
/// stable across HashMap iteration orders.
fn sorted_ledgers(map: HashMap<String, LedgerAccum>) -> Vec<TokenLedger> {
    let mut ledgers: Vec<TokenLedger> = map
        .into_iter()
        .map(|(contract, acc)| TokenLedger {
            contract,
            name: acc.name,
            symbol: acc.symbol,
            inflow: acc.inflow,
            outflow: acc.outflow,
            total: acc.inflow + acc.outflow,
            transfer_count: acc.count,
        })
        .collect();
    ledgers.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.contract.cmp(&b.contract))
    });
    ledgers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_core::classifier::{Classifier, KnownContracts};
    use crate::engine_core::normalizer::{TransferKind, TransferRecord};

    const SUBJECT: &str = "0xaaaa000000000000000000000000000000000001";
    const PEER: &str = "0xbbbb000000000000000000000000000000000002";
    const PEER2: &str = "0xeeee000000000000000000000000000000000005";
    const TOKEN_A: &str = "0xcccc000000000000000000000000000000000003";
    const TOKEN_B: &str = "0xdddd000000000000000000000000000000000004";
    const BRIDGE: &str = "0x45f1a95a4d3f3836523f5c83673c797f4d4d263b";

    fn base_record(kind: TransferKind, from: &str, to: Option<&str>, amount: f64) -> TransferRecord {
        TransferRecord {
            hash: "0xabc".to_string(),
            from: from.to_string(),
            to: to.map(|s| s.to_string()),
            kind,
            raw_amount: String::new(),
            decimals: 18,
            display_amount: amount,
            timestamp: 1_700_000_000,
            failed: false,
            gas_price_wei: None,
            gas_used_units: None,
            contract_address: None,
            token_symbol: String::new(),
            token_name: String::new(),
            token_id: None,
        }
    }

    fn token_record(from: &str, to: Option<&str>, contract: &str, amount: f64) -> TransferRecord {
        let mut rec = base_record(TransferKind::FungibleToken, from, to, amount);
        rec.contract_address = Some(contract.to_string());
        rec.token_symbol = "TOK".to_string();
        rec.token_name = "Token".to_string();
        rec
    }

    fn classify_all(records: Vec<TransferRecord>, contracts: &KnownContracts) -> Vec<ClassifiedRecord> {
        let classifier = Classifier::new(SUBJECT, contracts);
        records.into_iter().map(|r| classifier.classify(r)).collect()
    }

    #[test]
    fn test_native_volume_split() {
        let contracts = KnownContracts::empty();
        let records = classify_all(
            vec![
                base_record(TransferKind::Native, PEER, Some(SUBJECT), 1.5),
                base_record(TransferKind::Native, SUBJECT, Some(PEER), 0.5),
            ],
            &contracts,
        );
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.native_inflow, 1.5);
        assert_eq!(summary.native_outflow, 0.5);
        assert_eq!(summary.native_total, 2.0);
        assert_eq!(summary.native_tx_count, 2);
    }

    #[test]
    fn test_failed_records_excluded_everywhere() {
        let contracts = KnownContracts::empty();
        let mut failed = base_record(TransferKind::Native, PEER, Some(SUBJECT), 5.0);
        failed.failed = true;
        failed.gas_price_wei = Some(1_000_000_000);
        failed.gas_used_units = Some(21_000);
        let records = classify_all(vec![failed], &contracts);
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.native_tx_count, 0);
        assert_eq!(summary.native_total, 0.0);
        assert_eq!(summary.fee_spent_native, 0.0);
        assert_eq!(summary.unique_peer_count, 0);
        assert_eq!(summary.distinct_active_days, 0);
    }

    #[test]
    fn test_fee_sum_then_divide() {
        let contracts = KnownContracts::empty();
        let mut out1 = base_record(TransferKind::Native, SUBJECT, Some(PEER), 0.1);
        out1.gas_price_wei = Some(1_000_000_000); // 1 gwei
        out1.gas_used_units = Some(21_000);
        let mut out2 = out1.clone();
        out2.gas_used_units = Some(42_000);
        // Inbound: subject did not pay gas.
        let mut incoming = base_record(TransferKind::Native, PEER, Some(SUBJECT), 0.1);
        incoming.gas_price_wei = Some(1_000_000_000);
        incoming.gas_used_units = Some(21_000);

        let records = classify_all(vec![out1, out2, incoming], &contracts);
        let summary = aggregate(&records, SUBJECT);
        assert!((summary.fee_spent_native - 63_000.0 * 1e9 / 1e18).abs() < 1e-15);
    }

    #[test]
    fn test_contract_creation_counted() {
        let contracts = KnownContracts::empty();
        let records = classify_all(
            vec![
                base_record(TransferKind::Native, SUBJECT, None, 0.0),
                base_record(
                    TransferKind::Native,
                    SUBJECT,
                    Some("0x0000000000000000000000000000000000000000"),
                    0.0,
                ),
            ],
            &contracts,
        );
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.contracts_deployed, 2);
    }

    #[test]
    fn test_token_ledgers_grouped_and_sorted() {
        let contracts = KnownContracts::empty();
        let records = classify_all(
            vec![
                token_record(PEER, Some(SUBJECT), TOKEN_A, 10.0),
                token_record(SUBJECT, Some(PEER), TOKEN_A, 4.0),
                token_record(PEER, Some(SUBJECT), TOKEN_B, 100.0),
            ],
            &contracts,
        );
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.token_ledgers.len(), 2);
        assert_eq!(summary.token_transfer_count, 3);

        // Largest total first.
        assert_eq!(summary.token_ledgers[0].contract, TOKEN_B);
        assert_eq!(summary.token_ledgers[0].total, 100.0);
        assert_eq!(summary.token_ledgers[1].contract, TOKEN_A);
        assert_eq!(summary.token_ledgers[1].inflow, 10.0);
        assert_eq!(summary.token_ledgers[1].outflow, 4.0);
        assert_eq!(summary.token_ledgers[1].total, 14.0);
        assert_eq!(summary.token_ledgers[1].transfer_count, 2);

        // Ledger totals cover every non-dropped token amount.
        let ledger_sum: f64 = summary.token_ledgers.iter().map(|l| l.total).sum();
        assert_eq!(ledger_sum, 114.0);
    }

    #[test]
    fn test_peers_exclude_subject() {
        let contracts = KnownContracts::empty();
        let records = classify_all(
            vec![
                base_record(TransferKind::Native, SUBJECT, Some(SUBJECT), 1.0),
                base_record(TransferKind::Native, PEER, Some(SUBJECT), 1.0),
                base_record(TransferKind::Native, PEER2, Some(SUBJECT), 1.0),
            ],
            &contracts,
        );
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.unique_peer_count, 2);
    }

    #[test]
    fn test_active_days_across_kinds() {
        let contracts = KnownContracts::empty();
        let mut native = base_record(TransferKind::Native, PEER, Some(SUBJECT), 1.0);
        native.timestamp = 1_700_000_000; // 2023-11-14
        let mut token = token_record(PEER, Some(SUBJECT), TOKEN_A, 1.0);
        token.timestamp = 1_700_000_500; // same UTC day
        let mut nft = base_record(TransferKind::NonFungibleToken, PEER, Some(SUBJECT), 1.0);
        nft.timestamp = 1_700_100_000; // next UTC day
        let records = classify_all(vec![native, token, nft], &contracts);
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.distinct_active_days, 2);
        assert_eq!(summary.nft_transfer_count, 1);
    }

    #[test]
    fn test_bridged_inflow() {
        let contracts = KnownContracts::base_defaults();
        let mut bridged_token = token_record(BRIDGE, Some(SUBJECT), TOKEN_A, 25.0);
        bridged_token.token_symbol = "USDC".to_string();
        let records = classify_all(
            vec![
                base_record(TransferKind::Native, BRIDGE, Some(SUBJECT), 2.0),
                base_record(TransferKind::Native, PEER, Some(SUBJECT), 1.0),
                // Outbound to the bridge does not count as bridged inflow.
                base_record(TransferKind::Native, SUBJECT, Some(BRIDGE), 9.0),
                bridged_token,
                token_record(PEER, Some(SUBJECT), TOKEN_A, 5.0),
            ],
            &contracts,
        );
        let summary = aggregate(&records, SUBJECT);
        assert_eq!(summary.bridged_native_inflow, 2.0);
        assert_eq!(summary.bridged_token_inflows.len(), 1);
        assert_eq!(summary.bridged_token_inflows[0].inflow, 25.0);
        assert_eq!(summary.bridged_token_inflows[0].transfer_count, 1);
        // The full ledger still carries both transfers.
        assert_eq!(summary.token_ledgers[0].total, 30.0);
    }

    #[test]
    fn test_order_independence() {
        let contracts = KnownContracts::base_defaults();
        let records = classify_all(
            vec![
                base_record(TransferKind::Native, PEER, Some(SUBJECT), 1.5),
                base_record(TransferKind::Native, SUBJECT, Some(PEER), 0.5),
                token_record(PEER, Some(SUBJECT), TOKEN_A, 10.0),
                token_record(PEER2, Some(SUBJECT), TOKEN_B, 10.0),
                base_record(TransferKind::Native, BRIDGE, Some(SUBJECT), 2.0),
            ],
            &contracts,
        );
        let forward = aggregate(&records, SUBJECT);
        let mut reversed = records.clone();
        reversed.reverse();
        let backward = aggregate(&reversed, SUBJECT);

        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );
    }
}
