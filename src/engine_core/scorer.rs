//! Composite engagement scoring
//!
//! Combines six summary-derived inputs into a single integer in [0, 100].
//! Each sub-score is `min(raw / target, 1)`; the weighted sum uses a fixed
//! weight vector that sums to exactly 1.0. Targets and weights live in
//! [`ScoreConfig`] so callers can override them; they encode a judgment
//! call about "engagement" with no external ground truth, and the result is
//! an estimate only. It must never gate access or money.

use super::aggregator::ActivitySummary;
use serde::{Deserialize, Serialize};

/// Normalization targets and weights for the six sub-scores.
///
/// Weights must sum to 1.0; [`EngagementScorer::new`] checks this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Total transaction count (native + fungible-token) that earns a full
    /// transaction sub-score.
    pub tx_count_target: f64,
    pub token_transfer_target: f64,
    /// Native volume in display currency (e.g. USD) for a full volume score.
    pub volume_display_target: f64,
    pub peer_target: f64,
    pub active_day_target: f64,
    /// Held native balance, in native units.
    pub balance_target: f64,

    pub tx_count_weight: f64,
    pub token_transfer_weight: f64,
    pub volume_weight: f64,
    pub peer_weight: f64,
    pub active_day_weight: f64,
    pub balance_weight: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            tx_count_target: 50.0,
            token_transfer_target: 50.0,
            volume_display_target: 1000.0,
            peer_target: 25.0,
            active_day_target: 20.0,
            balance_target: 1.0,

            tx_count_weight: 0.20,
            token_transfer_weight: 0.15,
            volume_weight: 0.25,
            peer_weight: 0.15,
            active_day_weight: 0.15,
            balance_weight: 0.10,
        }
    }
}

impl ScoreConfig {
    pub fn weight_sum(&self) -> f64 {
        self.tx_count_weight
            + self.token_transfer_weight
            + self.volume_weight
            + self.peer_weight
            + self.active_day_weight
            + self.balance_weight
    }
}

/// The six raw inputs the score is computed from. Optional cycle data
/// (price, balance) that failed to fetch degrades to 0.0 here rather than
/// blocking the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub total_tx_count: f64,
    pub token_transfer_count: f64,
    pub native_volume_display: f64,
    pub unique_peer_count: f64,
    pub active_day_count: f64,
    pub balance_native: f64,
}

impl ScoreInputs {
    pub fn from_summary(
        summary: &ActivitySummary,
        price_display: Option<f64>,
        balance_native: Option<f64>,
    ) -> Self {
        Self {
            total_tx_count: (summary.native_tx_count + summary.token_transfer_count) as f64,
            token_transfer_count: summary.token_transfer_count as f64,
            native_volume_display: price_display
                .map(|p| summary.native_total * p)
                .unwrap_or(0.0),
            unique_peer_count: summary.unique_peer_count as f64,
            active_day_count: summary.distinct_active_days as f64,
            balance_native: balance_native.unwrap_or(0.0),
        }
    }
}

pub struct EngagementScorer {
    config: ScoreConfig,
}

impl EngagementScorer {
    /// Panics if the weight vector does not sum to 1.0 (within float
    /// tolerance); a misconfigured vector would silently skew every score.
    pub fn new(config: ScoreConfig) -> Self {
        let sum = config.weight_sum();
        assert!(
            (sum - 1.0).abs() < 1e-9,
            "score weights must sum to 1.0, got {}",
            sum
        );
        Self { config }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Compute the composite score. Monotonic non-decreasing in each input,
    /// always in [0, 100].
    pub fn score(&self, inputs: &ScoreInputs) -> u8 {
        let c = &self.config;
        let weighted = sub_score(inputs.total_tx_count, c.tx_count_target) * c.tx_count_weight
            + sub_score(inputs.token_transfer_count, c.token_transfer_target)
                * c.token_transfer_weight
            + sub_score(inputs.native_volume_display, c.volume_display_target) * c.volume_weight
            + sub_score(inputs.unique_peer_count, c.peer_target) * c.peer_weight
            + sub_score(inputs.active_day_count, c.active_day_target) * c.active_day_weight
            + sub_score(inputs.balance_native, c.balance_target) * c.balance_weight;

        (weighted * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

fn sub_score(raw: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (raw.max(0.0) / target).min(1.0)
}

/// One suggested engagement criterion: a fixed pass/fail rule over the same
/// summary fields the score uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub label: String,
    pub pass: bool,
}

/// The checklist shown alongside the score. Volume is in display currency
/// and treated as 0 when the price feed was unavailable.
pub fn suggested_criteria(
    summary: &ActivitySummary,
    native_volume_display: Option<f64>,
) -> Vec<Criterion> {
    let total_txs = summary.native_tx_count + summary.token_transfer_count;
    let volume = native_volume_display.unwrap_or(0.0);
    vec![
        Criterion {
            label: "At least 25 total txs in lookback".to_string(),
            pass: total_txs >= 25,
        },
        Criterion {
            label: ">= $250 native volume moved".to_string(),
            pass: volume >= 250.0,
        },
        Criterion {
            label: "Interact with >= 10 unique addresses".to_string(),
            pass: summary.unique_peer_count >= 10,
        },
        Criterion {
            label: "Be active on >= 10 distinct days".to_string(),
            pass: summary.distinct_active_days >= 10,
        },
        Criterion {
            label: "Include >= 5 token transfers".to_string(),
            pass: summary.token_transfer_count >= 5,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_inputs() -> ScoreInputs {
        ScoreInputs {
            total_tx_count: 0.0,
            token_transfer_count: 0.0,
            native_volume_display: 0.0,
            unique_peer_count: 0.0,
            active_day_count: 0.0,
            balance_native: 0.0,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoreConfig::default().weight_sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_activity_scores_zero() {
        let scorer = EngagementScorer::new(ScoreConfig::default());
        assert_eq!(scorer.score(&zero_inputs()), 0);
    }

    #[test]
    fn test_saturated_activity_scores_hundred() {
        let scorer = EngagementScorer::new(ScoreConfig::default());
        let inputs = ScoreInputs {
            total_tx_count: 10_000.0,
            token_transfer_count: 10_000.0,
            native_volume_display: 1e9,
            unique_peer_count: 10_000.0,
            active_day_count: 365.0,
            balance_native: 100.0,
        };
        assert_eq!(scorer.score(&inputs), 100);
    }

    #[test]
    fn test_monotonic_in_each_input() {
        let scorer = EngagementScorer::new(ScoreConfig::default());
        let base = ScoreInputs {
            total_tx_count: 10.0,
            token_transfer_count: 10.0,
            native_volume_display: 100.0,
            unique_peer_count: 5.0,
            active_day_count: 5.0,
            balance_native: 0.1,
        };
        let base_score = scorer.score(&base);

        let bumps: [fn(&mut ScoreInputs); 6] = [
            |i| i.total_tx_count += 100.0,
            |i| i.token_transfer_count += 100.0,
            |i| i.native_volume_display += 10_000.0,
            |i| i.unique_peer_count += 100.0,
            |i| i.active_day_count += 100.0,
            |i| i.balance_native += 10.0,
        ];
        for bump in bumps {
            let mut inputs = base;
            bump(&mut inputs);
            let bumped = scorer.score(&inputs);
            assert!(bumped >= base_score, "score must not decrease");
            assert!(bumped <= 100);
        }
    }

    #[test]
    fn test_mid_range_score() {
        let scorer = EngagementScorer::new(ScoreConfig::default());
        // Exactly half of every target.
        let inputs = ScoreInputs {
            total_tx_count: 25.0,
            token_transfer_count: 25.0,
            native_volume_display: 500.0,
            unique_peer_count: 12.5,
            active_day_count: 10.0,
            balance_native: 0.5,
        };
        assert_eq!(scorer.score(&inputs), 50);
    }

    #[test]
    #[should_panic(expected = "must sum to 1.0")]
    fn test_bad_weight_vector_rejected() {
        let mut config = ScoreConfig::default();
        config.balance_weight = 0.5;
        EngagementScorer::new(config);
    }

    #[test]
    fn test_missing_optional_data_degrades_to_zero() {
        let summary = ActivitySummary {
            native_inflow: 1.0,
            native_outflow: 1.0,
            native_total: 2.0,
            native_tx_count: 2,
            fee_spent_native: 0.0,
            unique_peer_count: 1,
            distinct_active_days: 1,
            contracts_deployed: 0,
            token_transfer_count: 0,
            nft_transfer_count: 0,
            bridged_native_inflow: 0.0,
            bridged_token_inflows: vec![],
            token_ledgers: vec![],
        };
        let inputs = ScoreInputs::from_summary(&summary, None, None);
        assert_eq!(inputs.native_volume_display, 0.0);
        assert_eq!(inputs.balance_native, 0.0);
        assert_eq!(inputs.total_tx_count, 2.0);
    }

    #[test]
    fn test_criteria_pass_and_fail() {
        let summary = ActivitySummary {
            native_inflow: 10.0,
            native_outflow: 5.0,
            native_total: 15.0,
            native_tx_count: 30,
            fee_spent_native: 0.0,
            unique_peer_count: 12,
            distinct_active_days: 4,
            contracts_deployed: 0,
            token_transfer_count: 6,
            nft_transfer_count: 0,
            bridged_native_inflow: 0.0,
            bridged_token_inflows: vec![],
            token_ledgers: vec![],
        };
        // Volume arrives already converted: 15 native at a $100 spot price.
        let criteria = suggested_criteria(&summary, Some(summary.native_total * 100.0));
        assert_eq!(criteria.len(), 5);
        assert!(criteria[0].pass); // 36 total txs
        assert!(criteria[1].pass); // $1500 volume
        assert!(criteria[2].pass); // 12 peers
        assert!(!criteria[3].pass); // 4 days
        assert!(criteria[4].pass); // 6 token transfers

        // The argument is display volume, not the spot price itself: a bare
        // $100 is below the $250 bar.
        let sub_threshold = suggested_criteria(&summary, Some(100.0));
        assert!(!sub_threshold[1].pass);

        // No price feed: volume criterion cannot pass.
        let without_price = suggested_criteria(&summary, None);
        assert!(!without_price[1].pass);
    }
}
