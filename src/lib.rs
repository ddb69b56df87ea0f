//! WalletFlow - Wallet Activity Aggregation Engine
//!
//! Consumes paginated explorer transaction feeds (native transfers, ERC-20
//! transfers, ERC-721 transfers, balance) for a single address and derives
//! a deterministic activity summary plus a composite engagement score.
//!
//! The heavy lifting lives in `engine_core` (pure, no I/O); `explorer_core`
//! wraps the Blockscout-compatible HTTP API and the spot price feed; `engine`
//! ties one fetch-and-aggregate cycle together.

pub mod engine_core;
pub mod explorer_core;

pub mod config;
pub mod engine;

pub use engine::{run_cycle, CycleConfig, CycleCounter, CycleError, Session, WalletReport};
pub use engine_core::{
    aggregate, paginate, ActivitySummary, ClassifiedRecord, Classifier, Direction,
    EngagementScorer, KnownContracts, NormalizeStats, Page, ScoreConfig, ScoreInputs,
    TokenLedger, TransferKind, TransferRecord,
};
