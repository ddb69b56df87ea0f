//! Engine Core - Activity Aggregation and Scoring
//!
//! Pure computation over one address's transaction records. No I/O lives
//! here; raw records come in from `explorer_core` and results go out as
//! plain values.
//!
//! # Architecture
//!
//! ```text
//! Raw explorer records → Normalizer (canonical TransferRecord)
//!     ↓
//! Classifier (direction + bridge recognition)
//!     ↓
//! Aggregator (ActivitySummary: volumes, ledgers, peers, days, fees)
//!     ↓
//! EngagementScorer (composite 0-100 score)
//!
//! Paginator (windowed views over native records / token ledgers)
//! ```
//!
//! Every stage is a pure function of its inputs: running the same record
//! set through the chain twice yields byte-identical output regardless of
//! input order.

pub mod aggregator;
pub mod classifier;
pub mod normalizer;
pub mod paginator;
pub mod scorer;

pub use aggregator::{aggregate, ActivitySummary, Aggregator, TokenLedger};
pub use classifier::{
    ClassifiedRecord, Classifier, Direction, KnownContracts, LabelCache, MemoryLabelCache,
};
pub use normalizer::{
    NormalizeStats, RawNativeTx, RawNftTx, RawTokenTx, TransferKind, TransferRecord,
};
pub use paginator::{paginate, Page};
pub use scorer::{suggested_criteria, Criterion, EngagementScorer, ScoreConfig, ScoreInputs};
