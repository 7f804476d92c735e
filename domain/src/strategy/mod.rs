//! Multi-model strategy domain
//!
//! Strategy kinds, the scoring function shared by best-of-n and `best`
//! selection, consensus clustering and the reduced result type.

pub mod consensus;
pub mod kind;
pub mod outcome;
pub mod scoring;

pub use consensus::{ConsensusOutcome, ConsensusSummary, cluster_answers};
pub use kind::{DEFAULT_CONSENSUS_THRESHOLD, Strategy, StrategyRequest};
pub use outcome::{CallFailure, MultiCallResult};
pub use scoring::{ScoreBreakdown, ScoreWeights, rank};
