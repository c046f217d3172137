//! chainscope-core: deterministic integration assessment for blockchains.
//!
//! Classifies a chain name against an ordered rule table, scores market
//! opportunity and priority, and renders the narrative that goes with it.
//! Nothing in this crate performs I/O and every operation is total.
//!
//! # Public API
//!
//! - [`classify()`] -- first-match rule lookup with a MEDIUM fallback
//! - [`assess()`] -- full pipeline over a [`ChainSnapshot`]
//! - [`Assessor`] -- pipeline bound to an injected [`HistorySource`]
//! - [`priority_score()`] -- four-part 0-100 score
//! - [`priority_for()`] -- complexity × opportunity priority table

pub mod assessment;
pub mod format;
pub mod history;
pub mod narrative;
pub mod priority;
pub mod rules;
pub mod score;
pub mod snapshot;

// ── Convenience re-exports: key types ────────────────────────────────

pub use assessment::{Assessment, Assessor};
pub use history::{
    ChainFamily, HistorySource, HistoryStats, IntegrationHistory, IntegrationRecord,
    IntegrationStatus, StaticHistory,
};
pub use narrative::Narrative;
pub use priority::{MarketStanding, Priority};
pub use rules::{Classification, ComplexityLevel, ComplexityRule};
pub use score::{PriorityScore, Rating, ScoreBreakdown};
pub use snapshot::ChainSnapshot;

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use assessment::{assess, supported_assessment};
pub use format::format_tvl;
pub use priority::{market_opportunity, priority_for};
pub use rules::{classify, rules};
pub use score::{compare_priorities, priority_score};
