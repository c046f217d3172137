//! Market-opportunity category and the complexity × opportunity priority table.

use serde::{Deserialize, Serialize};

use crate::rules::ComplexityLevel;
use crate::snapshot::ChainSnapshot;

/// Market-opportunity category.
///
/// `Supported` is the sentinel emitted by the already-supported override;
/// it never comes out of [`market_opportunity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStanding {
    Critical,
    High,
    Medium,
    Low,
    Supported,
}

impl MarketStanding {
    pub fn as_str(self) -> &'static str {
        match self {
            MarketStanding::Critical => "CRITICAL",
            MarketStanding::High => "HIGH",
            MarketStanding::Medium => "MEDIUM",
            MarketStanding::Low => "LOW",
            MarketStanding::Supported => "SUPPORTED",
        }
    }
}

impl std::fmt::Display for MarketStanding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority, P0 most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;

/// Categorize market opportunity from raw TVL and rank.
///
/// Unknown TVL is always LOW, even with a rank. Otherwise each tier is
/// reached by TVL or by rank, whichever qualifies.
pub fn market_opportunity(snapshot: &ChainSnapshot) -> MarketStanding {
    let Some(tvl) = snapshot.known_tvl() else {
        return MarketStanding::Low;
    };
    let rank_within = |limit: u32| snapshot.known_rank().is_some_and(|r| r <= limit);

    if tvl > 10.0 * BILLION || rank_within(5) {
        MarketStanding::Critical
    } else if tvl > 2.0 * BILLION || rank_within(15) {
        MarketStanding::High
    } else if tvl > 500.0 * MILLION || rank_within(30) {
        MarketStanding::Medium
    } else {
        MarketStanding::Low
    }
}

static PRIORITY_TABLE: &[(ComplexityLevel, MarketStanding, Priority)] = &[
    (ComplexityLevel::Low, MarketStanding::Critical, Priority::P0),
    (ComplexityLevel::Low, MarketStanding::High, Priority::P0),
    (ComplexityLevel::Low, MarketStanding::Medium, Priority::P1),
    (ComplexityLevel::Low, MarketStanding::Low, Priority::P2),
    (ComplexityLevel::Medium, MarketStanding::Critical, Priority::P0),
    (ComplexityLevel::Medium, MarketStanding::High, Priority::P1),
    (ComplexityLevel::Medium, MarketStanding::Medium, Priority::P2),
    (ComplexityLevel::Medium, MarketStanding::Low, Priority::P3),
    (ComplexityLevel::High, MarketStanding::Critical, Priority::P1),
    (ComplexityLevel::High, MarketStanding::High, Priority::P1),
    (ComplexityLevel::High, MarketStanding::Medium, Priority::P2),
    (ComplexityLevel::High, MarketStanding::Low, Priority::P3),
];

/// Look up the priority for a (complexity, opportunity) pair. Pairs absent
/// from the table resolve to P2.
pub fn priority_for(level: ComplexityLevel, standing: MarketStanding) -> Priority {
    PRIORITY_TABLE
        .iter()
        .find(|(l, s, _)| *l == level && *s == standing)
        .map(|(_, _, p)| *p)
        .unwrap_or(Priority::P2)
}
