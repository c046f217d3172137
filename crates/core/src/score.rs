//! Four-part priority score.
//!
//! The total is the capped sum of market opportunity, technical
//! feasibility, strategic value and urgency. It is reported alongside the
//! priority lookup and never feeds into it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::format::format_tvl;
use crate::rules::{normalize, ComplexityLevel};
use crate::snapshot::ChainSnapshot;

/// Chains with strong community demand.
pub static HIGH_PROFILE_CHAINS: &[&str] = &["berachain", "movement", "hyperliquid", "monad"];
/// Chains whose mainnet is live with high adoption.
pub static IMMEDIATE_CHAINS: &[&str] = &["berachain", "movement", "hyperliquid"];
/// Chains with significant funding or anticipation.
pub static NEAR_TERM_CHAINS: &[&str] = &["monad", "starknet"];

const MOVE_MARKERS: &[&str] = &["move", "aptos", "sui"];
const ZK_MARKERS: &[&str] = &["zk", "stark"];

const STRATEGIC_CAP: u32 = 25;
const URGENCY_CAP: u32 = 20;
const TOTAL_CAP: u32 = 100;

/// Qualitative rating of a priority score total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Critical,
    High,
    Medium,
    Low,
}

impl Rating {
    pub fn from_total(total: u32) -> Self {
        match total {
            80.. => Rating::Critical,
            60..=79 => Rating::High,
            40..=59 => Rating::Medium,
            _ => Rating::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Critical => "CRITICAL",
            Rating::High => "HIGH",
            Rating::Medium => "MEDIUM",
            Rating::Low => "LOW",
        }
    }

    /// What to do with a chain at this rating.
    pub fn recommended_action(self) -> &'static str {
        match self {
            Rating::Critical => {
                "START IMMEDIATELY - Allocate team resources and begin integration sprint"
            }
            Rating::High => "PRIORITIZE - Add to next quarter roadmap with dedicated resources",
            Rating::Medium => "MONITOR - Track growth metrics and revisit in 1-2 quarters",
            Rating::Low => "BACKLOG - Keep on radar but no immediate action needed",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub market_opportunity: u32,
    pub technical_feasibility: u32,
    pub strategic_value: u32,
    pub urgency: u32,
}

impl ScoreBreakdown {
    pub fn sum(&self) -> u32 {
        self.market_opportunity + self.technical_feasibility + self.strategic_value + self.urgency
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityScore {
    pub total: u32,
    pub breakdown: ScoreBreakdown,
    pub rating: Rating,
    pub reasoning: Vec<String>,
}

impl PriorityScore {
    pub fn recommended_action(&self) -> &'static str {
        self.rating.recommended_action()
    }
}

/// Score a chain of the given complexity.
pub fn priority_score(level: ComplexityLevel, snapshot: &ChainSnapshot) -> PriorityScore {
    let name = normalize(&snapshot.name);
    let tvl = snapshot.known_tvl();
    let mut reasoning = Vec::new();

    // ── Market opportunity ───────────────────────────────────────────
    let mut market = 0;
    if let Some(tvl) = tvl {
        let shown = format_tvl(tvl);
        if tvl > 10_000_000_000.0 {
            market += 30;
            reasoning.push(format!("Massive TVL of {shown} indicates huge market"));
        } else if tvl > 1_000_000_000.0 {
            market += 20;
            reasoning.push(format!("Strong TVL of {shown}"));
        } else if tvl > 100_000_000.0 {
            market += 10;
            reasoning.push(format!("Moderate TVL of {shown}"));
        } else {
            market += 5;
            reasoning.push(format!("Emerging market with {shown} TVL"));
        }
    }
    match snapshot.protocols {
        Some(p) if p > 100 => {
            market += 5;
            reasoning.push(format!("Rich ecosystem with {p}+ active protocols"));
        }
        Some(p) if p > 50 => market += 3,
        Some(p) if p > 20 => market += 2,
        _ => {}
    }

    // ── Technical feasibility ────────────────────────────────────────
    let technical = match level {
        ComplexityLevel::Low => {
            reasoning.push("LOW complexity - quick integration possible (2-4 weeks)".to_string());
            25
        }
        ComplexityLevel::Medium => {
            reasoning.push("MEDIUM complexity - moderate effort required (6-8 weeks)".to_string());
            15
        }
        ComplexityLevel::High => {
            reasoning
                .push("HIGH complexity - significant development needed (3-6 months)".to_string());
            5
        }
    };

    // ── Strategic value ──────────────────────────────────────────────
    let mut strategic = 0;
    if HIGH_PROFILE_CHAINS.contains(&name.as_str()) {
        strategic += 15;
        reasoning.push("High-profile chain with strong community demand".to_string());
    }
    match snapshot.known_rank() {
        Some(rank) if rank <= 10 => {
            strategic += 10;
            reasoning.push(format!("Top {rank} chain globally - strategic importance"));
        }
        Some(rank) if rank <= 25 => {
            strategic += 7;
            reasoning.push("Top 25 chain - good strategic fit".to_string());
        }
        Some(rank) if rank <= 50 => strategic += 4,
        _ => {}
    }
    if MOVE_MARKERS.iter().any(|m| name.contains(m)) {
        strategic += 5;
        reasoning.push("Move ecosystem - diversifies the supported portfolio".to_string());
    }
    if ZK_MARKERS.iter().any(|m| name.contains(m)) {
        strategic += 5;
        reasoning.push("ZK technology - future-proof integration".to_string());
    }
    let strategic = strategic.min(STRATEGIC_CAP);

    // ── Urgency ──────────────────────────────────────────────────────
    let urgency = if IMMEDIATE_CHAINS.contains(&name.as_str()) {
        reasoning.push("IMMEDIATE priority - live mainnet with high adoption".to_string());
        20
    } else if NEAR_TERM_CHAINS.contains(&name.as_str()) {
        reasoning.push("Near-term priority - significant funding/anticipation".to_string());
        12
    } else if tvl.is_some_and(|t| t > 1_000_000_000.0) {
        reasoning.push("Market opportunity growing - act soon".to_string());
        10
    } else {
        reasoning.push("Standard priority - monitor for growth".to_string());
        5
    };
    let urgency = urgency.min(URGENCY_CAP);

    let breakdown = ScoreBreakdown {
        market_opportunity: market,
        technical_feasibility: technical,
        strategic_value: strategic,
        urgency,
    };
    let total = breakdown.sum().min(TOTAL_CAP);

    PriorityScore {
        total,
        breakdown,
        rating: Rating::from_total(total),
        reasoning,
    }
}

/// Describe how two scores compare. Within ten points they are "similar".
pub fn compare_priorities(first: &PriorityScore, second: &PriorityScore) -> String {
    let diff = first.total as i64 - second.total as i64;
    if diff.abs() < 10 {
        return "Similar priority - consider both".to_string();
    }
    match diff.cmp(&0) {
        Ordering::Greater => format!("First chain is {diff} points higher priority"),
        _ => format!("Second chain is {} points higher priority", diff.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chain_without_metrics() {
        let s = priority_score(ComplexityLevel::Medium, &ChainSnapshot::new("Zanzibarchain"));
        assert_eq!(
            s.breakdown,
            ScoreBreakdown {
                market_opportunity: 0,
                technical_feasibility: 15,
                strategic_value: 0,
                urgency: 5,
            }
        );
        assert_eq!(s.total, 20);
        assert_eq!(s.rating, Rating::Low);
    }

    #[test]
    fn strategic_value_is_capped() {
        // high-profile 15 + rank 10 + move marker 5 = 30, capped to 25
        let snap = ChainSnapshot::new("Movement").with_tvl(20e9).with_rank(3);
        let s = priority_score(ComplexityLevel::Medium, &snap);
        assert_eq!(s.breakdown.strategic_value, 25);
        assert_eq!(s.breakdown.urgency, 20);
        assert_eq!(s.breakdown.market_opportunity, 30);
        assert_eq!(s.total, 90);
        assert_eq!(s.rating, Rating::Critical);
    }

    #[test]
    fn market_sub_score_adds_protocol_bonus_uncapped() {
        let snap = ChainSnapshot::new("x").with_tvl(11e9).with_protocols(150);
        let s = priority_score(ComplexityLevel::Low, &snap);
        assert_eq!(s.breakdown.market_opportunity, 35);
        let snap = ChainSnapshot::new("x").with_protocols(60);
        assert_eq!(
            priority_score(ComplexityLevel::Low, &snap).breakdown.market_opportunity,
            3
        );
    }

    #[test]
    fn only_best_rank_tier_counts() {
        let at = |rank| {
            priority_score(ComplexityLevel::Low, &ChainSnapshot::new("x").with_rank(rank))
                .breakdown
                .strategic_value
        };
        assert_eq!(at(1), 10);
        assert_eq!(at(25), 7);
        assert_eq!(at(50), 4);
        assert_eq!(at(51), 0);
    }

    #[test]
    fn urgency_tiers() {
        let urgency = |name: &str, tvl: Option<f64>| {
            let mut snap = ChainSnapshot::new(name);
            snap.tvl = tvl;
            priority_score(ComplexityLevel::Low, &snap).breakdown.urgency
        };
        assert_eq!(urgency("Hyperliquid", None), 20);
        assert_eq!(urgency("Starknet", None), 12);
        assert_eq!(urgency("x", Some(2e9)), 10);
        assert_eq!(urgency("x", Some(2e6)), 5);
        // allow-lists are exact names, not substrings
        assert_eq!(urgency("Monad Testnet", None), 5);
    }

    #[test]
    fn zk_marker_is_substring() {
        let s = priority_score(ComplexityLevel::Low, &ChainSnapshot::new("zkSync Era"));
        assert_eq!(s.breakdown.strategic_value, 5);
    }

    #[test]
    fn rating_boundaries() {
        assert_eq!(Rating::from_total(80), Rating::Critical);
        assert_eq!(Rating::from_total(79), Rating::High);
        assert_eq!(Rating::from_total(60), Rating::High);
        assert_eq!(Rating::from_total(40), Rating::Medium);
        assert_eq!(Rating::from_total(39), Rating::Low);
        assert!(Rating::Low.recommended_action().starts_with("BACKLOG"));
    }

    #[test]
    fn compare() {
        let mk = |total| PriorityScore {
            total,
            breakdown: ScoreBreakdown {
                market_opportunity: 0,
                technical_feasibility: 0,
                strategic_value: 0,
                urgency: 0,
            },
            rating: Rating::from_total(total),
            reasoning: vec![],
        };
        assert_eq!(compare_priorities(&mk(50), &mk(59)), "Similar priority - consider both");
        assert_eq!(
            compare_priorities(&mk(70), &mk(40)),
            "First chain is 30 points higher priority"
        );
        assert_eq!(
            compare_priorities(&mk(40), &mk(70)),
            "Second chain is 30 points higher priority"
        );
    }

    #[test]
    fn serializes_camel_case() {
        let s = priority_score(ComplexityLevel::Low, &ChainSnapshot::new("Base"));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["breakdown"]["technicalFeasibility"], 25);
        assert_eq!(json["rating"], "LOW");
    }
}
