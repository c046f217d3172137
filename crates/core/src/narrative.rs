//! Human-readable reasoning attached to an assessment.
//!
//! Content selection is driven by the complexity level, the snapshot
//! metrics and the derived priority. Wording is fixed per branch.

use serde::{Deserialize, Serialize};

use crate::history::IntegrationRecord;
use crate::priority::{MarketStanding, Priority};
use crate::rules::{Classification, ComplexityLevel};
use crate::snapshot::ChainSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub why_this_complexity: Vec<String>,
    pub key_technical_factors: Vec<String>,
    pub business_opportunity: Vec<String>,
    pub competitive_position: Vec<String>,
    pub next_steps: Vec<String>,
    pub red_flags: Vec<String>,
    pub go_to_market_strategy: String,
}

/// Whole months for a week count, rounded up.
fn months(weeks: u32) -> u32 {
    weeks.div_ceil(4)
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn technical_factors(level: ComplexityLevel) -> Vec<String> {
    match level {
        ComplexityLevel::Low => lines(&[
            "Standard architecture (EVM/Bitcoin-based)",
            "Can leverage existing wallet integrations",
            "Well-documented with mature tooling",
            "Established developer community",
        ]),
        ComplexityLevel::Medium => lines(&[
            "Custom virtual machine or runtime",
            "Requires new integration patterns",
            "Growing ecosystem with SDK support",
            "Moderate documentation quality",
        ]),
        ComplexityLevel::High => lines(&[
            "Novel cryptography or consensus",
            "Limited tooling and documentation",
            "Requires significant R&D",
            "Security audit complexity high",
        ]),
    }
}

fn competitive_position(level: ComplexityLevel) -> Vec<String> {
    match level {
        ComplexityLevel::Low => lines(&[
            "Fast time-to-market advantage",
            "Low risk integration - proven patterns",
            "Can launch ahead of competitors",
        ]),
        ComplexityLevel::Medium => lines(&[
            "Moderate development investment required",
            "Strategic positioning in growing ecosystem",
            "Balance of risk vs opportunity",
        ]),
        ComplexityLevel::High => lines(&[
            "High complexity - first-mover challenges",
            "Significant R&D investment needed",
            "Long-term strategic bet",
        ]),
    }
}

fn business_opportunity(snapshot: &ChainSnapshot) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(tvl) = snapshot.known_tvl().filter(|t| *t > 1_000_000_000.0) {
        out.push(format!("Strong market: ${:.1}B TVL", tvl / 1_000_000_000.0));
    }
    if let Some(rank) = snapshot.known_rank().filter(|r| *r <= 20) {
        out.push(format!("Top {rank} chain by TVL"));
    }
    if let Some(protocols) = snapshot.protocols.filter(|p| *p > 50) {
        out.push(format!("Active ecosystem: {protocols}+ protocols"));
    }
    if out.is_empty() {
        out.push("Emerging opportunity - monitor growth metrics".to_string());
    }
    out
}

fn next_steps(level: ComplexityLevel, weeks: u32, opportunity: MarketStanding) -> Vec<String> {
    let m = months(weeks);
    match level {
        ComplexityLevel::Low if opportunity != MarketStanding::Low => vec![
            "RECOMMEND: Fast-track this integration".to_string(),
            "Request technical questionnaire from foundation".to_string(),
            format!("Allocate 1 senior engineer for {weeks} weeks"),
            format!("Target launch: {m} months"),
        ],
        ComplexityLevel::Medium => vec![
            "Conduct detailed technical assessment".to_string(),
            "Request comprehensive tech questionnaire".to_string(),
            format!("Allocate 2 engineers for {weeks} weeks"),
            "Review security requirements and audit needs".to_string(),
            format!("Plan for {}-{} month timeline", m, m + 1),
        ],
        // HIGH, and LOW without a market to justify fast-tracking.
        ComplexityLevel::Low | ComplexityLevel::High => vec![
            "CAUTION: High complexity integration".to_string(),
            "Requires deep R&D phase before commitment".to_string(),
            "Request detailed technical documentation + audit reports".to_string(),
            "Form specialized team (3-4 engineers)".to_string(),
            format!("Expect {m}+ month timeline"),
            "Budget for external security audits".to_string(),
        ],
    }
}

fn red_flags(classification: &Classification, snapshot: &ChainSnapshot) -> Vec<String> {
    let tvl = snapshot.known_tvl();
    let mut out = Vec::new();
    if !snapshot.is_mainnet_live() {
        out.push("Mainnet not live - wait for production launch".to_string());
    }
    if classification.level() == ComplexityLevel::High && !tvl.is_some_and(|t| t >= 100_000_000.0) {
        out.push("High complexity + low market opportunity = risky investment".to_string());
    }
    if !classification.matched && tvl.is_none() {
        out.push("Unknown chain - requires comprehensive technical diligence".to_string());
    }
    out
}

fn go_to_market(priority: Priority, weeks: u32) -> String {
    let m = months(weeks);
    match priority {
        Priority::P0 => format!(
            "P0 - IMMEDIATE: Fast-track to capture market opportunity. Launch within {m} months."
        ),
        Priority::P1 => format!("P1 - HIGH: Add to Q2 roadmap. Plan {m}-month sprint."),
        Priority::P2 => {
            "P2 - MEDIUM: Monitor and reassess quarterly. Consider if market grows.".to_string()
        }
        Priority::P3 => {
            "P3 - LOW: Backlog only. Wait for significant market signals.".to_string()
        }
    }
}

/// Build the narrative for a rule-based assessment.
pub fn narrate(
    classification: &Classification,
    snapshot: &ChainSnapshot,
    opportunity: MarketStanding,
    priority: Priority,
) -> Narrative {
    let level = classification.level();
    let weeks = classification.weeks();

    Narrative {
        why_this_complexity: vec![classification.rule.reasoning.to_string()],
        key_technical_factors: technical_factors(level),
        business_opportunity: business_opportunity(snapshot),
        competitive_position: competitive_position(level),
        next_steps: next_steps(level, weeks, opportunity),
        red_flags: red_flags(classification, snapshot),
        go_to_market_strategy: go_to_market(priority, weeks),
    }
}

/// Narrative for a chain that is already integrated.
pub fn supported_narrative(
    record: &IntegrationRecord,
    level: ComplexityLevel,
    weeks: u32,
) -> Narrative {
    let since = record.launch_date.as_deref().unwrap_or("N/A");

    Narrative {
        why_this_complexity: vec![
            format!("Already supported since {since}"),
            format!("Actual complexity: {level}"),
            format!("Integration took {weeks} weeks"),
        ],
        key_technical_factors: record.lessons_learned.clone(),
        business_opportunity: vec!["Already integrated - no new opportunity".to_string()],
        competitive_position: vec![format!("Live in production since {since}")],
        next_steps: vec![
            "Already supported - no action needed".to_string(),
            format!(
                "View integration: {}",
                record.repository_url.as_deref().unwrap_or("N/A")
            ),
            format!(
                "Wallet app version: {}",
                record.ledger_live_version.as_deref().unwrap_or("N/A")
            ),
        ],
        red_flags: Vec::new(),
        go_to_market_strategy: "Already supported in production".to_string(),
    }
}
