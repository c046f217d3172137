//! The assessment pipeline: classify, score, look up priority, narrate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::format::{estimated_cost, thousands, WEEKLY_ENGINEER_COST};
use crate::history::{HistorySource, IntegrationRecord};
use crate::narrative::{narrate, supported_narrative, Narrative};
use crate::priority::{market_opportunity, priority_for, MarketStanding, Priority};
use crate::rules::{classify, ComplexityLevel};
use crate::score::{priority_score, PriorityScore};
use crate::snapshot::ChainSnapshot;

pub const CONFIDENCE_FALLBACK: u32 = 60;
pub const CONFIDENCE_MATCHED: u32 = 90;
pub const CONFIDENCE_SUPPORTED: u32 = 100;

/// A complete assessment. Field names on the wire are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub complexity: ComplexityLevel,
    pub complexity_score: u32,
    pub estimated_weeks: u32,
    pub estimated_cost: String,
    pub market_opportunity: MarketStanding,
    pub recommended_priority: Priority,
    #[serde(flatten)]
    pub narrative: Narrative,
    pub chain_type: String,
    pub matched_rules: Vec<String>,
    pub confidence: u32,
    /// Absent for already-supported chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<PriorityScore>,
}

impl Assessment {
    pub fn is_supported(&self) -> bool {
        self.market_opportunity == MarketStanding::Supported
    }
}

/// Assess a chain snapshot. Pure and deterministic.
///
/// A snapshot carrying a supported prior-integration record takes the
/// override path; everything else goes through the rule table.
pub fn assess(snapshot: &ChainSnapshot) -> Assessment {
    if let Some(record) = snapshot.supported_record() {
        return supported_assessment(record);
    }

    let classification = classify(&snapshot.name);
    let level = classification.level();
    let weeks = classification.weeks();
    let opportunity = market_opportunity(snapshot);
    let priority = priority_for(level, opportunity);

    debug!(
        chain = %snapshot.name,
        %level,
        weeks,
        %opportunity,
        %priority,
        matched = classification.matched,
        "rule-based assessment"
    );

    Assessment {
        complexity: level,
        complexity_score: level.complexity_score(),
        estimated_weeks: weeks,
        estimated_cost: estimated_cost(weeks, level.engineers()),
        market_opportunity: opportunity,
        recommended_priority: priority,
        narrative: narrate(&classification, snapshot, opportunity, priority),
        matched_rules: vec![classification.rule.reasoning.to_string()],
        confidence: classification.confidence(),
        chain_type: classification.chain_type,
        priority_score: Some(priority_score(level, snapshot)),
    }
}

/// Override for a chain that is already integrated. Category, score and
/// weeks come from the historical record.
pub fn supported_assessment(record: &IntegrationRecord) -> Assessment {
    let level = record.resolved_complexity().unwrap_or(ComplexityLevel::Medium);
    let weeks = record
        .integration_duration
        .or(record.estimated_weeks)
        .unwrap_or(8);
    let cost = match record.actual_cost {
        Some(actual) => format!("{} (actual)", thousands(actual)),
        None => {
            let estimate = record.estimated_weeks.unwrap_or(8) as u64 * WEEKLY_ENGINEER_COST;
            format!("{} (estimated)", thousands(estimate))
        }
    };

    debug!(chain = %record.chain_name, %level, weeks, "already supported");

    Assessment {
        complexity: level,
        complexity_score: level.complexity_score(),
        estimated_weeks: weeks,
        estimated_cost: cost,
        market_opportunity: MarketStanding::Supported,
        recommended_priority: Priority::P0,
        narrative: supported_narrative(record, level, weeks),
        chain_type: record.family.as_str().to_string(),
        matched_rules: vec!["Already supported - using historical data".to_string()],
        confidence: CONFIDENCE_SUPPORTED,
        priority_score: None,
    }
}

/// Assessment entry point bound to a history capability.
#[derive(Clone, Default)]
pub struct Assessor {
    history: HistorySource,
}

impl Assessor {
    pub fn new(history: HistorySource) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &HistorySource {
        &self.history
    }

    /// Attach the chain's history record when the snapshot carries none,
    /// then assess.
    pub fn assess(&self, snapshot: ChainSnapshot) -> Assessment {
        let mut snapshot = snapshot;
        if snapshot.prior_integration.is_none() {
            snapshot.prior_integration = self.history.record(&snapshot.name);
        }
        assess(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ChainFamily, IntegrationHistory, IntegrationStatus, StaticHistory};

    #[test]
    fn confidence_constants_line_up_with_classification() {
        assert_eq!(assess(&ChainSnapshot::new("Base")).confidence, CONFIDENCE_MATCHED);
        assert_eq!(
            assess(&ChainSnapshot::new("Qwertychain")).confidence,
            CONFIDENCE_FALLBACK
        );
    }

    #[test]
    fn category_score_and_weeks_come_from_one_rule() {
        for name in ["Arbitrum", "Osmosis", "Aztec", "Corda", "Unknownium"] {
            let a = assess(&ChainSnapshot::new(name));
            let c = classify(name);
            assert_eq!(a.complexity, c.level());
            assert_eq!(a.complexity_score, c.level().complexity_score());
            assert_eq!(a.estimated_weeks, c.weeks());
        }
    }

    #[test]
    fn supported_override_uses_actuals() {
        let record = StaticHistory::seeded().record("solana").unwrap();
        let a = supported_assessment(&record);
        assert_eq!(a.complexity, ComplexityLevel::Medium);
        assert_eq!(a.complexity_score, 55);
        assert_eq!(a.estimated_weeks, 8);
        assert_eq!(a.estimated_cost, "$85K (actual)");
        assert_eq!(a.chain_type, "Solana");
        assert_eq!(a.narrative.key_technical_factors, record.lessons_learned);
        assert!(a.narrative.red_flags.is_empty());
        assert!(a.priority_score.is_none());
    }

    #[test]
    fn supported_override_score_follows_initial_estimate() {
        let record = IntegrationRecord {
            initial_complexity_estimate: Some(ComplexityLevel::Low),
            estimated_weeks: Some(5),
            ..IntegrationRecord::new(
                "Kaia",
                "KAIA",
                IntegrationStatus::Supported,
                ChainFamily::Evm,
                "L1",
            )
        };
        let a = supported_assessment(&record);
        assert_eq!(a.complexity, ComplexityLevel::Low);
        assert_eq!(a.complexity_score, 25);
        assert_eq!(a.estimated_weeks, 5);
        assert_eq!(a.estimated_cost, "$25K (estimated)");
    }

    #[test]
    fn supported_override_defaults() {
        let record = IntegrationRecord::new(
            "Bare",
            "BARE",
            IntegrationStatus::Supported,
            ChainFamily::Custom,
            "L1",
        );
        let a = supported_assessment(&record);
        assert_eq!(a.complexity, ComplexityLevel::Medium);
        assert_eq!(a.estimated_weeks, 8);
        assert_eq!(a.estimated_cost, "$40K (estimated)");
        assert_eq!(a.narrative.why_this_complexity[0], "Already supported since N/A");
    }

    #[test]
    fn assessor_attaches_history() {
        let assessor = Assessor::new(HistorySource::seeded());
        let a = assessor.assess(ChainSnapshot::new("Solana"));
        assert!(a.is_supported());
        // evaluations do not trigger the override
        let a = assessor.assess(ChainSnapshot::new("Berachain"));
        assert!(!a.is_supported());
        assert_eq!(a.complexity, ComplexityLevel::Low);
    }

    #[test]
    fn assessor_without_history_uses_rules() {
        let a = Assessor::new(HistorySource::Unavailable).assess(ChainSnapshot::new("Solana"));
        assert!(!a.is_supported());
        assert_eq!(a.complexity, ComplexityLevel::Medium);
        assert_eq!(a.estimated_weeks, 7);
    }

    #[test]
    fn wire_shape() {
        let a = assess(&ChainSnapshot::new("Arbitrum"));
        let json = serde_json::to_value(&a).unwrap();
        for key in [
            "complexity",
            "complexityScore",
            "estimatedWeeks",
            "estimatedCost",
            "marketOpportunity",
            "recommendedPriority",
            "whyThisComplexity",
            "keyTechnicalFactors",
            "businessOpportunity",
            "competitivePosition",
            "nextSteps",
            "redFlags",
            "goToMarketStrategy",
            "chainType",
            "matchedRules",
            "confidence",
            "priorityScore",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["complexity"], "LOW");
        assert_eq!(json["recommendedPriority"], "P2");
    }
}
