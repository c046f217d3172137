//! Integration history: records of chains that were already integrated or
//! are being evaluated.
//!
//! The history is an injected capability. An [`Assessor`](crate::Assessor)
//! is built with a [`HistorySource`] that is either available or not, and
//! never probes for it at call time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rules::ComplexityLevel;

/// Lifecycle status of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationStatus {
    Supported,
    InProgress,
    Approved,
    Evaluation,
    Planned,
    Rejected,
    OnHold,
}

impl IntegrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrationStatus::Supported => "SUPPORTED",
            IntegrationStatus::InProgress => "IN_PROGRESS",
            IntegrationStatus::Approved => "APPROVED",
            IntegrationStatus::Evaluation => "EVALUATION",
            IntegrationStatus::Planned => "PLANNED",
            IntegrationStatus::Rejected => "REJECTED",
            IntegrationStatus::OnHold => "ON_HOLD",
        }
    }
}

/// Technology family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainFamily {
    #[serde(rename = "EVM")]
    Evm,
    Bitcoin,
    Cosmos,
    Solana,
    Move,
    Substrate,
    Custom,
}

impl ChainFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Bitcoin => "Bitcoin",
            ChainFamily::Cosmos => "Cosmos",
            ChainFamily::Solana => "Solana",
            ChainFamily::Move => "Move",
            ChainFamily::Substrate => "Substrate",
            ChainFamily::Custom => "Custom",
        }
    }
}

/// Historical record of one integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRecord {
    pub chain_name: String,
    pub ticker: String,
    pub status: IntegrationStatus,
    pub family: ChainFamily,
    /// "L1", "L2", "Rollup", ...
    pub architecture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_live_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hardware_support: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_complexity_estimate: Option<ComplexityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_complexity: Option<ComplexityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_weeks: Option<u32>,
    /// Actual weeks taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engineers_assigned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons_learned: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_challenges: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IntegrationRecord {
    /// A minimal record; remaining fields default to empty.
    pub fn new(
        chain_name: &str,
        ticker: &str,
        status: IntegrationStatus,
        family: ChainFamily,
        architecture: &str,
    ) -> Self {
        Self {
            chain_name: chain_name.to_string(),
            ticker: ticker.to_string(),
            status,
            family,
            architecture: architecture.to_string(),
            launch_date: None,
            ledger_live_version: None,
            hardware_support: Vec::new(),
            repository_url: None,
            initial_complexity_estimate: None,
            actual_complexity: None,
            estimated_weeks: None,
            integration_duration: None,
            engineers_assigned: None,
            estimated_cost: None,
            actual_cost: None,
            blockers: Vec::new(),
            lessons_learned: Vec::new(),
            key_challenges: Vec::new(),
            notes: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.status == IntegrationStatus::Supported
    }

    /// Actual complexity, else the initial estimate.
    pub fn resolved_complexity(&self) -> Option<ComplexityLevel> {
        self.actual_complexity.or(self.initial_complexity_estimate)
    }

    /// Actual weeks taken minus the estimate, when both are known.
    pub fn schedule_drift(&self) -> Option<i64> {
        match (self.integration_duration, self.estimated_weeks) {
            (Some(actual), Some(estimate)) => Some(actual as i64 - estimate as i64),
            _ => None,
        }
    }
}

/// Read-only lookup of integration records.
pub trait IntegrationHistory: Send + Sync {
    /// Record for a chain name (case-insensitive exact match).
    fn record(&self, chain_name: &str) -> Option<IntegrationRecord>;

    /// Every record: supported and in-flight integrations.
    fn records(&self) -> Vec<IntegrationRecord>;
}

/// History capability resolved when an assessor is constructed.
#[derive(Clone, Default)]
pub enum HistorySource {
    Available(Arc<dyn IntegrationHistory>),
    #[default]
    Unavailable,
}

impl HistorySource {
    pub fn available<H: IntegrationHistory + 'static>(history: H) -> Self {
        HistorySource::Available(Arc::new(history))
    }

    /// The built-in catalogue.
    pub fn seeded() -> Self {
        Self::available(StaticHistory::seeded())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, HistorySource::Available(_))
    }

    pub fn record(&self, chain_name: &str) -> Option<IntegrationRecord> {
        match self {
            HistorySource::Available(history) => history.record(chain_name),
            HistorySource::Unavailable => None,
        }
    }

    /// Record for the chain only if it is already supported.
    pub fn supported_record(&self, chain_name: &str) -> Option<IntegrationRecord> {
        self.record(chain_name).filter(IntegrationRecord::is_supported)
    }

    pub fn is_supported(&self, chain_name: &str) -> bool {
        self.supported_record(chain_name).is_some()
    }

    fn supported(&self) -> Vec<IntegrationRecord> {
        match self {
            HistorySource::Available(history) => history
                .records()
                .into_iter()
                .filter(IntegrationRecord::is_supported)
                .collect(),
            HistorySource::Unavailable => Vec::new(),
        }
    }

    /// Supported integrations sharing the family, architecture, or initial
    /// estimate of the chain's own record. At most five.
    pub fn similar_integrations(
        &self,
        chain_name: &str,
        family: Option<ChainFamily>,
        architecture: Option<&str>,
    ) -> Vec<IntegrationRecord> {
        let own_estimate = self
            .record(chain_name)
            .and_then(|r| r.initial_complexity_estimate);

        self.supported()
            .into_iter()
            .filter(|integration| {
                family == Some(integration.family)
                    || architecture == Some(integration.architecture.as_str())
                    || (own_estimate.is_some()
                        && integration.initial_complexity_estimate == own_estimate)
            })
            .take(5)
            .collect()
    }

    /// Deduplicated lessons from integrations similar to the chain's record.
    pub fn lessons_learned(&self, chain_name: &str) -> Vec<String> {
        self.collect_from_similar(chain_name, |r| &r.lessons_learned)
    }

    /// Deduplicated blockers from integrations similar to the chain's record.
    pub fn common_blockers(&self, chain_name: &str) -> Vec<String> {
        self.collect_from_similar(chain_name, |r| &r.blockers)
    }

    fn collect_from_similar(
        &self,
        chain_name: &str,
        field: impl Fn(&IntegrationRecord) -> &Vec<String>,
    ) -> Vec<String> {
        let Some(record) = self.record(chain_name) else {
            return Vec::new();
        };
        let mut out: Vec<String> = Vec::new();
        for integration in
            self.similar_integrations(chain_name, Some(record.family), Some(&record.architecture))
        {
            for item in field(&integration) {
                if !out.contains(item) {
                    out.push(item.clone());
                }
            }
        }
        out
    }

    /// Mean actual weeks of supported integrations at `level`, one decimal.
    pub fn average_integration_weeks(&self, level: ComplexityLevel) -> f64 {
        let durations: Vec<u32> = self
            .supported()
            .iter()
            .filter(|r| r.actual_complexity == Some(level))
            .filter_map(|r| r.integration_duration)
            .collect();

        if durations.is_empty() {
            return match level {
                ComplexityLevel::Low => 3.5,
                ComplexityLevel::Medium => 7.5,
                ComplexityLevel::High => 12.0,
            };
        }

        let total: u32 = durations.iter().sum();
        ((total as f64 / durations.len() as f64) * 10.0).round() / 10.0
    }

    pub fn stats(&self) -> HistoryStats {
        let all = match self {
            HistorySource::Available(history) => history.records(),
            HistorySource::Unavailable => Vec::new(),
        };
        let count = |status: IntegrationStatus| all.iter().filter(|r| r.status == status).count();

        let mut by_family = BTreeMap::new();
        for record in all.iter().filter(|r| r.is_supported()) {
            *by_family.entry(record.family.as_str().to_string()).or_insert(0) += 1;
        }

        let avg_weeks_by_complexity = ComplexityLevel::ALL
            .iter()
            .map(|level| (level.as_str().to_string(), self.average_integration_weeks(*level)))
            .collect();

        HistoryStats {
            total_supported: count(IntegrationStatus::Supported),
            in_progress: count(IntegrationStatus::InProgress),
            under_evaluation: count(IntegrationStatus::Evaluation),
            by_family,
            avg_weeks_by_complexity,
        }
    }
}

/// Aggregate view over the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_supported: usize,
    pub in_progress: usize,
    pub under_evaluation: usize,
    pub by_family: BTreeMap<String, usize>,
    pub avg_weeks_by_complexity: BTreeMap<String, f64>,
}

/// In-memory history: supported integrations plus in-flight evaluations.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    supported: Vec<IntegrationRecord>,
    evaluations: Vec<IntegrationRecord>,
}

impl StaticHistory {
    pub fn new(supported: Vec<IntegrationRecord>, evaluations: Vec<IntegrationRecord>) -> Self {
        Self {
            supported,
            evaluations,
        }
    }

    /// Built-in catalogue.
    pub fn seeded() -> Self {
        let solana = IntegrationRecord {
            launch_date: Some("2021-06-15".to_string()),
            ledger_live_version: Some("2.31.0".to_string()),
            hardware_support: vec![
                "Nano S Plus".to_string(),
                "Nano X".to_string(),
                "Stax".to_string(),
            ],
            repository_url: Some(
                "https://github.com/LedgerHQ/ledger-live/tree/develop/libs/ledger-live-common/src/families/solana"
                    .to_string(),
            ),
            initial_complexity_estimate: Some(ComplexityLevel::Medium),
            actual_complexity: Some(ComplexityLevel::Medium),
            estimated_weeks: Some(8),
            integration_duration: Some(8),
            engineers_assigned: Some(2),
            estimated_cost: Some(80_000),
            actual_cost: Some(85_000),
            blockers: vec![
                "SPL token standard required custom implementation".to_string(),
                "Stake account management complexity".to_string(),
            ],
            lessons_learned: vec![
                "SPL token standard well-documented but requires custom handling".to_string(),
                "Community SDKs are mature and helpful".to_string(),
                "Staking mechanism more complex than expected".to_string(),
            ],
            key_challenges: vec![
                "Transaction signing with SPL tokens".to_string(),
                "Account derivation for stake accounts".to_string(),
            ],
            notes: Some(
                "First non-EVM chain integration. Set pattern for custom VM integrations."
                    .to_string(),
            ),
            ..IntegrationRecord::new(
                "Solana",
                "SOL",
                IntegrationStatus::Supported,
                ChainFamily::Solana,
                "L1",
            )
        };

        let berachain = IntegrationRecord {
            initial_complexity_estimate: Some(ComplexityLevel::Low),
            estimated_weeks: Some(4),
            ..IntegrationRecord::new(
                "Berachain",
                "BERA",
                IntegrationStatus::Evaluation,
                ChainFamily::Evm,
                "L1",
            )
        };

        Self::new(vec![solana], vec![berachain])
    }
}

impl IntegrationHistory for StaticHistory {
    fn record(&self, chain_name: &str) -> Option<IntegrationRecord> {
        let normalized = chain_name.trim().to_lowercase();
        self.supported
            .iter()
            .chain(self.evaluations.iter())
            .find(|r| r.chain_name.to_lowercase() == normalized)
            .cloned()
    }

    fn records(&self) -> Vec<IntegrationRecord> {
        self.supported
            .iter()
            .chain(self.evaluations.iter())
            .cloned()
            .collect()
    }
}
