//! Per-request chain input.

use serde::{Deserialize, Serialize};

use crate::history::IntegrationRecord;

/// Everything known about a chain at assessment time.
///
/// Metric fields are optional; an absent value means the collaborator that
/// supplies it had no answer. A TVL of zero is normalized to unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mainnet_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_integration: Option<IntegrationRecord>,
}

impl ChainSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tvl(mut self, tvl: f64) -> Self {
        self.tvl = Some(tvl);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_protocols(mut self, protocols: u32) -> Self {
        self.protocols = Some(protocols);
        self
    }

    pub fn with_mainnet_live(mut self, live: bool) -> Self {
        self.mainnet_live = Some(live);
        self
    }

    pub fn with_prior_integration(mut self, record: IntegrationRecord) -> Self {
        self.prior_integration = Some(record);
        self
    }

    /// TVL if known and positive. Zero, negative and NaN read as unknown.
    pub fn known_tvl(&self) -> Option<f64> {
        self.tvl.filter(|tvl| *tvl > 0.0)
    }

    /// Rank if known. Rank zero is not a valid position and reads as unknown.
    pub fn known_rank(&self) -> Option<u32> {
        self.rank.filter(|rank| *rank > 0)
    }

    pub fn is_mainnet_live(&self) -> bool {
        self.mainnet_live.unwrap_or(true)
    }

    /// The prior-integration record, only when it marks the chain supported.
    pub fn supported_record(&self) -> Option<&IntegrationRecord> {
        self.prior_integration
            .as_ref()
            .filter(|record| record.is_supported())
    }
}
