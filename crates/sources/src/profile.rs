//! Merged chain profile: registry, catalogue and DeFi statistics.

use std::sync::Arc;

use chainscope_core::{format_tvl, ChainSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chainlist::RegistryInfo;
use crate::defillama::{ChainStats, ProtocolSummary};
use crate::known::{KnownChain, KnownChains};
use crate::traits::{Offline, RegistrySource, StatsSource};

pub const TBD: &str = "TBD";
pub const TO_BE_DISCOVERED: &str = "To be discovered";
pub const TO_BE_ANALYZED: &str = "To be analyzed";

/// Everything we could find out about a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProfile {
    pub name: String,
    pub ticker: String,
    pub rpc_url: String,
    pub chain_id: String,
    pub explorer_url: String,
    pub github_repo: String,
    pub chain_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chains: Option<u32>,
}

impl ChainProfile {
    /// Merge the three sources. Registry beats catalogue beats placeholders.
    pub fn merge(
        query: &str,
        registry: Option<&RegistryInfo>,
        known: Option<&KnownChain>,
        stats: Option<&ChainStats>,
    ) -> Self {
        let pick = |from_registry: Option<String>, from_known: Option<&str>, default: &str| {
            from_registry
                .filter(|s| !s.is_empty())
                .or_else(|| from_known.map(str::to_string))
                .unwrap_or_else(|| default.to_string())
        };

        let chain_type = if registry.is_some_and(|r| r.is_evm) {
            "EVM".to_string()
        } else {
            known
                .map(|k| k.chain_type.to_string())
                .unwrap_or_else(|| TO_BE_ANALYZED.to_string())
        };

        let tvl = stats.map(|s| s.tvl);

        ChainProfile {
            name: pick(
                registry.map(|r| r.name.clone()),
                known.map(|k| k.name),
                query.trim(),
            ),
            ticker: pick(
                registry.and_then(|r| r.symbol.clone()),
                known.map(|k| k.ticker),
                TBD,
            ),
            rpc_url: pick(
                registry.and_then(|r| r.rpc_urls.first().cloned()),
                known.map(|k| k.rpc_url),
                TO_BE_DISCOVERED,
            ),
            chain_id: pick(
                registry.and_then(|r| r.chain_id).map(|id| id.to_string()),
                known.map(|k| k.chain_id),
                TO_BE_DISCOVERED,
            ),
            explorer_url: pick(
                registry.and_then(|r| r.explorers.first().map(|e| e.url.clone())),
                known.map(|k| k.explorer_url),
                TO_BE_DISCOVERED,
            ),
            github_repo: pick(None, known.map(|k| k.github_repo), TO_BE_DISCOVERED),
            chain_type,
            tvl,
            tvl_formatted: tvl.filter(|t| *t > 0.0).map(format_tvl),
            protocols: stats.map(|s| s.protocols),
            change_24h: stats.map(|s| s.change_24h),
            chain_rank: stats.and_then(|s| s.rank),
            total_chains: stats.and_then(|s| s.total_chains),
        }
    }

    /// Assessment input for `name` carrying this profile's metrics.
    /// Mainnet is assumed live.
    pub fn snapshot(&self, name: &str) -> ChainSnapshot {
        ChainSnapshot {
            name: name.to_string(),
            tvl: self.tvl,
            rank: self.chain_rank,
            protocols: self.protocols,
            mainnet_live: Some(true),
            prior_integration: None,
        }
    }
}

/// Builds [`ChainProfile`]s from injected sources.
#[derive(Clone)]
pub struct ChainDataService {
    registry: Arc<dyn RegistrySource>,
    stats: Arc<dyn StatsSource>,
    known: KnownChains,
}

impl ChainDataService {
    pub fn new(registry: Arc<dyn RegistrySource>, stats: Arc<dyn StatsSource>) -> Self {
        Self {
            registry,
            stats,
            known: KnownChains,
        }
    }

    /// Catalogue only; no network access.
    pub fn offline() -> Self {
        Self::new(Arc::new(Offline), Arc::new(Offline))
    }

    /// Look the chain up everywhere and merge. Never fails: a source that
    /// errors is logged and treated as not knowing the chain.
    pub async fn profile(&self, chain: &str) -> ChainProfile {
        let (registry, stats) = tokio::join!(
            self.registry.chain_info(chain),
            self.stats.chain_stats(chain)
        );

        let registry = registry.unwrap_or_else(|e| {
            warn!(chain, error = %e, "chain registry lookup failed");
            None
        });
        let stats = stats.unwrap_or_else(|e| {
            warn!(chain, error = %e, "DeFi statistics lookup failed");
            None
        });
        let known = self.known.lookup(chain);

        info!(
            chain,
            registry = registry.is_some(),
            catalogue = known.is_some(),
            stats = stats.is_some(),
            "chain profile resolved"
        );

        ChainProfile::merge(chain, registry.as_ref(), known, stats.as_ref())
    }

    /// Largest protocols on `chain`. Empty when the statistics source
    /// fails or has no listing.
    pub async fn top_protocols(&self, chain: &str, limit: usize) -> Vec<ProtocolSummary> {
        self.stats
            .top_protocols(chain, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(chain, error = %e, "protocol listing failed");
                Vec::new()
            })
    }
}
