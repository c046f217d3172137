use async_trait::async_trait;

use crate::chainlist::RegistryInfo;
use crate::defillama::{ChainStats, ProtocolSummary};
use crate::error::SourceError;

/// DeFi statistics lookup (TVL, rank, protocol count).
///
/// `Ok(None)` means the source answered and does not know the chain.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn chain_stats(&self, chain: &str) -> Result<Option<ChainStats>, SourceError>;

    /// Largest protocols deployed on `chain`, by TVL. Sources without a
    /// protocol listing answer with nothing.
    async fn top_protocols(
        &self,
        _chain: &str,
        _limit: usize,
    ) -> Result<Vec<ProtocolSummary>, SourceError> {
        Ok(Vec::new())
    }
}

/// Chain registry lookup (chain id, RPCs, explorers, native currency).
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn chain_info(&self, chain: &str) -> Result<Option<RegistryInfo>, SourceError>;
}

/// A source that never knows anything. Used in offline mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl StatsSource for Offline {
    async fn chain_stats(&self, _chain: &str) -> Result<Option<ChainStats>, SourceError> {
        Ok(None)
    }
}

#[async_trait]
impl RegistrySource for Offline {
    async fn chain_info(&self, _chain: &str) -> Result<Option<RegistryInfo>, SourceError> {
        Ok(None)
    }
}
