//! Chain registry data from the ChainList `chains.json` feed.
//!
//! The feed is a few megabytes and changes rarely, so the decoded list is
//! kept in process for an hour.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::http::{blocking, get_json};
use crate::RegistrySource;

pub const DEFAULT_CHAINLIST_URL: &str = "https://chainid.network/chains.json";
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explorer {
    pub name: String,
    pub url: String,
}

/// One entry of `chains.json`. Unused fields are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainListEntry {
    pub name: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub rpc: Vec<String>,
    pub native_currency: Option<NativeCurrency>,
    #[serde(default, rename = "infoURL")]
    pub info_url: String,
    #[serde(default)]
    pub explorers: Vec<Explorer>,
}

impl ChainListEntry {
    /// RPC endpoints without localhost or `${TEMPLATE}` URLs.
    pub fn public_rpcs(&self) -> Vec<String> {
        self.rpc
            .iter()
            .filter(|rpc| {
                !rpc.contains("localhost") && !rpc.contains("127.0.0.1") && !rpc.contains("${")
            })
            .cloned()
            .collect()
    }

    /// A chain id plus an http or wss RPC is taken as EVM-compatible.
    pub fn is_evm(&self) -> bool {
        self.chain_id.is_some()
            && self
                .rpc
                .iter()
                .any(|rpc| rpc.contains("http") || rpc.contains("wss"))
    }
}

/// Summary of a registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    pub chain_id: Option<u64>,
    pub name: String,
    pub symbol: Option<String>,
    pub rpc_urls: Vec<String>,
    pub explorers: Vec<Explorer>,
    pub is_evm: bool,
    pub info_url: String,
}

impl From<&ChainListEntry> for RegistryInfo {
    fn from(entry: &ChainListEntry) -> Self {
        RegistryInfo {
            chain_id: entry.chain_id,
            name: entry.name.clone(),
            symbol: entry.native_currency.as_ref().map(|c| c.symbol.clone()),
            rpc_urls: entry.public_rpcs(),
            explorers: entry.explorers.clone(),
            is_evm: entry.is_evm(),
            info_url: entry.info_url.clone(),
        }
    }
}

/// Exact match on name, chain or short name; then a partial match on name
/// or chain, or the query containing the name.
pub fn find_entry<'a>(entries: &'a [ChainListEntry], query: &str) -> Option<&'a ChainListEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let exact = entries.iter().find(|e| {
        e.name.to_lowercase() == query
            || e.chain.to_lowercase() == query
            || e.short_name.to_lowercase() == query
    });
    exact.or_else(|| {
        entries.iter().find(|e| {
            let name = e.name.to_lowercase();
            name.contains(&query) || e.chain.to_lowercase().contains(&query) || query.contains(&name)
        })
    })
}

pub fn find_by_chain_id(entries: &[ChainListEntry], chain_id: u64) -> Option<&ChainListEntry> {
    entries.iter().find(|e| e.chain_id == Some(chain_id))
}

struct CacheSlot {
    fetched_at: Instant,
    entries: Arc<Vec<ChainListEntry>>,
}

#[derive(Clone)]
pub struct ChainListClient {
    url: String,
    ttl: Duration,
    cache: Arc<Mutex<Option<CacheSlot>>>,
}

impl Default for ChainListClient {
    fn default() -> Self {
        Self::new(DEFAULT_CHAINLIST_URL)
    }
}

impl ChainListClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ttl: CACHE_TTL,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Seed the cache, as if the feed had just been fetched.
    pub fn with_entries(self, entries: Vec<ChainListEntry>) -> Self {
        self.store(Arc::new(entries));
        self
    }

    fn cached(&self) -> Option<Arc<Vec<ChainListEntry>>> {
        let guard = self.cache.lock().ok()?;
        guard
            .as_ref()
            .filter(|slot| slot.fetched_at.elapsed() < self.ttl)
            .map(|slot| Arc::clone(&slot.entries))
    }

    fn store(&self, entries: Arc<Vec<ChainListEntry>>) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CacheSlot {
                fetched_at: Instant::now(),
                entries,
            });
        }
    }

    /// The full registry, from cache when fresh.
    pub fn entries(&self) -> Result<Arc<Vec<ChainListEntry>>, SourceError> {
        if let Some(entries) = self.cached() {
            return Ok(entries);
        }
        debug!(url = %self.url, "refreshing chain registry");
        let entries: Arc<Vec<ChainListEntry>> = Arc::new(get_json(&self.url)?);
        self.store(Arc::clone(&entries));
        Ok(entries)
    }

    pub fn lookup(&self, query: &str) -> Result<Option<RegistryInfo>, SourceError> {
        let entries = self.entries()?;
        Ok(find_entry(&entries, query).map(RegistryInfo::from))
    }

    pub fn lookup_chain_id(&self, chain_id: u64) -> Result<Option<RegistryInfo>, SourceError> {
        let entries = self.entries()?;
        Ok(find_by_chain_id(&entries, chain_id).map(RegistryInfo::from))
    }
}

#[async_trait]
impl RegistrySource for ChainListClient {
    async fn chain_info(&self, chain: &str) -> Result<Option<RegistryInfo>, SourceError> {
        if let Some(entries) = self.cached() {
            return Ok(find_entry(&entries, chain).map(RegistryInfo::from));
        }
        let client = self.clone();
        let chain = chain.to_string();
        blocking(move || client.lookup(&chain)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, chain: &str, short: &str, id: Option<u64>, rpc: &[&str]) -> ChainListEntry {
        ChainListEntry {
            name: name.to_string(),
            chain: chain.to_string(),
            short_name: short.to_string(),
            chain_id: id,
            rpc: rpc.iter().map(|s| s.to_string()).collect(),
            native_currency: Some(NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            }),
            info_url: String::new(),
            explorers: vec![],
        }
    }

    fn registry() -> Vec<ChainListEntry> {
        vec![
            entry(
                "Arbitrum Nova",
                "ETH",
                "arb-nova",
                Some(42170),
                &["https://nova.arbitrum.io/rpc"],
            ),
            entry(
                "Arbitrum One",
                "ETH",
                "arb1",
                Some(42161),
                &[
                    "https://arb1.arbitrum.io/rpc",
                    "https://arbitrum-mainnet.infura.io/v3/${INFURA_API_KEY}",
                    "http://localhost:8547",
                ],
            ),
            entry("Mystery", "MYST", "myst", None, &["https://rpc.myst"]),
        ]
    }

    #[test]
    fn exact_short_name_beats_partial() {
        let list = registry();
        assert_eq!(find_entry(&list, "arb1").unwrap().name, "Arbitrum One");
        // partial match returns the first listed
        assert_eq!(find_entry(&list, "arbitrum").unwrap().name, "Arbitrum Nova");
        assert!(find_entry(&list, "solana").is_none());
    }

    #[test]
    fn rpc_filter_drops_local_and_template_urls() {
        let list = registry();
        let info = RegistryInfo::from(find_entry(&list, "Arbitrum One").unwrap());
        assert_eq!(info.rpc_urls, vec!["https://arb1.arbitrum.io/rpc"]);
        assert_eq!(info.symbol.as_deref(), Some("ETH"));
        assert!(info.is_evm);
    }

    #[test]
    fn evm_flag_needs_chain_id() {
        let list = registry();
        assert!(!find_entry(&list, "Mystery").unwrap().is_evm());
        assert_eq!(find_by_chain_id(&list, 42170).unwrap().short_name, "arb-nova");
    }

    #[test]
    fn seeded_cache_serves_lookups() {
        let client = ChainListClient::new("http://127.0.0.1:9/unused").with_entries(registry());
        let info = client.lookup("arb1").unwrap().unwrap();
        assert_eq!(info.chain_id, Some(42161));
        assert_eq!(
            client.lookup_chain_id(42170).unwrap().unwrap().name,
            "Arbitrum Nova"
        );
    }

    #[tokio::test]
    async fn async_lookup_uses_fresh_cache() {
        let client = ChainListClient::new("http://127.0.0.1:9/unused").with_entries(registry());
        let info = client.chain_info("Arbitrum One").await.unwrap();
        assert_eq!(info.unwrap().chain_id, Some(42161));
    }

    #[test]
    fn expired_cache_is_ignored() {
        let client = ChainListClient::new("http://127.0.0.1:9/unused")
            .with_ttl(Duration::ZERO)
            .with_entries(registry());
        assert!(client.cached().is_none());
    }

    #[test]
    fn decodes_feed_entry() {
        let json = r#"[{"name":"Ethereum Mainnet","chain":"ETH","rpc":["https://eth.llamarpc.com"],
            "faucets":[],"nativeCurrency":{"name":"Ether","symbol":"ETH","decimals":18},
            "infoURL":"https://ethereum.org","shortName":"eth","chainId":1,"networkId":1,
            "explorers":[{"name":"etherscan","url":"https://etherscan.io","standard":"EIP3091"}]}]"#;
        let entries: Vec<ChainListEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].chain_id, Some(1));
        assert_eq!(entries[0].info_url, "https://ethereum.org");
        assert_eq!(entries[0].explorers[0].url, "https://etherscan.io");
    }
}
