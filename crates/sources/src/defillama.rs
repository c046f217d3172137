//! DeFi statistics from the DeFiLlama public API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::http::{blocking, encode_segment, get_json};
use crate::StatsSource;

pub const DEFAULT_DEFILLAMA_URL: &str = "https://api.llama.fi";

/// Protocols listed by [`top_protocols`] unless asked otherwise.
pub const DEFAULT_PROTOCOL_LIMIT: usize = 10;

/// One row of `/v2/chains`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainTvl {
    pub name: String,
    #[serde(default)]
    pub tvl: f64,
    #[serde(default, rename = "tokenSymbol")]
    pub token_symbol: Option<String>,
}

/// One point of `/v2/historicalChainTvl/{chain}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TvlPoint {
    #[serde(default)]
    pub date: i64,
    pub tvl: f64,
}

/// One row of `/protocols`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Protocol {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub chains: Vec<String>,
}

/// A protocol deployed on a chain, as listed by [`top_protocols`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tvl: f64,
}

/// Statistics for a single chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    /// Chain name as DeFiLlama spells it.
    pub name: String,
    pub tvl: f64,
    pub protocols: u32,
    /// Percent change over the last two data points, two decimals.
    pub change_24h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chains: Option<u32>,
}

// ── Pure lookups over fetched data ───────────────────────────────────

/// Exact name match, else either name containing the other.
pub fn find_chain<'a>(chains: &'a [ChainTvl], query: &str) -> Option<&'a ChainTvl> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    chains.iter().find(|c| {
        let name = c.name.to_lowercase();
        name == query || name.contains(&query) || query.contains(&name)
    })
}

/// 1-based rank by descending TVL, and the number of chains ranked.
/// Matches exactly or by the chain name containing the query.
pub fn rank_of(chains: &[ChainTvl], query: &str) -> Option<(u32, u32)> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let mut sorted: Vec<&ChainTvl> = chains.iter().collect();
    sorted.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));
    sorted
        .iter()
        .position(|c| {
            let name = c.name.to_lowercase();
            name == query || name.contains(&query)
        })
        .map(|idx| (idx as u32 + 1, chains.len() as u32))
}

/// Percent change between the last two points, rounded to two decimals.
/// Zero when there are fewer than two points or the earlier one is zero.
pub fn change_24h(history: &[TvlPoint]) -> f64 {
    match history {
        [.., yesterday, current] if yesterday.tvl != 0.0 => {
            let pct = (current.tvl - yesterday.tvl) / yesterday.tvl * 100.0;
            (pct * 100.0).round() / 100.0
        }
        _ => 0.0,
    }
}

/// Protocols deployed on `chain` (case-insensitive exact chain name).
pub fn count_protocols(protocols: &[Protocol], chain: &str) -> u32 {
    let chain = chain.to_lowercase();
    protocols
        .iter()
        .filter(|p| p.chains.iter().any(|c| c.to_lowercase() == chain))
        .count() as u32
}

/// The `limit` largest protocols by TVL on any chain whose name contains
/// `chain` (case-insensitive). Missing TVL counts as zero.
pub fn top_protocols(protocols: &[Protocol], chain: &str, limit: usize) -> Vec<ProtocolSummary> {
    let chain = chain.trim().to_lowercase();
    if chain.is_empty() {
        return Vec::new();
    }
    let mut deployed: Vec<ProtocolSummary> = protocols
        .iter()
        .filter(|p| p.chains.iter().any(|c| c.to_lowercase().contains(&chain)))
        .map(|p| ProtocolSummary {
            name: p.name.clone(),
            slug: p.slug.clone(),
            category: p.category.clone(),
            tvl: p.tvl.unwrap_or(0.0),
        })
        .collect();
    deployed.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));
    deployed.truncate(limit);
    deployed
}

// ── Client ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DefiLlamaClient {
    base_url: String,
}

impl Default for DefiLlamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_DEFILLAMA_URL)
    }
}

impl DefiLlamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn chains(&self) -> Result<Vec<ChainTvl>, SourceError> {
        get_json(&format!("{}/v2/chains", self.base_url))
    }

    pub fn historical_tvl(&self, chain: &str) -> Result<Vec<TvlPoint>, SourceError> {
        get_json(&format!(
            "{}/v2/historicalChainTvl/{}",
            self.base_url,
            encode_segment(chain)
        ))
    }

    pub fn protocols(&self) -> Result<Vec<Protocol>, SourceError> {
        get_json(&format!("{}/protocols", self.base_url))
    }

    /// Statistics for `query`, or `None` if DeFiLlama does not list it.
    ///
    /// The chain list is required; the history and protocol calls only
    /// enrich the result and fall back to zero when they fail.
    pub fn fetch_stats(&self, query: &str) -> Result<Option<ChainStats>, SourceError> {
        let chains = self.chains()?;
        let Some(chain) = find_chain(&chains, query) else {
            debug!(query, "chain not listed on DeFiLlama");
            return Ok(None);
        };

        let change = match self.historical_tvl(&chain.name) {
            Ok(history) => change_24h(&history),
            Err(e) => {
                debug!(error = %e, "historical TVL unavailable");
                0.0
            }
        };
        let protocols = match self.protocols() {
            Ok(list) => count_protocols(&list, &chain.name),
            Err(e) => {
                debug!(error = %e, "protocol list unavailable");
                0
            }
        };
        let rank = rank_of(&chains, query);

        Ok(Some(ChainStats {
            name: chain.name.clone(),
            tvl: chain.tvl,
            protocols,
            change_24h: change,
            rank: rank.map(|(r, _)| r),
            total_chains: rank.map(|(_, total)| total),
        }))
    }

    pub fn fetch_top_protocols(
        &self,
        chain: &str,
        limit: usize,
    ) -> Result<Vec<ProtocolSummary>, SourceError> {
        Ok(top_protocols(&self.protocols()?, chain, limit))
    }
}

#[async_trait]
impl StatsSource for DefiLlamaClient {
    async fn chain_stats(&self, chain: &str) -> Result<Option<ChainStats>, SourceError> {
        let client = self.clone();
        let chain = chain.to_string();
        blocking(move || client.fetch_stats(&chain)).await
    }

    async fn top_protocols(
        &self,
        chain: &str,
        limit: usize,
    ) -> Result<Vec<ProtocolSummary>, SourceError> {
        let client = self.clone();
        let chain = chain.to_string();
        blocking(move || client.fetch_top_protocols(&chain, limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chains() -> Vec<ChainTvl> {
        [
            ("Ethereum", 60e9),
            ("Solana", 9e9),
            ("Arbitrum", 3e9),
            ("Polygon zkEVM", 4e6),
            ("Polygon", 1e9),
        ]
        .into_iter()
        .map(|(name, tvl)| ChainTvl {
            name: name.to_string(),
            tvl,
            token_symbol: None,
        })
        .collect()
    }

    #[test]
    fn find_prefers_list_order_over_exactness() {
        let list = chains();
        assert_eq!(find_chain(&list, "solana").unwrap().name, "Solana");
        // "Polygon zkEVM" contains "polygon" and is listed first
        assert_eq!(find_chain(&list, "Polygon").unwrap().name, "Polygon zkEVM");
        // query containing the chain name also matches
        assert_eq!(find_chain(&list, "Arbitrum One").unwrap().name, "Arbitrum");
        assert!(find_chain(&list, "Monero").is_none());
        assert!(find_chain(&list, "  ").is_none());
    }

    #[test]
    fn rank_is_by_descending_tvl() {
        let list = chains();
        assert_eq!(rank_of(&list, "Ethereum"), Some((1, 5)));
        assert_eq!(rank_of(&list, "arbitrum"), Some((3, 5)));
        assert_eq!(rank_of(&list, "polygon"), Some((4, 5)));
        // rank does not match a query that merely contains the name
        assert_eq!(rank_of(&list, "Arbitrum One"), None);
    }

    #[test]
    fn change_over_last_two_points() {
        let pts = |vals: &[f64]| {
            vals.iter()
                .map(|tvl| TvlPoint { date: 0, tvl: *tvl })
                .collect::<Vec<_>>()
        };
        assert_eq!(change_24h(&pts(&[50.0, 100.0, 103.0])), 3.0);
        assert_eq!(change_24h(&pts(&[300.0, 200.0])), -33.33);
        assert_eq!(change_24h(&pts(&[1.0])), 0.0);
        assert_eq!(change_24h(&pts(&[0.0, 5.0])), 0.0);
    }

    #[test]
    fn protocol_count_is_exact_chain_name() {
        let protocols = vec![
            Protocol {
                name: "Aave".to_string(),
                chains: vec!["Ethereum".to_string(), "Arbitrum".to_string()],
                ..Default::default()
            },
            Protocol {
                name: "GMX".to_string(),
                chains: vec!["arbitrum".to_string()],
                ..Default::default()
            },
            Protocol {
                name: "Other".to_string(),
                chains: vec!["Arbitrum Nova".to_string()],
                ..Default::default()
            },
        ];
        assert_eq!(count_protocols(&protocols, "Arbitrum"), 2);
        assert_eq!(count_protocols(&protocols, "Solana"), 0);
    }

    #[test]
    fn top_protocols_by_tvl_on_matching_chains() {
        let protocols: Vec<Protocol> = serde_json::from_str(
            r#"[
                {"name":"Aave","slug":"aave","category":"Lending","tvl":12000000000,"chains":["Ethereum","Arbitrum"]},
                {"name":"GMX","slug":"gmx","category":"Derivatives","tvl":500000000,"chains":["Arbitrum"]},
                {"name":"Camelot","category":"Dexes","tvl":null,"chains":["Arbitrum Nova"]},
                {"name":"Jito","slug":"jito","tvl":2000000000,"chains":["Solana"]},
                {"name":"Uniswap","slug":"uniswap","category":"Dexes","tvl":4000000000,"chains":["Ethereum","Arbitrum"]}
            ]"#,
        )
        .unwrap();

        let top = top_protocols(&protocols, "arbitrum", 3);
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Aave", "Uniswap", "GMX"]);
        assert_eq!(top[2].category.as_deref(), Some("Derivatives"));

        // substring match picks up "Arbitrum Nova"; null TVL sorts last
        let all = top_protocols(&protocols, "Arbitrum", 10);
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].name, "Camelot");
        assert_eq!(all[3].tvl, 0.0);

        assert!(top_protocols(&protocols, "Monero", 10).is_empty());
        assert!(top_protocols(&protocols, " ", 10).is_empty());

        let json = serde_json::to_value(&all[3]).unwrap();
        assert!(json.get("slug").is_none());
    }

    #[test]
    fn decodes_api_rows() {
        let rows: Vec<ChainTvl> = serde_json::from_str(
            r#"[{"gecko_id":"ethereum","tvl":61000000000.5,"tokenSymbol":"ETH","name":"Ethereum","chainId":1}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].token_symbol.as_deref(), Some("ETH"));
        let stats = ChainStats {
            name: "Ethereum".to_string(),
            tvl: 1.0,
            protocols: 2,
            change_24h: 0.5,
            rank: None,
            total_chains: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["change24h"], 0.5);
        assert!(json.get("rank").is_none());
    }
}
