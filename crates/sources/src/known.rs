//! Curated catalogue of chains we already have metadata for.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownChain {
    /// Lookup key, lowercase.
    #[serde(skip)]
    pub key: &'static str,
    pub name: &'static str,
    pub ticker: &'static str,
    pub rpc_url: &'static str,
    pub chain_id: &'static str,
    pub explorer_url: &'static str,
    pub github_repo: &'static str,
    pub chain_type: &'static str,
}

macro_rules! known {
    ($key:literal, $name:literal, $ticker:literal, $rpc:literal, $id:literal, $explorer:literal, $github:literal, $ty:literal) => {
        KnownChain {
            key: $key,
            name: $name,
            ticker: $ticker,
            rpc_url: $rpc,
            chain_id: $id,
            explorer_url: $explorer,
            github_repo: $github,
            chain_type: $ty,
        }
    };
}

static CATALOGUE: &[KnownChain] = &[
    known!("ethereum", "Ethereum", "ETH", "https://eth.llamarpc.com", "1",
        "https://etherscan.io", "https://github.com/ethereum/go-ethereum", "EVM"),
    known!("polygon", "Polygon", "MATIC", "https://polygon-rpc.com", "137",
        "https://polygonscan.com", "https://github.com/maticnetwork/bor", "EVM"),
    known!("arbitrum", "Arbitrum", "ETH", "https://arb1.arbitrum.io/rpc", "42161",
        "https://arbiscan.io", "https://github.com/OffchainLabs/arbitrum", "EVM"),
    known!("optimism", "Optimism", "ETH", "https://mainnet.optimism.io", "10",
        "https://optimistic.etherscan.io", "https://github.com/ethereum-optimism/optimism", "EVM"),
    known!("base", "Base", "ETH", "https://mainnet.base.org", "8453",
        "https://basescan.org", "https://github.com/base-org", "EVM"),
    known!("solana", "Solana", "SOL", "https://api.mainnet-beta.solana.com", "mainnet-beta",
        "https://explorer.solana.com", "https://github.com/solana-labs/solana", "Solana"),
    known!("cosmos hub", "Cosmos Hub", "ATOM", "https://rpc-cosmoshub.blockapsis.com", "cosmoshub-4",
        "https://www.mintscan.io/cosmos", "https://github.com/cosmos/cosmos-sdk", "Cosmos"),
    known!("osmosis", "Osmosis", "OSMO", "https://rpc.osmosis.zone", "osmosis-1",
        "https://www.mintscan.io/osmosis", "https://github.com/osmosis-labs/osmosis", "Cosmos"),
    known!("flare", "Flare", "FLR", "https://flare-api.flare.network/ext/C/rpc", "14",
        "https://flare-explorer.flare.network", "https://github.com/flare-foundation", "EVM"),
    known!("babylon", "Babylon", "BBN", "https://rpc.babylonchain.io", "bbn-1",
        "https://explorer.babylonchain.io", "https://github.com/babylonchain", "Cosmos"),
    known!("berachain", "Berachain", "BERA", "https://rpc.berachain.com", "80084",
        "https://bartio.beratrail.io", "https://github.com/berachain", "EVM"),
    known!("movement", "Movement", "MOVE", "https://mevm.devnet.imola.movementlabs.xyz", "30732",
        "https://explorer.devnet.imola.movementlabs.xyz", "https://github.com/movementlabsxyz", "Move-EVM"),
    known!("monad", "Monad", "MON", "To be announced at mainnet", "TBA",
        "To be announced at mainnet", "https://github.com/monad-labs", "EVM"),
    known!("hyperliquid", "Hyperliquid", "HYPE", "https://api.hyperliquid.xyz", "hyperliquid-1",
        "https://app.hyperliquid.xyz", "https://github.com/hyperliquid-dex", "Custom L1"),
    known!("starknet", "Starknet", "STRK", "https://starknet-mainnet.public.blastapi.io", "SN_MAIN",
        "https://starkscan.co", "https://github.com/starkware-libs", "Cairo/ZK"),
    known!("bittensor", "Bittensor", "TAO", "wss://entrypoint-finney.opentensor.ai:9944", "bittensor-1",
        "https://taostats.io", "https://github.com/opentensor/bittensor", "Substrate"),
];

/// Lookup over the built-in catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownChains;

impl KnownChains {
    pub fn all(&self) -> &'static [KnownChain] {
        CATALOGUE
    }

    /// Exact key, else the first key that contains or is contained in the
    /// query.
    pub fn lookup(&self, chain: &str) -> Option<&'static KnownChain> {
        let query = chain.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        CATALOGUE.iter().find(|c| c.key == query).or_else(|| {
            CATALOGUE
                .iter()
                .find(|c| c.key.contains(query.as_str()) || query.contains(c.key))
        })
    }
}
