//! chainscope-sources: read-only chain metadata collaborators.
//!
//! Each source answers "known", "not known", or fails. Failures never
//! escape [`ChainDataService::profile`]; they are logged and read as unknown.

pub mod chainlist;
pub mod defillama;
pub mod error;
pub mod github;
mod http;
pub mod known;
pub mod profile;
pub mod traits;

pub use chainlist::{ChainListClient, RegistryInfo};
pub use defillama::{ChainStats, DefiLlamaClient, ProtocolSummary};
pub use error::SourceError;
pub use github::{FamilyInfo, GitHubClient, IntegrationPatterns, IntegrationTimeline, RepositoryReport};
pub use known::{KnownChain, KnownChains};
pub use profile::{ChainDataService, ChainProfile};
pub use traits::{Offline, RegistrySource, StatsSource};
