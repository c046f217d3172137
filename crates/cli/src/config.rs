//! Runtime configuration.
//!
//! Layered in increasing precedence: built-in defaults, an optional TOML
//! file, environment variables, then command-line flags (applied by the
//! caller).
//!
//! # Example
//!
//! ```toml
//! [openai]
//! model = "gpt-4o-mini"
//!
//! [server]
//! port = 8080
//! rate_limit = 120
//!
//! [sources]
//! offline = true
//!
//! [github]
//! repository = "LedgerHQ/ledger-live"
//! ```

use std::path::{Path, PathBuf};

use chainscope_advisor::llm::{DEFAULT_MODEL, DEFAULT_OPENAI_URL};
use chainscope_sources::chainlist::DEFAULT_CHAINLIST_URL;
use chainscope_sources::defillama::DEFAULT_DEFILLAMA_URL;
use chainscope_sources::github::{
    DEFAULT_FAMILIES_PATH, DEFAULT_GITHUB_API_URL, DEFAULT_REPOSITORY,
};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RATE_LIMIT: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    /// Required on every route but `/health` when set.
    pub api_key: Option<String>,
    /// Checked by `POST /api/login`.
    pub access_password: Option<String>,
    /// Requests per minute per client IP.
    pub rate_limit: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            access_password: None,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub offline: bool,
    pub defillama_url: String,
    pub chainlist_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            offline: false,
            defillama_url: DEFAULT_DEFILLAMA_URL.to_string(),
            chainlist_url: DEFAULT_CHAINLIST_URL.to_string(),
        }
    }
}

/// Repository mined for integration history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_url: String,
    /// `owner/name`.
    pub repository: String,
    /// Directory holding one subdirectory per chain family.
    pub families_path: String,
    pub token: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            families_path: DEFAULT_FAMILIES_PATH.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub openai: OpenAiSettings,
    pub server: ServerSettings,
    pub sources: SourceSettings,
    pub github: GitHubSettings,
}

impl AppConfig {
    /// Defaults, overlaid with `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables. Empty values are ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("CHAINSCOPE_GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(key) = get("CHAINSCOPE_API_KEY") {
            self.server.api_key = Some(key);
        }
        if let Some(password) = get("CHAINSCOPE_ACCESS_PASSWORD") {
            self.server.access_password = Some(password);
        }
        if let Some(value) = get("CHAINSCOPE_RATE_LIMIT") {
            self.server.rate_limit = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CHAINSCOPE_RATE_LIMIT",
                value,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.rate_limit, 60);
        assert!(!config.sources.offline);
        assert_eq!(config.github.repository, "LedgerHQ/ledger-live");
        assert!(config.github.token.is_none());
    }

    #[test]
    fn github_section_and_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[github]\nrepository = \"acme/wallet\"\nfamilies_path = \"src/families\"\n"
        )
        .unwrap();

        let mut config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.github.repository, "acme/wallet");
        assert_eq!(config.github.api_url, "https://api.github.com");

        config
            .apply_env(env(&[
                ("GITHUB_TOKEN", "ghp_x"),
                ("CHAINSCOPE_GITHUB_API_URL", "http://127.0.0.1:9"),
            ]))
            .unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
        assert_eq!(config.github.api_url, "http://127.0.0.1:9");
    }

    #[test]
    fn file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[openai]\nmodel = \"gpt-4o-mini\"\n\n[server]\nport = 8080\nrate_limit = 5\n"
        )
        .unwrap();

        let mut config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_URL);

        config
            .apply_env(env(&[
                ("OPENAI_MODEL", "gpt-4.1"),
                ("CHAINSCOPE_RATE_LIMIT", "30"),
                ("CHAINSCOPE_API_KEY", ""),
            ]))
            .unwrap();
        assert_eq!(config.openai.model, "gpt-4.1");
        assert_eq!(config.server.rate_limit, 30);
        assert!(config.server.api_key.is_none());
    }

    #[test]
    fn bad_rate_limit_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("CHAINSCOPE_RATE_LIMIT", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("CHAINSCOPE_RATE_LIMIT"));
    }

    #[test]
    fn malformed_file_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
