use learnstyle_core::{AuthConfig, EngineConfig};
use learnstyle_models::providers::{GeminiSection, ProviderConfig, ProviderKind, WorkflowSection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLearnStyleConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,

    #[serde(default)]
    pub engine: RawEngineConfig,

    #[serde(default)]
    pub provider: RawProviderConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Directory holding `documents.json`
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub enabled: Option<bool>,
    pub project_id: Option<String>,
    pub jwks_url: Option<String>,
    pub clock_skew_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngineConfig {
    pub min_evidence: Option<usize>,
    pub provider_timeout_ms: Option<u64>,
    pub needs_more_data_confidence_cap: Option<f64>,
    pub keep_completed_below_confidence: Option<f64>,
}

/// Provider sections already use optional fields; only `kind` needs lifting.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProviderConfig {
    pub kind: Option<ProviderKind>,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LearnStyleConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub host: String,

    /// Port the HTTP server listens on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl From<&ServerConfig> for learnstyle_server::ServerConfig {
    fn from(config: &ServerConfig) -> Self {
        learnstyle_server::ServerConfig::new(config.host.clone(), config.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the learnstyle server
pub const DEFAULT_PORT: u16 = 8787;

/// Fallback data directory when no platform data dir is available
pub const DEFAULT_DATA_DIR: &str = ".learnstyle/data";
