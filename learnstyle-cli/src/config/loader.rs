use super::types::{
    DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT, LearnStyleConfig, RawAuthConfig,
    RawEngineConfig, RawLearnStyleConfig, RawProviderConfig, RawServerConfig, RawStorageConfig,
    ServerConfig, StorageConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use learnstyle_core::{AuthConfig, EngineConfig};
use learnstyle_models::providers::{GeminiSection, ProviderConfig, WorkflowSection};
use std::path::{Path, PathBuf};

/// Overrides the project config directory (isolated test runs, containers)
pub const PROJECT_CONFIG_DIR_ENV: &str = "LEARNSTYLE_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project), then overlay the
    /// provider environment variables.
    pub fn load() -> Result<LearnStyleConfig> {
        let mut raw = RawLearnStyleConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        let mut config = Self::finalize(raw);
        config.provider = config.provider.with_process_env();
        Ok(config)
    }

    fn read_raw(path: &Path) -> Result<RawLearnStyleConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "learnstyle")
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".learnstyle/config.toml")
        }
    }

    /// Platform data directory, used when no `storage.data_dir` is configured
    pub fn default_data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawLearnStyleConfig, overlay: RawLearnStyleConfig) -> RawLearnStyleConfig {
        RawLearnStyleConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            storage: RawStorageConfig {
                data_dir: overlay.storage.data_dir.or(base.storage.data_dir),
            },
            auth: RawAuthConfig {
                enabled: overlay.auth.enabled.or(base.auth.enabled),
                project_id: overlay.auth.project_id.or(base.auth.project_id),
                jwks_url: overlay.auth.jwks_url.or(base.auth.jwks_url),
                clock_skew_seconds: overlay
                    .auth
                    .clock_skew_seconds
                    .or(base.auth.clock_skew_seconds),
            },
            engine: RawEngineConfig {
                min_evidence: overlay.engine.min_evidence.or(base.engine.min_evidence),
                provider_timeout_ms: overlay
                    .engine
                    .provider_timeout_ms
                    .or(base.engine.provider_timeout_ms),
                needs_more_data_confidence_cap: overlay
                    .engine
                    .needs_more_data_confidence_cap
                    .or(base.engine.needs_more_data_confidence_cap),
                keep_completed_below_confidence: overlay
                    .engine
                    .keep_completed_below_confidence
                    .or(base.engine.keep_completed_below_confidence),
            },
            provider: Self::merge_provider(base.provider, overlay.provider),
        }
    }

    fn merge_provider(base: RawProviderConfig, overlay: RawProviderConfig) -> RawProviderConfig {
        let (b, o) = (base.gemini, overlay.gemini);
        let gemini = GeminiSection {
            project: o.project.or(b.project),
            location: o.location.or(b.location),
            model: o.model.or(b.model),
            endpoint: o.endpoint.or(b.endpoint),
            temperature: o.temperature.or(b.temperature),
            max_output_tokens: o.max_output_tokens.or(b.max_output_tokens),
            timeout_ms: o.timeout_ms.or(b.timeout_ms),
        };

        let (b, o) = (base.workflow, overlay.workflow);
        let workflow = WorkflowSection {
            api_url: o.api_url.or(b.api_url),
            workflow_id: o.workflow_id.or(b.workflow_id),
            timeout_ms: o.timeout_ms.or(b.timeout_ms),
        };

        RawProviderConfig {
            kind: overlay.kind.or(base.kind),
            gemini,
            workflow,
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawLearnStyleConfig) -> LearnStyleConfig {
        let auth_defaults = AuthConfig::default();
        let engine_defaults = EngineConfig::default();

        LearnStyleConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            storage: StorageConfig {
                data_dir: raw
                    .storage
                    .data_dir
                    .unwrap_or_else(Self::default_data_dir),
            },
            auth: AuthConfig {
                enabled: raw.auth.enabled.unwrap_or(auth_defaults.enabled),
                project_id: raw.auth.project_id.unwrap_or(auth_defaults.project_id),
                jwks_url: raw.auth.jwks_url.unwrap_or(auth_defaults.jwks_url),
                clock_skew_seconds: raw
                    .auth
                    .clock_skew_seconds
                    .unwrap_or(auth_defaults.clock_skew_seconds),
            },
            engine: EngineConfig {
                min_evidence: raw.engine.min_evidence.unwrap_or(engine_defaults.min_evidence),
                provider_timeout_ms: raw
                    .engine
                    .provider_timeout_ms
                    .unwrap_or(engine_defaults.provider_timeout_ms),
                needs_more_data_confidence_cap: raw
                    .engine
                    .needs_more_data_confidence_cap
                    .unwrap_or(engine_defaults.needs_more_data_confidence_cap),
                keep_completed_below_confidence: raw
                    .engine
                    .keep_completed_below_confidence
                    .unwrap_or(engine_defaults.keep_completed_below_confidence),
            },
            provider: ProviderConfig {
                kind: raw.provider.kind.unwrap_or_default(),
                gemini: raw.provider.gemini,
                workflow: raw.provider.workflow,
            },
        }
    }

    /// Load a single config file without layering or environment overlay
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<LearnStyleConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(Self::finalize(RawLearnStyleConfig::default()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnstyle_models::providers::ProviderKind;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.toml");

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9999

[storage]
data_dir = "/var/lib/learnstyle"

[auth]
enabled = true
project_id = "demo-project"

[engine]
min_evidence = 5

[provider]
kind = "workflow"

[provider.workflow]
workflow_id = "learning-style"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/learnstyle"));
        assert!(config.auth.enabled);
        assert_eq!(config.auth.project_id, "demo-project");
        assert_eq!(config.auth.clock_skew_seconds, 60);
        assert_eq!(config.engine.min_evidence, 5);
        assert_eq!(config.engine.provider_timeout_ms, 20_000);
        assert_eq!(config.provider.kind, ProviderKind::Workflow);
        assert_eq!(
            config.provider.workflow.workflow_id.as_deref(),
            Some("learning-style")
        );
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let result = ConfigLoader::load_from_path(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base: RawLearnStyleConfig = toml::from_str(
            r#"
[server]
host = "127.0.0.1"
port = 8787

[engine]
min_evidence = 4
provider_timeout_ms = 10000

[provider]
kind = "gemini"

[provider.gemini]
project = "base-project"
model = "base-model"
"#,
        )
        .unwrap();

        let overlay: RawLearnStyleConfig = toml::from_str(
            r#"
[server]
port = 9000

[engine]
min_evidence = 6

[provider.gemini]
model = "overlay-model"
"#,
        )
        .unwrap();

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(merged.server.port, Some(9000));
        assert_eq!(merged.engine.min_evidence, Some(6));
        assert_eq!(merged.engine.provider_timeout_ms, Some(10_000));
        assert_eq!(merged.provider.kind, Some(ProviderKind::Gemini));
        assert_eq!(merged.provider.gemini.project.as_deref(), Some("base-project"));
        assert_eq!(merged.provider.gemini.model.as_deref(), Some("overlay-model"));
    }

    #[test]
    fn test_merge_raw_explicit_false_overrides_true() {
        let base: RawLearnStyleConfig = toml::from_str("[auth]\nenabled = true\n").unwrap();
        let overlay: RawLearnStyleConfig = toml::from_str("[auth]\nenabled = false\n").unwrap();

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.auth.enabled, Some(false));
    }

    #[test]
    fn test_user_config_path_names_learnstyle() {
        let path = ConfigLoader::user_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("learnstyle"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path() {
        unsafe { std::env::remove_var(PROJECT_CONFIG_DIR_ENV) };
        let path = ConfigLoader::project_config_path();
        assert_eq!(path, PathBuf::from(".learnstyle/config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_dir_override() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[server]\nport = 9123\n\n[engine]\nmin_evidence = 2\n",
        )
        .unwrap();

        unsafe { std::env::set_var(PROJECT_CONFIG_DIR_ENV, temp_dir.path()) };
        let path = ConfigLoader::project_config_path();
        let loaded = ConfigLoader::load();
        unsafe { std::env::remove_var(PROJECT_CONFIG_DIR_ENV) };

        assert_eq!(path, temp_dir.path().join("config.toml"));
        let config = loaded.unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.engine.min_evidence, 2);
    }
}
