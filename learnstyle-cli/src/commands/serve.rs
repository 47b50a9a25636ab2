//! learnstyle serve command
//!
//! Builds the assessment stack from configuration and runs the HTTP server:
//! - JSON-file document store under the data directory
//! - session memory stored alongside the student documents
//! - the provider selected by the registry (fails closed on bad config)
//! - bearer-token verification

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use learnstyle_core::auth::verifier_from_config;
use learnstyle_core::{AssessmentEngine, DocumentSessionStore, DocumentStore, JsonFileDocumentStore};
use learnstyle_models::ProviderRegistry;
use learnstyle_models::auth::credential_providers;
use learnstyle_server::{AppState, LearnStyleServer};
use tracing::{debug, info};

use super::auth::{credential_store, source_label};
use crate::config::{ConfigLoader, LearnStyleConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Directory for documents.json (overrides storage.data_dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl ServeArgs {
    fn apply(&self, config: &mut LearnStyleConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    args.apply(&mut config);

    let state = build_state(&config).await?;
    let server = LearnStyleServer::new((&config.server).into(), state);

    info!(
        host = %config.server.host,
        port = config.server.port,
        "starting learnstyle server"
    );
    server.run().await.map_err(Into::into)
}

async fn build_state(config: &LearnStyleConfig) -> Result<Arc<AppState>> {
    let data_dir = &config.storage.data_dir;
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let store = JsonFileDocumentStore::load(data_dir)
        .await
        .with_context(|| format!("loading documents from {}", data_dir.display()))?;
    info!(path = %store.file_path().display(), "document store ready");
    let documents: Arc<dyn DocumentStore> = Arc::new(store);
    let sessions = Arc::new(DocumentSessionStore::new(Arc::clone(&documents)));

    let credentials = credential_store();
    for name in credential_providers() {
        debug!(
            provider = name,
            source = source_label(credentials.credential_source(name)),
            "provider credential"
        );
    }
    let registry = ProviderRegistry::new(config.provider.clone(), credentials);
    let provider = registry
        .provider()
        .context("assessment provider is not available")?;

    let engine = AssessmentEngine::new(config.engine.clone(), provider, documents, sessions);
    let verifier = verifier_from_config(&config.auth)?;

    Ok(Arc::new(AppState::new(Arc::new(engine), verifier)))
}
