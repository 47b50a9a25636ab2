//! Provider credential management.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use dialoguer::{Password, theme::ColorfulTheme};
use learnstyle_models::auth::{
    CredentialSource, CredentialStore, credential_providers, env_vars_for_provider,
};

/// Keyring service name for provider credentials
const CREDENTIAL_SERVICE: &str = "learnstyle";

/// The credential store `serve` resolves providers against.
pub fn credential_store() -> CredentialStore {
    CredentialStore::new(CREDENTIAL_SERVICE).with_env_fallback()
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Show where each provider's credential comes from
    List,
    /// Store a provider API key in the system keyring
    Set {
        /// Provider to configure (gemini, workflow)
        provider: String,
    },
}

pub fn run(args: AuthArgs) -> Result<()> {
    let store = credential_store();
    match args.command {
        AuthCommands::List => {
            list(&store);
            Ok(())
        }
        AuthCommands::Set { provider } => set(&store, &provider),
    }
}

fn list(store: &CredentialStore) {
    println!("Provider credentials:");
    println!();
    for provider in credential_providers() {
        println!(
            "  {:<9} {:<15} env: {}",
            provider,
            source_label(store.credential_source(provider)),
            env_vars_for_provider(provider).join(", ")
        );
    }
}

fn set(store: &CredentialStore, provider: &str) -> Result<()> {
    check_provider(provider)?;

    println!(
        "Enter API key for {} (or set {})",
        provider,
        env_vars_for_provider(provider).join(" / ")
    );
    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    store.set(provider, &key)?;
    println!("Credentials for '{}' saved to keyring.", provider);
    Ok(())
}

fn check_provider(provider: &str) -> Result<()> {
    if credential_providers().any(|p| p == provider) {
        return Ok(());
    }
    let known: Vec<_> = credential_providers().collect();
    bail!(
        "Unknown provider '{}'. Providers with credentials: {}",
        provider,
        known.join(", ")
    )
}

pub(crate) fn source_label(source: Option<CredentialSource>) -> &'static str {
    match source {
        Some(CredentialSource::Keyring) => "(keyring)",
        Some(CredentialSource::Environment) => "(environment)",
        None => "(not configured)",
    }
}
