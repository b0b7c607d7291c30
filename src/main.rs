//! Bitwarden App Extension runner
//!
//! Runs one extension invocation against a request file, standing in for the
//! host app.
//!
//! ## Usage
//! 1. Write a request file with the host's input items
//! 2. Run `bitwarden-app-extension request.json`
//! 3. Set `BW_EXTENSION_USERNAME` / `BW_EXTENSION_PASSWORD` to pick the
//!    credentials returned to the host
//!
//! A locked vault cannot be unlocked from here; the request is closed with
//! no result instead.
//!
//! The completed response items are printed to stdout as JSON.

use secrecy::SecretString;
use std::sync::Arc;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use bitwarden_app_extension::config::load_config;
use bitwarden_app_extension::error::{ExtensionError, Result};
use bitwarden_app_extension::extension::attachment::ExtensionRequest;
use bitwarden_app_extension::extension::{ExtensionHost, ExtensionItem, ExtensionSession};
use bitwarden_app_extension::services::Services;
use bitwarden_app_extension::settings::SettingsStore;

/// Prints the returned items, standing in for the host app
struct StdoutHost;

impl ExtensionHost for StdoutHost {
    fn complete_request(&self, items: Vec<ExtensionItem>) -> Result<()> {
        let json = serde_json::to_string_pretty(&items)
            .map_err(|e| ExtensionError::HostCompletionFailed(e.to_string()))?;
        println!("{}", json);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let request_path = std::env::args().nth(1).ok_or_else(|| {
        ExtensionError::InvalidRequest("usage: bitwarden-app-extension <request.json>".to_string())
    })?;
    let request = ExtensionRequest::from_json(&std::fs::read_to_string(&request_path)?)?;

    let config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Default::default()
    });
    let settings = Arc::new(SettingsStore::open(&config.app_group_dir()?)?);
    let services = Services::from_settings(settings)?;

    let mut session = ExtensionSession::new(config, services, StdoutHost);
    session.load(&request.into_input_items()).await?;

    let route = session.appear()?;
    let credentials = match (
        std::env::var("BW_EXTENSION_USERNAME"),
        std::env::var("BW_EXTENSION_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) => Some((username, SecretString::from(password))),
        _ => None,
    };
    session.complete_unattended(route, credentials)
}
