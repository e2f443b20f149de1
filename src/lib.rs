pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionResult, CurrencyCode, UiNotifier};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Currencies,
    Convert {
        amount: String,
        from: Option<CurrencyCode>,
        to: Option<CurrencyCode>,
    },
    Interactive,
}

/// Loads configuration and runs `command` against the configured rate service.
///
/// `api_key` overrides the key from the config file when set.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    api_key: Option<String>,
) -> Result<()> {
    info!("fxcalc starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    }
    .with_api_key(api_key);
    debug!(
        base_url = %config.provider.base_url,
        currency = %config.currency,
        "Loaded config"
    );

    let provider = Arc::new(providers::CurrencyFreaksProvider::from_config(
        &config.provider,
    )?);
    let notifier: Arc<dyn UiNotifier> = Arc::new(cli::ui::ConsoleNotifier);

    match command {
        AppCommand::Currencies => {
            cli::currencies::run(provider.as_ref(), notifier.as_ref(), config.catalog_retries).await
        }
        AppCommand::Convert { amount, from, to } => {
            let source = from.unwrap_or_else(|| config.currency.clone());
            let target = to.unwrap_or_else(|| config.currency.clone());
            let result = cli::convert::run(provider, notifier, &amount, &source, &target).await?;
            match result {
                ConversionResult::Failed(message) => anyhow::bail!(message),
                ConversionResult::Placeholder => {
                    anyhow::bail!("Amount is not a valid number: '{}'", amount)
                }
                ConversionResult::Converted(_) => Ok(()),
            }
        }
        AppCommand::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::interactive::run(
                stdin,
                provider.as_ref(),
                provider.clone(),
                notifier,
                config.currency.clone(),
                config.catalog_retries,
            )
            .await
        }
    }
}
