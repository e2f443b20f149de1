use super::ui;
use crate::core::{CatalogProvider, CurrencyCatalog, UiNotifier};
use crate::providers::util::with_retry;
use anyhow::Result;
use tracing::debug;

const RETRY_DELAY_MS: u64 = 500;

/// Fetches the supported currencies and hands them to the UI.
///
/// The fetcher never retries on its own; `retries` extra attempts are made
/// here. On failure the UI gets a single failure message and `None` is
/// returned.
pub async fn load_catalog(
    provider: &dyn CatalogProvider,
    notifier: &dyn UiNotifier,
    retries: usize,
) -> Option<CurrencyCatalog> {
    let pb = ui::new_spinner("Fetching supported currencies...");
    let result = with_retry(|| provider.fetch_catalog(), retries, RETRY_DELAY_MS).await;
    pb.finish_and_clear();

    match result {
        Ok(catalog) => {
            debug!("Loaded {} currencies", catalog.len());
            notifier.show_catalog(&catalog);
            Some(catalog)
        }
        Err(e) => {
            notifier.show_failure(&format!("Failed to fetch currencies: {e}"));
            None
        }
    }
}

pub async fn run(
    provider: &dyn CatalogProvider,
    notifier: &dyn UiNotifier,
    retries: usize,
) -> Result<()> {
    match load_catalog(provider, notifier, retries).await {
        Some(_) => Ok(()),
        None => anyhow::bail!("Supported currencies are unavailable"),
    }
}
