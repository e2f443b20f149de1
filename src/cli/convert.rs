use crate::core::{
    ConversionCoordinator, ConversionOutcome, ConversionResult, CurrencyCode,
    CurrencyRateProvider, UiNotifier,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Converts a single amount and reports it through `notifier`.
pub async fn run(
    rates: Arc<dyn CurrencyRateProvider>,
    notifier: Arc<dyn UiNotifier>,
    amount: &str,
    source: &CurrencyCode,
    target: &CurrencyCode,
) -> Result<ConversionResult> {
    info!("Converting {} {} to {}", amount, source, target);

    let coordinator = ConversionCoordinator::new(rates, notifier);
    match coordinator.update(amount, source, target).await {
        ConversionOutcome::Applied(result) => Ok(result),
        ConversionOutcome::Superseded => anyhow::bail!("Conversion was superseded"),
    }
}
