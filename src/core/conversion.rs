//! Turns user edits into converted amounts and routes them to the UI.

use rust_decimal::{Decimal, RoundingStrategy};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::currency::{CurrencyCatalog, CurrencyCode, CurrencyRateProvider};

/// Text shown in the output field when the amount cannot be converted.
pub const AMOUNT_PLACEHOLDER: &str = "Converted amount";

/// Presentation layer as seen by the conversion pipeline.
pub trait UiNotifier: Send + Sync {
    fn show_catalog(&self, catalog: &CurrencyCatalog);
    fn show_amount(&self, amount: &str);
    fn show_failure(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub source_amount: f64,
    pub source: CurrencyCode,
    pub target: CurrencyCode,
}

impl ConversionRequest {
    /// Returns `None` unless `amount` is a finite, non-negative number.
    pub fn parse(amount: &str, source: CurrencyCode, target: CurrencyCode) -> Option<Self> {
        let source_amount = amount.trim().parse::<f64>().ok()?;
        if !source_amount.is_finite() || source_amount.is_sign_negative() {
            return None;
        }
        Some(ConversionRequest {
            source_amount,
            source,
            target,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    /// Input was not a number; the output field shows [`AMOUNT_PLACEHOLDER`].
    Placeholder,
    /// Amount in the target currency, always scaled to two fraction digits.
    Converted(Decimal),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Applied(ConversionResult),
    /// A newer request was issued before this one completed; nothing was shown.
    Superseded,
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    // Display yields the shortest text that round-trips, so 0.92 stays 0.92.
    Decimal::from_str(&value.to_string()).ok()
}

/// `amount * rate` rounded half-up to two decimal places.
///
/// Returns `None` when either operand or the product does not fit a `Decimal`,
/// whose magnitude tops out at `Decimal::MAX` (about 7.9e28).
pub fn convert_amount(amount: f64, rate: f64) -> Option<Decimal> {
    let product = to_decimal(amount)?.checked_mul(to_decimal(rate)?)?;
    let mut rounded = product.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Some(rounded)
}

/// Runs conversions and keeps the UI showing the result of the latest one.
///
/// Every call takes a ticket from a monotonically increasing counter. A
/// completion is only applied if its ticket is still the newest, checked and
/// applied under one lock so an older result can never land after a newer one.
pub struct ConversionCoordinator {
    rates: Arc<dyn CurrencyRateProvider>,
    notifier: Arc<dyn UiNotifier>,
    issued: AtomicU64,
    current: Mutex<Option<ConversionResult>>,
}

impl ConversionCoordinator {
    pub fn new(rates: Arc<dyn CurrencyRateProvider>, notifier: Arc<dyn UiNotifier>) -> Self {
        ConversionCoordinator {
            rates,
            notifier,
            issued: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Entry point for a user edit: validates the raw amount text, then converts.
    pub async fn update(
        &self,
        amount: &str,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> ConversionOutcome {
        let ticket = self.next_ticket();
        let request = ConversionRequest::parse(amount, source.clone(), target.clone());
        self.resolve(ticket, amount, request).await
    }

    /// Like [`update`](Self::update), but the request is ordered at call time
    /// and the returned future can be spawned and awaited later.
    pub fn begin(
        self: &Arc<Self>,
        amount: &str,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Pin<Box<dyn Future<Output = ConversionOutcome> + Send>> {
        let ticket = self.next_ticket();
        let request = ConversionRequest::parse(amount, source.clone(), target.clone());
        let amount = amount.to_string();
        let coordinator = Arc::clone(self);
        Box::pin(async move { coordinator.resolve(ticket, &amount, request).await })
    }

    pub async fn convert(&self, request: ConversionRequest) -> ConversionOutcome {
        let ticket = self.next_ticket();
        self.fetch_and_apply(ticket, request).await
    }

    async fn resolve(
        &self,
        ticket: u64,
        amount: &str,
        request: Option<ConversionRequest>,
    ) -> ConversionOutcome {
        match request {
            Some(request) => self.fetch_and_apply(ticket, request).await,
            None => {
                debug!(ticket, amount, "Amount is not a number, clearing output");
                self.apply(ticket, ConversionResult::Placeholder).await
            }
        }
    }

    #[instrument(
        name = "Convert",
        skip(self, request),
        fields(source = %request.source, target = %request.target)
    )]
    async fn fetch_and_apply(&self, ticket: u64, request: ConversionRequest) -> ConversionOutcome {
        let result = match self.rates.fetch_rate(&request.source, &request.target).await {
            Ok(rate) => match convert_amount(request.source_amount, rate) {
                Some(amount) => ConversionResult::Converted(amount),
                None => ConversionResult::Failed(format!(
                    "Converted amount is out of range: {} * {} exceeds {}",
                    request.source_amount,
                    rate,
                    Decimal::MAX
                )),
            },
            Err(err) => ConversionResult::Failed(err.to_string()),
        };

        self.apply(ticket, result).await
    }

    /// The result currently shown, if any request has been applied yet.
    pub async fn current(&self) -> Option<ConversionResult> {
        self.current.lock().await.clone()
    }

    fn next_ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn apply(&self, ticket: u64, result: ConversionResult) -> ConversionOutcome {
        let mut current = self.current.lock().await;

        let newest = self.issued.load(Ordering::SeqCst);
        if ticket != newest {
            debug!(ticket, newest, "Dropping superseded conversion result");
            return ConversionOutcome::Superseded;
        }

        match &result {
            ConversionResult::Placeholder => self.notifier.show_amount(AMOUNT_PLACEHOLDER),
            ConversionResult::Converted(amount) => self.notifier.show_amount(&amount.to_string()),
            ConversionResult::Failed(message) => self.notifier.show_failure(message),
        }

        *current = Some(result.clone());
        ConversionOutcome::Applied(result)
    }
}
