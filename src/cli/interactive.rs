//! Line-oriented conversion session.
//!
//! Each input line is one edit of the on-screen form: a new amount, a new
//! source or target currency. Every edit starts a conversion in the
//! background so input is never blocked on the network; the coordinator
//! makes sure only the newest edit ends up on screen.

use super::{currencies, ui};
use crate::core::{
    CatalogProvider, ConversionCoordinator, CurrencyCatalog, CurrencyCode, CurrencyRateProvider,
    UiNotifier,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{debug, warn};

const HELP: &str = "\
Enter an amount to convert it. Other commands:
  from CODE   change the source currency
  to CODE     change the target currency
  swap        swap source and target
  list        show supported currencies
  refresh     reload supported currencies
  help        show this message
  quit        leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Amount(String),
    From(CurrencyCode),
    To(CurrencyCode),
    Swap,
    List,
    Refresh,
    Help,
    Quit,
    Invalid(String),
}

/// Anything that is not a command is taken as amount text, including an
/// empty line, which clears the output.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let keyword = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next();

    match (keyword.as_str(), argument, parts.next()) {
        ("from" | "to", Some(code), None) => match code.parse::<CurrencyCode>() {
            Ok(code) if keyword == "from" => Input::From(code),
            Ok(code) => Input::To(code),
            Err(e) => Input::Invalid(e.to_string()),
        },
        ("from" | "to", _, _) => Input::Invalid(format!("Usage: {keyword} CODE")),
        ("swap", None, _) => Input::Swap,
        ("list", None, _) => Input::List,
        ("refresh", None, _) => Input::Refresh,
        ("help" | "?", None, _) => Input::Help,
        ("quit" | "exit" | "q", None, _) => Input::Quit,
        _ => Input::Amount(line.to_string()),
    }
}

/// What the form currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub amount: String,
    pub source: CurrencyCode,
    pub target: CurrencyCode,
    pub catalog: Option<CurrencyCatalog>,
}

impl Session {
    pub fn new(default_currency: CurrencyCode) -> Self {
        Session {
            amount: String::new(),
            source: default_currency.clone(),
            target: default_currency,
            catalog: None,
        }
    }

    /// Installs a freshly fetched catalog, re-selecting codes it does not list.
    pub fn replace_catalog(&mut self, catalog: CurrencyCatalog, preferred: &CurrencyCode) {
        if !catalog.contains(&self.source) {
            if let Some(code) = catalog.preferred(preferred) {
                self.source = code.clone();
            }
        }
        if !catalog.contains(&self.target) {
            if let Some(code) = catalog.preferred(preferred) {
                self.target = code.clone();
            }
        }
        self.catalog = Some(catalog);
    }

    /// Without a catalog every well-formed code is accepted.
    pub fn supports(&self, code: &CurrencyCode) -> bool {
        self.catalog.as_ref().is_none_or(|catalog| catalog.contains(code))
    }
}

pub async fn run<R>(
    reader: R,
    catalogs: &dyn CatalogProvider,
    rates: Arc<dyn CurrencyRateProvider>,
    notifier: Arc<dyn UiNotifier>,
    default_currency: CurrencyCode,
    catalog_retries: usize,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut session = Session::new(default_currency.clone());
    if let Some(catalog) =
        currencies::load_catalog(catalogs, notifier.as_ref(), catalog_retries).await
    {
        session.replace_catalog(catalog, &default_currency);
    }
    println!("{}", ui::style_text(HELP, ui::StyleType::Subtle));

    let coordinator = Arc::new(ConversionCoordinator::new(rates, Arc::clone(&notifier)));
    let mut pending = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let edited = match parse_input(&line) {
            Input::Quit => break,
            Input::Help => {
                println!("{HELP}");
                false
            }
            Input::Invalid(message) => {
                notifier.show_failure(&message);
                false
            }
            Input::List => {
                match &session.catalog {
                    Some(catalog) => notifier.show_catalog(catalog),
                    None => notifier.show_failure("Supported currencies are not loaded"),
                }
                false
            }
            Input::Refresh => {
                if let Some(catalog) =
                    currencies::load_catalog(catalogs, notifier.as_ref(), catalog_retries).await
                {
                    session.replace_catalog(catalog, &default_currency);
                }
                false
            }
            Input::Swap => {
                std::mem::swap(&mut session.source, &mut session.target);
                true
            }
            Input::From(code) | Input::To(code) if !session.supports(&code) => {
                notifier.show_failure(&format!("Unsupported currency: {code}"));
                false
            }
            Input::From(code) => {
                session.source = code;
                true
            }
            Input::To(code) => {
                session.target = code;
                true
            }
            Input::Amount(amount) => {
                session.amount = amount;
                true
            }
        };

        if edited {
            debug!(
                amount = %session.amount,
                source = %session.source,
                target = %session.target,
                "Form edited"
            );
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "{} {} -> {}",
                        session.amount, session.source, session.target
                    ),
                    ui::StyleType::Subtle
                )
            );
            pending.spawn(coordinator.begin(&session.amount, &session.source, &session.target));
        }

        while let Some(finished) = pending.try_join_next() {
            if let Err(e) = finished {
                warn!("Conversion task failed: {}", e);
            }
        }
    }

    while let Some(finished) = pending.join_next().await {
        if let Err(e) = finished {
            warn!("Conversion task failed: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversion::AMOUNT_PLACEHOLDER;
    use crate::core::conversion::tests::{RecordingNotifier, UiEvent};
    use crate::core::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::io::BufReader;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    struct FakeService {
        catalog: CurrencyCatalog,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeService {
        fn new(codes: &[&str]) -> Arc<Self> {
            Arc::new(FakeService {
                catalog: CurrencyCatalog::new(codes.iter().map(|c| code(c))),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CatalogProvider for FakeService {
        async fn fetch_catalog(&self) -> Result<CurrencyCatalog, FetchError> {
            Ok(self.catalog.clone())
        }
    }

    #[async_trait]
    impl CurrencyRateProvider for FakeService {
        async fn fetch_rate(
            &self,
            source: &CurrencyCode,
            target: &CurrencyCode,
        ) -> Result<f64, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((source.to_string(), target.to_string()));
            if source == target { Ok(1.0) } else { Ok(0.5) }
        }
    }

    async fn run_session(service: Arc<FakeService>, script: &str) -> Vec<UiEvent> {
        let notifier = Arc::new(RecordingNotifier::default());
        run(
            BufReader::new(script.as_bytes()),
            service.as_ref(),
            service.clone(),
            notifier.clone(),
            code("USD"),
            0,
        )
        .await
        .unwrap();
        notifier.events()
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("100"), Input::Amount("100".into()));
        assert_eq!(parse_input("  "), Input::Amount("".into()));
        assert_eq!(parse_input("abc"), Input::Amount("abc".into()));
        assert_eq!(parse_input("from eur"), Input::From(code("EUR")));
        assert_eq!(parse_input("TO gbp"), Input::To(code("GBP")));
        assert_eq!(parse_input("swap"), Input::Swap);
        assert_eq!(parse_input("quit"), Input::Quit);
        assert_eq!(parse_input("to"), Input::Invalid("Usage: to CODE".into()));
        assert_eq!(
            parse_input("from e$"),
            Input::Invalid("Invalid currency code: 'E$'".into())
        );
    }

    #[test]
    fn test_replace_catalog_keeps_listed_selection() {
        let mut session = Session::new(code("USD"));
        session.source = code("EUR");
        session.target = code("XYZ");

        session.replace_catalog(CurrencyCatalog::new(vec![code("GBP"), code("EUR")]), &code("USD"));

        assert_eq!(session.source, code("EUR"));
        assert_eq!(session.target, code("GBP"));
        assert!(session.supports(&code("GBP")));
        assert!(!session.supports(&code("XYZ")));
    }

    #[tokio::test]
    async fn test_session_shows_latest_conversion() {
        let service = FakeService::new(&["USD", "EUR"]);

        let events = run_session(service.clone(), "100\nto eur\nquit\n").await;

        assert_eq!(
            events.first(),
            Some(&UiEvent::Catalog(vec!["USD".into(), "EUR".into()]))
        );
        assert_eq!(events.last(), Some(&UiEvent::Amount("50.00".into())));
        assert!(
            service
                .calls
                .lock()
                .unwrap()
                .contains(&("USD".to_string(), "EUR".to_string()))
        );
    }

    #[tokio::test]
    async fn test_session_rejects_unlisted_currency() {
        let service = FakeService::new(&["USD", "EUR"]);

        let events = run_session(service.clone(), "from JPY\n").await;

        assert_eq!(
            events.last(),
            Some(&UiEvent::Failure("Unsupported currency: JPY".into()))
        );
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_clearing_amount_skips_network() {
        let service = FakeService::new(&["USD", "EUR"]);

        let events = run_session(service.clone(), "\n").await;

        assert_eq!(
            events.last(),
            Some(&UiEvent::Amount(AMOUNT_PLACEHOLDER.into()))
        );
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_swap_and_list() {
        let service = FakeService::new(&["USD", "EUR"]);

        let events = run_session(service.clone(), "to EUR\n8\nswap\nlist\n").await;

        let calls = service.calls.lock().unwrap().clone();
        assert!(calls.contains(&("EUR".to_string(), "USD".to_string())));
        assert_eq!(
            events
                .iter()
                .rev()
                .find(|e| matches!(e, UiEvent::Amount(_))),
            Some(&UiEvent::Amount("4.00".into()))
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, UiEvent::Catalog(_)))
                .count(),
            2
        );
    }
}
