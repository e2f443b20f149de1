//! Core business logic abstractions

pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod log;

// Re-export main types for cleaner imports
pub use conversion::{
    ConversionCoordinator, ConversionOutcome, ConversionRequest, ConversionResult, UiNotifier,
};
pub use currency::{CatalogProvider, CurrencyCatalog, CurrencyCode, CurrencyRateProvider};
pub use error::FetchError;
