pub mod currencyfreaks;
pub mod util;

pub use currencyfreaks::CurrencyFreaksProvider;
