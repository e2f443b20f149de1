//! Currency codes, the supported-currency catalog and the provider ports

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

use super::error::FetchError;

const MAX_CODE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: '{0}'")]
pub struct InvalidCurrencyCode(pub String);

/// Short uppercase identifier such as `USD`.
///
/// Crypto assets listed by the provider may contain digits (`1INCH`), so the
/// accepted format is 1 to 16 ASCII uppercase letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Result<Self, InvalidCurrencyCode> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.len() <= MAX_CODE_LEN
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if valid {
            Ok(CurrencyCode(code))
        } else {
            Err(InvalidCurrencyCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lenient parse for user input: surrounding whitespace is dropped and the
/// code is upper-cased before validation.
impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s.trim().to_uppercase())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Supported currencies in the order the provider listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyCatalog {
    codes: Vec<CurrencyCode>,
}

impl CurrencyCatalog {
    /// Builds a catalog keeping the first occurrence of each code.
    pub fn new(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut seen = HashSet::new();
        let codes = codes
            .into_iter()
            .filter(|code| seen.insert(code.clone()))
            .collect();
        CurrencyCatalog { codes }
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn position(&self, code: &CurrencyCode) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }

    /// The code to pre-select: `code` when listed, otherwise the first entry.
    pub fn preferred(&self, code: &CurrencyCode) -> Option<&CurrencyCode> {
        self.position(code)
            .and_then(|i| self.codes.get(i))
            .or_else(|| self.codes.first())
    }
}

/// Source of the supported-currency list.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<CurrencyCatalog, FetchError>;
}

/// Source of live pairwise rates. Implementations must not cache.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Returns `rate` such that `amount_in_source * rate` is the amount in `target`.
    async fn fetch_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<f64, FetchError>;
}
