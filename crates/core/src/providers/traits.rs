use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::investment::InvestmentType;

/// A fetched market snapshot for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Latest price in the instrument's native currency
    pub price: f64,
    /// ISO 4217 code the price is quoted in
    pub currency: String,
    /// Signed percent change over the last trading day
    pub change_percent: f64,
}

/// Trait abstraction over the external quote/FX source.
///
/// The core treats fetching as a black box: `Ok(None)` means "nothing
/// usable for this symbol right now" and leaves the holding untouched,
/// exactly like a transport error does. Retry, timeout and cancellation
/// policies belong to the implementation, never to the core.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the current quote for a symbol.
    async fn fetch_quote(
        &self,
        symbol: &str,
        kind: InvestmentType,
    ) -> Result<Option<Quote>, CoreError>;

    /// Fetch an exchange rate: units of `target` per 1 unit of `base`.
    async fn fetch_fx_rate(
        &self,
        base: &str,
        target: &str,
    ) -> Result<Option<f64>, CoreError>;
}
