use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The single currency all cross-portfolio totals are expressed in.
pub const REPORTING_CURRENCY: &str = "GBP";

/// Result of a rate lookup.
///
/// `fallback` is set when the table had no entry for a foreign currency and
/// the lookup degraded to parity (rate 1). The number alone can't be told
/// apart from a genuine 1:1 rate, so callers that care (summaries, UIs)
/// can surface the flag instead of silently showing unconverted values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLookup {
    /// Units of reporting currency per 1 unit of the requested currency.
    pub rate: f64,
    /// True when the rate defaulted to parity because no entry was stored.
    pub fallback: bool,
}

impl RateLookup {
    fn exact(rate: f64) -> Self {
        Self {
            rate,
            fallback: false,
        }
    }

    fn parity_fallback() -> Self {
        Self {
            rate: 1.0,
            fallback: true,
        }
    }
}

/// Mapping from 3-letter currency code to "units of reporting currency per
/// 1 unit of that currency" (e.g. `"USD" → 0.78` means 1 USD = 0.78 GBP).
///
/// The reporting currency itself is implicitly 1 and never stored as a key.
/// Entries are upserted opportunistically whenever a refresh observes a
/// foreign currency; stale entries are never proactively evicted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    pub rates: HashMap<String, f64>,
}

impl ExchangeRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw market rate for a currency, if one is stored.
    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(&currency.to_uppercase()).copied()
    }

    /// Insert or update a rate. The reporting currency is never stored.
    pub fn upsert(&mut self, currency: &str, rate: f64) {
        let code = currency.to_uppercase();
        if code == REPORTING_CURRENCY {
            return;
        }
        self.rates.insert(code, rate);
    }

    /// Market rate to the reporting currency, degrading to parity when the
    /// currency has never been observed.
    pub fn market_rate(&self, currency: &str) -> RateLookup {
        let code = currency.to_uppercase();
        if code == REPORTING_CURRENCY || code.is_empty() {
            return RateLookup::exact(1.0);
        }
        match self.get(&code) {
            Some(rate) => RateLookup::exact(rate),
            None => RateLookup::parity_fallback(),
        }
    }

    /// Market rate after applying a portfolio's FX fee percentage.
    ///
    /// The reporting currency always resolves to exactly 1 — fees never
    /// apply to it. For a foreign currency:
    /// `effective = market × (1 − fee_percent / 100)`.
    pub fn effective_rate(&self, currency: &str, fee_percent: f64) -> RateLookup {
        let code = currency.to_uppercase();
        if code == REPORTING_CURRENCY || code.is_empty() {
            return RateLookup::exact(1.0);
        }
        let market = self.market_rate(&code);
        RateLookup {
            rate: market.rate * (1.0 - fee_percent / 100.0),
            fallback: market.fallback,
        }
    }

    /// Number of stored foreign-currency entries.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
