use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::investment::Investment;
use super::rates::ExchangeRateTable;

/// A named collection of holdings plus a cash balance.
///
/// `cash` is always expressed in the reporting currency and is never itself
/// currency-converted. `fx_fee_percent` is the fee this portfolio's broker
/// charges on FX conversions (e.g. 1.5), applied on top of market rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    pub name: String,

    /// Cash balance in the reporting currency
    pub cash: f64,

    /// Holdings, in insertion order (display order only — not semantic)
    pub investments: Vec<Investment>,

    /// FX fee percentage applied to effective rates (default 0)
    #[serde(default)]
    pub fx_fee_percent: f64,
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cash: 0.0,
            investments: Vec::new(),
            fx_fee_percent: 0.0,
        }
    }

    /// Find a holding by id.
    pub fn find_investment(&self, id: Uuid) -> Option<&Investment> {
        self.investments.iter().find(|i| i.id == id)
    }

    pub fn find_investment_mut(&mut self, id: Uuid) -> Option<&mut Investment> {
        self.investments.iter_mut().find(|i| i.id == id)
    }
}

/// The whole document: every portfolio, the shared exchange-rate table and
/// the currently selected portfolio.
///
/// Invariants:
/// - the book always contains at least one portfolio (deleting the last
///   one is rejected);
/// - `current_portfolio_id` always references an existing portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioBook {
    /// Ordered sequence of portfolios with unique ids
    pub portfolios: Vec<Portfolio>,

    /// The portfolio selection is explicit document state, threaded through
    /// every call — there is no ambient "current portfolio" in the core.
    pub current_portfolio_id: Uuid,

    /// Shared table of observed foreign-currency rates
    pub exchange_rates: ExchangeRateTable,

    /// When any part of the book was last refreshed or saved
    pub last_updated: DateTime<Utc>,
}

impl PortfolioBook {
    /// A fresh book with a single empty portfolio selected.
    pub fn new() -> Self {
        let portfolio = Portfolio::new("Main");
        let current_portfolio_id = portfolio.id;
        Self {
            portfolios: vec![portfolio],
            current_portfolio_id,
            exchange_rates: ExchangeRateTable::new(),
            last_updated: Utc::now(),
        }
    }

    /// The currently selected portfolio.
    ///
    /// Falls back to the first portfolio if the selection id has somehow
    /// gone stale (e.g. a hand-edited document) — the book is never empty.
    pub fn current(&self) -> &Portfolio {
        self.portfolios
            .iter()
            .find(|p| p.id == self.current_portfolio_id)
            .unwrap_or(&self.portfolios[0])
    }

    pub fn find_portfolio(&self, id: Uuid) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.id == id)
    }

    pub fn find_portfolio_mut(&mut self, id: Uuid) -> Option<&mut Portfolio> {
        self.portfolios.iter_mut().find(|p| p.id == id)
    }

    /// Total number of holdings across every portfolio.
    pub fn investment_count(&self) -> usize {
        self.portfolios.iter().map(|p| p.investments.len()).sum()
    }
}

impl Default for PortfolioBook {
    fn default() -> Self {
        Self::new()
    }
}
