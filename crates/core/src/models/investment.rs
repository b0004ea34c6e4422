use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::price::{self, PricePoint};
use super::rates::{ExchangeRateTable, RateLookup, REPORTING_CURRENCY};

/// The category of a tracked investment.
/// Determines which tearsheet path the quote provider scrapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentType {
    /// Open-ended funds (OEICs, unit trusts)
    Fund,
    /// Exchange-traded funds
    Etf,
    /// Individual equities
    Stock,
}

impl std::fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestmentType::Fund => write!(f, "Fund"),
            InvestmentType::Etf => write!(f, "ETF"),
            InvestmentType::Stock => write!(f, "Stock"),
        }
    }
}

/// A single holding: a position in one fund/ETF/stock plus its locally
/// stored price history.
///
/// The first history sample is the **anchor** — the cost-basis price at
/// purchase (`book_cost / quantity`, 0 when quantity is 0). It is created
/// on add and overwritten (never duplicated) whenever quantity, cost or
/// buy date are edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    /// Unique identifier
    pub id: Uuid,

    /// Fund / ETF / Stock
    pub kind: InvestmentType,

    /// Ticker or ISIN, possibly suffixed with an exchange (e.g. "MKL:NYQ")
    pub symbol: String,

    /// Human-readable name
    pub name: String,

    /// Display grouping fields
    pub region: String,
    pub sector: String,

    /// Units held (never negative)
    pub quantity: f64,

    /// Total amount originally paid, in `book_cost_currency`
    pub book_cost: f64,

    /// Currency the book cost was entered in (e.g. "GBP", "USD")
    pub book_cost_currency: String,

    /// Optional manual override: units of reporting currency per 1 unit of
    /// `book_cost_currency`, assumed already net of any fee.
    #[serde(default)]
    pub book_cost_exchange_rate: Option<f64>,

    /// Purchase date — the holding contributes zero value before it
    pub buy_date: NaiveDate,

    /// Sparse, irregularly-dated price samples in the market currency
    pub history: Vec<PricePoint>,

    // ── Fetched snapshot ────────────────────────────────────────────
    /// Latest fetched market price (native currency)
    #[serde(default)]
    pub current_price: Option<f64>,

    /// Market currency of the asset, which may differ from the book-cost
    /// currency (e.g. a USD-priced ETF paid for in GBP)
    #[serde(default)]
    pub currency: Option<String>,

    /// Signed percent change over the last trading day
    #[serde(default)]
    pub daily_change_percent: Option<f64>,

    /// When the snapshot fields were last refreshed
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Parameters for creating a new investment.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub kind: InvestmentType,
    pub symbol: String,
    pub name: String,
    pub region: String,
    pub sector: String,
    pub quantity: f64,
    pub book_cost: f64,
    pub book_cost_currency: String,
    pub book_cost_exchange_rate: Option<f64>,
    pub buy_date: NaiveDate,
}

/// Parameters for editing an existing investment.
/// Snapshot fields (price, market currency, daily change) are not editable —
/// they only come from refreshes.
#[derive(Debug, Clone)]
pub struct EditInvestment {
    pub name: String,
    pub region: String,
    pub sector: String,
    pub quantity: f64,
    pub book_cost: f64,
    pub book_cost_currency: String,
    pub book_cost_exchange_rate: Option<f64>,
    pub buy_date: NaiveDate,
}

impl Investment {
    /// Build a holding from creation parameters with a single anchor
    /// history point at the buy date.
    pub fn new(params: NewInvestment) -> Self {
        let book_cost_currency = if params.book_cost_currency.trim().is_empty() {
            REPORTING_CURRENCY.to_string()
        } else {
            params.book_cost_currency.to_uppercase()
        };
        let mut investment = Self {
            id: Uuid::new_v4(),
            kind: params.kind,
            symbol: params.symbol,
            name: params.name,
            region: params.region,
            sector: params.sector,
            quantity: params.quantity,
            book_cost: params.book_cost,
            book_cost_currency,
            book_cost_exchange_rate: params.book_cost_exchange_rate,
            buy_date: params.buy_date,
            history: Vec::new(),
            current_price: None,
            currency: None,
            daily_change_percent: None,
            last_updated: None,
        };
        let anchor_price = investment.cost_basis_price();
        price::reanchor(&mut investment.history, investment.buy_date, anchor_price);
        investment
    }

    /// Cost-basis price per unit: `book_cost / quantity`, 0 when nothing is
    /// held (avoids a division by zero for placeholder rows).
    pub fn cost_basis_price(&self) -> f64 {
        if self.quantity > 0.0 {
            self.book_cost / self.quantity
        } else {
            0.0
        }
    }

    /// Market currency, defaulting to the reporting currency when no quote
    /// has been fetched yet.
    pub fn market_currency(&self) -> &str {
        match self.currency.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => REPORTING_CURRENCY,
        }
    }

    /// Reconstruct the native price as of a date from the sparse history.
    ///
    /// Latest sample dated ≤ `as_of` wins (forward fill). With no such
    /// sample but `as_of` on or after the buy date, the cost-basis price is
    /// returned — we know what it was bought at and haven't sampled since.
    /// Before the buy date there is nothing meaningful to report: 0.
    pub fn reconstruct_price(&self, as_of: NaiveDate) -> f64 {
        if let Some(point) = price::latest_on_or_before(&self.history, as_of) {
            return point.price;
        }
        if as_of >= self.buy_date {
            self.cost_basis_price()
        } else {
            0.0
        }
    }

    /// Record a refreshed price for `date`, overwriting the last sample in
    /// place when it already carries that date.
    pub fn append_price(&mut self, date: NaiveDate, new_price: f64) {
        price::append_or_update(&mut self.history, date, new_price);
    }

    /// Rewrite the anchor sample after quantity/cost/date edits.
    pub fn reanchor(&mut self) {
        let anchor_price = self.cost_basis_price();
        price::reanchor(&mut self.history, self.buy_date, anchor_price);
    }

    /// Rate used to convert the book cost into the reporting currency.
    ///
    /// A manual `book_cost_exchange_rate > 0` is used verbatim — it is
    /// assumed already net, so the portfolio fee is NOT reapplied. Otherwise
    /// the fee-adjusted effective rate for the book-cost currency applies.
    pub fn cost_basis_rate(&self, table: &ExchangeRateTable, fee_percent: f64) -> RateLookup {
        if self.book_cost_currency != REPORTING_CURRENCY {
            if let Some(manual) = self.book_cost_exchange_rate {
                if manual > 0.0 {
                    return RateLookup {
                        rate: manual,
                        fallback: false,
                    };
                }
            }
        }
        table.effective_rate(&self.book_cost_currency, fee_percent)
    }
}
