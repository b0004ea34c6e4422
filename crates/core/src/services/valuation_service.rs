use chrono::NaiveDate;

use crate::models::investment::Investment;
use crate::models::rates::{ExchangeRateTable, RateLookup};

/// A holding valued at a single point in time, in the reporting currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    /// quantity × native price × effective rate
    pub value_reporting: f64,
    /// book cost × cost-basis rate — constant across time, book cost is
    /// not historized
    pub cost_reporting: f64,
    /// Rate applied to the market value
    pub rate: RateLookup,
    /// Rate applied to the book cost
    pub cost_rate: RateLookup,
}

impl Valuation {
    /// Absolute gain in the reporting currency.
    pub fn gain(&self) -> f64 {
        self.value_reporting - self.cost_reporting
    }

    /// Percentage gain. A non-positive cost yields 0 — never NaN or ∞.
    pub fn gain_percent(&self) -> f64 {
        if self.cost_reporting > 0.0 {
            self.gain() / self.cost_reporting * 100.0
        } else {
            0.0
        }
    }
}

/// Converts holdings into reporting-currency values.
///
/// Pure arithmetic over an immutable snapshot — no I/O, no clock. Callers
/// supply `today` so valuations stay reproducible.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Value a holding at a point in time.
    ///
    /// `as_of = None` means "now": the fetched `current_price` is used when
    /// present, falling back to history reconstruction at `today`. A dated
    /// valuation always reconstructs from history.
    ///
    /// A holding contributes **zero** value before its buy date, whatever
    /// stray history samples exist — it was not in the portfolio yet. The
    /// book cost conversion is unaffected by `as_of`.
    pub fn value_of(
        &self,
        investment: &Investment,
        table: &ExchangeRateTable,
        fee_percent: f64,
        as_of: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Valuation {
        let rate = table.effective_rate(investment.market_currency(), fee_percent);
        let cost_rate = investment.cost_basis_rate(table, fee_percent);

        let price_native = match as_of {
            Some(date) => investment.reconstruct_price(date),
            None => investment
                .current_price
                .unwrap_or_else(|| investment.reconstruct_price(today)),
        };

        let predates_purchase = as_of.is_some_and(|date| date < investment.buy_date);
        let value_reporting = if predates_purchase {
            0.0
        } else {
            investment.quantity * price_native * rate.rate
        };

        Valuation {
            value_reporting,
            cost_reporting: investment.book_cost * cost_rate.rate,
            rate,
            cost_rate,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
