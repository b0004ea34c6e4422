use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::investment::InvestmentType;

/// Portfolio-level day-over-day movement, back-solved from per-holding
/// daily change percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChange {
    /// Today's total minus the reconstructed previous total, in the
    /// reporting currency
    pub absolute: f64,
    /// `absolute / previous_total × 100`, 0 when the previous total is not
    /// positive
    pub percent: f64,
}

/// One row of a portfolio summary: a holding valued "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentSummary {
    pub investment_id: Uuid,
    pub kind: InvestmentType,
    pub symbol: String,
    pub name: String,
    pub quantity: f64,

    /// Latest fetched native price, if any
    pub current_price: Option<f64>,
    /// Market currency the price is quoted in
    pub currency: String,

    /// Position value in the reporting currency (fee-adjusted rate)
    pub value_reporting: f64,
    /// Book cost in the reporting currency (constant across time)
    pub cost_reporting: f64,

    /// `value_reporting − cost_reporting`
    pub gain: f64,
    /// `gain / cost_reporting × 100`, 0 when the cost is not positive
    pub gain_percent: f64,

    /// Signed percent change over the last trading day, if fetched
    pub daily_change_percent: Option<f64>,
    /// Yesterday's value back-solved from the daily change
    pub previous_value_reporting: f64,

    /// True when the value conversion fell back to a parity rate because
    /// the market currency was never observed in the rate table
    pub rate_fallback: bool,
    /// Same flag for the book-cost conversion
    pub cost_rate_fallback: bool,
}

/// Full summary of one portfolio at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub portfolio_id: Uuid,
    pub name: String,
    pub as_of: NaiveDate,

    /// Cash balance (reporting currency, included in the totals)
    pub cash: f64,

    /// Cash plus every holding's reporting-currency value
    pub total_value: f64,
    /// Sum of the holdings' reporting-currency book costs
    pub total_cost: f64,
    /// Holdings gain: `(total_value − cash) − total_cost`
    pub total_gain: f64,
    /// `total_gain / total_cost × 100`, 0 when the cost is not positive
    pub total_gain_percent: f64,

    pub daily_change: DailyChange,

    pub investments: Vec<InvestmentSummary>,
}
