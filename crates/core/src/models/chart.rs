use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One point of a value-over-time series.
///
/// `value` is either an absolute reporting-currency amount or a normalized
/// percentage return, depending on the requested [`SeriesMode`]. No two
/// points of one series ever share a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// What the series values mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    /// Absolute value in the reporting currency
    Absolute,
    /// Percentage return relative to the series' first positive value
    PercentReturn,
}

/// Value series for a single holding within the book aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentSeries {
    pub investment_id: Uuid,
    pub symbol: String,
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

/// Value series for one portfolio (cash + holdings, cash held flat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSeries {
    pub portfolio_id: Uuid,
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

/// The full aggregation output: per-holding, per-portfolio and whole-book
/// series over the union of every holding's sample dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSeries {
    pub per_investment: Vec<InvestmentSeries>,
    pub per_portfolio: Vec<PortfolioSeries>,
    pub total: Vec<SeriesPoint>,
}

/// Week-over-week movement of a value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChange {
    /// Value at the most recent series point
    pub current: f64,
    /// Value at the last point dated on-or-before seven days ago
    /// (the series' first point when nothing is old enough)
    pub week_ago: f64,
    /// `(current − week_ago) / week_ago × 100`, 0 when `week_ago` is 0
    pub change_percent: f64,
}
