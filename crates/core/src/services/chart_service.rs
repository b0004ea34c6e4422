use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::models::chart::{
    BookSeries, InvestmentSeries, PortfolioSeries, SeriesMode, SeriesPoint, WeeklyChange,
};
use crate::models::investment::Investment;
use crate::models::portfolio::PortfolioBook;
use crate::services::valuation_service::ValuationService;

/// Builds chart-ready time series from the book.
///
/// The core computes all the numbers — the frontend only renders. Values
/// are reconstructed from each holding's sparse price history (forward
/// fill), converted with the owning portfolio's fee-adjusted rates, and
/// summed per date. Cash is treated as date-invariant: historical cash
/// movements are not modeled.
pub struct ChartService {
    valuation_service: ValuationService,
}

impl ChartService {
    pub fn new() -> Self {
        Self {
            valuation_service: ValuationService::new(),
        }
    }

    /// The dates a book series is evaluated on: the union of every
    /// holding's sample dates, every holding's buy date, and `today`,
    /// across all portfolios — deduplicated and sorted ascending.
    pub fn date_universe(&self, book: &PortfolioBook, today: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = BTreeSet::new();
        dates.insert(today);
        for portfolio in &book.portfolios {
            for investment in &portfolio.investments {
                dates.insert(investment.buy_date);
                for point in &investment.history {
                    dates.insert(point.date);
                }
            }
        }
        dates.into_iter().collect()
    }

    /// Build per-holding, per-portfolio and whole-book series.
    ///
    /// `range` restricts the date universe (inclusive on both ends).
    /// In [`SeriesMode::PercentReturn`] every series is normalized against
    /// its own first positive value; series with no positive value come
    /// back empty.
    pub fn build_series(
        &self,
        book: &PortfolioBook,
        range: Option<(NaiveDate, NaiveDate)>,
        mode: SeriesMode,
        today: NaiveDate,
    ) -> BookSeries {
        let mut dates = self.date_universe(book, today);
        if let Some((from, to)) = range {
            dates.retain(|d| *d >= from && *d <= to);
        }

        let mut per_investment = Vec::new();
        let mut per_portfolio = Vec::new();
        let mut total: Vec<SeriesPoint> = dates
            .iter()
            .map(|d| SeriesPoint {
                date: *d,
                value: 0.0,
            })
            .collect();

        for portfolio in &book.portfolios {
            let mut portfolio_points = Vec::with_capacity(dates.len());

            for (idx, date) in dates.iter().enumerate() {
                // Cash is constant across history — a deliberate modeling
                // simplification, not derived from any samples.
                let mut value = portfolio.cash;
                for investment in &portfolio.investments {
                    value += self
                        .valuation_service
                        .value_of(
                            investment,
                            &book.exchange_rates,
                            portfolio.fx_fee_percent,
                            Some(*date),
                            today,
                        )
                        .value_reporting;
                }
                portfolio_points.push(SeriesPoint { date: *date, value });
                total[idx].value += value;
            }

            for investment in &portfolio.investments {
                let points = dates
                    .iter()
                    .map(|date| SeriesPoint {
                        date: *date,
                        value: self
                            .valuation_service
                            .value_of(
                                investment,
                                &book.exchange_rates,
                                portfolio.fx_fee_percent,
                                Some(*date),
                                today,
                            )
                            .value_reporting,
                    })
                    .collect();
                per_investment.push(InvestmentSeries {
                    investment_id: investment.id,
                    symbol: investment.symbol.clone(),
                    name: investment.name.clone(),
                    points: self.apply_mode(points, mode),
                });
            }

            per_portfolio.push(PortfolioSeries {
                portfolio_id: portfolio.id,
                name: portfolio.name.clone(),
                points: self.apply_mode(portfolio_points, mode),
            });
        }

        BookSeries {
            per_investment,
            per_portfolio,
            total: self.apply_mode(total, mode),
        }
    }

    fn apply_mode(&self, points: Vec<SeriesPoint>, mode: SeriesMode) -> Vec<SeriesPoint> {
        match mode {
            SeriesMode::Absolute => points,
            SeriesMode::PercentReturn => self.percentage_return(&points),
        }
    }

    /// Normalize an absolute series to percentage returns.
    ///
    /// The baseline is the first entry with a value > 0; output is
    /// restricted to dates on or after it, so the first output point is
    /// always 0.0 at the baseline date. A series with no positive entry
    /// produces an empty result — never a division by zero.
    pub fn percentage_return(&self, points: &[SeriesPoint]) -> Vec<SeriesPoint> {
        let baseline_idx = match points.iter().position(|p| p.value > 0.0) {
            Some(idx) => idx,
            None => return Vec::new(),
        };
        let baseline = points[baseline_idx].value;
        points[baseline_idx..]
            .iter()
            .map(|p| SeriesPoint {
                date: p.date,
                value: (p.value - baseline) / baseline * 100.0,
            })
            .collect()
    }

    /// Week-over-week movement of a series.
    ///
    /// The comparison point is the last entry dated on-or-before seven
    /// calendar days before `today`, scanning backward from the newest
    /// point; when nothing is old enough the series' first point serves as
    /// the fallback. Returns `None` for an empty series.
    pub fn weekly_change(
        &self,
        points: &[SeriesPoint],
        today: NaiveDate,
    ) -> Option<WeeklyChange> {
        let last = points.last()?;
        let cutoff = today - Duration::days(7);

        let week_ago_point = points
            .iter()
            .rev()
            .find(|p| p.date <= cutoff)
            .unwrap_or(points.first()?);

        let current = last.value;
        let week_ago = week_ago_point.value;
        let change_percent = if week_ago != 0.0 {
            (current - week_ago) / week_ago * 100.0
        } else {
            0.0
        };

        Some(WeeklyChange {
            current,
            week_ago,
            change_percent,
        })
    }

    /// Per-holding percentage-return chart, independent of any portfolio
    /// aggregation: the holding's own samples, extended with a synthetic
    /// "today" point from the fetched price when the last stored sample
    /// predates today, normalized against the first point's price.
    ///
    /// A non-positive first price degrades the baseline to 1 so the
    /// transform stays total; such a chart starts at −100% rather than
    /// dividing by zero.
    pub fn investment_return_series(
        &self,
        investment: &Investment,
        today: NaiveDate,
    ) -> Vec<SeriesPoint> {
        let mut points = investment.history.clone();

        // Legacy rows may predate local history tracking
        if points.is_empty() && investment.quantity > 0.0 {
            points.push(crate::models::price::PricePoint {
                date: investment.buy_date,
                price: investment.cost_basis_price(),
            });
        }

        if let Some(current_price) = investment.current_price {
            let stale = points.last().is_some_and(|last| last.date < today);
            if stale {
                points.push(crate::models::price::PricePoint {
                    date: today,
                    price: current_price,
                });
            }
        }

        points.sort_by_key(|p| p.date);

        let baseline = match points.first() {
            Some(first) if first.price > 0.0 => first.price,
            Some(_) => 1.0,
            None => return Vec::new(),
        };

        points
            .iter()
            .map(|p| SeriesPoint {
                date: p.date,
                value: (p.price - baseline) / baseline * 100.0,
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
