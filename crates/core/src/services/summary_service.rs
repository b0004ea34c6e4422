use chrono::NaiveDate;

use crate::models::portfolio::Portfolio;
use crate::models::rates::ExchangeRateTable;
use crate::models::summary::{DailyChange, InvestmentSummary, PortfolioSummary};
use crate::services::valuation_service::ValuationService;

/// Computes per-portfolio summaries: gain/loss rows and the day-over-day
/// change reconstructed from per-holding daily percentages.
///
/// Only a current value and a daily percent change are known per holding,
/// so the previous-day value is back-solved:
/// `previous = today / (1 + pct/100)`. Cash is assumed flat across a day.
pub struct SummaryService {
    valuation_service: ValuationService,
}

impl SummaryService {
    pub fn new() -> Self {
        Self {
            valuation_service: ValuationService::new(),
        }
    }

    /// Previous-day value of a position from its daily change percentage.
    /// A −100% change would make the divisor zero; the previous value is
    /// defined as 0 in that case, not infinite.
    pub fn previous_value(value_today: f64, daily_change_percent: f64) -> f64 {
        let divisor = 1.0 + daily_change_percent / 100.0;
        if divisor == 0.0 {
            0.0
        } else {
            value_today / divisor
        }
    }

    /// Portfolio-level daily delta from a current total and the
    /// reconstructed previous total.
    pub fn daily_change(value_today: f64, previous_value: f64) -> DailyChange {
        let absolute = value_today - previous_value;
        let percent = if previous_value > 0.0 {
            absolute / previous_value * 100.0
        } else {
            0.0
        };
        DailyChange { absolute, percent }
    }

    /// Full summary of one portfolio, holdings valued "now".
    pub fn portfolio_summary(
        &self,
        portfolio: &Portfolio,
        table: &ExchangeRateTable,
        today: NaiveDate,
    ) -> PortfolioSummary {
        let mut rows = Vec::with_capacity(portfolio.investments.len());
        let mut total_value = 0.0;
        let mut previous_total = 0.0;
        let mut total_cost = 0.0;

        for investment in &portfolio.investments {
            let valuation = self.valuation_service.value_of(
                investment,
                table,
                portfolio.fx_fee_percent,
                None,
                today,
            );

            let daily_pct = investment.daily_change_percent.unwrap_or(0.0);
            let previous = Self::previous_value(valuation.value_reporting, daily_pct);

            total_value += valuation.value_reporting;
            previous_total += previous;
            total_cost += valuation.cost_reporting;

            rows.push(InvestmentSummary {
                investment_id: investment.id,
                kind: investment.kind,
                symbol: investment.symbol.clone(),
                name: investment.name.clone(),
                quantity: investment.quantity,
                current_price: investment.current_price,
                currency: investment.market_currency().to_string(),
                value_reporting: valuation.value_reporting,
                cost_reporting: valuation.cost_reporting,
                gain: valuation.gain(),
                gain_percent: valuation.gain_percent(),
                daily_change_percent: investment.daily_change_percent,
                previous_value_reporting: previous,
                rate_fallback: valuation.rate.fallback,
                cost_rate_fallback: valuation.cost_rate.fallback,
            });
        }

        // Cash participates in both totals unchanged — a flat 0% daily move
        total_value += portfolio.cash;
        previous_total += portfolio.cash;

        let holdings_value = total_value - portfolio.cash;
        let total_gain = holdings_value - total_cost;
        let total_gain_percent = if total_cost > 0.0 {
            total_gain / total_cost * 100.0
        } else {
            0.0
        };

        PortfolioSummary {
            portfolio_id: portfolio.id,
            name: portfolio.name.clone(),
            as_of: today,
            cash: portfolio.cash,
            total_value,
            total_cost,
            total_gain,
            total_gain_percent,
            daily_change: Self::daily_change(total_value, previous_total),
            investments: rows,
        }
    }
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}
