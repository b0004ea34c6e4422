use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::investment::{EditInvestment, Investment, NewInvestment};
use crate::models::portfolio::{Portfolio, PortfolioBook};
use crate::services::valuation_service::ValuationService;

/// Manages the write paths of the book: investment add/edit/remove, cash,
/// and portfolio management.
///
/// Pure business logic over `&mut PortfolioBook` — no I/O, no clock except
/// an explicit `today`. Every target portfolio is named by id; there is no
/// ambient selection beyond the book's own `current_portfolio_id` field.
pub struct PortfolioService {
    valuation_service: ValuationService,
}

impl PortfolioService {
    pub fn new() -> Self {
        Self {
            valuation_service: ValuationService::new(),
        }
    }

    // ── Investments ─────────────────────────────────────────────────

    /// Add a holding to a portfolio. The new holding starts with a single
    /// anchor history point at its buy date.
    pub fn add_investment(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        params: NewInvestment,
    ) -> Result<Uuid, CoreError> {
        if params.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Investment symbol must not be empty".into(),
            ));
        }
        if params.quantity < 0.0 {
            return Err(CoreError::ValidationError(
                "Quantity must not be negative".into(),
            ));
        }
        if params.book_cost < 0.0 {
            return Err(CoreError::ValidationError(
                "Book cost must not be negative".into(),
            ));
        }

        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        let investment = Investment::new(params);
        let id = investment.id;
        portfolio.investments.push(investment);
        Ok(id)
    }

    /// Update a holding's editable fields and rewrite its anchor point.
    /// The anchor is always overwritten in place — edits never grow the
    /// history with a second cost-basis sample.
    pub fn edit_investment(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        investment_id: Uuid,
        params: EditInvestment,
    ) -> Result<(), CoreError> {
        if params.quantity < 0.0 {
            return Err(CoreError::ValidationError(
                "Quantity must not be negative".into(),
            ));
        }

        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        let investment = portfolio
            .find_investment_mut(investment_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(investment_id.to_string()))?;

        investment.name = params.name;
        investment.region = params.region;
        investment.sector = params.sector;
        investment.quantity = params.quantity;
        investment.book_cost = params.book_cost;
        investment.book_cost_currency = params.book_cost_currency.to_uppercase();
        investment.book_cost_exchange_rate = params.book_cost_exchange_rate;
        investment.buy_date = params.buy_date;
        investment.reanchor();

        Ok(())
    }

    /// Remove a holding, optionally realizing its position into the
    /// portfolio's cash.
    ///
    /// An explicit `sale_value` (reporting currency) wins; otherwise the
    /// proceeds are the holding's current fee-adjusted `value_reporting`.
    /// Returns the amount credited to cash (0 when `add_to_cash` is false).
    pub fn remove_investment(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        investment_id: Uuid,
        sale_value: Option<f64>,
        add_to_cash: bool,
        today: NaiveDate,
    ) -> Result<f64, CoreError> {
        let table = book.exchange_rates.clone();
        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        let idx = portfolio
            .investments
            .iter()
            .position(|i| i.id == investment_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(investment_id.to_string()))?;

        let mut proceeds = 0.0;
        if add_to_cash {
            proceeds = match sale_value {
                Some(value) => value,
                None => {
                    self.valuation_service
                        .value_of(
                            &portfolio.investments[idx],
                            &table,
                            portfolio.fx_fee_percent,
                            None,
                            today,
                        )
                        .value_reporting
                }
            };
            portfolio.cash += proceeds;
        }

        portfolio.investments.remove(idx);
        Ok(proceeds)
    }

    /// Replace a portfolio's cash balance (reporting currency).
    pub fn update_cash(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        amount: f64,
    ) -> Result<(), CoreError> {
        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        portfolio.cash = amount;
        Ok(())
    }

    // ── Portfolios ──────────────────────────────────────────────────

    /// Create a new empty portfolio and return its id.
    pub fn add_portfolio(
        &self,
        book: &mut PortfolioBook,
        name: impl Into<String>,
    ) -> Result<Uuid, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Portfolio name must not be empty".into(),
            ));
        }
        let portfolio = Portfolio::new(name);
        let id = portfolio.id;
        book.portfolios.push(portfolio);
        Ok(id)
    }

    /// Delete a portfolio. Deleting the last one is rejected; deleting the
    /// currently selected one repoints the selection at the first
    /// remaining portfolio.
    pub fn delete_portfolio(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
    ) -> Result<(), CoreError> {
        if book.portfolios.len() <= 1 {
            return Err(CoreError::LastPortfolio);
        }
        let idx = book
            .portfolios
            .iter()
            .position(|p| p.id == portfolio_id)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))?;

        book.portfolios.remove(idx);
        if book.current_portfolio_id == portfolio_id {
            book.current_portfolio_id = book.portfolios[0].id;
        }
        Ok(())
    }

    /// Change the book's selected portfolio. Unknown ids are rejected so
    /// the selection invariant can never break.
    pub fn switch_portfolio(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
    ) -> Result<(), CoreError> {
        if book.find_portfolio(portfolio_id).is_none() {
            return Err(CoreError::PortfolioNotFound(portfolio_id.to_string()));
        }
        book.current_portfolio_id = portfolio_id;
        Ok(())
    }

    pub fn rename_portfolio(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        name: impl Into<String>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Portfolio name must not be empty".into(),
            ));
        }
        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        portfolio.name = name;
        Ok(())
    }

    /// Set a portfolio's FX fee percentage (0–100).
    pub fn set_fx_fee(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
        fee_percent: f64,
    ) -> Result<(), CoreError> {
        if !(0.0..=100.0).contains(&fee_percent) {
            return Err(CoreError::ValidationError(format!(
                "FX fee of {fee_percent}% is outside 0–100"
            )));
        }
        let portfolio = Self::portfolio_mut(book, portfolio_id)?;
        portfolio.fx_fee_percent = fee_percent;
        Ok(())
    }

    fn portfolio_mut(
        book: &mut PortfolioBook,
        portfolio_id: Uuid,
    ) -> Result<&mut Portfolio, CoreError> {
        book.find_portfolio_mut(portfolio_id)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
