pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use models::{
    chart::{BookSeries, SeriesMode, SeriesPoint, WeeklyChange},
    investment::{EditInvestment, NewInvestment},
    portfolio::{Portfolio, PortfolioBook},
    rates::ExchangeRateTable,
    summary::PortfolioSummary,
};
use providers::traits::QuoteProvider;
use services::{
    chart_service::ChartService,
    portfolio_service::PortfolioService,
    refresh_service::{RefreshReport, RefreshService},
    summary_service::SummaryService,
    valuation_service::{Valuation, ValuationService},
};
use storage::manager::StorageManager;

use errors::CoreError;

/// Main entry point for the Portfolio Tracker core library.
/// Holds the book state and all services needed to operate on it.
#[must_use]
pub struct PortfolioTracker {
    book: PortfolioBook,
    portfolio_service: PortfolioService,
    valuation_service: ValuationService,
    chart_service: ChartService,
    summary_service: SummaryService,
    refresh_service: RefreshService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("portfolios", &self.book.portfolios.len())
            .field("investments", &self.book.investment_count())
            .field("rates", &self.book.exchange_rates.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create a brand new book with a single empty portfolio.
    pub fn create_new() -> Self {
        Self::build(PortfolioBook::new())
    }

    /// Load an existing book from encrypted bytes (password required).
    /// Use this for WASM / Tauri where the frontend handles file I/O.
    pub fn load_from_bytes(encrypted: &[u8], password: &str) -> Result<Self, CoreError> {
        let book = StorageManager::load_from_bytes(encrypted, password)?;
        Ok(Self::build(book))
    }

    /// Save the current book to encrypted bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self, password: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.book, password)?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load from an encrypted file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<Self, CoreError> {
        let book = StorageManager::load_from_file(path, password)?;
        Ok(Self::build(book))
    }

    /// Save to an encrypted file on disk (native only).
    /// Clears the unsaved-changes flag on success.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&mut self, path: &str, password: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.book, path, password)?;
        self.dirty = false;
        Ok(())
    }

    // ── Investment Management ───────────────────────────────────────

    /// Add an investment to a portfolio. The holding starts with its
    /// cost-basis anchor point; quote fields stay empty until a refresh.
    pub fn add_investment(
        &mut self,
        portfolio_id: Uuid,
        params: NewInvestment,
    ) -> Result<Uuid, CoreError> {
        let id = self
            .portfolio_service
            .add_investment(&mut self.book, portfolio_id, params)?;
        self.dirty = true;
        Ok(id)
    }

    /// Add an investment and immediately fetch its first quote (and any
    /// FX rates the new holding needs). A failed fetch still leaves a
    /// fully valid holding — the snapshot fields just stay empty.
    pub async fn add_investment_fetched(
        &mut self,
        portfolio_id: Uuid,
        params: NewInvestment,
        provider: &dyn QuoteProvider,
    ) -> Result<Uuid, CoreError> {
        let id = self.add_investment(portfolio_id, params)?;
        self.refresh_service
            .refresh_investment(
                &mut self.book,
                portfolio_id,
                id,
                provider,
                Self::today(),
                Utc::now(),
            )
            .await;
        Ok(id)
    }

    /// Update an investment's editable fields and rewrite its cost-basis
    /// anchor.
    pub fn edit_investment(
        &mut self,
        portfolio_id: Uuid,
        investment_id: Uuid,
        params: EditInvestment,
    ) -> Result<(), CoreError> {
        self.portfolio_service
            .edit_investment(&mut self.book, portfolio_id, investment_id, params)?;
        self.dirty = true;
        Ok(())
    }

    /// Remove an investment, optionally realizing proceeds into the
    /// portfolio's cash. Returns the amount credited.
    pub fn remove_investment(
        &mut self,
        portfolio_id: Uuid,
        investment_id: Uuid,
        sale_value: Option<f64>,
        add_to_cash: bool,
    ) -> Result<f64, CoreError> {
        let proceeds = self.portfolio_service.remove_investment(
            &mut self.book,
            portfolio_id,
            investment_id,
            sale_value,
            add_to_cash,
            Self::today(),
        )?;
        self.dirty = true;
        Ok(proceeds)
    }

    /// Replace a portfolio's cash balance (reporting currency).
    pub fn update_cash(&mut self, portfolio_id: Uuid, amount: f64) -> Result<(), CoreError> {
        self.portfolio_service
            .update_cash(&mut self.book, portfolio_id, amount)?;
        self.dirty = true;
        Ok(())
    }

    // ── Portfolio Management ────────────────────────────────────────

    /// Create a new empty portfolio and return its id.
    pub fn add_portfolio(&mut self, name: impl Into<String>) -> Result<Uuid, CoreError> {
        let id = self.portfolio_service.add_portfolio(&mut self.book, name)?;
        self.dirty = true;
        Ok(id)
    }

    /// Delete a portfolio. The last remaining portfolio cannot be deleted.
    pub fn delete_portfolio(&mut self, portfolio_id: Uuid) -> Result<(), CoreError> {
        self.portfolio_service
            .delete_portfolio(&mut self.book, portfolio_id)?;
        self.dirty = true;
        Ok(())
    }

    /// Select a different portfolio as current.
    pub fn switch_portfolio(&mut self, portfolio_id: Uuid) -> Result<(), CoreError> {
        self.portfolio_service
            .switch_portfolio(&mut self.book, portfolio_id)?;
        self.dirty = true;
        Ok(())
    }

    pub fn rename_portfolio(
        &mut self,
        portfolio_id: Uuid,
        name: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.portfolio_service
            .rename_portfolio(&mut self.book, portfolio_id, name)?;
        self.dirty = true;
        Ok(())
    }

    /// Set a portfolio's FX fee percentage (0–100).
    pub fn set_fx_fee(&mut self, portfolio_id: Uuid, fee_percent: f64) -> Result<(), CoreError> {
        self.portfolio_service
            .set_fx_fee(&mut self.book, portfolio_id, fee_percent)?;
        self.dirty = true;
        Ok(())
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Refresh quotes for every holding in every portfolio, plus the FX
    /// rates for all foreign currencies observed. Holdings whose fetch
    /// fails are left untouched; partial success is normal.
    pub async fn refresh_prices(&mut self, provider: &dyn QuoteProvider) -> RefreshReport {
        let report = self
            .refresh_service
            .refresh_book(&mut self.book, provider, Self::today(), Utc::now())
            .await;
        self.dirty = true;
        report
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Value a single holding, "now" or at a specific date.
    pub fn investment_valuation(
        &self,
        portfolio_id: Uuid,
        investment_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<Valuation, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        let investment = portfolio
            .find_investment(investment_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(investment_id.to_string()))?;
        Ok(self.valuation_service.value_of(
            investment,
            &self.book.exchange_rates,
            portfolio.fx_fee_percent,
            as_of,
            Self::today(),
        ))
    }

    /// A portfolio's current total value: cash plus every holding.
    pub fn portfolio_value(&self, portfolio_id: Uuid) -> Result<f64, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        let today = Self::today();
        let mut total = portfolio.cash;
        for investment in &portfolio.investments {
            total += self
                .valuation_service
                .value_of(
                    investment,
                    &self.book.exchange_rates,
                    portfolio.fx_fee_percent,
                    None,
                    today,
                )
                .value_reporting;
        }
        Ok(total)
    }

    /// Current value of the whole book across all portfolios.
    pub fn book_value(&self) -> f64 {
        self.book
            .portfolios
            .iter()
            .map(|p| self.portfolio_value(p.id).unwrap_or(0.0))
            .sum()
    }

    // ── Charts & Series ─────────────────────────────────────────────

    /// Build per-holding, per-portfolio and whole-book value series over
    /// the union of all sample dates (optionally restricted to a range).
    pub fn book_series(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
        mode: SeriesMode,
    ) -> BookSeries {
        self.chart_service
            .build_series(&self.book, range, mode, Self::today())
    }

    /// A holding's own percentage-return chart, from its stored history
    /// plus a synthetic "today" point when a fetched price is newer.
    pub fn investment_return_series(
        &self,
        portfolio_id: Uuid,
        investment_id: Uuid,
    ) -> Result<Vec<SeriesPoint>, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        let investment = portfolio
            .find_investment(investment_id)
            .ok_or_else(|| CoreError::InvestmentNotFound(investment_id.to_string()))?;
        Ok(self
            .chart_service
            .investment_return_series(investment, Self::today()))
    }

    /// One portfolio's percentage-return series, normalized against its
    /// first positive value.
    pub fn portfolio_return_series(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<SeriesPoint>, CoreError> {
        let series = self.book_series(None, SeriesMode::PercentReturn);
        series
            .per_portfolio
            .into_iter()
            .find(|s| s.portfolio_id == portfolio_id)
            .map(|s| s.points)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))
    }

    /// Week-over-week change of one portfolio's value series.
    pub fn portfolio_weekly_change(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Option<WeeklyChange>, CoreError> {
        let series = self.book_series(None, SeriesMode::Absolute);
        let points = series
            .per_portfolio
            .iter()
            .find(|s| s.portfolio_id == portfolio_id)
            .map(|s| s.points.as_slice())
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))?;
        Ok(self.chart_service.weekly_change(points, Self::today()))
    }

    /// Week-over-week change of the whole book.
    pub fn book_weekly_change(&self) -> Option<WeeklyChange> {
        let series = self.book_series(None, SeriesMode::Absolute);
        self.chart_service
            .weekly_change(&series.total, Self::today())
    }

    // ── Summary ─────────────────────────────────────────────────────

    /// Full summary of one portfolio: per-holding rows, totals, and the
    /// daily change back-solved from per-holding daily percentages.
    pub fn portfolio_summary(&self, portfolio_id: Uuid) -> Result<PortfolioSummary, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        Ok(self.summary_service.portfolio_summary(
            portfolio,
            &self.book.exchange_rates,
            Self::today(),
        ))
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn portfolios(&self) -> &[Portfolio] {
        &self.book.portfolios
    }

    /// The currently selected portfolio.
    #[must_use]
    pub fn current_portfolio(&self) -> &Portfolio {
        self.book.current()
    }

    #[must_use]
    pub fn current_portfolio_id(&self) -> Uuid {
        self.book.current_portfolio_id
    }

    #[must_use]
    pub fn exchange_rates(&self) -> &ExchangeRateTable {
        &self.book.exchange_rates
    }

    #[must_use]
    pub fn book(&self) -> &PortfolioBook {
        &self.book
    }

    /// Returns `true` if the book has been modified since the last save or
    /// load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Export the full book as JSON (unencrypted snapshot for debugging).
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.book)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize book: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn portfolio(&self, portfolio_id: Uuid) -> Result<&Portfolio, CoreError> {
        self.book
            .find_portfolio(portfolio_id)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn build(book: PortfolioBook) -> Self {
        Self {
            book,
            portfolio_service: PortfolioService::new(),
            valuation_service: ValuationService::new(),
            chart_service: ChartService::new(),
            summary_service: SummaryService::new(),
            refresh_service: RefreshService::new(),
            dirty: false,
        }
    }
}
