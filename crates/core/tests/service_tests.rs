// ═══════════════════════════════════════════════════════════════════
// Service Tests — PortfolioService CRUD invariants, RefreshService with
// mock providers, SummaryService daily-change reconciliation
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::investment::{EditInvestment, InvestmentType, NewInvestment};
use portfolio_tracker_core::models::portfolio::PortfolioBook;
use portfolio_tracker_core::providers::traits::{Quote, QuoteProvider};
use portfolio_tracker_core::services::portfolio_service::PortfolioService;
use portfolio_tracker_core::services::refresh_service::RefreshService;
use portfolio_tracker_core::services::summary_service::SummaryService;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn new_params(symbol: &str, quantity: f64, book_cost: f64) -> NewInvestment {
    NewInvestment {
        kind: InvestmentType::Stock,
        symbol: symbol.into(),
        name: format!("{symbol} Inc."),
        region: "US".into(),
        sector: "Tech".into(),
        quantity,
        book_cost,
        book_cost_currency: "GBP".into(),
        book_cost_exchange_rate: None,
        buy_date: d(2024, 1, 1),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Mock providers
// ═══════════════════════════════════════════════════════════════════

/// HashMap-backed quote source: only listed symbols/pairs resolve.
struct MockQuoteProvider {
    quotes: HashMap<String, Quote>,
    fx: HashMap<(String, String), f64>,
}

impl MockQuoteProvider {
    fn new() -> Self {
        let mut quotes = HashMap::new();
        quotes.insert(
            "AAPL".to_string(),
            Quote {
                price: 150.0,
                currency: "USD".into(),
                change_percent: 1.2,
            },
        );
        quotes.insert(
            "VWRL".to_string(),
            Quote {
                price: 95.0,
                currency: "GBP".into(),
                change_percent: -0.4,
            },
        );

        let mut fx = HashMap::new();
        fx.insert(("USD".to_string(), "GBP".to_string()), 0.8);
        fx.insert(("EUR".to_string(), "GBP".to_string()), 0.85);

        Self { quotes, fx }
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    fn name(&self) -> &str {
        "MockQuotes"
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        _kind: InvestmentType,
    ) -> Result<Option<Quote>, CoreError> {
        Ok(self.quotes.get(symbol).cloned())
    }

    async fn fetch_fx_rate(&self, base: &str, target: &str) -> Result<Option<f64>, CoreError> {
        if base == target {
            return Ok(Some(1.0));
        }
        Ok(self.fx.get(&(base.to_string(), target.to_string())).copied())
    }
}

/// A source that always errors (transport failure).
struct FailingProvider;

#[async_trait]
impl QuoteProvider for FailingProvider {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        _kind: InvestmentType,
    ) -> Result<Option<Quote>, CoreError> {
        Err(CoreError::Provider {
            provider: "Failing".into(),
            message: format!("Simulated failure for {symbol}"),
        })
    }

    async fn fetch_fx_rate(&self, base: &str, target: &str) -> Result<Option<f64>, CoreError> {
        Err(CoreError::Provider {
            provider: "Failing".into(),
            message: format!("Simulated failure for {base}{target}"),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioService — investments
// ═══════════════════════════════════════════════════════════════════

mod investments {
    use super::*;

    #[test]
    fn add_creates_holding_with_anchor() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let id = svc
            .add_investment(&mut book, pid, new_params("VWRL", 10.0, 1000.0))
            .unwrap();

        let inv = book.portfolios[0].find_investment(id).unwrap();
        assert_eq!(inv.history.len(), 1);
        assert_eq!(inv.history[0].price, 100.0);
        assert!(inv.current_price.is_none());
    }

    #[test]
    fn add_rejects_empty_symbol() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let result = svc.add_investment(&mut book, pid, new_params("  ", 1.0, 100.0));
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn add_rejects_negative_quantity() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let result = svc.add_investment(&mut book, pid, new_params("VWRL", -1.0, 100.0));
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn add_to_unknown_portfolio_fails() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();

        let result = svc.add_investment(&mut book, Uuid::new_v4(), new_params("VWRL", 1.0, 100.0));
        assert!(matches!(result, Err(CoreError::PortfolioNotFound(_))));
    }

    #[test]
    fn edit_reanchors_without_growing_history() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        let id = svc
            .add_investment(&mut book, pid, new_params("VWRL", 10.0, 1000.0))
            .unwrap();
        book.portfolios[0]
            .find_investment_mut(id)
            .unwrap()
            .append_price(d(2024, 3, 1), 104.0);

        svc.edit_investment(
            &mut book,
            pid,
            id,
            EditInvestment {
                name: "Vanguard FTSE All-World".into(),
                region: "Global".into(),
                sector: "Equity".into(),
                quantity: 20.0,
                book_cost: 2100.0,
                book_cost_currency: "gbp".into(),
                book_cost_exchange_rate: None,
                buy_date: d(2024, 2, 1),
            },
        )
        .unwrap();

        let inv = book.portfolios[0].find_investment(id).unwrap();
        assert_eq!(inv.history.len(), 2);
        assert_eq!(inv.history[0].date, d(2024, 2, 1));
        assert_eq!(inv.history[0].price, 105.0);
        assert_eq!(inv.book_cost_currency, "GBP");
        assert_eq!(inv.name, "Vanguard FTSE All-World");
    }

    #[test]
    fn edit_unknown_investment_fails() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let result = svc.edit_investment(
            &mut book,
            pid,
            Uuid::new_v4(),
            EditInvestment {
                name: "X".into(),
                region: "".into(),
                sector: "".into(),
                quantity: 1.0,
                book_cost: 1.0,
                book_cost_currency: "GBP".into(),
                book_cost_exchange_rate: None,
                buy_date: d(2024, 1, 1),
            },
        );
        assert!(matches!(result, Err(CoreError::InvestmentNotFound(_))));
    }

    #[test]
    fn remove_with_explicit_sale_value_credits_cash() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        book.portfolios[0].cash = 50.0;
        let id = svc
            .add_investment(&mut book, pid, new_params("VWRL", 10.0, 1000.0))
            .unwrap();

        let proceeds = svc
            .remove_investment(&mut book, pid, id, Some(1234.56), true, d(2024, 6, 1))
            .unwrap();

        assert_eq!(proceeds, 1234.56);
        assert!((book.portfolios[0].cash - 1284.56).abs() < 1e-9);
        assert!(book.portfolios[0].investments.is_empty());
    }

    #[test]
    fn remove_auto_value_matches_fee_adjusted_valuation() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        book.exchange_rates.upsert("USD", 0.8);
        book.portfolios[0].fx_fee_percent = 1.5;

        let id = svc
            .add_investment(&mut book, pid, new_params("AAPL", 10.0, 1000.0))
            .unwrap();
        {
            let inv = book.portfolios[0].find_investment_mut(id).unwrap();
            inv.currency = Some("USD".into());
            inv.current_price = Some(150.0);
        }

        let proceeds = svc
            .remove_investment(&mut book, pid, id, None, true, d(2024, 6, 1))
            .unwrap();

        // Cash increases by exactly the last computed value: 10 × 150 × 0.788
        assert!((proceeds - 1182.0).abs() < 1e-9);
        assert!((book.portfolios[0].cash - 1182.0).abs() < 1e-9);
    }

    #[test]
    fn remove_without_add_to_cash_leaves_cash() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        book.portfolios[0].cash = 75.0;
        let id = svc
            .add_investment(&mut book, pid, new_params("VWRL", 10.0, 1000.0))
            .unwrap();

        let proceeds = svc
            .remove_investment(&mut book, pid, id, Some(9999.0), false, d(2024, 6, 1))
            .unwrap();

        assert_eq!(proceeds, 0.0);
        assert_eq!(book.portfolios[0].cash, 75.0);
        assert!(book.portfolios[0].investments.is_empty());
    }

    #[test]
    fn remove_unknown_investment_fails() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let result =
            svc.remove_investment(&mut book, pid, Uuid::new_v4(), None, true, d(2024, 6, 1));
        assert!(matches!(result, Err(CoreError::InvestmentNotFound(_))));
    }

    #[test]
    fn update_cash_replaces_balance() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        svc.update_cash(&mut book, pid, 420.0).unwrap();
        assert_eq!(book.portfolios[0].cash, 420.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioService — portfolio management
// ═══════════════════════════════════════════════════════════════════

mod portfolios {
    use super::*;

    #[test]
    fn add_and_switch() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();

        let id = svc.add_portfolio(&mut book, "ISA").unwrap();
        svc.switch_portfolio(&mut book, id).unwrap();

        assert_eq!(book.portfolios.len(), 2);
        assert_eq!(book.current_portfolio_id, id);
        assert_eq!(book.current().name, "ISA");
    }

    #[test]
    fn add_rejects_blank_name() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        assert!(svc.add_portfolio(&mut book, "   ").is_err());
    }

    #[test]
    fn switch_to_unknown_id_fails() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let before = book.current_portfolio_id;

        let result = svc.switch_portfolio(&mut book, Uuid::new_v4());
        assert!(matches!(result, Err(CoreError::PortfolioNotFound(_))));
        assert_eq!(book.current_portfolio_id, before);
    }

    #[test]
    fn deleting_last_portfolio_is_rejected() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        let result = svc.delete_portfolio(&mut book, pid);
        assert!(matches!(result, Err(CoreError::LastPortfolio)));
        assert_eq!(book.portfolios.len(), 1);
    }

    #[test]
    fn deleting_current_repoints_selection() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let first = book.current_portfolio_id;
        let second = svc.add_portfolio(&mut book, "ISA").unwrap();
        svc.switch_portfolio(&mut book, second).unwrap();

        svc.delete_portfolio(&mut book, second).unwrap();

        assert_eq!(book.portfolios.len(), 1);
        assert_eq!(book.current_portfolio_id, first);
    }

    #[test]
    fn deleting_other_keeps_selection() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let first = book.current_portfolio_id;
        let second = svc.add_portfolio(&mut book, "ISA").unwrap();

        svc.delete_portfolio(&mut book, second).unwrap();
        assert_eq!(book.current_portfolio_id, first);
    }

    #[test]
    fn rename() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        svc.rename_portfolio(&mut book, pid, "Pension").unwrap();
        assert_eq!(book.current().name, "Pension");
    }

    #[test]
    fn set_fx_fee_validates_range() {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        svc.set_fx_fee(&mut book, pid, 1.5).unwrap();
        assert_eq!(book.current().fx_fee_percent, 1.5);

        assert!(svc.set_fx_fee(&mut book, pid, -0.1).is_err());
        assert!(svc.set_fx_fee(&mut book, pid, 100.5).is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// RefreshService
// ═══════════════════════════════════════════════════════════════════

mod refresh {
    use super::*;

    fn book_with(symbols: &[&str]) -> PortfolioBook {
        let svc = PortfolioService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        for symbol in symbols {
            svc.add_investment(&mut book, pid, new_params(symbol, 10.0, 1000.0))
                .unwrap();
        }
        book
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn applies_quote_and_history_point() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL"]);
        let provider = MockQuoteProvider::new();

        let report = svc
            .refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;

        assert_eq!(report.quotes_applied, 1);
        let inv = &book.portfolios[0].investments[0];
        assert_eq!(inv.current_price, Some(150.0));
        assert_eq!(inv.currency.as_deref(), Some("USD"));
        assert_eq!(inv.daily_change_percent, Some(1.2));
        assert!(inv.last_updated.is_some());
        // Anchor + today's sample
        assert_eq!(inv.history.len(), 2);
        assert_eq!(inv.history[1].date, d(2024, 6, 1));
        assert_eq!(inv.history[1].price, 150.0);
    }

    #[tokio::test]
    async fn same_day_refresh_twice_is_idempotent() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL"]);
        let provider = MockQuoteProvider::new();

        svc.refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;
        svc.refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;

        let inv = &book.portfolios[0].investments[0];
        assert_eq!(inv.history.len(), 2);
        assert_eq!(inv.history[1].price, 150.0);
    }

    #[tokio::test]
    async fn next_day_refresh_appends() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL"]);
        let provider = MockQuoteProvider::new();

        svc.refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;
        svc.refresh_book(&mut book, &provider, d(2024, 6, 2), now())
            .await;

        assert_eq!(book.portfolios[0].investments[0].history.len(), 3);
    }

    #[tokio::test]
    async fn unknown_symbol_leaves_holding_untouched() {
        let svc = RefreshService::new();
        let mut book = book_with(&["NOPE"]);
        let provider = MockQuoteProvider::new();

        let report = svc
            .refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;

        assert_eq!(report.quotes_applied, 0);
        assert_eq!(report.quotes_skipped, 1);
        let inv = &book.portfolios[0].investments[0];
        assert!(inv.current_price.is_none());
        assert!(inv.last_updated.is_none());
        assert_eq!(inv.history.len(), 1);
    }

    #[tokio::test]
    async fn partial_failure_updates_the_rest() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL", "NOPE", "VWRL"]);
        let provider = MockQuoteProvider::new();

        let report = svc
            .refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;

        assert_eq!(report.quotes_applied, 2);
        assert_eq!(report.quotes_skipped, 1);
        let investments = &book.portfolios[0].investments;
        assert_eq!(investments[0].current_price, Some(150.0));
        assert!(investments[1].current_price.is_none());
        assert_eq!(investments[2].current_price, Some(95.0));
    }

    #[tokio::test]
    async fn failing_provider_changes_nothing() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL", "VWRL"]);
        book.exchange_rates.upsert("USD", 0.79);

        let report = svc
            .refresh_book(&mut book, &FailingProvider, d(2024, 6, 1), now())
            .await;

        assert_eq!(report.quotes_applied, 0);
        assert_eq!(report.quotes_skipped, 2);
        assert_eq!(report.rates_updated, 0);
        // Existing rate survives a failed refresh
        assert_eq!(book.exchange_rates.get("USD"), Some(0.79));
        for inv in &book.portfolios[0].investments {
            assert!(inv.current_price.is_none());
            assert_eq!(inv.history.len(), 1);
        }
    }

    #[tokio::test]
    async fn observed_foreign_currency_upserts_rate() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL"]);
        let provider = MockQuoteProvider::new();

        let report = svc
            .refresh_book(&mut book, &provider, d(2024, 6, 1), now())
            .await;

        assert_eq!(report.rates_updated, 1);
        assert_eq!(book.exchange_rates.get("USD"), Some(0.8));
        // Reporting currency never enters the table
        assert_eq!(book.exchange_rates.get("GBP"), None);
    }

    #[tokio::test]
    async fn foreign_book_cost_currency_gets_a_rate_too() {
        let svc = RefreshService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        let mut params = new_params("VWRL", 10.0, 1000.0);
        params.book_cost_currency = "EUR".into();
        PortfolioService::new()
            .add_investment(&mut book, pid, params)
            .unwrap();

        svc.refresh_book(&mut book, &MockQuoteProvider::new(), d(2024, 6, 1), now())
            .await;

        assert_eq!(book.exchange_rates.get("EUR"), Some(0.85));
    }

    #[tokio::test]
    async fn refresh_bumps_book_timestamp() {
        let svc = RefreshService::new();
        let mut book = book_with(&[]);
        let stamp = now();

        svc.refresh_book(&mut book, &MockQuoteProvider::new(), d(2024, 6, 1), stamp)
            .await;
        assert_eq!(book.last_updated, stamp);
    }

    #[tokio::test]
    async fn refresh_single_investment() {
        let svc = RefreshService::new();
        let mut book = book_with(&["AAPL", "VWRL"]);
        let pid = book.current_portfolio_id;
        let id = book.portfolios[0].investments[0].id;

        let updated = svc
            .refresh_investment(
                &mut book,
                pid,
                id,
                &MockQuoteProvider::new(),
                d(2024, 6, 1),
                now(),
            )
            .await;

        assert!(updated);
        assert_eq!(
            book.portfolios[0].investments[0].current_price,
            Some(150.0)
        );
        // The sibling holding is untouched
        assert!(book.portfolios[0].investments[1].current_price.is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// SummaryService — daily change reconciliation
// ═══════════════════════════════════════════════════════════════════

mod daily_change {
    use super::*;

    #[test]
    fn back_solves_previous_value() {
        // 900 today at +12.5% ⇒ yesterday 800
        assert!((SummaryService::previous_value(900.0, 12.5) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn minus_hundred_percent_yields_zero_not_infinity() {
        let prev = SummaryService::previous_value(500.0, -100.0);
        assert_eq!(prev, 0.0);
        assert!(prev.is_finite());
    }

    #[test]
    fn zero_change_keeps_value() {
        assert_eq!(SummaryService::previous_value(123.0, 0.0), 123.0);
    }

    #[test]
    fn portfolio_daily_change_scenario() {
        // Cash 100, one holding worth 900 today with +12.5% daily change:
        // previous = 800 + 100 cash = 900; change = 1000 − 900 = 100 ≈ 11.11%
        let svc = SummaryService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        book.portfolios[0].cash = 100.0;

        let mut params = new_params("VWRL", 10.0, 600.0);
        params.buy_date = d(2024, 1, 1);
        PortfolioService::new()
            .add_investment(&mut book, pid, params)
            .unwrap();
        {
            let inv = book.portfolios[0].investments.first_mut().unwrap();
            inv.current_price = Some(90.0); // 10 × 90 = 900 GBP
            inv.daily_change_percent = Some(12.5);
        }

        let summary = svc.portfolio_summary(&book.portfolios[0], &book.exchange_rates, d(2024, 6, 1));

        assert!((summary.total_value - 1000.0).abs() < 1e-9);
        assert!((summary.daily_change.absolute - 100.0).abs() < 1e-9);
        assert!((summary.daily_change.percent - 100.0 / 900.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_portfolio_has_zero_change() {
        let svc = SummaryService::new();
        let book = PortfolioBook::new();
        let summary =
            svc.portfolio_summary(&book.portfolios[0], &book.exchange_rates, d(2024, 6, 1));
        assert_eq!(summary.daily_change.absolute, 0.0);
        assert_eq!(summary.daily_change.percent, 0.0);
    }

    #[test]
    fn summary_rows_carry_gain_and_fallback_flags() {
        let svc = SummaryService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;

        PortfolioService::new()
            .add_investment(&mut book, pid, new_params("AAPL", 10.0, 1000.0))
            .unwrap();
        {
            let inv = book.portfolios[0].investments.first_mut().unwrap();
            inv.currency = Some("USD".into()); // never observed in the table
            inv.current_price = Some(150.0);
        }

        let summary =
            svc.portfolio_summary(&book.portfolios[0], &book.exchange_rates, d(2024, 6, 1));
        let row = &summary.investments[0];

        assert!(row.rate_fallback);
        assert!(!row.cost_rate_fallback); // book cost is GBP
        assert!((row.value_reporting - 1500.0).abs() < 1e-9);
        assert!((row.gain - 500.0).abs() < 1e-9);
        assert!((row.gain_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn totals_include_cash_but_gain_excludes_it() {
        let svc = SummaryService::new();
        let mut book = PortfolioBook::new();
        let pid = book.current_portfolio_id;
        book.portfolios[0].cash = 250.0;

        PortfolioService::new()
            .add_investment(&mut book, pid, new_params("VWRL", 10.0, 1000.0))
            .unwrap();
        book.portfolios[0].investments[0].current_price = Some(120.0);

        let summary =
            svc.portfolio_summary(&book.portfolios[0], &book.exchange_rates, d(2024, 6, 1));

        assert!((summary.total_value - 1450.0).abs() < 1e-9);
        assert!((summary.total_cost - 1000.0).abs() < 1e-9);
        assert!((summary.total_gain - 200.0).abs() < 1e-9);
        assert!((summary.total_gain_percent - 20.0).abs() < 1e-9);
    }
}
