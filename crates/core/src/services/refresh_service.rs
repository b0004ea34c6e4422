use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::models::investment::Investment;
use crate::models::portfolio::PortfolioBook;
use crate::models::rates::REPORTING_CURRENCY;
use crate::providers::traits::{Quote, QuoteProvider};

/// Outcome of a batch refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Holdings whose snapshot was updated
    pub quotes_applied: usize,
    /// Holdings left untouched because no quote came back
    pub quotes_skipped: usize,
    /// Exchange-rate entries upserted
    pub rates_updated: usize,
}

/// Pulls fresh quotes and FX rates through a [`QuoteProvider`] and applies
/// them to the book.
///
/// Refreshes are independent per holding: each either fully applies
/// (price, currency, daily change, timestamp, today's history point) or
/// leaves the holding exactly as it was. A failed fetch is an expected
/// outcome, never an error — partial success across a batch is normal.
pub struct RefreshService;

impl RefreshService {
    pub fn new() -> Self {
        Self
    }

    /// Refresh every holding in every portfolio, then re-fetch rates for
    /// all foreign currencies observed along the way. Bumps the book's
    /// `last_updated` stamp.
    pub async fn refresh_book(
        &self,
        book: &mut PortfolioBook,
        provider: &dyn QuoteProvider,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> RefreshReport {
        let mut report = RefreshReport::default();
        let mut currencies: BTreeSet<String> = BTreeSet::new();

        for portfolio in &mut book.portfolios {
            for investment in &mut portfolio.investments {
                match provider.fetch_quote(&investment.symbol, investment.kind).await {
                    Ok(Some(quote)) => {
                        Self::apply_quote(investment, &quote, today, now);
                        report.quotes_applied += 1;
                        if quote.currency != REPORTING_CURRENCY && !quote.currency.is_empty() {
                            currencies.insert(quote.currency);
                        }
                    }
                    // No quote or transport failure: snapshot stays as-is
                    Ok(None) | Err(_) => report.quotes_skipped += 1,
                }
                if investment.book_cost_currency != REPORTING_CURRENCY {
                    currencies.insert(investment.book_cost_currency.clone());
                }
            }
        }

        report.rates_updated = self.refresh_rates(book, provider, &currencies).await;
        book.last_updated = now;
        report
    }

    /// Fetch the current quote for one holding and apply it. Returns
    /// whether anything changed.
    pub async fn refresh_investment(
        &self,
        book: &mut PortfolioBook,
        portfolio_id: uuid::Uuid,
        investment_id: uuid::Uuid,
        provider: &dyn QuoteProvider,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(portfolio) = book.find_portfolio_mut(portfolio_id) else {
            return false;
        };
        let Some(investment) = portfolio.find_investment_mut(investment_id) else {
            return false;
        };

        let quote = match provider.fetch_quote(&investment.symbol, investment.kind).await {
            Ok(Some(quote)) => quote,
            Ok(None) | Err(_) => return false,
        };
        Self::apply_quote(investment, &quote, today, now);
        let book_cost_currency = investment.book_cost_currency.clone();

        let mut currencies = BTreeSet::new();
        if quote.currency != REPORTING_CURRENCY && !quote.currency.is_empty() {
            currencies.insert(quote.currency);
        }
        if book_cost_currency != REPORTING_CURRENCY {
            currencies.insert(book_cost_currency);
        }
        self.refresh_rates(book, provider, &currencies).await;
        true
    }

    /// Apply one fetched quote: snapshot fields plus the today history
    /// point (overwriting an earlier same-day refresh in place).
    fn apply_quote(
        investment: &mut Investment,
        quote: &Quote,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) {
        investment.current_price = Some(quote.price);
        investment.daily_change_percent = Some(quote.change_percent);
        investment.currency = Some(quote.currency.clone());
        investment.last_updated = Some(now);
        investment.append_price(today, quote.price);
    }

    /// Upsert rates for the given foreign currencies. A `None`/failed
    /// fetch leaves any existing entry alone.
    async fn refresh_rates(
        &self,
        book: &mut PortfolioBook,
        provider: &dyn QuoteProvider,
        currencies: &BTreeSet<String>,
    ) -> usize {
        let mut updated = 0;
        for currency in currencies {
            if currency == REPORTING_CURRENCY {
                continue;
            }
            match provider.fetch_fx_rate(currency, REPORTING_CURRENCY).await {
                Ok(Some(rate)) => {
                    book.exchange_rates.upsert(currency, rate);
                    updated += 1;
                }
                Ok(None) | Err(_) => {}
            }
        }
        updated
    }
}

impl Default for RefreshService {
    fn default() -> Self {
        Self::new()
    }
}
