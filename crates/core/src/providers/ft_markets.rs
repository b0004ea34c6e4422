use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::investment::InvestmentType;
use super::traits::{Quote, QuoteProvider};

const BASE_URL: &str = "https://markets.ft.com/data";

/// Browser-like UA — the tearsheet pages refuse the default reqwest agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Quote/FX source scraping the FT markets tearsheet pages.
///
/// - **Funds** use `funds/tearsheet/summary`, everything else
///   `equities/tearsheet/summary`; FX pairs use the currencies tearsheet
///   with the concatenated pair symbol (e.g. `USDGBP`).
/// - Prices quoted in GBX (pence sterling) are converted to GBP.
/// - Bare symbols are retried with common exchange suffixes
///   (`:NYQ`, `:NSQ`, `:LSE`) before giving up.
///
/// Every failure mode — transport error, non-200, markup drift — yields
/// `Ok(None)`: a missing quote is an expected outcome, not an error.
pub struct FtMarketsProvider {
    client: Client,
    quote_value: Regex,
    quote_currency: Regex,
    change_value: Regex,
}

impl FtMarketsProvider {
    pub fn new() -> Result<Self, CoreError> {
        let builder = Client::builder().user_agent(USER_AGENT);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        let client = builder.build()?;

        Ok(Self {
            client,
            // First quote value on the page (the headline price)
            quote_value: Regex::new(
                r#"mod-tearsheet-overview__quote__value[^"]*"[^>]*>\s*([0-9][0-9,]*(?:\.[0-9]+)?)"#,
            )?,
            // Subheading of the quote bar, e.g. "Price (USD)"
            quote_currency: Regex::new(r"Price \(([A-Z]{3})\)")?,
            // "Today's Change" row; the percent part of "1.23 / 0.84%"
            change_value: Regex::new(
                r"(?s)Today(?:'|&#x27;|&apos;)s Change.{0,400}?([+-]?[0-9]+(?:\.[0-9]+)?)%",
            )?,
        })
    }

    fn tearsheet_path(kind: InvestmentType) -> &'static str {
        match kind {
            InvestmentType::Fund => "funds/tearsheet/summary",
            InvestmentType::Etf | InvestmentType::Stock => "equities/tearsheet/summary",
        }
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }

    /// One scrape attempt for one exact symbol.
    async fn scrape_quote(&self, symbol: &str, kind: InvestmentType) -> Option<Quote> {
        let url = format!("{BASE_URL}/{}?s={symbol}", Self::tearsheet_path(kind));
        let html = self.fetch_page(&url).await?;

        let price_text = self.quote_value.captures(&html)?.get(1)?.as_str();
        let mut price: f64 = price_text.replace(',', "").parse().ok()?;

        let mut currency = self
            .quote_currency
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        // Pence sterling — report in pounds
        if currency == "GBX" {
            price /= 100.0;
            currency = "GBP".to_string();
        }

        let change_percent = self
            .change_value
            .captures(&html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        Some(Quote {
            price,
            currency,
            change_percent,
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for FtMarketsProvider {
    fn name(&self) -> &str {
        "FT Markets"
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        kind: InvestmentType,
    ) -> Result<Option<Quote>, CoreError> {
        // 1. Exact symbol as entered
        if let Some(quote) = self.scrape_quote(symbol, kind).await {
            return Ok(Some(quote));
        }

        // 2. Bare symbol — try the common exchange suffixes
        if !symbol.contains(':') {
            for suffix in ["NYQ", "NSQ", "LSE"] {
                let candidate = format!("{symbol}:{suffix}");
                if let Some(quote) = self.scrape_quote(&candidate, kind).await {
                    return Ok(Some(quote));
                }
            }
        }

        // 3. Users often type ":NYSE" where the tearsheets want ":NYQ"
        if let Some(bare) = symbol.strip_suffix(":NYSE") {
            let candidate = format!("{bare}:NYQ");
            if let Some(quote) = self.scrape_quote(&candidate, kind).await {
                return Ok(Some(quote));
            }
        }

        Ok(None)
    }

    async fn fetch_fx_rate(
        &self,
        base: &str,
        target: &str,
    ) -> Result<Option<f64>, CoreError> {
        let base = base.to_uppercase();
        let target = target.to_uppercase();
        if base == target {
            return Ok(Some(1.0));
        }

        let url = format!("{BASE_URL}/currencies/tearsheet/summary?s={base}{target}");
        let Some(html) = self.fetch_page(&url).await else {
            return Ok(None);
        };

        let rate = self
            .quote_value
            .captures(&html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok());

        Ok(rate)
    }
}
