use std::time::Duration;

use async_trait::async_trait;
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::{
    parse_constituents, to_provider_symbol, MarketData, MarketError, TickerInfo, APP_USER_AGENT,
};

pub const DEFAULT_LISTING_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";
pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub listing_url: String,
    pub chart_url: String,
    pub timeout: Duration,
}

/// Scrapes the constituents listing and reads daily bars from the Yahoo chart API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listing_url = std::env::var("TRENDING_LISTING_URL")
            .unwrap_or_else(|_| DEFAULT_LISTING_URL.to_owned());
        let chart_url =
            std::env::var("TRENDING_CHART_URL").unwrap_or_else(|_| DEFAULT_CHART_URL.to_owned());
        let timeout = match std::env::var("TRENDING_TIMEOUT_SECS") {
            Ok(secs) => secs
                .parse()
                .into_diagnostic()
                .wrap_err("TRENDING_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            listing_url,
            chart_url,
            timeout: Duration::from_secs(timeout),
        })
    }

    pub fn client(&self) -> Result<Client> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(self.timeout)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build reqwest client")?;

        Ok(Client {
            http,
            config: self.clone(),
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_volume: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct QuoteSeries {
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl ChartEnvelope {
    fn into_result(self, symbol: &str) -> Result<ChartResult, MarketError> {
        if let Some(err) = self.chart.error {
            return Err(MarketError::Chart {
                symbol: symbol.to_owned(),
                reason: format!("{}: {}", err.code, err.description),
            });
        }

        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| MarketError::Chart {
                symbol: symbol.to_owned(),
                reason: "empty result".to_owned(),
            })
    }
}

impl ChartResult {
    /// Last non-null bar volume, falling back to the session volume in `meta`.
    fn latest_volume(&self) -> Option<u64> {
        self.indicators
            .quote
            .first()
            .and_then(|series| series.volume.iter().rev().find_map(|v| *v))
            .or(self.meta.regular_market_volume)
    }

    fn ticker_info(self) -> TickerInfo {
        TickerInfo {
            long_name: self.meta.long_name.or(self.meta.short_name),
            current_price: self.meta.regular_market_price,
        }
    }
}

impl Client {
    async fn chart(&self, symbol: &str) -> Result<ChartResult, MarketError> {
        let url = format!("{}/{}", self.config.chart_url.trim_end_matches('/'), symbol);

        // Unknown symbols come back as 404 with an error envelope.
        let response = self
            .http
            .get(url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;

        let envelope = response.json::<ChartEnvelope>().await?;

        envelope.into_result(symbol)
    }
}

#[async_trait]
impl MarketData for Client {
    async fn constituents(&self) -> Result<Vec<String>, MarketError> {
        tracing::debug!(url = %self.config.listing_url, "fetching constituents listing");

        let html = self
            .http
            .get(&self.config.listing_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let symbols = parse_constituents(&html)?;

        Ok(symbols.iter().map(|s| to_provider_symbol(s)).collect())
    }

    async fn latest_volume(&self, symbol: &str) -> Result<Option<u64>, MarketError> {
        Ok(self.chart(symbol).await?.latest_volume())
    }

    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketError> {
        Ok(self.chart(symbol).await?.ticker_info())
    }
}
