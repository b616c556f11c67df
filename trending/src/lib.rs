use async_trait::async_trait;
use futures::{future, stream, StreamExt, TryStreamExt};
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

pub use shared::TrendingStock;

pub use crate::constituents::{parse_constituents, to_provider_symbol};
pub use crate::yahoo::{Client as YahooClient, Config};

mod constituents;
mod yahoo;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub const CONCURRENT_REQUESTS: usize = 8;
pub const TRENDING_LIMIT: usize = 10;

#[derive(Error, Diagnostic, Debug)]
pub enum MarketError {
    #[error("market data request failed")]
    Transport(#[from] reqwest::Error),
    #[error("no constituents table found on the listing page")]
    MissingConstituents,
    #[error("no chart data for {symbol}: {reason}")]
    Chart { symbol: String, reason: String },
    #[error("none of the {symbols} constituents reported a trading volume")]
    NoVolumeData { symbols: usize },
}

/// Name and price metadata for one ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerInfo {
    pub long_name: Option<String>,
    pub current_price: Option<f64>,
}

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Ticker symbols in the index, in the provider's notation.
    async fn constituents(&self) -> Result<Vec<String>, MarketError>;

    /// Volume traded on the most recent session, if any was reported.
    async fn latest_volume(&self, symbol: &str) -> Result<Option<u64>, MarketError>;

    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo, MarketError>;
}

/// The `limit` most traded constituents, highest volume first.
///
/// Symbols whose daily data can't be fetched are left out of the ranking.
/// Metadata is only fetched for the ranked symbols, and any failure there
/// fails the whole call.
pub async fn trending_stocks<M>(market: &M, limit: usize) -> Result<Vec<TrendingStock>, MarketError>
where
    M: MarketData + ?Sized,
{
    let symbols = market.constituents().await?;
    let symbol_count = symbols.len();
    tracing::info!(symbols = symbol_count, "fetched constituents");

    let volumes: Vec<(String, u64)> = stream::iter(symbols)
        .map(|symbol| async move {
            match market.latest_volume(&symbol).await {
                Ok(Some(volume)) => Some((symbol, volume)),
                Ok(None) => {
                    tracing::debug!(%symbol, "no volume reported");
                    None
                }
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "skipping symbol without daily data");
                    None
                }
            }
        })
        .buffer_unordered(CONCURRENT_REQUESTS)
        .filter_map(future::ready)
        .collect()
        .await;

    if volumes.is_empty() && symbol_count > 0 {
        return Err(MarketError::NoVolumeData {
            symbols: symbol_count,
        });
    }

    let ranked = rank_by_volume(volumes, limit);

    stream::iter(ranked)
        .map(|(symbol, volume)| async move {
            let info = market.ticker_info(&symbol).await?;

            Ok::<_, MarketError>(TrendingStock {
                symbol,
                name: info.long_name,
                price: info.current_price,
                volume,
            })
        })
        .buffered(CONCURRENT_REQUESTS)
        .try_collect()
        .await
}

/// Sort by descending volume, ties broken by symbol, and keep the first `limit`.
pub fn rank_by_volume(volumes: Vec<(String, u64)>, limit: usize) -> Vec<(String, u64)> {
    volumes
        .into_iter()
        .sorted_by(|(a_symbol, a_volume), (b_symbol, b_volume)| {
            b_volume.cmp(a_volume).then_with(|| a_symbol.cmp(b_symbol))
        })
        .take(limit)
        .collect()
}
