use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Json, Router};
use shared::TrendingStock;
use trending::{trending_stocks, MarketData, TRENDING_LIMIT};

use crate::pages::{self, AppError};

#[derive(Clone)]
pub struct StocksState {
    pub market: Arc<dyn MarketData>,
}

pub fn router(market: Arc<dyn MarketData>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/v0/trending", get(list))
        .with_state(StocksState { market })
}

// Every view repeats the full fetch.
async fn home(State(state): State<StocksState>) -> Result<Html<String>, AppError> {
    let stocks = trending_stocks(state.market.as_ref(), TRENDING_LIMIT).await?;

    Ok(Html(pages::trending(&stocks)))
}

async fn list(State(state): State<StocksState>) -> Result<Json<Vec<TrendingStock>>, AppError> {
    Ok(Json(
        trending_stocks(state.market.as_ref(), TRENDING_LIMIT).await?,
    ))
}
