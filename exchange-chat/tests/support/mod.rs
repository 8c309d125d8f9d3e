//! A local stand-in for the Privatbank API.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::{net::TcpListener, task::JoinHandle};

struct UpstreamState {
    failing_dates: HashSet<String>,
    requested_dates: Mutex<Vec<String>>,
}

pub struct FakeUpstream {
    addr: SocketAddr,
    state: Arc<UpstreamState>,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> Result<Self> {
        Self::failing_on(Vec::<String>::new()).await
    }

    /// Answers 500 for every archive date in `dates`.
    pub async fn failing_on<I, S>(dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = Arc::new(UpstreamState {
            failing_dates: dates.into_iter().map(Into::into).collect(),
            requested_dates: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/p24api/exchange_rates", get(archive_day))
            .route("/p24api/pubinfo", get(snapshot))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    pub fn historical_url(&self) -> String {
        format!("http://{}/p24api/exchange_rates?json", self.addr)
    }

    #[allow(dead_code)]
    pub fn snapshot_url(&self) -> String {
        format!("http://{}/p24api/pubinfo?exchange&coursid=5", self.addr)
    }

    /// Archive dates requested so far, in arrival order.
    pub fn requested_dates(&self) -> Vec<String> {
        self.state
            .requested_dates
            .lock()
            .expect("request log poisoned")
            .clone()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn archive_day(
    State(state): State<Arc<UpstreamState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let date = params.get("date").cloned().unwrap_or_default();
    state
        .requested_dates
        .lock()
        .expect("request log poisoned")
        .push(date.clone());

    if !params.contains_key("json") {
        return (StatusCode::BAD_REQUEST, "json flag missing").into_response();
    }
    if state.failing_dates.contains(&date) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "archive unavailable").into_response();
    }

    Json(json!({
        "date": date,
        "bank": "PB",
        "baseCurrency": 980,
        "baseCurrencyLit": "UAH",
        "exchangeRate": [
            {"baseCurrency": "UAH", "saleRateNB": 1.0, "purchaseRateNB": 1.0},
            {"baseCurrency": "UAH", "currency": "CHF", "saleRateNB": 46.1, "purchaseRateNB": 46.1},
            {"baseCurrency": "UAH", "currency": "EUR", "saleRateNB": 44.2, "purchaseRateNB": 44.2,
             "saleRate": 44.65, "purchaseRate": 43.9},
            {"baseCurrency": "UAH", "currency": "GBP", "saleRateNB": 52.4, "purchaseRateNB": 52.4,
             "saleRate": 53.0, "purchaseRate": 51.8},
            {"baseCurrency": "UAH", "currency": "PLN", "saleRateNB": 10.3, "purchaseRateNB": 10.3,
             "saleRate": 10.5, "purchaseRate": 10.1},
            {"baseCurrency": "UAH", "currency": "USD", "saleRateNB": 41.3, "purchaseRateNB": 41.3,
             "saleRate": 41.6, "purchaseRate": 41.1}
        ]
    }))
    .into_response()
}

async fn snapshot() -> Response {
    Json(json!([
        {"ccy": "EUR", "base_ccy": "UAH", "buy": "43.90000", "sale": "44.65000"},
        {"ccy": "USD", "base_ccy": "UAH", "buy": "41.10000", "sale": "41.60000"}
    ]))
    .into_response()
}
