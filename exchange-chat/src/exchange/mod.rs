//! Exchange-rate aggregation against the Privatbank public API.
//!
//! [`Aggregator`] runs in one of two modes:
//!
//! - [`ExchangeMode::Historical`] requests the archive endpoint once per day,
//!   counting back from today, and keeps the configured currencies.
//! - [`ExchangeMode::Snapshot`] requests the current cash rates once and keeps
//!   every currency returned.
//!
//! A batch either succeeds as a whole or fails: one bad response discards the
//! rest. [`format`] turns the records into the chat line or the CLI table.

pub mod format;
pub mod upstream;

use std::{error::Error, fmt, time::Duration};

use chrono::{Days, Local, NaiveDate};
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use self::upstream::{DailyRates, SnapshotRate};

pub const DEFAULT_HISTORICAL_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates?json";
pub const DEFAULT_SNAPSHOT_URL: &str = "https://api.privatbank.ua/p24api/pubinfo?exchange&coursid=5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExchangeMode {
    /// One archive request per day, filtered to the configured currencies.
    #[default]
    Historical,
    /// A single request for today's cash rates, all currencies.
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub mode: ExchangeMode,
    pub historical_url: String,
    pub snapshot_url: String,
    /// Currency allow-list for historical mode. Empty keeps everything.
    pub currencies: Vec<String>,
    pub timeout: Duration,
    pub max_in_flight: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            mode: ExchangeMode::default(),
            historical_url: DEFAULT_HISTORICAL_URL.to_string(),
            snapshot_url: DEFAULT_SNAPSHOT_URL.to_string(),
            currencies: ["EUR", "PLN", "USD"].map(String::from).to_vec(),
            timeout: DEFAULT_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRate {
    pub currency: String,
    pub buy: String,
    pub sell: String,
}

/// Rates for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub date: String,
    pub rates: Vec<CurrencyRate>,
}

#[derive(Debug)]
pub enum ExchangeError {
    /// Zero days were requested.
    NoDays,
    /// Upstream answered with a non-success status.
    Status { url: String, status: StatusCode },
    /// Connect, timeout, or body decoding failure.
    Transport(reqwest::Error),
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::NoDays => f.write_str("at least one day must be requested"),
            ExchangeError::Status { url, status } => {
                write!(f, "upstream returned {status} for {url}")
            }
            ExchangeError::Transport(err) => write!(f, "upstream request failed: {err}"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExchangeError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        ExchangeError::Transport(err)
    }
}

pub struct Aggregator {
    client: reqwest::Client,
    config: ExchangeConfig,
}

impl Aggregator {
    pub fn new(config: ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Fetches `days` worth of rates ending today (local time).
    pub async fn fetch(&self, days: u8) -> Result<Vec<ExchangeRecord>, ExchangeError> {
        self.fetch_from(Local::now().date_naive(), days).await
    }

    /// Like [`Aggregator::fetch`] with an explicit "today".
    pub async fn fetch_from(
        &self,
        today: NaiveDate,
        days: u8,
    ) -> Result<Vec<ExchangeRecord>, ExchangeError> {
        if days == 0 {
            return Err(ExchangeError::NoDays);
        }

        match self.config.mode {
            ExchangeMode::Historical => self.fetch_history(today, days).await,
            ExchangeMode::Snapshot => Ok(vec![self.fetch_snapshot(today).await?]),
        }
    }

    async fn fetch_history(
        &self,
        today: NaiveDate,
        days: u8,
    ) -> Result<Vec<ExchangeRecord>, ExchangeError> {
        // `buffered` keeps date order; `try_collect` stops at the first failure.
        stream::iter(requested_dates(today, days))
            .map(|date| self.fetch_day(date))
            .buffered(self.config.max_in_flight.max(1))
            .try_collect()
            .await
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<ExchangeRecord, ExchangeError> {
        let date = format_date(date);
        let request = self
            .client
            .get(&self.config.historical_url)
            .query(&[("date", date.as_str())]);
        let day: DailyRates = self.get_json(request).await?;
        debug!(date, entries = day.exchange_rate.len(), "archive day fetched");

        Ok(daily_record(day, &self.config.currencies))
    }

    async fn fetch_snapshot(&self, today: NaiveDate) -> Result<ExchangeRecord, ExchangeError> {
        let request = self.client.get(&self.config.snapshot_url);
        let rates: Vec<SnapshotRate> = self.get_json(request).await?;
        debug!(entries = rates.len(), "snapshot fetched");

        Ok(ExchangeRecord {
            date: format_date(today),
            rates: rates
                .into_iter()
                .map(|rate| CurrencyRate {
                    currency: rate.ccy,
                    buy: rate.buy.to_string(),
                    sell: rate.sale.to_string(),
                })
                .collect(),
        })
    }

    async fn get_json<T>(&self, request: RequestBuilder) -> Result<T, ExchangeError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Status {
                url: response.url().to_string(),
                status,
            });
        }
        Ok(response.json().await?)
    }
}

/// Today and the `days - 1` days before it, newest first.
pub fn requested_dates(today: NaiveDate, days: u8) -> Vec<NaiveDate> {
    (0..days)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset.into())))
        .collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn daily_record(day: DailyRates, currencies: &[String]) -> ExchangeRecord {
    let rates = day
        .exchange_rate
        .into_iter()
        .filter_map(|entry| {
            let currency = entry.currency?;
            let sell = entry.sale_rate?;
            let buy = entry.purchase_rate?;
            Some(CurrencyRate {
                currency,
                buy: buy.to_string(),
                sell: sell.to_string(),
            })
        })
        .filter(|rate| currencies.is_empty() || currencies.contains(&rate.currency))
        .collect();

    ExchangeRecord {
        date: day.date,
        rates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_dates_count_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
        let dates: Vec<String> = requested_dates(today, 3).into_iter().map(format_date).collect();

        assert_eq!(dates, ["02.03.2026", "01.03.2026", "28.02.2026"]);
    }

    #[test]
    fn requested_dates_are_strictly_decreasing() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date");
        for days in 1..=9 {
            let dates = requested_dates(today, days);
            assert_eq!(dates.len(), usize::from(days));
            assert_eq!(dates[0], today);
            assert!(dates.windows(2).all(|pair| pair[0] > pair[1]));
        }
    }

    #[test]
    fn daily_record_filters_to_allowed_currencies_with_both_rates() {
        let body = r#"{
            "date": "18.10.2026",
            "exchangeRate": [
                {"baseCurrency": "UAH", "saleRateNB": 1.0, "purchaseRateNB": 1.0},
                {"currency": "CHF", "saleRate": 46.5, "purchaseRate": 45.9},
                {"currency": "EUR", "saleRate": 44.65, "purchaseRate": 43.9},
                {"currency": "GBP", "saleRateNB": 52.1, "purchaseRateNB": 52.1},
                {"currency": "USD", "saleRate": 41.6, "purchaseRate": 41.1}
            ]
        }"#;
        let day: DailyRates = serde_json::from_str(body).expect("valid body");
        let allowed = ["EUR", "GBP", "USD"].map(String::from);

        let record = daily_record(day, &allowed);

        let currencies: Vec<&str> = record.rates.iter().map(|r| r.currency.as_str()).collect();
        assert_eq!(currencies, ["EUR", "USD"]);
        assert_eq!(record.rates[0].buy, "43.9");
        assert_eq!(record.rates[0].sell, "44.65");
    }

    #[test]
    fn empty_allow_list_keeps_everything() {
        let body = r#"{"date": "18.10.2026", "exchangeRate": [
            {"currency": "CHF", "saleRate": 46.5, "purchaseRate": 45.9},
            {"currency": "USD", "saleRate": 41.6, "purchaseRate": 41.1}
        ]}"#;
        let day: DailyRates = serde_json::from_str(body).expect("valid body");

        assert_eq!(daily_record(day, &[]).rates.len(), 2);
    }

    #[tokio::test]
    async fn zero_days_is_rejected_without_requests() {
        let aggregator = Aggregator::new(ExchangeConfig {
            historical_url: "http://127.0.0.1:9/unreachable".into(),
            ..ExchangeConfig::default()
        })
        .expect("client builds");

        let result = aggregator.fetch(0).await;

        assert!(matches!(result, Err(ExchangeError::NoDays)));
    }
}
