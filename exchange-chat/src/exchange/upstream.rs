//! JSON shapes returned by the Privatbank public API.

use std::fmt;

use serde::Deserialize;
use serde_json::Number;

/// A rate as sent upstream: the archive endpoint uses JSON numbers, the cash
/// snapshot endpoint uses strings. Both are kept verbatim for display.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RateValue {
    Number(Number),
    Text(String),
}

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateValue::Number(number) => write!(f, "{number}"),
            RateValue::Text(text) => f.write_str(text),
        }
    }
}

/// Body of `exchange_rates?json&date=DD.MM.YYYY`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRates {
    pub date: String,
    #[serde(default)]
    pub exchange_rate: Vec<DailyRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRate {
    // The leading UAH entry of each day carries no `currency`.
    pub currency: Option<String>,
    pub sale_rate: Option<RateValue>,
    pub purchase_rate: Option<RateValue>,
}

/// One element of `pubinfo?exchange&coursid=5`.
#[derive(Debug, Deserialize)]
pub struct SnapshotRate {
    pub ccy: String,
    pub buy: RateValue,
    pub sale: RateValue,
}
