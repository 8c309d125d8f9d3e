use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::{
    exchange::{
        DEFAULT_HISTORICAL_URL, DEFAULT_MAX_IN_FLIGHT, DEFAULT_SNAPSHOT_URL, ExchangeConfig,
        ExchangeMode,
    },
    server::ServerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat relay, accepting WebSocket connections.
    Server(ServerArgs),
    /// Connect to a relay and participate in the chat.
    Client(ClientArgs),
    /// Print Privatbank exchange rates for the last few days as a table.
    Rates(RatesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Socket address the server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// File that receives one line per executed exchange command.
    #[arg(long, default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Currencies included in exchange broadcasts.
    #[arg(
        short,
        long,
        num_args = 1..,
        default_values_t = [String::from("EUR"), String::from("PLN"), String::from("USD")]
    )]
    pub currencies: Vec<String>,

    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

impl ServerArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen: self.listen,
            log_file: self.log_file.clone(),
            exchange: self.exchange.to_config(self.currencies.clone()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// WebSocket URL of the relay.
    #[arg(long, default_value = "ws://127.0.0.1:8080/")]
    pub server: String,
}

#[derive(Args, Debug, Clone)]
pub struct RatesArgs {
    /// Number of days to fetch, counting back from today.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub days: u8,

    /// Currencies to show, separated by spaces: CHF CZK EUR GBP PLN USD.
    #[arg(
        short,
        long,
        num_args = 1..,
        default_values_t = [String::from("EUR"), String::from("USD")]
    )]
    pub currencies: Vec<String>,

    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

impl RatesArgs {
    pub fn exchange_config(&self) -> ExchangeConfig {
        self.exchange.to_config(self.currencies.clone())
    }
}

/// Upstream options shared by `server` and `rates`.
#[derive(Args, Debug, Clone)]
pub struct ExchangeArgs {
    /// Archive (one request per day) or current cash rates (single request).
    #[arg(long, value_enum, default_value_t = ExchangeMode::Historical)]
    pub mode: ExchangeMode,

    /// Archive endpoint; `date=DD.MM.YYYY` is appended to its query.
    #[arg(long, default_value = DEFAULT_HISTORICAL_URL)]
    pub historical_url: String,

    /// Current cash rates endpoint.
    #[arg(long, default_value = DEFAULT_SNAPSHOT_URL)]
    pub snapshot_url: String,

    /// Per-request timeout against the upstream API.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Upper bound on concurrent archive requests.
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,
}

impl ExchangeArgs {
    pub fn to_config(&self, currencies: Vec<String>) -> ExchangeConfig {
        ExchangeConfig {
            mode: self.mode,
            historical_url: self.historical_url.clone(),
            snapshot_url: self.snapshot_url.clone(),
            currencies,
            timeout: Duration::from_secs(self.timeout_secs),
            max_in_flight: self.max_in_flight,
        }
    }
}
