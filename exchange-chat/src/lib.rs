//! Chat relay with Privatbank exchange-rate lookups.
//!
//! Peers connect over WebSocket and every text frame they send is relayed to
//! everyone connected. `exchange N` fetches N days of rates and broadcasts
//! them instead. Each module focuses on a concrete responsibility:
//!
//! - [`cli`] parses the command-line interface for server, client and rates modes.
//! - [`registry`] tracks connected peers and fans messages out to their queues.
//! - [`command`] classifies inbound messages.
//! - [`server`] accepts connections and routes each message.
//! - [`exchange`] talks to the upstream API and formats the results.
//! - [`journal`] appends a line per executed exchange command.
//! - [`client`] is the terminal chat client.
//! - [`rates`] prints the rates table once and exits.

pub mod cli;
pub mod client;
pub mod command;
pub mod exchange;
pub mod journal;
pub mod rates;
pub mod registry;
pub mod server;
