use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{
    cli::RatesArgs,
    exchange::{Aggregator, format},
};

/// Fetches the requested days once and prints the rates table to stdout.
pub async fn run(args: RatesArgs) -> Result<()> {
    let config = args.exchange_config();
    let currencies = config.currencies.clone();
    let aggregator = Aggregator::new(config).context("failed to build upstream http client")?;

    let records = aggregator
        .fetch(args.days)
        .await
        .with_context(|| format!("failed to fetch exchange rates for {} day(s)", args.days))?;
    debug!(days = args.days, records = records.len(), "rates fetched");

    let table = format::rates_table(&records, &currencies);
    let mut stdout = tokio::io::stdout();
    stdout.write_all(table.as_bytes()).await?;
    stdout.flush().await?;

    Ok(())
}
