use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use exchange_chat::{
    cli::{Cli, Command},
    client, rates,
    server::{ChatServer, ServerState},
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => {
            let config = args.server_config();
            let state = ServerState::from_config(&config)?;
            let listener = TcpListener::bind(config.listen).await?;
            let server = ChatServer::new(listener, state.into());
            let addr = server.local_addr()?;
            info!("server listening on {}", addr);
            if let Err(err) = server.run_until_ctrl_c().await {
                warn!("server exited with error: {err:?}");
                return Err(err);
            }
        }
        Command::Client(args) => client::run(args).await?,
        Command::Rates(args) => rates::run(args).await?,
    }

    Ok(())
}
