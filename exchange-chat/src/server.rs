use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::any,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    command::{ChatCommand, GREETING_REPLY},
    exchange::{Aggregator, ExchangeConfig, ExchangeError, format},
    journal::ExchangeJournal,
    registry::{PeerId, Registration, Registry},
};

pub const EXCHANGE_LOG_MESSAGE: &str = "exchange command executed";
pub const EXCHANGE_UNAVAILABLE: &str = "exchange data unavailable";
pub const SHUTDOWN_NOTICE: &str = "server shutting down";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub log_file: PathBuf,
    pub exchange: ExchangeConfig,
}

/// Everything a connection handler needs, shared across connections.
pub struct ServerState {
    pub registry: Registry,
    pub aggregator: Aggregator,
    pub journal: ExchangeJournal,
}

impl ServerState {
    pub fn new(registry: Registry, aggregator: Aggregator, journal: ExchangeJournal) -> Self {
        Self {
            registry,
            aggregator,
            journal,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let aggregator = Aggregator::new(config.exchange.clone())
            .context("failed to build upstream http client")?;
        Ok(Self::new(
            Registry::new(),
            aggregator,
            ExchangeJournal::new(&config.log_file),
        ))
    }
}

pub struct ChatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl ChatServer {
    pub fn new(listener: TcpListener, state: Arc<ServerState>) -> Self {
        Self { listener, state }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ChatServer { listener, state } = self;
        let app = router(Arc::clone(&state));

        let shutdown = async move {
            shutdown.await;
            handle_shutdown(&state).await;
        };

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("chat server failed")
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

/// WebSocket upgrades are accepted on `/`.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", any(upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_shutdown(state: &ServerState) {
    info!("server shutting down");
    state.registry.broadcast(SHUTDOWN_NOTICE).await;
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, addr, state))
}

struct Session<'a> {
    id: PeerId,
    name: &'a str,
    addr: SocketAddr,
}

async fn handle_connection(socket: WebSocket, addr: SocketAddr, state: Arc<ServerState>) {
    let Registration { id, name, inbox } = state.registry.register(addr).await;
    info!(peer = %addr, %name, "client connected");

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(forward_outbox(inbox, sink, addr));

    let session = Session {
        id,
        name: &name,
        addr,
    };
    if let Err(err) = run_session(&state, &session, stream).await {
        debug!(peer = %addr, error = ?err, "client connection closed with error");
    }

    cleanup_client_disconnect(&state, id, addr).await;

    // The writer stops once the queue drains, since the registry dropped its sender.
    if let Err(err) = writer.await {
        warn!(peer = %addr, error = ?err, "writer task failed");
    }
}

async fn forward_outbox(
    mut inbox: mpsc::Receiver<String>,
    mut sink: SplitSink<WebSocket, Message>,
    addr: SocketAddr,
) {
    while let Some(message) = inbox.recv().await {
        if let Err(err) = sink.send(Message::Text(message)).await {
            debug!(peer = %addr, error = ?err, "failed to deliver message to client");
            break;
        }
    }
}

async fn run_session(
    state: &ServerState,
    session: &Session<'_>,
    mut stream: SplitStream<WebSocket>,
) -> Result<()> {
    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => handle_client_message(state, session, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

async fn handle_client_message(state: &ServerState, session: &Session<'_>, text: &str) {
    if let Err(err) = route_message(state, session.name, text).await {
        warn!(peer = %session.addr, name = session.name, error = %err, "exchange command failed");
        state.registry.send_to(session.id, EXCHANGE_UNAVAILABLE).await;
    }
}

/// Applies one inbound message on behalf of the peer called `sender`.
///
/// Greetings and echoes always succeed. An exchange command that cannot get
/// data returns the error without broadcasting or journaling anything.
pub async fn route_message(
    state: &ServerState,
    sender: &str,
    text: &str,
) -> Result<(), ExchangeError> {
    match ChatCommand::parse(text) {
        ChatCommand::Exchange { days } => run_exchange(state, days).await?,
        ChatCommand::Greeting => {
            state.registry.broadcast(GREETING_REPLY).await;
        }
        ChatCommand::Echo => {
            state.registry.broadcast(&format!("{sender}: {text}")).await;
        }
    }
    Ok(())
}

async fn run_exchange(state: &ServerState, days: u8) -> Result<(), ExchangeError> {
    let records = state.aggregator.fetch(days).await?;
    let delivered = state
        .registry
        .broadcast(&format::chat_line(&records))
        .await;
    info!(days, delivered, "exchange rates broadcast");

    if let Err(err) = state.journal.append(EXCHANGE_LOG_MESSAGE).await {
        warn!(path = %state.journal.path().display(), error = ?err, "failed to append exchange log");
    }
    Ok(())
}

async fn cleanup_client_disconnect(state: &ServerState, id: PeerId, addr: SocketAddr) {
    if let Some(peer) = state.registry.unregister(id).await {
        info!(peer = %addr, name = %peer.name, "client disconnected");
    }
}
