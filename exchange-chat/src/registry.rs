use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
};

use rand::seq::SliceRandom;
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};
use tracing::{debug, warn};

pub type PeerId = u64;

/// Messages a peer may have queued before further deliveries to it are dropped.
pub const OUTBOX_CAPACITY: usize = 128;

type NameGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// A connected chat participant.
#[derive(Debug)]
pub struct Peer {
    pub name: String,
    pub addr: SocketAddr,
    outbox: mpsc::Sender<String>,
}

/// Handed back to the connection task on [`Registry::register`].
#[derive(Debug)]
pub struct Registration {
    pub id: PeerId,
    pub name: String,
    pub inbox: mpsc::Receiver<String>,
}

/// The live set of peers for one server instance.
pub struct Registry {
    peers: Mutex<HashMap<PeerId, Peer>>,
    next_id: AtomicU64,
    names: NameGenerator,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_name_generator(random_full_name)
    }

    /// Builds a registry that names peers with `names` instead of random names.
    pub fn with_name_generator<F>(names: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            peers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            names: Box::new(names),
        }
    }

    pub async fn register(&self, addr: SocketAddr) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = (self.names)();
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);

        let mut peers = self.peers.lock().await;
        peers.insert(
            id,
            Peer {
                name: name.clone(),
                addr,
                outbox,
            },
        );

        Registration { id, name, inbox }
    }

    /// Removes a peer. Removing an absent peer is a no-op.
    pub async fn unregister(&self, id: PeerId) -> Option<Peer> {
        let mut peers = self.peers.lock().await;
        peers.remove(&id)
    }

    /// Queues `message` for every registered peer and returns how many accepted it.
    pub async fn broadcast(&self, message: &str) -> usize {
        let peers = self.peers.lock().await;
        peers
            .iter()
            .filter(|(id, peer)| deliver(**id, peer, message))
            .count()
    }

    /// Queues `message` for a single peer.
    pub async fn send_to(&self, id: PeerId, message: &str) -> bool {
        let peers = self.peers.lock().await;
        match peers.get(&id) {
            Some(peer) => deliver(id, peer, message),
            None => {
                debug!(peer_id = id, "direct message to unknown peer dropped");
                false
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }

    pub async fn names(&self) -> Vec<String> {
        let peers = self.peers.lock().await;
        peers.values().map(|peer| peer.name.clone()).collect()
    }
}

fn deliver(id: PeerId, peer: &Peer, message: &str) -> bool {
    match peer.outbox.try_send(message.to_string()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(peer_id = id, peer = %peer.addr, name = %peer.name, "outbox full, message dropped");
            false
        }
        Err(TrySendError::Closed(_)) => {
            warn!(peer_id = id, peer = %peer.addr, name = %peer.name, "peer gone, message dropped");
            false
        }
    }
}

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Nancy", "Matthew", "Lisa", "Anthony", "Betty", "Mark",
    "Margaret", "Donald", "Sandra",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson",
];

/// Picks a random "First Last" display name.
pub fn random_full_name() -> String {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Anonymous");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Peer");
    format!("{first} {last}")
}
