//! Minecraft beta 1.8.1 demo server
//!
//! Accepts connections, frames and decodes what clients send with the
//! `b181_protocol` codec and answers the login, ping and chat packets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use b181_protocol::config::Config;
use b181_protocol::protocol::{ClientboundPacket, SchemaTable};

mod handlers;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "B181_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

/// A logged in player other connections can send packets to.
pub struct PlayerHandle {
    pub tx: mpsc::UnboundedSender<ClientboundPacket>,
}

/// Outcome of claiming a username at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Reserved(i32),
    NameTaken,
    Full,
}

/// Shared server state
pub struct Server {
    pub config: Config,
    pub table: Arc<SchemaTable>,
    pub players: DashMap<i32, PlayerHandle>,
    /// Names claimed by logged in players, mapped to their entity id.
    pub names: DashMap<String, i32>,
    pub connections_by_ip: DashMap<String, usize>,
    next_entity_id: AtomicI32,
}

impl Server {
    pub fn new(config: Config, table: SchemaTable) -> Self {
        Self {
            config,
            table: Arc::new(table),
            players: DashMap::new(),
            names: DashMap::new(),
            connections_by_ip: DashMap::new(),
            next_entity_id: AtomicI32::new(1),
        }
    }

    /// Get the next entity id.
    pub fn next_entity_id(&self) -> i32 {
        self.next_entity_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of logged in players.
    pub fn online_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_username_online(&self, username: &str) -> bool {
        self.names.contains_key(username)
    }

    /// Claim `username` and assign it an entity id.
    ///
    /// The name check and the insert happen under one shard lock, so two
    /// logins with the same name cannot both succeed.
    pub fn reserve_name(&self, username: &str) -> Reservation {
        let eid = match self.names.entry(username.to_string()) {
            Entry::Occupied(_) => return Reservation::NameTaken,
            Entry::Vacant(slot) => {
                let eid = self.next_entity_id();
                slot.insert(eid);
                eid
            }
        };
        if self.names.len() > usize::from(self.config.server.max_players) {
            self.names.remove(username);
            return Reservation::Full;
        }
        Reservation::Reserved(eid)
    }

    pub fn release_name(&self, username: &str) {
        self.names.remove(username);
    }

    /// Queue a packet for every logged in player.
    pub fn broadcast(&self, packet: ClientboundPacket) {
        for player in self.players.iter() {
            // A closed channel means that connection is already shutting down.
            let _ = player.tx.send(packet.clone());
        }
    }

    /// Get total connection count.
    pub fn connection_count(&self) -> usize {
        self.connections_by_ip.iter().map(|c| *c.value()).sum()
    }

    /// Get connection count for an IP.
    pub fn ip_connection_count(&self, ip: &str) -> usize {
        self.connections_by_ip.get(ip).map(|r| *r).unwrap_or(0)
    }

    /// Increment IP connection count.
    pub fn add_ip_connection(&self, ip: &str) {
        self.connections_by_ip
            .entry(ip.to_string())
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    /// Decrement IP connection count.
    pub fn remove_ip_connection(&self, ip: &str) {
        if let Some(mut count) = self.connections_by_ip.get_mut(ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                drop(count);
                self.connections_by_ip.remove(ip);
            }
        }
    }

    /// Whether a new connection from `addr` fits the configured limits.
    fn admit(&self, addr: &SocketAddr) -> bool {
        let network = &self.config.network;
        if self.connection_count() >= network.max_connections {
            warn!("Connection limit reached, rejecting {}", addr);
            return false;
        }
        let ip = addr.ip().to_string();
        if self.ip_connection_count(&ip) >= network.max_connections_per_ip {
            warn!("IP connection limit reached for {}", ip);
            return false;
        }
        true
    }
}

fn load_config() -> Result<Config> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Config::load_or_default(&path).with_context(|| format!("loading {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting b181 server v{}", env!("CARGO_PKG_VERSION"));

    let table = SchemaTable::standard().context("building packet schema table")?;
    info!(
        "Loaded {} packet schemas ({} excluded)",
        table.len(),
        table.unsupported().len()
    );

    let addr = config.bind_addr();
    let server = Arc::new(Server::new(config, table));

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    info!("MOTD: {}", server.config.server.motd);

    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                if !server.admit(&addr) {
                    continue;
                }

                let server = server.clone();
                tokio::spawn(async move {
                    if let Err(e) = handlers::handle_connection(socket, addr, server).await {
                        error!("Connection handler error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
