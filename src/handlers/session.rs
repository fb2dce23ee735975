//! Per-connection player state

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use b181_protocol::protocol::packets::Kick;
use b181_protocol::protocol::{ClientboundPacket, String16};

/// State of one client connection.
pub struct Session {
    pub addr: SocketAddr,
    /// Name sent in the handshake.
    pub handshake_name: Option<String>,
    pub username: Option<String>,
    pub entity_id: Option<i32>,
    pub connected_at: Instant,
    /// Last complete frame received.
    pub last_activity: Instant,
    /// Last keep-alive answered by the client.
    pub last_keep_alive: Instant,
    /// Set once a reply should be the last thing sent.
    pub closing: bool,
    /// Sender other connections use to reach this player.
    pub tx: mpsc::UnboundedSender<ClientboundPacket>,
}

impl Session {
    pub fn new(addr: SocketAddr, tx: mpsc::UnboundedSender<ClientboundPacket>) -> Self {
        let now = Instant::now();
        Self {
            addr,
            handshake_name: None,
            username: None,
            entity_id: None,
            connected_at: now,
            last_activity: now,
            last_keep_alive: now,
            closing: false,
            tx,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.entity_id.is_some()
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn update_keep_alive(&mut self) {
        self.last_keep_alive = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    pub fn is_keep_alive_overdue(&self, timeout: Duration) -> bool {
        self.is_logged_in() && self.last_keep_alive.elapsed() > timeout
    }

    /// Name to use in logs.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.handshake_name) {
            (Some(name), _) | (None, Some(name)) => name.clone(),
            (None, None) => self.addr.to_string(),
        }
    }

    /// Build a kick packet and mark the session for closing.
    pub fn kick(&mut self, reason: impl Into<String>) -> ClientboundPacket {
        self.closing = true;
        Kick {
            reason: String16::from(reason.into()),
        }
        .into()
    }
}
