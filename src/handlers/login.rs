//! Handshake and login handlers

use tracing::{info, warn};

use b181_protocol::constants::*;
use b181_protocol::protocol::packets::{
    ChatMessage, HandshakeC2s, HandshakeS2c, LoginRequestC2s, LoginRequestS2c, PlayerPosLookS2c,
    SpawnPos, TimeUpdate,
};
use b181_protocol::protocol::{ClientboundPacket, String16};

use super::session::Session;
use crate::{PlayerHandle, Reservation, Server};

/// Offline mode: the connection hash `-` tells the client to skip
/// authentication.
pub fn handle_handshake(packet: HandshakeC2s, session: &mut Session) -> Vec<ClientboundPacket> {
    let name = packet.username.to_string_lossy();
    info!("Player \"{}\" has initiated handshake", name);
    session.handshake_name = Some(name);

    vec![HandshakeS2c {
        connection_hash: String16::from(OFFLINE_CONNECTION_HASH),
    }
    .into()]
}

/// Check the login request and send the player into the world.
pub fn handle_login(
    packet: LoginRequestC2s,
    server: &Server,
    session: &mut Session,
) -> Vec<ClientboundPacket> {
    let username = packet.username.to_string_lossy();
    info!(
        "Player \"{}\" has protocol version: {}",
        username, packet.protocol_ver
    );

    if session.is_logged_in() {
        warn!("Duplicate login request from {}", session.display_name());
        return vec![session.kick("Already logged in!")];
    }
    if packet.protocol_ver < PROTOCOL_VERSION {
        return vec![session.kick("Outdated client!")];
    }
    if packet.protocol_ver > PROTOCOL_VERSION {
        return vec![session.kick("Outdated server!")];
    }
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return vec![session.kick("Invalid username!")];
    }

    let eid = match server.reserve_name(&username) {
        Reservation::Reserved(eid) => eid,
        Reservation::NameTaken => {
            return vec![session.kick("A player with that name is already online!")]
        }
        Reservation::Full => return vec![session.kick("The server is full!")],
    };

    session.entity_id = Some(eid);
    session.username = Some(username.clone());
    session.update_keep_alive();
    server.players.insert(
        eid,
        PlayerHandle {
            tx: session.tx.clone(),
        },
    );
    info!("Player {} (eid {}) logged in from {}", username, eid, session.addr);

    server.broadcast(
        ChatMessage {
            msg: String16::from(format!("\u{a7}e{} joined the game.", username)),
        }
        .into(),
    );

    let (x, y, z) = DEFAULT_SPAWN;
    vec![
        LoginRequestS2c {
            player_eid: eid,
            seed: server.config.server.seed,
            world_height: DEFAULT_WORLD_HEIGHT,
            max_players: server.config.server.max_players,
            ..Default::default()
        }
        .into(),
        TimeUpdate { time: 0 }.into(),
        SpawnPos { x, y, z }.into(),
        PlayerPosLookS2c {
            x: f64::from(x) + 0.5,
            stance: f64::from(y) + PLAYER_STANCE_OFFSET,
            y: f64::from(y),
            z: f64::from(z) + 0.5,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
        }
        .into(),
    ]
}
