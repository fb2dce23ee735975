//! Chat message handler

use tracing::{debug, info};

use b181_protocol::constants::MAX_CHAT_LENGTH;
use b181_protocol::protocol::packets::ChatMessage;
use b181_protocol::protocol::{ClientboundPacket, String16};

use super::session::Session;
use crate::Server;

/// Relay a chat line to every player, the sender included.
pub fn handle_chat(
    packet: ChatMessage,
    server: &Server,
    session: &mut Session,
) -> Vec<ClientboundPacket> {
    if packet.msg.len() > MAX_CHAT_LENGTH {
        return vec![session.kick("Message too long!")];
    }

    let Some(username) = session.username.clone() else {
        debug!("Ignoring chat from {} before login", session.addr);
        return vec![];
    };

    let msg = packet.msg.to_string_lossy();
    info!("[CHAT] {}: {}", username, msg);

    server.broadcast(
        ChatMessage {
            msg: String16::from(format!("<{}> {}", username, msg)),
        }
        .into(),
    );
    vec![]
}
