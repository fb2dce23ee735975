//! Connection handling for client connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use b181_protocol::constants::READ_CHUNK_SIZE;
use b181_protocol::protocol::packets::{ChatMessage, KeepAlive};
use b181_protocol::protocol::{
    describe_frame, ClientboundPacket, PacketFramer, ServerboundPacket, Side, String16,
};

use super::session::Session;
use super::{chat, login, status};
use crate::Server;

/// Handle a client connection.
pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    server: Arc<Server>,
) -> Result<()> {
    let ip = addr.ip().to_string();
    info!("New connection from {}", addr);

    server.add_ip_connection(&ip);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = Session::new(addr, tx);

    let result = handle_client_packets(socket, &server, &mut session, rx).await;

    cleanup_session(&server, &session);
    server.remove_ip_connection(&ip);

    info!(
        "Connection closed from {} after {}s",
        addr,
        session.connected_at.elapsed().as_secs()
    );
    result
}

/// Main packet loop for a client.
async fn handle_client_packets(
    socket: TcpStream,
    server: &Arc<Server>,
    session: &mut Session,
    mut rx: mpsc::UnboundedReceiver<ClientboundPacket>,
) -> Result<()> {
    let addr = session.addr;
    let network = &server.config.network;
    let timeout = Duration::from_secs(network.connection_timeout_secs);

    let (mut reader, mut writer) = socket.into_split();
    let mut framer =
        PacketFramer::with_max_frame_len(server.table.clone(), Side::Server, network.max_frame_size);

    let mut keep_alive_interval =
        tokio::time::interval(Duration::from_secs(network.keep_alive_interval_secs));
    keep_alive_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // Skip the first immediate tick
    keep_alive_interval.tick().await;

    let mut temp_buf = [0u8; READ_CHUNK_SIZE];

    loop {
        if session.is_timed_out(timeout) {
            warn!("Connection timed out for {}", session.display_name());
            let kick = session.kick("Timed out!");
            return send_packets(&mut writer, &[kick]).await;
        }
        if session.is_keep_alive_overdue(timeout) {
            warn!("No keep alive response from {}", session.display_name());
            let kick = session.kick("Timed out! (No response to keep alive)");
            return send_packets(&mut writer, &[kick]).await;
        }

        tokio::select! {
            _ = keep_alive_interval.tick() => {
                if session.is_logged_in() {
                    let keep_alive_id = rand::thread_rng().gen_range(1..=i32::MAX);
                    debug!("Sending keep alive {} to {}", keep_alive_id, addr);
                    send_packets(&mut writer, &[KeepAlive { keep_alive_id }.into()]).await?;
                }
            }

            // Packets queued by other connections
            Some(packet) = rx.recv() => {
                send_packets(&mut writer, &[packet]).await?;
            }

            read_result = reader.read(&mut temp_buf) => {
                let n = match read_result {
                    Ok(0) => {
                        debug!("Client {} disconnected", addr);
                        return Ok(());
                    }
                    Ok(n) => n,
                    Err(e) => {
                        error!("Read error from {}: {}", addr, e);
                        return Err(e.into());
                    }
                };
                framer.extend(&temp_buf[..n]);

                loop {
                    let frame = match framer.next_frame() {
                        Ok(Some(frame)) => frame,
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Framing error from {}: {}", addr, e);
                            let kick = session.kick(e.to_string());
                            return send_packets(&mut writer, &[kick]).await;
                        }
                    };

                    let responses = process_frame(&frame, server, session);
                    send_packets(&mut writer, &responses).await?;

                    if session.closing {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Decode one frame and run its handler. Returns the packets to send back.
fn process_frame(frame: &[u8], server: &Server, session: &mut Session) -> Vec<ClientboundPacket> {
    session.update_activity();
    debug!(
        "{} -> {}",
        session.display_name(),
        describe_frame(&server.table, Side::Server, frame)
    );

    match ServerboundPacket::decode(frame) {
        Ok(packet) => handle_packet(packet, server, session),
        Err(e) => {
            warn!("Bad packet from {}: {}", session.display_name(), e);
            vec![session.kick(e.to_string())]
        }
    }
}

/// Handle a single packet.
fn handle_packet(
    packet: ServerboundPacket,
    server: &Server,
    session: &mut Session,
) -> Vec<ClientboundPacket> {
    match packet {
        ServerboundPacket::KeepAlive(p) => {
            status::handle_keep_alive(p, session);
            vec![]
        }

        ServerboundPacket::ServerListPing(_) => status::handle_server_list_ping(server, session),

        ServerboundPacket::HandshakeC2s(p) => login::handle_handshake(p, session),

        ServerboundPacket::LoginRequestC2s(p) => login::handle_login(p, server, session),

        ServerboundPacket::ChatMessage(p) => chat::handle_chat(p, server, session),

        ServerboundPacket::Kick(p) => {
            status::handle_client_kick(p, session);
            vec![]
        }

        other => {
            debug!(
                "Unhandled packet {} from {}",
                other.name(),
                session.display_name()
            );
            vec![]
        }
    }
}

/// Encode and write packets to the client.
async fn send_packets(writer: &mut OwnedWriteHalf, packets: &[ClientboundPacket]) -> Result<()> {
    if packets.is_empty() {
        return Ok(());
    }

    let mut data = Vec::new();
    for packet in packets {
        data.extend_from_slice(&packet.encode());
    }

    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

/// Drop the player from the online list and tell everyone else.
fn cleanup_session(server: &Server, session: &Session) {
    let Some(eid) = session.entity_id else {
        return;
    };
    server.players.remove(&eid);
    if let Some(username) = &session.username {
        server.release_name(username);
    }

    let name = session.display_name();
    server.broadcast(
        ChatMessage {
            msg: String16::from(format!("\u{a7}e{} left the game.", name)),
        }
        .into(),
    );
    info!("Player {} (eid {}) logged out", name, eid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{server, session};
    use b181_protocol::protocol::Packet;
    use b181_protocol::protocol::packets::{HandshakeC2s, OnGround};

    #[test]
    fn test_handshake_frame_replies() {
        let server = server();
        let (mut session, _rx) = session();
        let frame = HandshakeC2s {
            username: String16::from("Notch"),
        }
        .encode();

        let replies = process_frame(&frame, &server, &mut session);

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].encode(), hex::decode("020001002d").unwrap()[..]);
        assert!(!session.closing);
    }

    #[test]
    fn test_undecodable_frame_kicks() {
        let server = server();
        let (mut session, _rx) = session();

        // Chat frame with a trailing byte
        let replies = process_frame(&hex::decode("0300000000").unwrap(), &server, &mut session);

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].opcode(), 0xFF);
        assert!(session.closing);
    }

    #[test]
    fn test_unhandled_packet_ignored() {
        let server = server();
        let (mut session, _rx) = session();
        let frame = OnGround { on_ground: true }.encode();

        assert!(process_frame(&frame, &server, &mut session).is_empty());
        assert!(!session.closing);
    }

    #[test]
    fn test_cleanup_announces_leave() {
        let server = server();
        let (mut leaving, _rx) = session();
        let (mut staying, mut rx) = session();
        for (s, name) in [(&mut leaving, "Notch"), (&mut staying, "jeb_")] {
            login::handle_login(
                b181_protocol::protocol::packets::LoginRequestC2s {
                    protocol_ver: b181_protocol::constants::PROTOCOL_VERSION,
                    username: String16::from(name),
                    ..Default::default()
                },
                &server,
                s,
            );
        }
        while rx.try_recv().is_ok() {}

        cleanup_session(&server, &leaving);

        assert_eq!(server.online_count(), 1);
        assert!(!server.is_username_online("Notch"));
        match rx.try_recv() {
            Ok(ClientboundPacket::ChatMessage(chat)) => {
                assert_eq!(chat.msg, "\u{a7}eNotch left the game.");
            }
            other => panic!("unexpected broadcast {:?}", other),
        }
    }
}
