//! Server list ping, keep-alive and client disconnect handlers

use tracing::{debug, info};

use b181_protocol::constants::PING_SEPARATOR;
use b181_protocol::protocol::packets::{KeepAlive, Kick};
use b181_protocol::protocol::ClientboundPacket;

use super::session::Session;
use crate::Server;

/// Answer a server list ping with `motd§online§max` in a kick, as the
/// client expects.
pub fn handle_server_list_ping(server: &Server, session: &mut Session) -> Vec<ClientboundPacket> {
    let reply = format!(
        "{}{sep}{}{sep}{}",
        server.config.server.motd,
        server.online_count(),
        server.config.server.max_players,
        sep = PING_SEPARATOR
    );
    debug!("Server list ping from {}", session.addr);
    vec![session.kick(reply)]
}

/// A zero id is never sent by the server, so it does not count as an answer.
pub fn handle_keep_alive(packet: KeepAlive, session: &mut Session) {
    if packet.keep_alive_id != 0 {
        session.update_keep_alive();
    }
}

pub fn handle_client_kick(packet: Kick, session: &mut Session) {
    let reason = packet.reason.to_string_lossy();
    if reason != "Quitting" {
        info!(
            "Client {} disconnected with unknown message \"{}\"",
            session.display_name(),
            reason
        );
    }
    session.closing = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{server, session};
    use b181_protocol::protocol::String16;
    use std::time::{Duration, Instant};

    #[test]
    fn test_server_list_ping_reply() {
        let server = server();
        let (mut session, _rx) = session();

        let replies = handle_server_list_ping(&server, &mut session);

        assert!(session.closing);
        match &replies[..] {
            [ClientboundPacket::Kick(kick)] => {
                assert_eq!(kick.reason, "A Minecraft Server\u{a7}0\u{a7}20");
            }
            other => panic!("unexpected replies {:?}", other),
        }
    }

    #[test]
    fn test_keep_alive_zero_ignored() {
        let (mut session, _rx) = session();
        let before = Instant::now() - Duration::from_secs(30);
        session.last_keep_alive = before;

        handle_keep_alive(KeepAlive { keep_alive_id: 0 }, &mut session);
        assert_eq!(session.last_keep_alive, before);

        handle_keep_alive(KeepAlive { keep_alive_id: 77 }, &mut session);
        assert!(session.last_keep_alive > before);
    }

    #[test]
    fn test_client_kick_closes() {
        let (mut session, _rx) = session();

        handle_client_kick(
            Kick {
                reason: String16::from("Quitting"),
            },
            &mut session,
        );
        assert!(session.closing);
    }
}
