//! Protocol constants for the beta 1.8.1 wire format
//!
//! Values are fixed by the client and cannot be changed.

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

pub const DEFAULT_PORT: u16 = 25565;

/// Protocol version sent in the client's login request.
pub const PROTOCOL_VERSION: i32 = 17;

/// Connection hash sent back in the handshake when running in offline mode.
pub const OFFLINE_CONNECTION_HASH: &str = "-";

/// Field separator used in the server list ping reply.
pub const PING_SEPARATOR: char = '\u{a7}';

// =============================================================================
// FRAMING LIMITS
// =============================================================================

/// Size of the opcode that starts every frame.
pub const OPCODE_LEN: usize = 1;

/// Size of the character count in front of a String16 payload.
pub const STRING16_PREFIX_LEN: usize = 2;

/// Bytes per String16 character unit.
pub const STRING16_UNIT_LEN: usize = 2;

/// Largest frame the server buffers before dropping a connection.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8192;

// =============================================================================
// CONNECTION HANDLING
// =============================================================================

pub const DEFAULT_MAX_PLAYERS: u8 = 20;
pub const MAX_TOTAL_CONNECTIONS: usize = 500;
pub const MAX_CONNECTIONS_PER_IP: usize = 3;

/// The client drops the connection after 60 seconds without a keep-alive.
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = 20;
pub const CONNECTION_TIMEOUT_SECS: u64 = 60;

/// Read chunk size for the socket loop.
pub const READ_CHUNK_SIZE: usize = 4096;

// =============================================================================
// LOGIN AND CHAT
// =============================================================================

pub const MAX_USERNAME_LENGTH: usize = 16;

/// Longer chat messages get the sender kicked.
pub const MAX_CHAT_LENGTH: usize = 100;

pub const DEFAULT_SPAWN: (i32, i32, i32) = (0, 64, 0);
pub const DEFAULT_WORLD_HEIGHT: u8 = 128;
pub const PLAYER_STANCE_OFFSET: f64 = 1.62;
