//! Packet framing and codec for the Minecraft beta 1.8.1 protocol
//!
//! The [`protocol`] module holds the schema table, the generated packet
//! records, the frame-length resolver and the field decoder. [`config`] and
//! [`constants`] are shared with the `b181_server` binary.

pub mod config;
pub mod constants;
pub mod protocol;
