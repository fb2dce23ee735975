//! Packet handlers for the demo server

mod chat;
mod connection;
mod login;
mod session;
mod status;

pub use connection::handle_connection;
