// Network adapter modules for inbound client sockets.

pub mod client;

pub use client::ws_handler;
