// Frameworks layer: configuration, process bootstrap and the two entry points.

pub mod client;
pub mod config;
pub mod runtime;
pub mod server;
