// Interface adapters: wire protocol, websocket handling and the outbound relay client.

pub mod clients;
pub mod console;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
