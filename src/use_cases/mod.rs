// Use cases layer: relay workflows for the server and the driving loop for clients.

pub mod driving;
pub mod registry;
pub mod relay;
pub mod reporting;
pub mod types;

pub use driving::{DrivingSession, HudReadout, JoinedAs};
pub use registry::SessionRegistry;
pub use relay::{Relay, relay_task};
pub use reporting::{ReportPolicy, ReportThrottle};
pub use types::{Attachment, ChatLine, InitSnapshot, RelayBroadcast, RelayEvent};
