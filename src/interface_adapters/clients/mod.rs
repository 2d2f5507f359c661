// Outbound connections to other services.

pub mod relay;
