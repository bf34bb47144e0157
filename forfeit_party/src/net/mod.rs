//! Wire protocol and the server actor that speaks it.

pub mod messages;
pub mod server;
