//! Sans-IO game session: consumes inbound transport messages, drives the two
//! boards, and produces outbound payloads. The embedding owns the socket,
//! the timers, and the rendering.

pub use session::*;
pub use storage::*;

mod session;
mod storage;
