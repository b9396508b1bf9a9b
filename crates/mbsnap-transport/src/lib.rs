//! Blocking TCP transport for the register bridge.
//!
//! This is the lowest layer of mbsnap. It binds the listening endpoint,
//! accepts connections, and answers one question about each peer: is it
//! allowed to talk to us at all. Everything else builds on the
//! [`TcpEndpoint`] and [`AllowList`] types provided here.

pub mod allow;
pub mod error;
pub mod tcp;

pub use allow::AllowList;
pub use error::{Result, TransportError};
pub use tcp::TcpEndpoint;
