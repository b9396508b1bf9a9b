//! Register-write bridge that persists decoded channel snapshots.
//!
//! Field devices push holding-register writes (FC06/FC10) over a
//! Modbus/TCP-style connection. mbsnap keeps the written words in memory,
//! decodes every configured channel into an engineering value, and rewrites
//! a small `"<id> | <value>"` text file at a throttled rate.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP listening endpoint and peer allow-list
//! - [`frame`]: 7-byte header framing, request parsing, exception responses
//! - [`registers`]: register store, channel map, value decoding, snapshot text
//! - [`server`]: configuration, snapshot writer, connection server (behind `server` feature)

/// Re-export transport types.
pub mod transport {
    pub use mbsnap_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mbsnap_frame::*;
}

/// Re-export register and decoding types.
pub mod registers {
    pub use mbsnap_registers::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use mbsnap_server::*;
}
