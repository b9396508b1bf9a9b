//! The register-write endpoint.
//!
//! Peers connect over TCP and write holding registers with FC06/FC10.
//! Each accepted write lands in the shared [`RegisterStore`]; at most once
//! per flush interval the whole channel table is decoded and the text
//! snapshot file is rewritten.
//!
//! [`RegisterStore`]: mbsnap_registers::RegisterStore

pub mod bridge;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod snapshot_writer;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{Result, ServerError};
pub use server::{Server, ServerHandle};
pub use session::serve_connection;
pub use snapshot_writer::SnapshotWriter;
