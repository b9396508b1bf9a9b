//! Register memory and engineering-value decoding.
//!
//! The bridge keeps a fixed array of 16-bit words that peers write into.
//! Channels are named pairs of those words; the [`decoder`] turns a pair
//! into a float or counter under the configured byte and word order, and
//! [`snapshot`] renders every channel as `"<id> | <value>"` text.
//!
//! The channel table, decoding rules, and text format are the contract
//! shared with any reader that polls the same device layout.

pub mod address;
pub mod channel;
pub mod decoder;
pub mod error;
pub mod snapshot;
pub mod store;

pub use address::AddressBase;
pub use channel::{ChannelDescriptor, ChannelGroup, ChannelMap, ValueType};
pub use decoder::{
    decode, encode_f32, encode_u32, ByteOrder, DecodeOptions, DecodePolicy, EngineeringValue,
    GroupScales, WordOrder,
};
pub use error::{RegisterError, Result};
pub use snapshot::{Snapshot, SnapshotLine};
pub use store::{RegisterStore, DEFAULT_REGISTER_COUNT};
