//! Header + PDU framing for register write traffic.
//!
//! Every message on the wire is framed with a 7-byte header:
//! - A 2-byte big-endian transaction id, echoed back in the response
//! - A 2-byte big-endian protocol id (always 0)
//! - A 2-byte big-endian length covering the unit id and the PDU
//! - A 1-byte unit id
//!
//! The PDU that follows starts with a function code. Only the two register
//! write functions are understood; everything else is answered with an
//! exception PDU.

pub mod codec;
pub mod error;
pub mod function;
pub mod pdu;
pub mod reader;
pub mod writer;

pub use codec::{decode_adu, encode_adu, Adu, HEADER_SIZE, MAX_PDU_SIZE, PROTOCOL_ID};
pub use error::{FrameError, Result};
pub use function::{function_name, ExceptionCode, FunctionCode, EXCEPTION_FLAG};
pub use pdu::{Exception, Request, Response};
pub use reader::FrameReader;
pub use writer::FrameWriter;
