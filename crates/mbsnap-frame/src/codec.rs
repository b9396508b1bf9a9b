use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Frame header: transaction (2) + protocol (2) + length (2) + unit (1) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// The only protocol id the bridge speaks.
pub const PROTOCOL_ID: u16 = 0;

/// Largest PDU whose length still fits the 16-bit length field.
pub const MAX_PDU_SIZE: usize = u16::MAX as usize - 1;

/// A framed request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adu {
    /// Correlates a response with its request.
    pub transaction_id: u16,
    /// Addressed unit behind the endpoint.
    pub unit_id: u8,
    /// Function code followed by its body.
    pub pdu: Bytes,
}

impl Adu {
    /// Create a new frame.
    pub fn new(transaction_id: u16, unit_id: u8, pdu: impl Into<Bytes>) -> Self {
        Self {
            transaction_id,
            unit_id,
            pdu: pdu.into(),
        }
    }

    /// A reply carrying this frame's transaction and unit ids.
    pub fn reply(&self, pdu: impl Into<Bytes>) -> Self {
        Self::new(self.transaction_id, self.unit_id, pdu)
    }

    /// First PDU byte, if any.
    pub fn function_code(&self) -> Option<u8> {
        self.pdu.first().copied()
    }

    /// The total wire size of this frame (header + PDU).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.pdu.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────┬──────────┬──────────────────┐
/// │ Transaction  │ Protocol     │ Length       │ Unit     │ PDU              │
/// │ (2B BE)      │ (2B BE) = 0  │ (2B BE)      │ (1B)     │ (Length-1 bytes) │
/// └──────────────┴──────────────┴──────────────┴──────────┴──────────────────┘
/// ```
pub fn encode_adu(transaction_id: u16, unit_id: u8, pdu: &[u8], dst: &mut BytesMut) -> Result<()> {
    if pdu.len() > MAX_PDU_SIZE {
        return Err(FrameError::PduTooLarge {
            size: pdu.len(),
            max: MAX_PDU_SIZE,
        });
    }
    dst.reserve(HEADER_SIZE + pdu.len());
    dst.put_u16(transaction_id);
    dst.put_u16(PROTOCOL_ID);
    dst.put_u16((pdu.len() + 1) as u16);
    dst.put_u8(unit_id);
    dst.put_slice(pdu);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_adu(src: &mut BytesMut) -> Result<Option<Adu>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let transaction_id = u16::from_be_bytes([src[0], src[1]]);
    let protocol_id = u16::from_be_bytes([src[2], src[3]]);
    let length = u16::from_be_bytes([src[4], src[5]]);
    let unit_id = src[6];

    if protocol_id != PROTOCOL_ID {
        trace!(transaction_id, protocol_id, "foreign protocol id");
        return Err(FrameError::InvalidProtocolId(protocol_id));
    }
    if length < 2 {
        trace!(transaction_id, length, "length leaves no room for a function code");
        return Err(FrameError::InvalidLength(length));
    }

    let pdu_len = usize::from(length) - 1;
    if src.len() < HEADER_SIZE + pdu_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let pdu = src.split_to(pdu_len).freeze();

    Ok(Some(Adu {
        transaction_id,
        unit_id,
        pdu,
    }))
}
