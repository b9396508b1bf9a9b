/// Errors that can occur during frame encoding/decoding.
///
/// Every variant ends the session that produced it: the bridge never
/// answers a frame it could not delimit.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header carries a protocol id other than 0.
    #[error("invalid protocol id {0:#06x} (expected 0)")]
    InvalidProtocolId(u16),

    /// The header length cannot hold a unit id and a function code.
    #[error("invalid frame length {0} (minimum 2)")]
    InvalidLength(u16),

    /// The PDU does not fit in the 16-bit length field.
    #[error("pdu too large ({size} bytes, max {max})")]
    PduTooLarge { size: usize, max: usize },

    /// A response PDU could not be interpreted.
    #[error("malformed response pdu: {0}")]
    MalformedResponse(&'static str),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection between frames.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the connection partway through a frame.
    #[error("connection closed mid-frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
