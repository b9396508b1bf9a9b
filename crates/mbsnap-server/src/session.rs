use std::io::{Read, Write};

use mbsnap_frame::{FrameError, FrameReader, FrameWriter};
use tracing::{debug, trace};

use crate::bridge::Bridge;
use crate::error::Result;

/// Run the request loop for one connection until the peer goes away.
///
/// Each frame is answered before the next is read. The loop ends without
/// a response on EOF, a short header or PDU, or a frame it cannot
/// delimit. Returns the number of frames answered.
pub fn serve_connection<R: Read, W: Write>(reader: R, writer: W, bridge: &Bridge) -> Result<u64> {
    let mut reader = FrameReader::new(reader);
    let mut writer = FrameWriter::new(writer);
    let mut answered = 0u64;

    loop {
        let request = match reader.read_adu() {
            Ok(adu) => adu,
            Err(FrameError::ConnectionClosed) => {
                debug!(answered, "peer closed connection");
                return Ok(answered);
            }
            Err(
                err @ (FrameError::Truncated { .. }
                | FrameError::InvalidProtocolId(_)
                | FrameError::InvalidLength(_)),
            ) => {
                debug!(error = %err, answered, "dropping connection on bad framing");
                return Ok(answered);
            }
            Err(err) => return Err(err.into()),
        };

        trace!(
            transaction_id = request.transaction_id,
            unit_id = request.unit_id,
            pdu_len = request.pdu.len(),
            "received frame"
        );

        let response = bridge.handle_pdu(&request.pdu);
        writer.write_adu(&request.reply(response.to_pdu()))?;
        answered += 1;
    }
}
