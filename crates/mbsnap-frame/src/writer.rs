use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_adu, Adu};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_adu(&mut self, adu: &Adu) -> Result<()> {
        self.send(adu.transaction_id, adu.unit_id, adu.pdu.as_ref())
    }

    /// Encode and send a PDU with the given transaction and unit ids.
    pub fn send(&mut self, transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_adu(transaction_id, unit_id, pdu, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::decode_adu;

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x0102, 0x03, &[0x90, 0x03]).unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes, vec![0x01, 0x02, 0x00, 0x00, 0x00, 0x03, 0x03, 0x90, 0x03]);
    }

    #[test]
    fn write_adu_roundtrips_through_decoder() {
        let adu = Adu::new(5, 1, vec![0x10, 0x00, 0x00, 0x00, 0x02]);
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_adu(&adu).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        assert_eq!(decode_adu(&mut wire).unwrap().unwrap(), adu);
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(1, 1, &[0x06]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn partial_writes_are_completed() {
        let mut writer = FrameWriter::new(OneByteWriter(Vec::new()));
        writer.send(1, 1, &[0x06, 0x00, 0x01, 0x00, 0x02]).unwrap();
        assert_eq!(writer.get_ref().0.len(), 12);
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct OneByteWriter(Vec<u8>);

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            match buf.first() {
                Some(byte) => {
                    self.0.push(*byte);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
