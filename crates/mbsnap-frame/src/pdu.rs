use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::function::{ExceptionCode, FunctionCode, EXCEPTION_FLAG};

/// A protocol-level refusal, answered with an exception PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    /// Raw function code of the refused request.
    pub function: u8,
    pub code: ExceptionCode,
}

impl Exception {
    pub fn new(function: u8, code: ExceptionCode) -> Self {
        Self { function, code }
    }

    /// Encoded exception PDU: `(function | 0x80), code`.
    pub fn to_pdu(self) -> [u8; 2] {
        [self.function | EXCEPTION_FLAG, self.code.as_u8()]
    }
}

/// A decoded register write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// FC06: one word at `address`.
    WriteSingleRegister { address: u16, value: u16 },
    /// FC10: `values.len()` consecutive words from `start`.
    WriteMultipleRegisters { start: u16, values: Vec<u16> },
}

impl Request {
    /// Parse a request PDU.
    ///
    /// Unknown function codes yield `IllegalFunction`; a supported function
    /// with a body of the wrong shape yields `IllegalDataValue`.
    pub fn parse(pdu: &[u8]) -> std::result::Result<Self, Exception> {
        let Some(&code) = pdu.first() else {
            return Err(Exception::new(0, ExceptionCode::IllegalFunction));
        };
        let malformed = Exception::new(code, ExceptionCode::IllegalDataValue);

        match FunctionCode::from_u8(code) {
            Some(FunctionCode::WriteSingleRegister) => {
                if pdu.len() != 5 {
                    return Err(malformed);
                }
                Ok(Self::WriteSingleRegister {
                    address: be_u16(pdu, 1),
                    value: be_u16(pdu, 3),
                })
            }
            Some(FunctionCode::WriteMultipleRegisters) => {
                if pdu.len() < 6 {
                    return Err(malformed);
                }
                let start = be_u16(pdu, 1);
                let quantity = usize::from(be_u16(pdu, 3));
                let byte_count = usize::from(pdu[5]);
                if byte_count != quantity * 2 || pdu.len() != 6 + byte_count {
                    return Err(malformed);
                }
                let values = pdu[6..]
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                Ok(Self::WriteMultipleRegisters { start, values })
            }
            None => Err(Exception::new(code, ExceptionCode::IllegalFunction)),
        }
    }

    pub fn function(&self) -> FunctionCode {
        match self {
            Self::WriteSingleRegister { .. } => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleRegisters { .. } => FunctionCode::WriteMultipleRegisters,
        }
    }

    /// First protocol address touched by the request.
    pub fn start(&self) -> u16 {
        match self {
            Self::WriteSingleRegister { address, .. } => *address,
            Self::WriteMultipleRegisters { start, .. } => *start,
        }
    }

    /// Number of words the request writes.
    pub fn quantity(&self) -> usize {
        match self {
            Self::WriteSingleRegister { .. } => 1,
            Self::WriteMultipleRegisters { values, .. } => values.len(),
        }
    }

    /// The normal response to this request.
    pub fn success(&self) -> Response {
        match self {
            Self::WriteSingleRegister { address, value } => Response::WriteSingleRegister {
                address: *address,
                value: *value,
            },
            Self::WriteMultipleRegisters { start, values } => Response::WriteMultipleRegisters {
                start: *start,
                quantity: values.len() as u16,
            },
        }
    }

    /// Encode the request PDU, as a client would send it.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        match self {
            Self::WriteSingleRegister { address, value } => {
                dst.put_u8(FunctionCode::WriteSingleRegister.as_u8());
                dst.put_u16(*address);
                dst.put_u16(*value);
            }
            Self::WriteMultipleRegisters { start, values } => {
                let byte_count = values.len() * 2;
                if byte_count > usize::from(u8::MAX) {
                    return Err(FrameError::PduTooLarge {
                        size: 6 + byte_count,
                        max: 6 + usize::from(u8::MAX),
                    });
                }
                dst.put_u8(FunctionCode::WriteMultipleRegisters.as_u8());
                dst.put_u16(*start);
                dst.put_u16(values.len() as u16);
                dst.put_u8(byte_count as u8);
                for value in values {
                    dst.put_u16(*value);
                }
            }
        }
        Ok(())
    }

    pub fn to_pdu(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(6 + self.quantity() * 2);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// A response PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// FC06 echo of the request.
    WriteSingleRegister { address: u16, value: u16 },
    /// FC10 acknowledgement of `quantity` words from `start`.
    WriteMultipleRegisters { start: u16, quantity: u16 },
    Exception(Exception),
}

impl From<Exception> for Response {
    fn from(exception: Exception) -> Self {
        Self::Exception(exception)
    }
}

impl Response {
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Self::WriteSingleRegister { address, value } => {
                dst.put_u8(FunctionCode::WriteSingleRegister.as_u8());
                dst.put_u16(*address);
                dst.put_u16(*value);
            }
            Self::WriteMultipleRegisters { start, quantity } => {
                dst.put_u8(FunctionCode::WriteMultipleRegisters.as_u8());
                dst.put_u16(*start);
                dst.put_u16(*quantity);
            }
            Self::Exception(exception) => dst.put_slice(&exception.to_pdu()),
        }
    }

    pub fn to_pdu(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(5);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Parse a response PDU, as a client would receive it.
    pub fn parse(pdu: &[u8]) -> Result<Self> {
        let Some(&code) = pdu.first() else {
            return Err(FrameError::MalformedResponse("empty pdu"));
        };

        if code & EXCEPTION_FLAG != 0 {
            if pdu.len() != 2 {
                return Err(FrameError::MalformedResponse("exception pdu must be 2 bytes"));
            }
            let exception_code = ExceptionCode::from_u8(pdu[1])
                .ok_or(FrameError::MalformedResponse("unknown exception code"))?;
            return Ok(Self::Exception(Exception::new(
                code & !EXCEPTION_FLAG,
                exception_code,
            )));
        }

        if pdu.len() != 5 {
            return Err(FrameError::MalformedResponse("write response must be 5 bytes"));
        }
        match FunctionCode::from_u8(code) {
            Some(FunctionCode::WriteSingleRegister) => Ok(Self::WriteSingleRegister {
                address: be_u16(pdu, 1),
                value: be_u16(pdu, 3),
            }),
            Some(FunctionCode::WriteMultipleRegisters) => Ok(Self::WriteMultipleRegisters {
                start: be_u16(pdu, 1),
                quantity: be_u16(pdu, 3),
            }),
            None => Err(FrameError::MalformedResponse("unsupported function code")),
        }
    }
}

fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_register_write() {
        let request = Request::parse(&[0x06, 0x9C, 0x41, 0x12, 0x34]).unwrap();
        assert_eq!(
            request,
            Request::WriteSingleRegister {
                address: 40001,
                value: 0x1234
            }
        );
        assert_eq!(request.quantity(), 1);
    }

    #[test]
    fn single_register_response_echoes_request() {
        let pdu = [0x06, 0x00, 0x0A, 0xFF, 0xEE];
        let request = Request::parse(&pdu).unwrap();
        assert_eq!(request.success().to_pdu().as_ref(), &pdu);
    }

    #[test]
    fn single_register_wrong_length_is_illegal_data_value() {
        for pdu in [&[0x06, 0x00, 0x01, 0x02][..], &[0x06, 0x00, 0x01, 0x02, 0x03, 0x04][..]] {
            let err = Request::parse(pdu).unwrap_err();
            assert_eq!(err, Exception::new(0x06, ExceptionCode::IllegalDataValue));
        }
    }

    #[test]
    fn parse_multiple_register_write() {
        let pdu = [0x10, 0x00, 0x00, 0x00, 0x02, 0x04, 0x40, 0x49, 0x0F, 0xDB];
        let request = Request::parse(&pdu).unwrap();
        assert_eq!(
            request,
            Request::WriteMultipleRegisters {
                start: 0,
                values: vec![0x4049, 0x0FDB]
            }
        );
        assert_eq!(
            request.success().to_pdu().as_ref(),
            &[0x10, 0x00, 0x00, 0x00, 0x02]
        );
    }

    #[test]
    fn multiple_register_byte_count_mismatch() {
        let pdu = [0x10, 0x00, 0x00, 0x00, 0x02, 0x02, 0x40, 0x49];
        let err = Request::parse(&pdu).unwrap_err();
        assert_eq!(err.to_pdu(), [0x90, 0x03]);
    }

    #[test]
    fn multiple_register_trailing_bytes() {
        let pdu = [0x10, 0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x01, 0xFF];
        let err = Request::parse(&pdu).unwrap_err();
        assert_eq!(err.code, ExceptionCode::IllegalDataValue);
    }

    #[test]
    fn multiple_register_short_header() {
        let err = Request::parse(&[0x10, 0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(err.to_pdu(), [0x90, 0x03]);
    }

    #[test]
    fn multiple_register_zero_quantity_is_well_formed() {
        let request = Request::parse(&[0x10, 0x00, 0x05, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(request.quantity(), 0);
    }

    #[test]
    fn unsupported_function_is_illegal_function() {
        let err = Request::parse(&[0x03, 0x00, 0x00, 0x00, 0x0A]).unwrap_err();
        assert_eq!(err.to_pdu(), [0x83, 0x01]);
    }

    #[test]
    fn encode_matches_parse() {
        let request = Request::WriteMultipleRegisters {
            start: 42001,
            values: vec![1, 2, 3],
        };
        let pdu = request.to_pdu().unwrap();
        assert_eq!(pdu[5], 6);
        assert_eq!(Request::parse(&pdu).unwrap(), request);
    }

    #[test]
    fn encode_rejects_more_values_than_byte_count_allows() {
        let request = Request::WriteMultipleRegisters {
            start: 0,
            values: vec![0; 128],
        };
        assert!(matches!(
            request.to_pdu(),
            Err(FrameError::PduTooLarge { .. })
        ));
    }

    #[test]
    fn parse_responses() {
        assert_eq!(
            Response::parse(&[0x90, 0x03]).unwrap(),
            Response::Exception(Exception::new(0x10, ExceptionCode::IllegalDataValue))
        );
        assert_eq!(
            Response::parse(&[0x10, 0x9C, 0x41, 0x00, 0x04]).unwrap(),
            Response::WriteMultipleRegisters {
                start: 40001,
                quantity: 4
            }
        );
        assert!(Response::parse(&[]).is_err());
        assert!(Response::parse(&[0x83, 0x09]).is_err());
        assert!(Response::parse(&[0x03, 0x00, 0x00, 0x00, 0x00]).is_err());
    }
}
