//! Function and exception codes.

/// Bit set on the function code of an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Function codes the bridge serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    /// Write Single Register (0x06).
    WriteSingleRegister = 0x06,
    /// Write Multiple Registers (0x10).
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    /// Map a raw function code to a supported function.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x06 => Some(Self::WriteSingleRegister),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Exception codes carried in the second byte of an exception PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExceptionCode {
    /// The function code is not served.
    IllegalFunction = 0x01,
    /// The address is not valid for the function.
    IllegalDataAddress = 0x02,
    /// The request body is malformed.
    IllegalDataValue = 0x03,
}

impl ExceptionCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::IllegalFunction),
            0x02 => Some(Self::IllegalDataAddress),
            0x03 => Some(Self::IllegalDataValue),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Returns a human-readable name for a raw function code.
pub fn function_name(code: u8) -> &'static str {
    match code & !EXCEPTION_FLAG {
        0x01 => "READ_COILS",
        0x02 => "READ_DISCRETE_INPUTS",
        0x03 => "READ_HOLDING_REGISTERS",
        0x04 => "READ_INPUT_REGISTERS",
        0x05 => "WRITE_SINGLE_COIL",
        0x06 => "WRITE_SINGLE_REGISTER",
        0x0F => "WRITE_MULTIPLE_COILS",
        0x10 => "WRITE_MULTIPLE_REGISTERS",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_register_writes_are_supported() {
        assert_eq!(
            FunctionCode::from_u8(0x06),
            Some(FunctionCode::WriteSingleRegister)
        );
        assert_eq!(
            FunctionCode::from_u8(0x10),
            Some(FunctionCode::WriteMultipleRegisters)
        );
        for code in [0x00, 0x03, 0x05, 0x0F, 0x16, 0x86, 0xFF] {
            assert_eq!(FunctionCode::from_u8(code), None, "code {code:#04x}");
        }
    }

    #[test]
    fn names_ignore_exception_flag() {
        assert_eq!(function_name(0x10), "WRITE_MULTIPLE_REGISTERS");
        assert_eq!(function_name(0x90), "WRITE_MULTIPLE_REGISTERS");
        assert_eq!(function_name(0x2B), "UNKNOWN");
    }
}
