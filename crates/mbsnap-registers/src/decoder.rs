//! 32-bit engineering values from register pairs.
//!
//! Decoding first assembles a 4-byte buffer from the pair `(w0, w1)`:
//! the word order picks which word lands first (is most significant), the
//! byte order picks how each word's two bytes are laid down. The buffer is
//! then read big-endian, as an IEEE-754 single or as an unsigned integer.
//!
//! Under [`DecodePolicy::Heuristic`], float channels whose value is not
//! plausible are re-read as a scaled signed 16-bit integer when the
//! high-order word looks like a sign extension (`0x0000` or `0xFFFF`).
//! Counter channels are never re-read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelGroup, ValueType};
use crate::error::RegisterError;

/// Smallest magnitude a float reading may have and still be trusted.
pub const PLAUSIBLE_MIN: f64 = 1e-6;
/// Largest magnitude a float reading may have and still be trusted.
pub const PLAUSIBLE_MAX: f64 = 1e6;

/// Byte order within each 16-bit word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Which word of a pair is most significant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordOrder {
    /// `w0` is the high-order word.
    #[default]
    Big,
    /// `w1` is the high-order word.
    Little,
}

macro_rules! order_str {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    Self::Big => "big",
                    Self::Little => "little",
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = RegisterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    "big" => Ok(Self::Big),
                    "little" => Ok(Self::Little),
                    _ => Err(RegisterError::InvalidOrder(s.to_string())),
                }
            }
        }
    };
}

order_str!(ByteOrder);
order_str!(WordOrder);

/// How float channels are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Always report the IEEE-754 reading.
    #[default]
    Strict,
    /// Fall back to a scaled int16 when the float is implausible.
    Heuristic,
}

impl DecodePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecodePolicy {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "heuristic" => Ok(Self::Heuristic),
            _ => Err(RegisterError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Per-group scale applied to the int16 fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupScales {
    pub ai: f64,
    pub ao: f64,
    pub tk: f64,
}

impl GroupScales {
    /// Scale for `group`. Counters are never scaled.
    pub fn for_group(&self, group: ChannelGroup) -> f64 {
        match group {
            ChannelGroup::AnalogInput => self.ai,
            ChannelGroup::AnalogOutput => self.ao,
            ChannelGroup::Tank => self.tk,
            ChannelGroup::HourCounter => 1.0,
        }
    }
}

impl Default for GroupScales {
    fn default() -> Self {
        Self {
            ai: 1.0,
            ao: 1.0,
            tk: 1.0,
        }
    }
}

/// Everything that decides how a pair becomes a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub word_order: WordOrder,
    pub byte_order: ByteOrder,
    pub policy: DecodePolicy,
    pub scales: GroupScales,
}

/// A decoded reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineeringValue {
    Float(f64),
    Unsigned(u32),
}

impl fmt::Display for EngineeringValue {
    /// Floats to three decimals, counters as plain integers. Non-finite
    /// floats print as `nan`, `inf`, and `-inf`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("nan"),
            Self::Float(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "inf" } else { "-inf" })
            }
            Self::Float(v) => write!(f, "{v:.3}"),
        }
    }
}

/// Lay the pair down as four bytes, most significant first.
pub fn assemble(w0: u16, w1: u16, word_order: WordOrder, byte_order: ByteOrder) -> [u8; 4] {
    let (high, low) = match word_order {
        WordOrder::Big => (w0, w1),
        WordOrder::Little => (w1, w0),
    };
    let (h, l) = match byte_order {
        ByteOrder::Big => (high.to_be_bytes(), low.to_be_bytes()),
        ByteOrder::Little => (high.to_le_bytes(), low.to_le_bytes()),
    };
    [h[0], h[1], l[0], l[1]]
}

/// Inverse of [`assemble`].
fn disassemble(bytes: [u8; 4], word_order: WordOrder, byte_order: ByteOrder) -> (u16, u16) {
    let read = |pair: [u8; 2]| match byte_order {
        ByteOrder::Big => u16::from_be_bytes(pair),
        ByteOrder::Little => u16::from_le_bytes(pair),
    };
    let high = read([bytes[0], bytes[1]]);
    let low = read([bytes[2], bytes[3]]);
    match word_order {
        WordOrder::Big => (high, low),
        WordOrder::Little => (low, high),
    }
}

/// Decode one pair.
///
/// `scale` multiplies the int16 fallback and is ignored otherwise.
///
/// The fallback works on the assembled big-endian view, after both word
/// order and byte order are applied: the high half is the configured
/// high-order word with its bytes already swapped when `byte_order` is
/// little, and the int16 is read from the low half the same way.
pub fn decode(
    w0: u16,
    w1: u16,
    value_type: ValueType,
    scale: f64,
    options: &DecodeOptions,
) -> EngineeringValue {
    let bytes = assemble(w0, w1, options.word_order, options.byte_order);
    match value_type {
        ValueType::Uint32 => EngineeringValue::Unsigned(u32::from_be_bytes(bytes)),
        ValueType::Float32 => {
            let value = f64::from(f32::from_be_bytes(bytes));
            if options.policy == DecodePolicy::Heuristic && !is_plausible(value) {
                let high = u16::from_be_bytes([bytes[0], bytes[1]]);
                if high == 0x0000 || high == 0xFFFF {
                    let low = i16::from_be_bytes([bytes[2], bytes[3]]);
                    return EngineeringValue::Float(f64::from(low) * scale);
                }
            }
            EngineeringValue::Float(value)
        }
    }
}

/// Finite with magnitude in `[1e-6, 1e6]`.
pub fn is_plausible(value: f64) -> bool {
    value.is_finite() && (PLAUSIBLE_MIN..=PLAUSIBLE_MAX).contains(&value.abs())
}

/// The pair a device sends for `value` under the given orders.
pub fn encode_f32(value: f32, word_order: WordOrder, byte_order: ByteOrder) -> (u16, u16) {
    disassemble(value.to_be_bytes(), word_order, byte_order)
}

/// The pair a device sends for `value` under the given orders.
pub fn encode_u32(value: u32, word_order: WordOrder, byte_order: ByteOrder) -> (u16, u16) {
    disassemble(value.to_be_bytes(), word_order, byte_order)
}
