use serde::{Deserialize, Serialize};

/// Translation from protocol-visible addresses to engineering offsets.
///
/// A PLC numbering its holding registers from 40001 and a client already
/// sending zero-based offsets can share one endpoint: addresses at or
/// above the base are rebased, anything below it is taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBase(pub u16);

impl AddressBase {
    /// 1-based `4xxxx` holding-register numbering.
    pub const PLC: Self = Self(40001);
    /// Already zero-based.
    pub const ZERO: Self = Self(0);

    pub fn value(self) -> u16 {
        self.0
    }

    /// Engineering offset for `protocol_addr`.
    pub fn translate(self, protocol_addr: u16) -> usize {
        if protocol_addr >= self.0 {
            usize::from(protocol_addr - self.0)
        } else {
            usize::from(protocol_addr)
        }
    }
}

impl Default for AddressBase {
    fn default() -> Self {
        Self::PLC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plc_numbering_is_rebased() {
        let base = AddressBase::PLC;
        assert_eq!(base.translate(40001), 0);
        assert_eq!(base.translate(42001), 2000);
        assert_eq!(base.translate(44104), 4103);
    }

    #[test]
    fn below_base_passes_through() {
        let base = AddressBase::PLC;
        assert_eq!(base.translate(0), 0);
        assert_eq!(base.translate(3000), 3000);
        assert_eq!(base.translate(40000), 40000);
    }

    #[test]
    fn zero_base_is_identity() {
        for addr in [0u16, 1, 1319, 4103, u16::MAX] {
            assert_eq!(AddressBase::ZERO.translate(addr), usize::from(addr));
        }
    }

    #[test]
    fn base_40000_shifts_by_one_less() {
        let base = AddressBase(40000);
        assert_eq!(base.translate(40000), 0);
        assert_eq!(base.translate(40001), 1);
    }

    #[test]
    fn deserializes_from_bare_number() {
        let base: AddressBase = serde_json::from_str("40001").unwrap();
        assert_eq!(base, AddressBase::PLC);
    }
}
