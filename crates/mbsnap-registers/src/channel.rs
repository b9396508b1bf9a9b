//! The engineering channel table.
//!
//! Four groups, declared in this order and rendered in this order:
//!
//! | Group | Ids | Offsets | Type |
//! |---|---|---|---|
//! | Analog inputs | `AI.0000`..`AI.0659` | 0..=1319 | float32 |
//! | Analog outputs | `AO.0000`..`AO.0043` | 2000..=2087 | float32 |
//! | Hour counters | 51 tags from the counter list | 3000..=3101 | uint32 |
//! | Tank volumes | `TK.0000`..`TK.0051` | 4000..=4103 | float32 |
//!
//! Every channel spans two consecutive words.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::RegisterError;

const ANALOG_INPUT_COUNT: usize = 660;
const ANALOG_OUTPUT_COUNT: usize = 44;
const TANK_COUNT: usize = 52;

const ANALOG_INPUT_BASE: usize = 0;
const ANALOG_OUTPUT_BASE: usize = 2000;
const TANK_BASE: usize = 4000;

/// Hour-counter tags and their offsets. The tag numbers are plant
/// identifiers, not positions, so the table is explicit.
const HOUR_COUNTERS: [(&str, usize); 51] = [
    ("HC.0171", 3000),
    ("HC.0174", 3002),
    ("HC.0190", 3004),
    ("HC.0425", 3006),
    ("HC.0428", 3008),
    ("HC.0429", 3010),
    ("HC.0584", 3012),
    ("HC.0587", 3014),
    ("HC.0588", 3016),
    ("HC.0614", 3018),
    ("HC.0615", 3020),
    ("HC.0616", 3022),
    ("HC.0622", 3024),
    ("HC.0653", 3026),
    ("HC.0654", 3028),
    ("HC.0912", 3030),
    ("HC.0913", 3032),
    ("HC.0949", 3034),
    ("HC.0952", 3036),
    ("HC.1320", 3038),
    ("HC.1323", 3040),
    ("HC.1326", 3042),
    ("HC.1329", 3044),
    ("HC.1336", 3046),
    ("HC.1343", 3048),
    ("HC.1346", 3050),
    ("HC.1349", 3052),
    ("HC.1352", 3054),
    ("HC.1353", 3056),
    ("HC.1354", 3058),
    ("HC.1360", 3060),
    ("HC.1363", 3062),
    ("HC.1367", 3064),
    ("HC.1370", 3066),
    ("HC.1373", 3068),
    ("HC.1380", 3070),
    ("HC.1387", 3072),
    ("HC.1390", 3074),
    ("HC.1393", 3076),
    ("HC.1396", 3078),
    ("HC.1399", 3080),
    ("HC.1400", 3082),
    ("HC.1401", 3084),
    ("HC.1696", 3086),
    ("HC.1704", 3088),
    ("HC.1712", 3090),
    ("HC.1721", 3092),
    ("HC.1725", 3094),
    ("HC.1836", 3096),
    ("HC.1908", 3098),
    ("HC.1909", 3100),
];

/// How a channel's 32 bits are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Float32,
    Uint32,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Uint32 => "uint32",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "float" | "f32" => Ok(Self::Float32),
            "uint32" | "u32" => Ok(Self::Uint32),
            _ => Err(RegisterError::InvalidValueType(s.to_string())),
        }
    }
}

/// Channel groups, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelGroup {
    AnalogInput,
    AnalogOutput,
    HourCounter,
    Tank,
}

impl ChannelGroup {
    pub const ALL: [Self; 4] = [
        Self::AnalogInput,
        Self::AnalogOutput,
        Self::HourCounter,
        Self::Tank,
    ];

    /// Tag prefix, e.g. `AI`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::AnalogInput => "AI",
            Self::AnalogOutput => "AO",
            Self::HourCounter => "HC",
            Self::Tank => "TK",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AnalogInput => "Analog inputs",
            Self::AnalogOutput => "Analog outputs",
            Self::HourCounter => "Hour counters",
            Self::Tank => "Tank volumes",
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            Self::HourCounter => ValueType::Uint32,
            _ => ValueType::Float32,
        }
    }
}

/// One named register pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelDescriptor {
    pub id: String,
    /// Engineering offset of the first (wire-order low) word.
    pub offset: usize,
    pub value_type: ValueType,
    pub group: ChannelGroup,
}

impl ChannelDescriptor {
    pub fn new(id: impl Into<String>, offset: usize, group: ChannelGroup) -> Self {
        Self {
            id: id.into(),
            offset,
            value_type: group.value_type(),
            group,
        }
    }

    /// Words occupied: always two.
    pub const WIDTH: usize = 2;

    /// The pair `(w0, w1)` in wire order, if both words exist in `words`.
    pub fn pair(&self, words: &[u16]) -> Option<(u16, u16)> {
        let w0 = *words.get(self.offset)?;
        let w1 = *words.get(self.offset + 1)?;
        Some((w0, w1))
    }
}

/// Ordered, immutable channel table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    channels: Vec<ChannelDescriptor>,
}

impl ChannelMap {
    pub fn new(channels: Vec<ChannelDescriptor>) -> Self {
        Self { channels }
    }

    /// The plant channel table, built once.
    pub fn standard() -> &'static ChannelMap {
        static STANDARD: OnceLock<ChannelMap> = OnceLock::new();
        STANDARD.get_or_init(build_standard)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChannelDescriptor> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<&ChannelDescriptor> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn group(&self, group: ChannelGroup) -> impl Iterator<Item = &ChannelDescriptor> {
        self.channels.iter().filter(move |c| c.group == group)
    }

    /// Smallest store length that holds every channel.
    pub fn register_span(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.offset + ChannelDescriptor::WIDTH)
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a ChannelMap {
    type Item = &'a ChannelDescriptor;
    type IntoIter = std::slice::Iter<'a, ChannelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn build_standard() -> ChannelMap {
    let mut channels = Vec::with_capacity(
        ANALOG_INPUT_COUNT + ANALOG_OUTPUT_COUNT + HOUR_COUNTERS.len() + TANK_COUNT,
    );

    push_contiguous(
        &mut channels,
        ChannelGroup::AnalogInput,
        ANALOG_INPUT_BASE,
        ANALOG_INPUT_COUNT,
    );
    push_contiguous(
        &mut channels,
        ChannelGroup::AnalogOutput,
        ANALOG_OUTPUT_BASE,
        ANALOG_OUTPUT_COUNT,
    );
    channels.extend(
        HOUR_COUNTERS
            .iter()
            .map(|(id, offset)| ChannelDescriptor::new(*id, *offset, ChannelGroup::HourCounter)),
    );
    push_contiguous(&mut channels, ChannelGroup::Tank, TANK_BASE, TANK_COUNT);

    ChannelMap::new(channels)
}

fn push_contiguous(
    channels: &mut Vec<ChannelDescriptor>,
    group: ChannelGroup,
    base: usize,
    count: usize,
) {
    channels.extend((0..count).map(|i| {
        ChannelDescriptor::new(
            format!("{}.{i:04}", group.prefix()),
            base + i * ChannelDescriptor::WIDTH,
            group,
        )
    }));
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::store::DEFAULT_REGISTER_COUNT;

    #[test]
    fn standard_table_group_sizes() {
        let map = ChannelMap::standard();
        assert_eq!(map.group(ChannelGroup::AnalogInput).count(), 660);
        assert_eq!(map.group(ChannelGroup::AnalogOutput).count(), 44);
        assert_eq!(map.group(ChannelGroup::HourCounter).count(), 51);
        assert_eq!(map.group(ChannelGroup::Tank).count(), 52);
        assert_eq!(map.len(), 807);
    }

    #[test]
    fn standard_table_boundaries() {
        let map = ChannelMap::standard();
        assert_eq!(map.lookup("AI.0000").unwrap().offset, 0);
        assert_eq!(map.lookup("AI.0659").unwrap().offset, 1318);
        assert_eq!(map.lookup("AO.0000").unwrap().offset, 2000);
        assert_eq!(map.lookup("AO.0043").unwrap().offset, 2086);
        assert_eq!(map.lookup("HC.0171").unwrap().offset, 3000);
        assert_eq!(map.lookup("HC.1909").unwrap().offset, 3100);
        assert_eq!(map.lookup("TK.0051").unwrap().offset, 4102);
        assert!(map.lookup("AI.0660").is_none());
    }

    #[test]
    fn declaration_order_is_ai_ao_hc_tk() {
        let groups: Vec<ChannelGroup> = ChannelMap::standard()
            .iter()
            .map(|c| c.group)
            .fold(Vec::new(), |mut acc, g| {
                if acc.last() != Some(&g) {
                    acc.push(g);
                }
                acc
            });
        assert_eq!(groups, ChannelGroup::ALL.to_vec());
    }

    #[test]
    fn channels_never_overlap_and_fit_default_store() {
        let map = ChannelMap::standard();
        let mut used = HashSet::new();
        for channel in map {
            assert!(used.insert(channel.offset), "{} overlaps", channel.id);
            assert!(used.insert(channel.offset + 1), "{} overlaps", channel.id);
        }
        assert_eq!(map.register_span(), DEFAULT_REGISTER_COUNT);
    }

    #[test]
    fn only_hour_counters_are_unsigned() {
        for channel in ChannelMap::standard() {
            let expected = if channel.group == ChannelGroup::HourCounter {
                ValueType::Uint32
            } else {
                ValueType::Float32
            };
            assert_eq!(channel.value_type, expected, "{}", channel.id);
        }
    }

    #[test]
    fn pair_reads_two_words_in_wire_order() {
        let channel = ChannelDescriptor::new("TK.0000", 2, ChannelGroup::Tank);
        assert_eq!(channel.pair(&[0, 0, 7, 8]), Some((7, 8)));
        assert_eq!(channel.pair(&[0, 0, 7]), None);
    }

    #[test]
    fn value_type_parsing() {
        assert_eq!("float32".parse::<ValueType>().unwrap(), ValueType::Float32);
        assert_eq!("UINT32".parse::<ValueType>().unwrap(), ValueType::Uint32);
        assert!("int16".parse::<ValueType>().is_err());
    }
}
