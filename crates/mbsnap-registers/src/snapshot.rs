use std::fmt;

use crate::channel::ChannelMap;
use crate::decoder::{decode, DecodeOptions, EngineeringValue};

/// One rendered channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotLine<'a> {
    pub channel: &'a str,
    pub value: EngineeringValue,
}

impl fmt::Display for SnapshotLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.channel, self.value)
    }
}

/// Every channel of a map decoded from one register image, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<'a> {
    lines: Vec<SnapshotLine<'a>>,
}

impl<'a> Snapshot<'a> {
    /// Decode every channel of `map` from `words`.
    ///
    /// Words missing from a short image read as zero, so the snapshot
    /// always has one line per channel.
    pub fn capture(words: &[u16], map: &'a ChannelMap, options: &DecodeOptions) -> Self {
        let lines = map
            .iter()
            .map(|channel| {
                let (w0, w1) = channel.pair(words).unwrap_or((0, 0));
                SnapshotLine {
                    channel: channel.id.as_str(),
                    value: decode(
                        w0,
                        w1,
                        channel.value_type,
                        options.scales.for_group(channel.group),
                        options,
                    ),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[SnapshotLine<'a>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn value(&self, channel: &str) -> Option<EngineeringValue> {
        self.lines
            .iter()
            .find(|line| line.channel == channel)
            .map(|line| line.value)
    }

    /// Newline-joined `"<id> | <value>"` lines, without a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.len() * 20);
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelDescriptor, ChannelGroup};
    use crate::decoder::{encode_u32, ByteOrder, DecodePolicy, WordOrder};
    use crate::store::DEFAULT_REGISTER_COUNT;

    #[test]
    fn zeroed_store_renders_every_channel() {
        let words = vec![0u16; DEFAULT_REGISTER_COUNT];
        let map = ChannelMap::standard();
        let snapshot = Snapshot::capture(&words, map, &DecodeOptions::default());
        let text = snapshot.render();

        assert_eq!(snapshot.len(), map.len());
        assert_eq!(text.lines().count(), map.len());
        assert!(text.starts_with("AI.0000 | 0.000\nAI.0001 | 0.000\n"));
        assert!(text.contains("\nAO.0043 | 0.000\nHC.0171 | 0\n"));
        assert!(text.ends_with("TK.0051 | 0.000"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn analog_input_reads_three_point_one_four() {
        let mut words = vec![0u16; DEFAULT_REGISTER_COUNT];
        words[0] = 0x4048;
        words[1] = 0xF5C3;
        let snapshot = Snapshot::capture(&words, ChannelMap::standard(), &DecodeOptions::default());
        assert!(snapshot.render().lines().any(|l| l == "AI.0000 | 3.140"));
    }

    #[test]
    fn counters_render_as_integers() {
        let mut words = vec![0u16; DEFAULT_REGISTER_COUNT];
        let (w0, w1) = encode_u32(987_654, WordOrder::Little, ByteOrder::Little);
        words[3100] = w0;
        words[3101] = w1;
        let options = DecodeOptions {
            word_order: WordOrder::Little,
            byte_order: ByteOrder::Little,
            ..DecodeOptions::default()
        };
        let snapshot = Snapshot::capture(&words, ChannelMap::standard(), &options);
        assert_eq!(
            snapshot.value("HC.1909"),
            Some(EngineeringValue::Unsigned(987_654))
        );
        assert!(snapshot.render().contains("\nHC.1909 | 987654\n"));
    }

    #[test]
    fn heuristic_applies_group_scale() {
        let mut words = vec![0u16; DEFAULT_REGISTER_COUNT];
        words[4000] = 0x0000;
        words[4001] = 0x0190; // 400
        let mut options = DecodeOptions {
            policy: DecodePolicy::Heuristic,
            ..DecodeOptions::default()
        };
        options.scales.tk = 0.25;
        let snapshot = Snapshot::capture(&words, ChannelMap::standard(), &options);
        assert_eq!(snapshot.value("TK.0000"), Some(EngineeringValue::Float(100.0)));
    }

    #[test]
    fn short_image_reads_missing_words_as_zero() {
        let map = ChannelMap::new(vec![
            ChannelDescriptor::new("AI.0000", 0, ChannelGroup::AnalogInput),
            ChannelDescriptor::new("TK.0000", 10, ChannelGroup::Tank),
        ]);
        let snapshot = Snapshot::capture(&[0x3F80, 0x0000], &map, &DecodeOptions::default());
        assert_eq!(snapshot.render(), "AI.0000 | 1.000\nTK.0000 | 0.000");
    }
}
