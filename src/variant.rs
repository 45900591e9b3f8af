//! RDES variants and their per-value bit layouts.
//!
//! Every variant shares the same framing for a single value:
//!
//! * bit 8 of the lead byte clear: a raw 31-bit value, 4 bytes big-endian
//! * bit 8 set: a delta; bit 7 is the sign (1 = increase), the variant's
//!   size-selector bits follow, and the remaining bits of the lead byte plus
//!   all following bytes hold the magnitude, most significant first
//!
//! The variants differ only in which [`Level`]s exist and how the selector
//! bits announce them. Each one is a [`DeltaCodec`] strategy, picked once when
//! a compressor or decompressor is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bits::{byte, check_bit};
use crate::constants::{
    DELTA_FLAG, RAW_VALUE_BYTES, RAW_VALUE_MAX, RDES1_LEVELS, RDES2_LEVELS, RDES3_LEVELS, SIGN_FLAG,
};
use crate::error::ConfigError;

/// One of the three RDES bit-budget allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Variant {
    /// One 3-byte delta level (22-bit magnitude)
    Rdes1,
    /// 2-byte (13-bit) and 3-byte (21-bit) delta levels
    Rdes2,
    /// 1-byte (5-bit), 2-byte (12-bit) and 3-byte (20-bit) delta levels
    #[default]
    Rdes3,
}

impl Variant {
    /// All variants, in numeric order
    pub const ALL: [Self; 3] = [Self::Rdes1, Self::Rdes2, Self::Rdes3];

    /// Numeric variant id (1, 2 or 3)
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Rdes1 => 1,
            Self::Rdes2 => 2,
            Self::Rdes3 => 3,
        }
    }

    /// The encoding strategy for this variant
    #[must_use]
    pub fn codec(self) -> &'static dyn DeltaCodec {
        match self {
            Self::Rdes1 => &Rdes1,
            Self::Rdes2 => &Rdes2,
            Self::Rdes3 => &Rdes3,
        }
    }

    /// Delta levels of this variant, smallest first
    #[must_use]
    pub fn levels(self) -> &'static [Level] {
        self.codec().levels()
    }

    /// Largest offset that still encodes as a delta
    #[must_use]
    pub fn max_delta(self) -> u32 {
        self.levels().last().map_or(0, Level::max_magnitude)
    }
}

impl TryFrom<u8> for Variant {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Rdes1),
            2 => Ok(Self::Rdes2),
            3 => Ok(Self::Rdes3),
            other => Err(ConfigError::UnknownVariant(other)),
        }
    }
}

impl From<Variant> for u8 {
    fn from(variant: Variant) -> Self {
        variant.number()
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("rdes")
            .or_else(|| trimmed.strip_prefix("RDES"))
            .unwrap_or(trimmed);
        let number = digits.parse::<u8>().map_err(|_| ConfigError::UnknownVariantName(s.to_owned()))?;
        Self::try_from(number)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RDES{}", self.number())
    }
}

/// A delta encoding level: how many bytes it takes and how its lead byte is tagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    bytes: u8,
    magnitude_bits: u8,
    selector: u8,
    selector_mask: u8,
}

impl Level {
    pub(crate) const fn new(bytes: u8, magnitude_bits: u8, selector: u8, selector_mask: u8) -> Self {
        Self {
            bytes,
            magnitude_bits,
            selector,
            selector_mask,
        }
    }

    /// Total bytes emitted for a value at this level
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bytes as usize
    }

    /// Number of magnitude bits carried
    #[inline]
    #[must_use]
    pub const fn magnitude_bits(&self) -> u32 {
        self.magnitude_bits as u32
    }

    /// Largest offset this level can carry
    #[inline]
    #[must_use]
    pub const fn max_magnitude(&self) -> u32 {
        (1 << self.magnitude_bits) - 1
    }

    /// Selector bits identifying this level in a lead byte
    #[inline]
    #[must_use]
    pub const fn selector(&self) -> u8 {
        self.selector
    }

    /// Magnitude bits stored in the lead byte
    #[inline]
    const fn lead_mask(&self) -> u8 {
        let lead_bits = self.magnitude_bits as u32 - 8 * (self.bytes as u32 - 1);
        ((1u32 << lead_bits) - 1) as u8
    }

    /// Whether a delta lead byte announces this level
    #[inline]
    #[must_use]
    pub const fn matches(&self, lead: u8) -> bool {
        lead & self.selector_mask == self.selector
    }

    /// Append the bytes of `delta` at this level
    ///
    /// The magnitude must fit (`delta.magnitude <= self.max_magnitude()`).
    pub(crate) fn write(&self, delta: Delta, out: &mut Vec<u8>) {
        debug_assert!(delta.magnitude <= self.max_magnitude());
        let tail = self.bytes() - 1;
        let mut lead = DELTA_FLAG | self.selector | byte(delta.magnitude >> (8 * tail));
        if delta.increase {
            lead |= SIGN_FLAG;
        }
        out.push(lead);
        for i in (0..tail).rev() {
            out.push(byte(delta.magnitude >> (8 * i)));
        }
    }

    /// Read a delta from `body`, which holds exactly `self.bytes()` bytes
    pub(crate) fn read(&self, body: &[u8]) -> Delta {
        debug_assert_eq!(body.len(), self.bytes());
        let lead = body[0];
        let magnitude = body[1..]
            .iter()
            .fold(u32::from(lead & self.lead_mask()), |acc, &b| (acc << 8) | u32::from(b));
        Delta {
            increase: lead & SIGN_FLAG != 0,
            magnitude,
        }
    }
}

/// A signed offset between two consecutive values of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    /// True when the new value is greater than or equal to the last one
    pub increase: bool,
    /// Absolute difference
    pub magnitude: u32,
}

impl Delta {
    /// Offset that takes `last` to `new`
    #[inline]
    #[must_use]
    pub const fn between(last: u32, new: u32) -> Self {
        Self {
            increase: new >= last,
            magnitude: last.abs_diff(new),
        }
    }

    /// Apply this offset to `last`, or `None` if the result leaves `0..=RAW_VALUE_MAX`
    #[inline]
    #[must_use]
    pub fn apply(self, last: u32) -> Option<u32> {
        let value = if self.increase {
            last.checked_add(self.magnitude)?
        } else {
            last.checked_sub(self.magnitude)?
        };
        (value <= RAW_VALUE_MAX).then_some(value)
    }

    /// Signed view of this offset
    #[inline]
    #[must_use]
    pub fn signed(self) -> i64 {
        if self.increase {
            i64::from(self.magnitude)
        } else {
            -i64::from(self.magnitude)
        }
    }
}

/// How a single value was (or will be) laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    /// Full 4-byte value
    Raw(u32),
    /// Offset from the column's last value
    Delta {
        /// Level the offset was written at
        level: Level,
        /// The offset itself
        delta: Delta,
    },
}

impl Encoded {
    /// Bytes this value occupies
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Raw(_) => RAW_VALUE_BYTES,
            Self::Delta { level, .. } => level.bytes(),
        }
    }

    /// Always false: every value takes at least one byte
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Resolve to an absolute value given the column's last value
    #[must_use]
    pub fn resolve(&self, last: u32) -> Option<u32> {
        match *self {
            Self::Raw(value) => Some(value),
            Self::Delta { delta, .. } => delta.apply(last),
        }
    }
}

/// Not enough bytes to finish the value starting at the front of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incomplete {
    /// Bytes the value needs in total
    pub needed: usize,
}

/// Write a raw value, clearing the delta marker bit
#[inline]
pub(crate) fn write_raw(value: u32, out: &mut Vec<u8>) {
    let bytes = (value & RAW_VALUE_MAX).to_be_bytes();
    out.extend_from_slice(&bytes);
}

/// Per-variant encoding strategy
///
/// Implementors only describe their level table and how the size-selector
/// bits of a lead byte map onto it; the shared framing is provided.
pub trait DeltaCodec: fmt::Debug + Send + Sync {
    /// Variant implemented by this strategy
    fn variant(&self) -> Variant;

    /// Delta levels, smallest first
    fn levels(&self) -> &'static [Level];

    /// Level announced by the selector bits of a delta lead byte
    fn level_of(&self, lead: u8) -> &'static Level;

    /// Smallest level able to carry `magnitude`, if any
    fn level_for(&self, magnitude: u32) -> Option<&'static Level> {
        self.levels().iter().find(|level| magnitude <= level.max_magnitude())
    }

    /// Number of bytes taken by the value whose lead byte is `lead`
    fn value_len(&self, lead: u8) -> usize {
        if lead & DELTA_FLAG == 0 {
            RAW_VALUE_BYTES
        } else {
            self.level_of(lead).bytes()
        }
    }

    /// Append `new` to `out` relative to `last`, falling back to a raw value
    /// when the offset exceeds every level
    fn encode(&self, last: u32, new: u32, out: &mut Vec<u8>) -> Encoded {
        let delta = Delta::between(last, new);
        match self.level_for(delta.magnitude) {
            Some(level) => {
                level.write(delta, out);
                Encoded::Delta { level: *level, delta }
            }
            None => {
                write_raw(new, out);
                Encoded::Raw(new & RAW_VALUE_MAX)
            }
        }
    }

    /// Decode the value at the front of `bytes`, returning it with the number
    /// of bytes consumed
    ///
    /// # Errors
    /// Returns [`Incomplete`] when `bytes` ends before the value does.
    fn decode(&self, bytes: &[u8]) -> Result<(Encoded, usize), Incomplete> {
        let Some(&lead) = bytes.first() else {
            return Err(Incomplete { needed: 1 });
        };
        let len = self.value_len(lead);
        let body = bytes.get(..len).ok_or(Incomplete { needed: len })?;

        if lead & DELTA_FLAG == 0 {
            let raw = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
            return Ok((Encoded::Raw(raw & RAW_VALUE_MAX), len));
        }

        let level = self.level_of(lead);
        Ok((
            Encoded::Delta {
                level: *level,
                delta: level.read(body),
            },
            len,
        ))
    }
}

/// RDES1: every delta is 3 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Rdes1;

impl DeltaCodec for Rdes1 {
    fn variant(&self) -> Variant {
        Variant::Rdes1
    }

    fn levels(&self) -> &'static [Level] {
        &RDES1_LEVELS
    }

    #[inline]
    fn level_of(&self, _lead: u8) -> &'static Level {
        &RDES1_LEVELS[0]
    }
}

/// RDES2: bit 6 set means 3 bytes, clear means 2
#[derive(Debug, Clone, Copy, Default)]
pub struct Rdes2;

impl DeltaCodec for Rdes2 {
    fn variant(&self) -> Variant {
        Variant::Rdes2
    }

    fn levels(&self) -> &'static [Level] {
        &RDES2_LEVELS
    }

    #[inline]
    fn level_of(&self, lead: u8) -> &'static Level {
        if check_bit(lead, 6) {
            &RDES2_LEVELS[1]
        } else {
            &RDES2_LEVELS[0]
        }
    }
}

/// RDES3: bit 6 clear means 1 byte; otherwise bit 5 set means 3 bytes, clear means 2
#[derive(Debug, Clone, Copy, Default)]
pub struct Rdes3;

impl DeltaCodec for Rdes3 {
    fn variant(&self) -> Variant {
        Variant::Rdes3
    }

    fn levels(&self) -> &'static [Level] {
        &RDES3_LEVELS
    }

    #[inline]
    fn level_of(&self, lead: u8) -> &'static Level {
        match (check_bit(lead, 6), check_bit(lead, 5)) {
            (false, _) => &RDES3_LEVELS[0],
            (true, false) => &RDES3_LEVELS[1],
            (true, true) => &RDES3_LEVELS[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(codec: &dyn DeltaCodec, last: u32, new: u32) -> Vec<u8> {
        let mut out = Vec::new();
        codec.encode(last, new, &mut out);
        out
    }

    #[test]
    fn level_tables_match_bit_budgets() {
        let budgets: Vec<(u8, Vec<(usize, u32)>)> = Variant::ALL
            .iter()
            .map(|v| {
                (
                    v.number(),
                    v.levels().iter().map(|l| (l.bytes(), l.magnitude_bits())).collect(),
                )
            })
            .collect();
        assert_eq!(
            budgets,
            vec![
                (1, vec![(3, 22)]),
                (2, vec![(2, 13), (3, 21)]),
                (3, vec![(1, 5), (2, 12), (3, 20)]),
            ]
        );
    }

    #[test]
    fn every_level_is_recognised_by_its_own_lead_byte() {
        for variant in Variant::ALL {
            let codec = variant.codec();
            for level in variant.levels() {
                for increase in [false, true] {
                    let mut out = Vec::new();
                    level.write(
                        Delta {
                            increase,
                            magnitude: level.max_magnitude(),
                        },
                        &mut out,
                    );
                    assert_eq!(out.len(), level.bytes());
                    assert!(level.matches(out[0]));
                    assert_eq!(codec.level_of(out[0]), level, "{variant} lead {:#010b}", out[0]);
                }
            }
        }
    }

    #[test]
    fn rdes1_layout() {
        // +1: 1 1 000000 | 00000000 | 00000001
        assert_eq!(encode(&Rdes1, 10, 11), vec![0b1100_0000, 0, 1]);
        // -(2^22 - 1): sign clear, all magnitude bits set
        assert_eq!(encode(&Rdes1, (1 << 22) - 1, 0), vec![0b1011_1111, 0xFF, 0xFF]);
    }

    #[test]
    fn rdes2_layout() {
        // 2-byte level: 1 1 0 mmmmm | mmmmmmmm
        assert_eq!(encode(&Rdes2, 0, 0x1ABC), vec![0b1101_1010, 0xBC]);
        // 3-byte level: 1 0 1 mmmmm | ... (decrease)
        assert_eq!(encode(&Rdes2, 0x10_0000, 0), vec![0b1011_0000, 0x00, 0x00]);
    }

    #[test]
    fn rdes3_layout() {
        // 1-byte level: 1 1 0 mmmmm
        assert_eq!(encode(&Rdes3, 100, 105), vec![0b1100_0101]);
        assert_eq!(encode(&Rdes3, 131, 100), vec![0b1001_1111]);
        // 2-byte level: 1 1 1 0 mmmm | mmmmmmmm
        assert_eq!(encode(&Rdes3, 0, 0xFFF), vec![0b1110_1111, 0xFF]);
        // 3-byte level: 1 1 1 1 mmmm | ... | ...
        assert_eq!(encode(&Rdes3, 105, 50_000), vec![0b1111_0000, 0xC2, 0xE7]);
    }

    #[test]
    fn raw_fallback_clears_marker_bit() {
        let value = (1 << 22) + 7;
        assert_eq!(encode(&Rdes1, 0, value), value.to_be_bytes().to_vec());
        assert_eq!(encode(&Rdes3, 0, RAW_VALUE_MAX), vec![0x7F, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn decode_reports_missing_bytes() {
        assert_eq!(Rdes3.decode(&[]), Err(Incomplete { needed: 1 }));
        assert_eq!(Rdes3.decode(&[0x00, 0x01]), Err(Incomplete { needed: 4 }));
        assert_eq!(Rdes3.decode(&[0b1111_0000, 0x01]), Err(Incomplete { needed: 3 }));
        assert_eq!(Rdes2.decode(&[0b1100_0000]), Err(Incomplete { needed: 2 }));
    }

    #[test]
    fn decode_reads_what_encode_wrote() {
        for variant in Variant::ALL {
            let codec = variant.codec();
            for (last, new) in [(0, 0), (500, 3), (3, 500), (0, 1 << 20), (1 << 30, 0), (7, RAW_VALUE_MAX)] {
                let bytes = encode(codec, last, new);
                let (encoded, used) = codec.decode(&bytes).unwrap();
                assert_eq!(used, bytes.len());
                assert_eq!(encoded.resolve(last), Some(new), "{variant}: {last} -> {new}");
            }
        }
    }

    #[test]
    fn delta_apply_rejects_out_of_range_results() {
        let down = Delta {
            increase: false,
            magnitude: 10,
        };
        assert_eq!(down.apply(5), None);
        let up = Delta {
            increase: true,
            magnitude: 10,
        };
        assert_eq!(up.apply(RAW_VALUE_MAX - 5), None);
        assert_eq!(up.apply(5), Some(15));
    }

    #[test]
    fn variant_parsing() {
        assert_eq!("1".parse::<Variant>().unwrap(), Variant::Rdes1);
        assert_eq!("rdes2".parse::<Variant>().unwrap(), Variant::Rdes2);
        assert_eq!("RDES3".parse::<Variant>().unwrap(), Variant::Rdes3);
        assert!("4".parse::<Variant>().is_err());
        assert!("x".parse::<Variant>().is_err());
        assert_eq!(Variant::try_from(0), Err(ConfigError::UnknownVariant(0)));
    }
}
