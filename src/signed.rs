//! Mapping between signed readings and the unsigned range RDES encodes.
//!
//! A signed value is shifted up by [`SIGN_OFFSET`] before compression and
//! shifted back after decompression. Only the shifted (unsigned) value is
//! ever used as a delta reference.

use crate::constants::{RAW_VALUE_MAX, SIGN_OFFSET};

/// Smallest signed value that survives `unsignify`
pub const SIGNED_MIN: i64 = -SIGN_OFFSET;

/// Largest signed value that survives `unsignify`
pub const SIGNED_MAX: i64 = RAW_VALUE_MAX as i64 - SIGN_OFFSET;

/// Shift a signed value into the encodable unsigned range
///
/// Returns `None` when the result would not fit in 31 bits.
///
/// # Example
/// ```
/// use rdes::{resignify, unsignify};
///
/// let stored = unsignify(-40).unwrap();
/// assert_eq!(resignify(stored), -40);
/// assert_eq!(unsignify(i64::from(i32::MIN)), None);
/// ```
#[inline]
#[must_use]
pub fn unsignify(value: i64) -> Option<u32> {
    if (SIGNED_MIN..=SIGNED_MAX).contains(&value) {
        u32::try_from(value + SIGN_OFFSET).ok()
    } else {
        None
    }
}

/// Undo [`unsignify`]
#[inline]
#[must_use]
pub fn resignify(value: u32) -> i64 {
    i64::from(value) - SIGN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_matches_wire_constant() {
        assert_eq!(SIGN_OFFSET, 536_870_911);
        assert_eq!(unsignify(0), Some(536_870_911));
    }

    #[test]
    fn bounds() {
        assert_eq!(unsignify(SIGNED_MIN), Some(0));
        assert_eq!(unsignify(SIGNED_MAX), Some(RAW_VALUE_MAX));
        assert_eq!(unsignify(SIGNED_MIN - 1), None);
        assert_eq!(unsignify(SIGNED_MAX + 1), None);
    }

    #[test]
    fn documented_signed_range_round_trips() {
        let lo = -((1i64 << 29) - 1);
        let hi = 1i64 << 29;
        for v in [lo, lo + 1, -1, 0, 1, hi - 1, hi] {
            assert_eq!(unsignify(v).map(resignify), Some(v));
        }
    }
}
