use std::collections::HashMap;

use crate::util::rolling_hash;

const MAX_BOW_OFFSET: f32 = 60.0;
const BOW_FRACTION: f32 = 0.2;

/// Bow direction for the connector between two post numbers.
///
/// The pair is unordered: `pair_sign(a, b) == pair_sign(b, a)`.
pub fn pair_sign(a: u64, b: u64) -> i8 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let key = format!("{lo}-{hi}");
    if rolling_hash(&key).rem_euclid(2) == 0 {
        1
    } else {
        -1
    }
}

/// Memoized [`pair_sign`] values. Once a pair has a sign it keeps it for the
/// lifetime of the table.
#[derive(Debug, Default)]
pub struct SignTable {
    signs: HashMap<(u64, u64), i8>,
}

impl SignTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_for(&mut self, a: u64, b: u64) -> i8 {
        let key = if a <= b { (a, b) } else { (b, a) };
        *self
            .signs
            .entry(key)
            .or_insert_with(|| pair_sign(key.0, key.1))
    }

    pub fn len(&self) -> usize {
        self.signs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }
}

/// Control points of a cubic Bézier from `from` to `to`, bowed by `sign`.
pub fn cubic_controls(sign: i8, from: [f32; 2], to: [f32; 2]) -> ([f32; 2], [f32; 2]) {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let dist = (dx * dx + dy * dy).sqrt();
    if dist <= f32::EPSILON {
        return (from, to);
    }

    let offset = (BOW_FRACTION * dist).min(MAX_BOW_OFFSET) * f32::from(sign);
    let c1 = [from[0] + dx / 3.0, from[1] + dy / 3.0 + offset];
    let c2 = [from[0] + (2.0 * dx) / 3.0, from[1] + (2.0 * dy) / 3.0 - offset];
    (c1, c2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_ignores_argument_order() {
        for (a, b) in [(1, 2), (123_456, 123_401), (7, 7), (0, u64::MAX)] {
            assert_eq!(pair_sign(a, b), pair_sign(b, a));
        }
    }

    #[test]
    fn sign_matches_rolling_hash_parity() {
        // "1-2" hashes to 48_534, which is even.
        assert_eq!(rolling_hash("1-2"), 48_534);
        assert_eq!(pair_sign(2, 1), 1);
        // "1-3" hashes to 48_535, which is odd.
        assert_eq!(pair_sign(1, 3), -1);
    }

    #[test]
    fn table_memoizes_once_per_pair() {
        let mut table = SignTable::new();
        let first = table.sign_for(900, 17);
        let second = table.sign_for(17, 900);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_length_chord_returns_endpoints() {
        let (c1, c2) = cubic_controls(1, [4.0, 5.0], [4.0, 5.0]);
        assert_eq!(c1, [4.0, 5.0]);
        assert_eq!(c2, [4.0, 5.0]);
    }

    #[test]
    fn bow_offset_is_capped() {
        let (c1, c2) = cubic_controls(-1, [0.0, 0.0], [3000.0, 0.0]);
        assert_eq!(c1, [1000.0, -60.0]);
        assert_eq!(c2, [2000.0, 60.0]);
    }

    #[test]
    fn short_chords_bow_by_a_fifth_of_their_length() {
        let (c1, _) = cubic_controls(1, [0.0, 0.0], [30.0, 0.0]);
        assert!((c1[1] - 6.0).abs() < 1e-4);
    }
}
