//! Progressive significance / refinement coding of wavelet coefficients
//!
//! # Frame layout
//!
//! ```text
//! byte 0      : bit length of the initial threshold (0 = silent frame, nothing follows)
//! bytes 1..   : significance, sign and refinement bits, MSB first
//! ```
//!
//! Bits are produced threshold by threshold, so any prefix of a frame (of at
//! least one byte) still decodes, just more coarsely.

use crate::collections::LinkedList;

mod decoder;
mod encoder;

pub use decoder::*;
pub use encoder::*;

/// How a set in the LIS gets tested for significance
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SetKind {
    /// everything below the node
    A,
    /// everything below the node's children
    B,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SetEntry {
    pub index: usize,
    pub kind: SetKind,
}

impl SetEntry {
    pub fn a(index: usize) -> Self {
        Self {
            index,
            kind: SetKind::A,
        }
    }

    pub fn b(index: usize) -> Self {
        Self {
            index,
            kind: SetKind::B,
        }
    }
}

/// # Description
/// The three lists driving both the encoder and decoder
/// ## Comments
/// every index in `1..len` is always in exactly one of: `lip`, `lsp`, or below a set in `lis`
pub struct Worklists {
    /// insignificant pixels
    pub lip: LinkedList<usize>,
    /// significant pixels
    pub lsp: LinkedList<usize>,
    /// insignificant sets
    pub lis: LinkedList<SetEntry>,
    len: usize,
}

impl Worklists {
    pub fn new(len: usize) -> Self {
        let mut lists = Self {
            lip: LinkedList::with_capacity(len),
            lsp: LinkedList::with_capacity(len),
            lis: LinkedList::new(),
            len,
        };
        lists.lip.push_rear(0);
        lists.lip.push_rear(1);
        if lists.has_grandchildren(1) {
            lists.lis.push_rear(SetEntry::a(1));
        }
        lists
    }

    /// `index` has children with children of their own, i.e. a type-A set can hang off it
    pub fn has_grandchildren(&self, index: usize) -> bool {
        index != 0 && index < self.len / 2
    }

    /// a type-A set at `index` turns into a type-B set once its children are visited
    pub fn keeps_type_b(&self, index: usize) -> bool {
        index != 0 && index < self.len / 4
    }
}

/// largest power of two no greater than the largest magnitude, 0 for silence
pub fn initial_threshold(coefs: &[i32]) -> u32 {
    let max = coefs.iter().map(|c| c.unsigned_abs()).max().unwrap_or(0);
    if max == 0 {
        0
    } else {
        1 << (31 - max.leading_zeros())
    }
}

/// what goes into the header byte for `threshold`
pub fn threshold_bit_length(threshold: u32) -> u8 {
    (32 - threshold.leading_zeros()) as u8
}

/// inverse of `threshold_bit_length`
pub fn threshold_from_bit_length(bits: u8) -> u32 {
    match bits {
        0 => 0,
        1..=32 => 1 << (bits - 1),
        _ => {
            log::warn!("frame header claims a {} bit threshold, treating frame as silent", bits);
            0
        }
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[allow(unused_imports)]
    use crate::math::build_significance_map;

    #[test]
    fn thresholds() {
        assert_eq!(initial_threshold(&[0, 0, 0, 0]), 0);
        assert_eq!(initial_threshold(&[0, -1]), 1);
        assert_eq!(initial_threshold(&[3, -200, 17, 0]), 128);
        assert_eq!(initial_threshold(&[i32::MIN, 0]), 1 << 31);

        assert_eq!(threshold_bit_length(0), 0);
        assert_eq!(threshold_bit_length(1), 1);
        assert_eq!(threshold_bit_length(128), 8);
        assert_eq!(threshold_bit_length(1 << 31), 32);

        for bits in 0..=32u8 {
            let threshold = threshold_from_bit_length(bits);
            assert_eq!(threshold_bit_length(threshold), bits);
        }
        assert_eq!(threshold_from_bit_length(200), 0);
    }

    #[test]
    fn initial_lists() {
        let lists = Worklists::new(2);
        assert_eq!(lists.lip.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(lists.lis.is_empty());

        let lists = Worklists::new(16);
        assert_eq!(lists.lip.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            lists.lis.iter().copied().collect::<Vec<_>>(),
            vec![SetEntry::a(1)]
        );
        assert!(lists.lsp.is_empty());
    }

    #[test]
    fn round_trip_unbounded() {
        let coefs = (0..128)
            .map(|k: i32| ((k * 7919) % 257 - 128) * (k % 3))
            .collect::<Vec<_>>();
        let mut buffer = vec![0u8; 4096];
        let written = encode_coefficients(&coefs, &mut buffer);
        assert!(written < buffer.len());

        let decoded = decode_coefficients(&buffer[..written], coefs.len());
        assert_eq!(coefs.iter().map(|&c| c as i64).collect::<Vec<_>>(), decoded);
    }

    #[test]
    fn round_trip_sparse() {
        let mut coefs = vec![0i32; 256];
        coefs[0] = 900;
        coefs[37] = -64;
        coefs[200] = 3;
        let mut buffer = vec![0u8; 1024];
        let written = encode_coefficients(&coefs, &mut buffer);
        // zero trees keep a sparse frame tiny
        assert!(written < 64, "{} bytes", written);

        let decoded = decode_coefficients(&buffer[..written], coefs.len());
        assert_eq!(decoded[0], 900);
        assert_eq!(decoded[37], -64);
        assert_eq!(decoded[200], 3);
        assert_eq!(decoded.iter().filter(|&&c| c != 0).count(), 3);
    }

    #[test]
    fn every_prefix_decodes() {
        let coefs = (0..64)
            .map(|k: i32| (k - 32) * (k % 5) * 11)
            .collect::<Vec<_>>();
        let largest = coefs.iter().map(|c| c.unsigned_abs() as u64).max().unwrap_or(0);
        let mut buffer = vec![0u8; 1024];
        let written = encode_coefficients(&coefs, &mut buffer);
        assert!(written < buffer.len());

        for len in 1..=written {
            let decoded = decode_coefficients(&buffer[..len], coefs.len());
            assert_eq!(decoded.len(), coefs.len());
            let error = coefs
                .iter()
                .zip(decoded.iter())
                .map(|(&c, &d)| (c as i64 - d).unsigned_abs())
                .max()
                .unwrap_or(0);
            // an approximation never strays further than the coefficient itself
            assert!(error <= largest, "prefix {}", len);
            if len == written {
                assert_eq!(error, 0);
            }
        }
    }

    #[test]
    fn budget_is_respected() {
        let coefs = (0..512)
            .map(|k: i32| (k * 104729) % 4001 - 2000)
            .collect::<Vec<_>>();
        for budget in [1usize, 2, 3, 10, 100, 333].iter().copied() {
            let mut buffer = vec![0u8; budget];
            let written = encode_coefficients(&coefs, &mut buffer);
            assert!(written <= budget);
            assert!(written >= 1);
            assert_eq!(buffer[0], threshold_bit_length(initial_threshold(&coefs)));

            let decoded = decode_coefficients(&buffer[..written], coefs.len());
            assert_eq!(decoded.len(), coefs.len());
        }
    }

    #[test]
    fn truncated_encode_is_a_prefix() {
        let coefs = (0..256)
            .map(|k: i32| ((k * 31) % 97 - 48) * 13)
            .collect::<Vec<_>>();
        let mut full = vec![0u8; 8192];
        let full_len = encode_coefficients(&coefs, &mut full);

        let mut short = vec![0u8; full_len / 2];
        let short_len = encode_coefficients(&coefs, &mut short);
        assert_eq!(short_len, short.len());
        // running out of room only ever drops the tail
        assert_eq!(&short[..], &full[..short_len]);
    }

    #[test]
    fn map_matches_encoder_decisions() {
        let coefs = [0, 0, 0, 0, 0, 0, 0, 9];
        let map = build_significance_map(&coefs);
        assert_eq!(map[3], 9);
        assert_eq!(map[2], 0);

        let mut buffer = [0u8; 16];
        let written = encode_coefficients(&coefs, &mut buffer);
        assert_eq!(buffer[0], 4);
        let decoded = decode_coefficients(&buffer[..written], coefs.len());
        assert_eq!(decoded, vec![0, 0, 0, 0, 0, 0, 0, 9]);
    }
}
