use super::*;
use crate::collections::BitReader;
use crate::math::power_of_two;

/// # Description
/// Rebuilds `len` coefficients from a (possibly truncated) progressive stream
/// ## Comments
/// - running out of bits is expected, whatever was refined so far is returned
/// - `input` must hold at least the header byte
pub fn decode_coefficients(input: &[u8], len: usize) -> Vec<i64> {
    assert!(!input.is_empty(), "missing frame header");
    power_of_two(len);

    let mut threshold = threshold_from_bit_length(input[0]);
    let mut decoder = SpihtDecoder::new(len, &input[1..]);
    while threshold > 0 {
        if decoder.significance_pass(threshold).is_none() {
            break;
        }
        if decoder.refinement_pass(threshold).is_none() {
            break;
        }
        threshold >>= 1;
    }

    log::trace!(
        "decoded {} coefficients from {} bytes, stopped at threshold {}",
        len,
        decoder.reader.bytes_consumed() + 1,
        threshold
    );
    decoder.coefs
}

struct SpihtDecoder<'a> {
    coefs: Vec<i64>,
    lists: Worklists,
    reader: BitReader<'a>,
}

impl<'a> SpihtDecoder<'a> {
    fn new(len: usize, stream: &'a [u8]) -> Self {
        Self {
            coefs: vec![0; len],
            lists: Worklists::new(len),
            reader: BitReader::new(stream),
        }
    }

    /// reads a significance bit, plus the sign when the coefficient turned significant
    fn take_coefficient(&mut self, index: usize, threshold: u32) -> Option<bool> {
        let significant = self.reader.read_bit()?;
        if significant {
            let negative = self.reader.read_bit()?;
            // middle of [T, 2T)
            let magnitude = threshold as i64 + (threshold / 2) as i64;
            self.coefs[index] = if negative { -magnitude } else { magnitude };
        }
        Some(significant)
    }

    fn significance_pass(&mut self, threshold: u32) -> Option<()> {
        let mut cur = self.lists.lip.front();
        while let Some(&index) = self.lists.lip.get(cur) {
            let next = self.lists.lip.next(cur);
            if self.take_coefficient(index, threshold)? {
                self.lists.lip.remove_at(cur);
                self.lists.lsp.push_rear(index);
            }
            cur = next;
        }

        let mut cur = self.lists.lis.front();
        while let Some(&entry) = self.lists.lis.get(cur) {
            let index = entry.index;
            let significant = self.reader.read_bit()?;
            if significant {
                match entry.kind {
                    SetKind::A => {
                        for child in [2 * index, 2 * index + 1] {
                            if self.take_coefficient(child, threshold)? {
                                self.lists.lsp.push_rear(child);
                            } else {
                                self.lists.lip.push_rear(child);
                            }
                        }
                        if self.lists.keeps_type_b(index) {
                            self.lists.lis.push_rear(SetEntry::b(index));
                        }
                    }
                    SetKind::B => {
                        self.lists.lis.push_rear(SetEntry::a(2 * index));
                        self.lists.lis.push_rear(SetEntry::a(2 * index + 1));
                    }
                }
            }

            let next = self.lists.lis.next(cur);
            if significant {
                self.lists.lis.remove_at(cur);
            }
            cur = next;
        }

        Some(())
    }

    /// # Description
    /// narrows every significant coefficient down to one half of its current interval
    /// ## Comments
    /// the estimate first drops to the lower half's center then moves up a whole step on a `1`
    fn refinement_pass(&mut self, threshold: u32) -> Option<()> {
        let step = (threshold / 2) as i64;
        if step == 0 {
            return Some(());
        }
        let back_off = step - step / 2;

        let Self {
            coefs,
            lists,
            reader,
        } = self;
        for &index in lists.lsp.iter() {
            let upper = reader.read_bit()?;
            let coef = &mut coefs[index];
            if *coef > 0 {
                *coef -= back_off;
                if upper {
                    *coef += step;
                }
            } else {
                *coef += back_off;
                if upper {
                    *coef -= step;
                }
            }
        }
        Some(())
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn header_only() {
        // threshold 8 but no bits: nothing turns significant
        assert_eq!(decode_coefficients(&[4], 4), vec![0; 4]);
        assert_eq!(decode_coefficients(&[0, 0xff, 0xff], 8), vec![0; 8]);
    }

    #[test]
    fn two_coefficient_stream() {
        let stream = [3u8, 0b1001_1110];
        assert_eq!(decode_coefficients(&stream, 2), vec![7, -2]);
    }

    #[test]
    fn zero_refinements_settle_on_the_lower_bound() {
        // significant at T = 4 then nothing but zeros: the estimate walks 6 -> 5 -> 4
        assert_eq!(decode_coefficients(&[3, 0b1000_0000], 2), vec![4, 0]);
        assert_eq!(decode_coefficients(&[3, 0b1100_0000], 2), vec![-4, 0]);
    }

    #[test]
    fn bogus_header_is_silence() {
        assert_eq!(decode_coefficients(&[77, 0xff], 2), vec![0, 0]);
    }
}
