use super::*;
use crate::collections::BitWriter;
use crate::math::build_significance_map;

/// # Description
/// Encodes `coefs` into `output`, stopping as soon as `output` is full
/// ## Returns
/// number of bytes of `output` actually used, header byte included
/// ## Comments
/// - `coefs.len()` must be a power of two >= 2
/// - `output` must hold at least the header byte
pub fn encode_coefficients(coefs: &[i32], output: &mut [u8]) -> usize {
    assert!(!output.is_empty(), "no room for the frame header");

    let mut threshold = initial_threshold(coefs);
    let (header, stream) = output.split_at_mut(1);
    header[0] = threshold_bit_length(threshold);

    let mut encoder = SpihtEncoder::new(coefs, stream);
    let mut planes = 0;
    while threshold > 0 {
        if encoder.significance_pass(threshold).is_none() {
            break;
        }
        if encoder.refinement_pass(threshold).is_none() {
            break;
        }
        planes += 1;
        threshold >>= 1;
    }

    encoder.writer.flush();
    let written = encoder.writer.bytes_written() + 1;
    log::trace!(
        "encoded {} coefficients into {}/{} bytes, {} complete planes",
        coefs.len(),
        written,
        encoder.writer.capacity() + 1,
        planes
    );
    written
}

struct SpihtEncoder<'a, 'b> {
    coefs: &'a [i32],
    map: Vec<u32>,
    lists: Worklists,
    writer: BitWriter<'b>,
}

impl<'a, 'b> SpihtEncoder<'a, 'b> {
    fn new(coefs: &'a [i32], stream: &'b mut [u8]) -> Self {
        Self {
            coefs,
            map: build_significance_map(coefs),
            lists: Worklists::new(coefs.len()),
            writer: BitWriter::new(stream),
        }
    }

    /// `None` once the output is full
    fn emit(&mut self, bit: bool) -> Option<()> {
        self.writer.write_bit(bit).then(|| ())
    }

    /// emits the significance bit of a single coefficient, followed by its sign when significant
    fn emit_coefficient(&mut self, index: usize, threshold: u32) -> Option<bool> {
        let coef = self.coefs[index];
        let significant = coef.unsigned_abs() >= threshold;
        self.emit(significant)?;
        if significant {
            self.emit(coef < 0)?;
        }
        Some(significant)
    }

    fn significance_pass(&mut self, threshold: u32) -> Option<()> {
        let mut cur = self.lists.lip.front();
        while let Some(&index) = self.lists.lip.get(cur) {
            let next = self.lists.lip.next(cur);
            if self.emit_coefficient(index, threshold)? {
                self.lists.lip.remove_at(cur);
                self.lists.lsp.push_rear(index);
            }
            cur = next;
        }

        // sets appended while walking get visited in this same pass
        let mut cur = self.lists.lis.front();
        while let Some(&entry) = self.lists.lis.get(cur) {
            let index = entry.index;
            let retire = match entry.kind {
                SetKind::A => {
                    let significant = self.map[index] >= threshold;
                    self.emit(significant)?;
                    if significant {
                        for child in [2 * index, 2 * index + 1] {
                            if self.emit_coefficient(child, threshold)? {
                                self.lists.lsp.push_rear(child);
                            } else {
                                self.lists.lip.push_rear(child);
                            }
                        }
                        if self.lists.keeps_type_b(index) {
                            self.lists.lis.push_rear(SetEntry::b(index));
                        }
                    }
                    significant
                }
                SetKind::B => {
                    let significant = self.map[2 * index].max(self.map[2 * index + 1]) >= threshold;
                    self.emit(significant)?;
                    if significant {
                        self.lists.lis.push_rear(SetEntry::a(2 * index));
                        self.lists.lis.push_rear(SetEntry::a(2 * index + 1));
                    }
                    significant
                }
            };

            let next = self.lists.lis.next(cur);
            if retire {
                self.lists.lis.remove_at(cur);
            }
            cur = next;
        }

        Some(())
    }

    fn refinement_pass(&mut self, threshold: u32) -> Option<()> {
        let bit_mask = threshold / 2;
        if bit_mask == 0 {
            return Some(());
        }

        let Self {
            coefs,
            lists,
            writer,
            ..
        } = self;
        for &index in lists.lsp.iter() {
            if !writer.write_bit(coefs[index].unsigned_abs() & bit_mask != 0) {
                return None;
            }
        }
        Some(())
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn silent_frame_is_just_a_header() {
        let mut buffer = [0xffu8; 8];
        assert_eq!(encode_coefficients(&[0; 16], &mut buffer), 1);
        assert_eq!(buffer[0], 0);
    }

    #[test]
    fn two_coefficient_stream() {
        // T = 4: lip 0 -> 1,0(sign +), lip 1 -> 0, refine(2) on 0 -> 1
        // T = 2: lip 1 -> 1,1(sign -), refine(1) on 0 -> 1, on 1 -> 0
        // T = 1: lip empty, nothing to refine
        let mut buffer = [0u8; 4];
        let written = encode_coefficients(&[7, -2], &mut buffer);
        assert_eq!(buffer[0], 3);
        assert_eq!(written, 2);
        assert_eq!(buffer[1], 0b1001_1110);
    }

    #[test]
    #[should_panic]
    fn needs_a_header_byte() {
        encode_coefficients(&[1, 2], &mut []);
    }
}
