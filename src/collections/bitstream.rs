/*

BIT ORDER:
  bytes:        0                 1
  bits:     7 6 5 4 3 2 1 0 | 7 6 5 4 3 2 1 0 |
  mask:     ^ (0x80 first, shifted right every bit)

  a byte is only committed to the buffer once all eight bits are known,
  `flush` commits the last partial byte (low bits left as zero)

*/

const FIRST_BIT_MASK: u8 = 0x80;

/// # Description
/// Writes single bits MSB-first into a fixed-size byte buffer
/// ## Comments
/// - running out of room is not an error, `write_bit` just returns `false`
pub struct BitWriter<'a> {
    buffer: &'a mut [u8],
    cursor: usize,
    bits: u8,
    mask: u8,
}

impl<'a> BitWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            bits: 0,
            mask: FIRST_BIT_MASK,
        }
    }

    /// # Description
    /// Appends a single bit to the stream
    /// ## Returns
    /// `false` when the buffer is exhausted, in which case nothing is written
    pub fn write_bit(&mut self, bit: bool) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }

        if bit {
            self.bits |= self.mask;
        }
        self.mask >>= 1;

        if self.mask == 0 {
            self.buffer[self.cursor] = self.bits;
            self.cursor += 1;
            self.bits = 0;
            self.mask = FIRST_BIT_MASK;
        }

        true
    }

    /// # Description
    /// Commits a partially filled byte, if there is one
    /// ## Returns
    /// `false` if no room remains in the buffer (even when nothing is pending)
    pub fn flush(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        if self.mask != FIRST_BIT_MASK {
            self.buffer[self.cursor] = self.bits;
            self.cursor += 1;
            self.bits = 0;
            self.mask = FIRST_BIT_MASK;
        }
        true
    }

    /// number of whole bytes committed to the buffer so far
    pub fn bytes_written(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

/// # Description
/// Reads single bits MSB-first out of a byte buffer
pub struct BitReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
    bits: u8,
    mask: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            bits: 0,
            mask: 0,
        }
    }

    /// # Description
    /// Consumes a single bit
    /// ## Returns
    /// `None` once every bit of the buffer has been read
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.mask == 0 {
            let &byte = self.buffer.get(self.cursor)?;
            self.bits = byte;
            self.cursor += 1;
            self.mask = FIRST_BIT_MASK;
        }

        let bit = self.bits & self.mask != 0;
        self.mask >>= 1;
        Some(bit)
    }

    /// bytes pulled out of the buffer so far (the current byte counts as consumed)
    pub fn bytes_consumed(&self) -> usize {
        self.cursor
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::{BitReader, BitWriter};

    #[test]
    fn msb_first() {
        let mut buffer = [0u8; 2];
        let mut writer = BitWriter::new(&mut buffer);
        for &bit in [true, false, true, true, false, false, false, true, true].iter() {
            assert!(writer.write_bit(bit));
        }
        assert_eq!(writer.bytes_written(), 1);
        assert!(writer.flush());
        assert_eq!(writer.bytes_written(), 2);
        assert_eq!(buffer, [0b1011_0001, 0b1000_0000]);
    }

    #[test]
    fn overflow_is_a_noop() {
        let mut buffer = [0u8; 1];
        let mut writer = BitWriter::new(&mut buffer);
        for _ in 0..8 {
            assert!(writer.write_bit(true));
        }
        assert_eq!(writer.write_bit(true), false);
        assert_eq!(writer.write_bit(false), false);
        assert_eq!(writer.flush(), false);
        assert_eq!(writer.bytes_written(), 1);
        assert_eq!(buffer, [0xff]);
    }

    #[test]
    fn empty_buffer() {
        let mut buffer = [0u8; 0];
        let mut writer = BitWriter::new(&mut buffer);
        assert_eq!(writer.write_bit(true), false);
        assert_eq!(writer.flush(), false);
        assert_eq!(writer.bytes_written(), 0);

        let mut reader = BitReader::new(&buffer);
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn flush_without_pending_bits() {
        let mut buffer = [0u8; 4];
        let mut writer = BitWriter::new(&mut buffer);
        for _ in 0..8 {
            writer.write_bit(false);
        }
        assert!(writer.flush());
        assert_eq!(writer.bytes_written(), 1);
    }

    #[test]
    fn reader_stops_at_end() {
        let buffer = [0b0100_0000u8];
        let mut reader = BitReader::new(&buffer);
        let bits = (0..8).filter_map(|_| reader.read_bit()).collect::<Vec<_>>();
        assert_eq!(bits.len(), 8);
        assert_eq!(bits[1], true);
        assert_eq!(bits.iter().filter(|&&b| b).count(), 1);
        assert_eq!(reader.read_bit(), None);
        assert_eq!(reader.bytes_consumed(), 1);
    }

    #[test]
    fn shotgun() {
        for trial in 0..200 {
            let length = rand::random::<usize>() % 300;
            let bits = (0..length)
                .map(|_| rand::random::<bool>())
                .collect::<Vec<_>>();

            let mut buffer = vec![0u8; (length + 7) / 8];
            let mut writer = BitWriter::new(&mut buffer);
            for &bit in bits.iter() {
                assert!(writer.write_bit(bit));
            }
            writer.flush();
            assert_eq!(writer.bytes_written(), (length + 7) / 8);

            let mut reader = BitReader::new(&buffer);
            let read_back = (0..length)
                .map(|_| reader.read_bit().expect("stream ended early"))
                .collect::<Vec<_>>();
            assert_eq!(bits, read_back, "trial number: {}", trial + 1);
        }
    }
}
