use super::AgressError;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SampleBits {
    Eight,
    Sixteen,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endian {
    Little,
    Big,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// # Description
/// Layout of raw PCM samples handed to / produced by the frame codec
/// ## Comments
/// - `endian` is ignored for 8-bit samples
/// - unsigned samples are centered by adding the signed minimum, so the midpoint of the range maps to zero
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SampleFormat {
    pub bits: SampleBits,
    pub endian: Endian,
    pub sign: Signedness,
}

impl SampleFormat {
    pub const U8: Self = Self::new(SampleBits::Eight, Endian::Little, Signedness::Unsigned);
    pub const S8: Self = Self::new(SampleBits::Eight, Endian::Little, Signedness::Signed);
    pub const S16LE: Self = Self::new(SampleBits::Sixteen, Endian::Little, Signedness::Signed);
    pub const S16BE: Self = Self::new(SampleBits::Sixteen, Endian::Big, Signedness::Signed);
    pub const U16LE: Self = Self::new(SampleBits::Sixteen, Endian::Little, Signedness::Unsigned);
    pub const U16BE: Self = Self::new(SampleBits::Sixteen, Endian::Big, Signedness::Unsigned);

    pub const fn new(bits: SampleBits, endian: Endian, sign: Signedness) -> Self {
        Self { bits, endian, sign }
    }

    /// same width and byte order, holding values that are already centered
    pub fn as_signed(&self) -> Self {
        Self {
            sign: Signedness::Signed,
            ..*self
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self.bits {
            SampleBits::Eight => 1,
            SampleBits::Sixteen => 2,
        }
    }

    /// number of whole samples in `bytes`
    pub fn sample_count(&self, bytes: &[u8]) -> usize {
        bytes.len() / self.bytes_per_sample()
    }

    /// smallest/largest centered value the format can hold
    pub fn centered_range(&self) -> (i32, i32) {
        match self.bits {
            SampleBits::Eight => (i8::MIN as i32, i8::MAX as i32),
            SampleBits::Sixteen => (i16::MIN as i32, i16::MAX as i32),
        }
    }

    /// smallest/largest value as it is stored in memory
    pub fn stored_range(&self) -> (i32, i32) {
        match (self.bits, self.sign) {
            (SampleBits::Eight, Signedness::Unsigned) => (0, u8::MAX as i32),
            (SampleBits::Sixteen, Signedness::Unsigned) => (0, u16::MAX as i32),
            (_, Signedness::Signed) => self.centered_range(),
        }
    }

    /// what gets added to a stored unsigned value to center it
    fn offset(&self) -> i32 {
        match self.sign {
            Signedness::Signed => 0,
            Signedness::Unsigned => self.centered_range().0,
        }
    }

    /// # Description
    /// reads sample `index` exactly as stored (no centering)
    pub fn read_raw(&self, bytes: &[u8], index: usize) -> i32 {
        match (self.bits, self.sign) {
            (SampleBits::Eight, Signedness::Unsigned) => bytes[index] as i32,
            (SampleBits::Eight, Signedness::Signed) => bytes[index] as i8 as i32,
            (SampleBits::Sixteen, sign) => {
                let pair = [bytes[2 * index], bytes[2 * index + 1]];
                let word = match self.endian {
                    Endian::Little => u16::from_le_bytes(pair),
                    Endian::Big => u16::from_be_bytes(pair),
                };
                match sign {
                    Signedness::Unsigned => word as i32,
                    Signedness::Signed => word as i16 as i32,
                }
            }
        }
    }

    /// # Description
    /// stores `value` at `index` as-is
    /// ## Comments
    /// `value` must already be in the stored range of the format
    pub fn write_raw(&self, bytes: &mut [u8], index: usize, value: i32) {
        match self.bits {
            SampleBits::Eight => bytes[index] = value as u8,
            SampleBits::Sixteen => {
                let word = value as u16;
                let pair = match self.endian {
                    Endian::Little => word.to_le_bytes(),
                    Endian::Big => word.to_be_bytes(),
                };
                bytes[2 * index..2 * index + 2].copy_from_slice(&pair);
            }
        }
    }

    pub fn read_centered(&self, bytes: &[u8], index: usize) -> i32 {
        self.read_raw(bytes, index) + self.offset()
    }

    /// stores a centered value, clamping it into the format's range
    pub fn write_centered(&self, bytes: &mut [u8], index: usize, value: i32) {
        let (lo, hi) = self.stored_range();
        self.write_raw(bytes, index, (value - self.offset()).clamp(lo, hi));
    }

    /// overwrites every whole sample in `bytes` with the format's midpoint
    pub fn fill_silence(&self, bytes: &mut [u8]) {
        for k in 0..self.sample_count(bytes) {
            self.write_centered(bytes, k, 0);
        }
    }

    /// # Description
    /// converts raw samples into centered reals
    pub fn to_signal(&self, bytes: &[u8]) -> Vec<f64> {
        (0..self.sample_count(bytes))
            .map(|k| self.read_centered(bytes, k) as f64)
            .collect()
    }

    /// # Description
    /// stores centered reals into `bytes`
    /// ## Comments
    /// values are de-centered, clamped into the stored range then truncated toward zero
    pub fn from_signal(&self, signal: &[f64], bytes: &mut [u8]) {
        let (lo, hi) = self.stored_range();
        let offset = self.offset() as f64;
        for (k, &value) in signal.iter().enumerate() {
            let stored = (value - offset).clamp(lo as f64, hi as f64) as i32;
            self.write_raw(bytes, k, stored);
        }
    }
}

impl Default for SampleFormat {
    fn default() -> Self {
        Self::S16LE
    }
}

impl TryFrom<u8> for SampleBits {
    type Error = AgressError;
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(SampleBits::Eight),
            16 => Ok(SampleBits::Sixteen),
            _ => Err(AgressError::UnsupportedBits(bits as u16)),
        }
    }
}

impl From<SampleBits> for u8 {
    fn from(bits: SampleBits) -> u8 {
        match bits {
            SampleBits::Eight => 8,
            SampleBits::Sixteen => 16,
        }
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[allow(dead_code)]
    const ALL_FORMATS: [SampleFormat; 6] = [
        SampleFormat::U8,
        SampleFormat::S8,
        SampleFormat::S16LE,
        SampleFormat::S16BE,
        SampleFormat::U16LE,
        SampleFormat::U16BE,
    ];

    #[test]
    fn centering() {
        assert_eq!(SampleFormat::U8.read_centered(&[128], 0), 0);
        assert_eq!(SampleFormat::U8.read_centered(&[0], 0), -128);
        assert_eq!(SampleFormat::S8.read_centered(&[0xff], 0), -1);
        assert_eq!(SampleFormat::U16LE.read_centered(&[0x00, 0x80], 0), 0);
        assert_eq!(SampleFormat::U16BE.read_centered(&[0x80, 0x00], 0), 0);
        assert_eq!(SampleFormat::S16BE.read_centered(&[0x01, 0x02], 0), 0x0102);
        assert_eq!(SampleFormat::S16LE.read_centered(&[0x01, 0x02], 0), 0x0201);
    }

    #[test]
    fn conversion_symmetry() {
        for format in ALL_FORMATS.iter() {
            let bytes = (0..=255u8).chain((0..=255u8).rev()).collect::<Vec<_>>();
            let signal = format.to_signal(&bytes);
            assert_eq!(signal.len(), bytes.len() / format.bytes_per_sample());

            let mut restored = vec![0u8; bytes.len()];
            format.from_signal(&signal, &mut restored);
            assert_eq!(bytes, restored, "{:?}", format);
        }
    }

    #[test]
    fn clamps_out_of_range() {
        let mut bytes = [0u8; 4];
        SampleFormat::S16LE.from_signal(&[40000.0, -40000.0], &mut bytes);
        assert_eq!(SampleFormat::S16LE.read_raw(&bytes, 0), i16::MAX as i32);
        assert_eq!(SampleFormat::S16LE.read_raw(&bytes, 1), i16::MIN as i32);

        let mut bytes = [0u8; 2];
        SampleFormat::U8.from_signal(&[-1000.0, 127.9], &mut bytes);
        assert_eq!(bytes, [0, 255]);
    }

    #[test]
    fn truncates_toward_zero() {
        let mut bytes = [0u8; 2];
        SampleFormat::S8.from_signal(&[-2.7, 2.7], &mut bytes);
        assert_eq!(bytes, [(-2i8) as u8, 2]);
    }

    #[test]
    fn silence_and_signed_views() {
        let mut bytes = [0u8; 4];
        SampleFormat::U8.fill_silence(&mut bytes);
        assert_eq!(bytes, [128; 4]);

        let mut bytes = [0xffu8; 5];
        SampleFormat::U16BE.fill_silence(&mut bytes);
        // the trailing partial sample is left alone
        assert_eq!(bytes, [0x80, 0, 0x80, 0, 0xff]);

        assert_eq!(SampleFormat::U8.as_signed(), SampleFormat::S8);
        assert_eq!(SampleFormat::U16BE.as_signed(), SampleFormat::S16BE);
        assert_eq!(SampleFormat::S16LE.as_signed(), SampleFormat::S16LE);
    }

    #[test]
    fn bits_from_header() {
        assert_eq!(SampleBits::try_from(8).ok(), Some(SampleBits::Eight));
        assert_eq!(SampleBits::try_from(16).ok(), Some(SampleBits::Sixteen));
        assert!(SampleBits::try_from(24).is_err());
        assert_eq!(u8::from(SampleBits::Sixteen), 16);
    }
}
