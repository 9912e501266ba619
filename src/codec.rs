pub mod agress;
pub mod error;
pub mod format;
pub mod frame;
pub mod progressive;
pub mod smooth;
pub mod wav;

pub use agress::*;
pub use error::*;
pub use format::*;
pub use frame::*;
pub use smooth::*;

/// Shape of a PCM stream, as found in a wav header
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u32,
    pub bits: SampleBits,
}

impl StreamInfo {
    pub fn new(sample_rate: u32, channels: u32, bits: SampleBits) -> Self {
        Self {
            sample_rate,
            channels,
            bits,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// # Description
    /// how samples of this stream are laid out in memory
    /// ## Comments
    /// wav stores 8-bit samples unsigned and 16-bit samples signed little-endian
    pub fn format(&self) -> SampleFormat {
        match self.bits {
            SampleBits::Eight => SampleFormat::U8,
            SampleBits::Sixteen => SampleFormat::S16LE,
        }
    }

    /// bytes making up one sample of every channel
    pub fn block_align(&self) -> usize {
        self.channels() * self.format().bytes_per_sample()
    }
}
