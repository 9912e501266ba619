use super::{AgressError, Result, SampleBits};

/// smallest byte budget handed to a single frame
pub const MIN_FRAME_BUDGET: usize = 2;
/// frame lengths are stored as a `u16`
pub const MAX_FRAME_BUDGET: usize = u16::MAX as usize;

/// How the channels of a wav file map onto sub-streams
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ChannelMode {
    /// one stream, stereo input gets downmixed
    Mono,
    /// left and right coded independently
    Stereo,
    /// mid `(l + r) / 2` and side `(l - r) / 2`
    JointStereo,
}

impl ChannelMode {
    /// value stored in the stream header
    pub fn tag(self) -> u8 {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo => 2,
            ChannelMode::JointStereo => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(ChannelMode::Mono),
            2 => Ok(ChannelMode::Stereo),
            3 => Ok(ChannelMode::JointStereo),
            _ => Err(AgressError::UnsupportedChannels(tag as u16)),
        }
    }

    /// number of frames stored per block of samples
    pub fn streams(self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo | ChannelMode::JointStereo => 2,
        }
    }

    /// channels of the decoded wav
    pub fn output_channels(self) -> usize {
        self.streams()
    }
}

/// # Description
/// Knobs of the encoder
/// ## Comments
/// - `frame_size` is in samples per channel, a power of two
/// - `ratio` is uncompressed size over compressed size, so `4.0` keeps roughly a quarter of the bits
/// - `mid_side_ratio` is the percentage of a joint stereo budget given to the mid channel
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct EncoderConfig {
    pub frame_size: usize,
    pub ratio: f64,
    pub mode: ChannelMode,
    pub mid_side_ratio: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            ratio: 4.0,
            mode: ChannelMode::JointStereo,
            mid_side_ratio: 70.0,
        }
    }
}

impl EncoderConfig {
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size;
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mid_side_ratio(mut self, mid_side_ratio: f64) -> Self {
        self.mid_side_ratio = mid_side_ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_size < 2
            || !self.frame_size.is_power_of_two()
            || self.frame_size > MAX_FRAME_BUDGET
        {
            return Err(AgressError::InvalidConfig(format!(
                "frame size must be a power of two between 2 and {}, got {}",
                MAX_FRAME_BUDGET / 2 + 1,
                self.frame_size
            )));
        }
        if !(self.ratio >= 1.0) {
            return Err(AgressError::InvalidConfig(format!(
                "compression ratio must be at least 1, got {}",
                self.ratio
            )));
        }
        if !(self.mid_side_ratio > 1.0 && self.mid_side_ratio < 99.0) {
            return Err(AgressError::InvalidConfig(format!(
                "mid/side ratio must lie strictly between 1 and 99, got {}",
                self.mid_side_ratio
            )));
        }
        Ok(())
    }

    /// mono input is always coded as a single stream, whatever `mode` says
    pub fn effective_mode(&self, in_channels: usize) -> ChannelMode {
        if in_channels == 1 {
            ChannelMode::Mono
        } else {
            self.mode
        }
    }

    /// # Description
    /// byte budget of every sub-stream frame, in the order they are stored
    /// ## Comments
    /// the two length-prefix bytes of each frame come out of its budget
    pub fn frame_budgets(&self, in_channels: usize, bits: SampleBits) -> Vec<usize> {
        let bytes_per_sample = if bits == SampleBits::Eight { 1 } else { 2 };
        let total = (in_channels * bytes_per_sample * self.frame_size) as f64 / self.ratio;
        let clamp = |bytes: f64| bytes.clamp(MIN_FRAME_BUDGET as f64, MAX_FRAME_BUDGET as f64) as usize;

        match self.effective_mode(in_channels) {
            ChannelMode::Mono => vec![clamp(total - 2.0)],
            ChannelMode::Stereo => vec![clamp(total / 2.0 - 2.0); 2],
            ChannelMode::JointStereo => {
                let mid = clamp(total * self.mid_side_ratio / 100.0 - 2.0);
                let side = clamp(total - mid as f64 - 2.0);
                vec![mid, side]
            }
        }
    }
}

/// Knobs of the decoder
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DecoderConfig {
    /// width of the boxcar run across frame seams, 1 turns smoothing off
    pub smooth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { smooth: 5 }
    }
}

impl DecoderConfig {
    pub fn with_smooth(mut self, smooth: usize) -> Self {
        self.smooth = smooth;
        self
    }

    /// smoothing width actually usable with frames of `frame` samples
    pub fn overlap(&self, frame: usize) -> usize {
        self.smooth.clamp(1, frame.max(1))
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_size, 1024);
        assert_eq!(config.mode, ChannelMode::JointStereo);
        assert_eq!(DecoderConfig::default().smooth, 5);
    }

    #[test]
    fn rejects_bad_settings() {
        let config = EncoderConfig::default();
        for frame_size in [0usize, 1, 3, 1000, 1 << 16].iter().copied() {
            assert!(config.with_frame_size(frame_size).validate().is_err(), "{}", frame_size);
        }
        assert!(config.with_frame_size(2).validate().is_ok());
        assert!(config.with_frame_size(1 << 15).validate().is_ok());

        assert!(config.with_ratio(0.5).validate().is_err());
        assert!(config.with_ratio(f64::NAN).validate().is_err());
        assert!(config.with_ratio(1.0).validate().is_ok());

        assert!(config.with_mid_side_ratio(1.0).validate().is_err());
        assert!(config.with_mid_side_ratio(99.0).validate().is_err());
        assert!(config.with_mid_side_ratio(50.0).validate().is_ok());
    }

    #[test]
    fn header_tags() {
        for mode in [ChannelMode::Mono, ChannelMode::Stereo, ChannelMode::JointStereo].iter() {
            assert_eq!(ChannelMode::from_tag(mode.tag()).ok(), Some(*mode));
        }
        assert!(matches!(
            ChannelMode::from_tag(7),
            Err(AgressError::UnsupportedChannels(7))
        ));
    }

    #[test]
    fn budgets() {
        let config = EncoderConfig::default();

        // 1024 samples * 2 bytes / 4 = 512 bytes in total
        assert_eq!(config.frame_budgets(1, SampleBits::Sixteen), vec![510]);
        // stereo input: 1024 bytes in total
        let joint = config.frame_budgets(2, SampleBits::Sixteen);
        assert_eq!(joint, vec![714, 308]);
        assert_eq!(
            config
                .with_mode(ChannelMode::Stereo)
                .frame_budgets(2, SampleBits::Sixteen),
            vec![510, 510]
        );
        assert_eq!(
            config
                .with_mode(ChannelMode::Mono)
                .frame_budgets(2, SampleBits::Eight),
            vec![510]
        );

        // tiny frames bottom out at two bytes
        let tiny = config.with_frame_size(2).with_ratio(100.0);
        assert_eq!(tiny.frame_budgets(2, SampleBits::Eight), vec![2, 2]);

        // and huge ones are capped by the u16 length prefix
        let huge = config.with_frame_size(1 << 15).with_ratio(1.0);
        assert_eq!(huge.frame_budgets(2, SampleBits::Sixteen), vec![MAX_FRAME_BUDGET; 2]);
    }

    #[test]
    fn overlap_fits_the_frame() {
        assert_eq!(DecoderConfig::default().overlap(1024), 5);
        assert_eq!(DecoderConfig::default().overlap(4), 4);
        assert_eq!(DecoderConfig::default().with_smooth(0).overlap(64), 1);
    }
}
