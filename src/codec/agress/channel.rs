use super::{decode_frame, smooth_edge, ChannelMode, SampleFormat};

/// # Description
/// Converts between interleaved wav blocks and the per-stream frames that get coded
/// ## Comments
/// channel arithmetic happens on centered values, so 8-bit (unsigned) input mixes correctly
#[derive(Copy, Clone, Debug)]
pub struct ChannelLayout {
    mode: ChannelMode,
    input: SampleFormat,
    in_channels: usize,
}

impl ChannelLayout {
    pub fn new(mode: ChannelMode, input: SampleFormat, in_channels: usize) -> Self {
        Self {
            mode,
            input,
            in_channels,
        }
    }

    pub fn streams(&self) -> usize {
        self.mode.streams()
    }

    /// mid and side are signed quantities, everything else stays in the wav's own format
    pub fn stream_format(&self) -> SampleFormat {
        match self.mode {
            ChannelMode::JointStereo => self.input.as_signed(),
            ChannelMode::Mono | ChannelMode::Stereo => self.input,
        }
    }

    /// # Description
    /// splits `frame` interleaved sample blocks into one buffer per stream
    pub fn split(&self, block: &[u8], frame: usize) -> Vec<Vec<u8>> {
        let input = self.input;
        let output = self.stream_format();
        let channels = self.in_channels;
        let mut streams = vec![vec![0u8; frame * output.bytes_per_sample()]; self.streams()];

        match (self.mode, channels) {
            (ChannelMode::Mono, 1) => {
                let len = streams[0].len();
                streams[0].copy_from_slice(&block[..len]);
            }
            (ChannelMode::Mono, _) => {
                for k in 0..frame {
                    let left = input.read_centered(block, k * channels);
                    let right = input.read_centered(block, k * channels + 1);
                    output.write_centered(&mut streams[0], k, (left + right) / 2);
                }
            }
            (ChannelMode::Stereo, _) => {
                for k in 0..frame {
                    for (c, stream) in streams.iter_mut().enumerate() {
                        let value = input.read_centered(block, k * channels + c);
                        output.write_centered(stream, k, value);
                    }
                }
            }
            (ChannelMode::JointStereo, _) => {
                let (mid, side) = streams.split_at_mut(1);
                for k in 0..frame {
                    let left = input.read_centered(block, k * channels);
                    let right = input.read_centered(block, k * channels + 1);
                    output.write_centered(&mut mid[0], k, (left + right) / 2);
                    output.write_centered(&mut side[0], k, (left - right) / 2);
                }
            }
        }
        streams
    }

    /// # Description
    /// interleaves one decoded frame of every stream onto the end of `pcm`
    /// ## Comments
    /// joint stereo reconstructs `l = m + s`, `r = m - s`, clamped into the wav's range
    pub fn merge(&self, frames: &[Vec<u8>], pcm: &mut Vec<u8>) {
        let input = self.stream_format();
        let output = self.input;
        let frame = input.sample_count(&frames[0]);
        let channels = self.mode.output_channels();
        let start = pcm.len();
        pcm.resize(start + frame * channels * output.bytes_per_sample(), 0);
        let block = &mut pcm[start..];

        match self.mode {
            ChannelMode::Mono => block.copy_from_slice(&frames[0]),
            ChannelMode::Stereo => {
                for k in 0..frame {
                    for (c, stream) in frames.iter().enumerate() {
                        let value = input.read_centered(stream, k);
                        output.write_centered(block, k * channels + c, value);
                    }
                }
            }
            ChannelMode::JointStereo => {
                for k in 0..frame {
                    let mid = input.read_centered(&frames[0], k);
                    let side = input.read_centered(&frames[1], k);
                    output.write_centered(block, k * channels, mid + side);
                    output.write_centered(block, k * channels + 1, mid - side);
                }
            }
        }
    }
}

/// # Description
/// Decodes the frames of one stream, holding a frame back so its seam with the next can be smoothed
pub struct ChannelDecoder {
    format: SampleFormat,
    frame_bytes: usize,
    overlap: usize,
    held: Option<Vec<u8>>,
}

impl ChannelDecoder {
    pub fn new(format: SampleFormat, frame: usize, overlap: usize) -> Self {
        Self {
            format,
            frame_bytes: frame * format.bytes_per_sample(),
            overlap,
            held: None,
        }
    }

    /// # Description
    /// decodes the next encoded frame of the stream
    /// ## Returns
    /// the previous frame, now final, if there was one
    pub fn push(&mut self, encoded: &[u8]) -> Option<Vec<u8>> {
        let mut current = vec![0u8; self.frame_bytes];
        if encoded.is_empty() {
            log::warn!("empty frame in stream, substituting silence");
            decode_frame(&[0], self.format, &mut current);
        } else {
            decode_frame(encoded, self.format, &mut current);
        }

        let previous = self.held.take().map(|mut previous| {
            smooth_edge(&mut previous, &mut current, self.overlap, self.format);
            previous
        });
        self.held = Some(current);
        previous
    }

    /// hands back the frame still held, nothing follows it so it is left as is
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.held.take()
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use crate::codec::encode_frame;

    #[test]
    fn downmix_averages_centered_values() {
        let layout = ChannelLayout::new(ChannelMode::Mono, SampleFormat::U8, 2);
        // (l, r) = (-128, 127), (0, 100), (27, 27)
        let block = [0u8, 255, 128, 228, 155, 155];
        let streams = layout.split(&block, 3);
        assert_eq!(streams, vec![vec![128, 178, 155]]);
    }

    #[test]
    fn mono_input_passes_through() {
        let layout = ChannelLayout::new(ChannelMode::Mono, SampleFormat::S16LE, 1);
        let block = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        let streams = layout.split(&block, 4);
        assert_eq!(streams, vec![vec![1, 2, 3, 4, 5, 6, 7, 8]]);

        let mut pcm = Vec::new();
        layout.merge(&streams, &mut pcm);
        assert_eq!(pcm, &block[..8]);
    }

    #[test]
    fn stereo_streams_round_trip() {
        let layout = ChannelLayout::new(ChannelMode::Stereo, SampleFormat::S16LE, 2);
        let block = (0..16u8).collect::<Vec<_>>();
        let streams = layout.split(&block, 4);
        assert_eq!(streams[0], vec![0, 1, 4, 5, 8, 9, 12, 13]);
        assert_eq!(streams[1], vec![2, 3, 6, 7, 10, 11, 14, 15]);

        let mut pcm = vec![0xaa];
        layout.merge(&streams, &mut pcm);
        assert_eq!(pcm[0], 0xaa);
        assert_eq!(&pcm[1..], &block[..]);
    }

    #[test]
    fn joint_stereo_on_unsigned_input() {
        let layout = ChannelLayout::new(ChannelMode::JointStereo, SampleFormat::U8, 2);
        assert_eq!(layout.stream_format(), SampleFormat::S8);

        // (l, r) = (100, -100), (-128, -128), (127, 0)
        let block = [228u8, 28, 0, 0, 255, 128];
        let streams = layout.split(&block, 3);
        assert_eq!(streams[0], vec![0, (-128i8) as u8, 63]);
        assert_eq!(streams[1], vec![100, 0, 63]);

        // the odd difference loses its low bit on the way
        let mut pcm = Vec::new();
        layout.merge(&streams, &mut pcm);
        assert_eq!(pcm, vec![228, 28, 0, 0, 254, 128]);
    }

    #[test]
    fn joint_stereo_reconstruction_clamps() {
        let layout = ChannelLayout::new(ChannelMode::JointStereo, SampleFormat::S16LE, 2);
        let format = layout.stream_format();
        let mut mid = vec![0u8; 2];
        let mut side = vec![0u8; 2];
        format.write_centered(&mut mid, 0, 30000);
        format.write_centered(&mut side, 0, 10000);

        let mut pcm = Vec::new();
        layout.merge(&[mid, side], &mut pcm);
        assert_eq!(SampleFormat::S16LE.read_raw(&pcm, 0), i16::MAX as i32);
        assert_eq!(SampleFormat::S16LE.read_raw(&pcm, 1), 20000);
    }

    #[test]
    fn decoder_holds_one_frame_back() {
        let format = SampleFormat::U8;
        let mut decoder = ChannelDecoder::new(format, 8, 4);

        let mut low = [0u8; 64];
        let mut high = [0u8; 64];
        let low_len = encode_frame(&[10, 12, 9, 11, 10, 12, 9, 11], format, &mut low);
        let high_len = encode_frame(&[200, 190, 210, 200, 190, 210, 200, 190], format, &mut high);

        let mut expected_low = vec![0u8; 8];
        let mut expected_high = vec![0u8; 8];
        decode_frame(&low[..low_len], format, &mut expected_low);
        decode_frame(&high[..high_len], format, &mut expected_high);
        smooth_edge(&mut expected_low, &mut expected_high, 4, format);

        assert_eq!(decoder.push(&low[..low_len]), None);
        assert_eq!(decoder.push(&high[..high_len]), Some(expected_low));
        assert_eq!(decoder.finish(), Some(expected_high.clone()));
        assert_eq!(decoder.finish(), None);

        // the seam really moved: the held frame starts below its plain decode
        let mut plain_high = vec![0u8; 8];
        decode_frame(&high[..high_len], format, &mut plain_high);
        assert!(expected_high[0] < plain_high[0]);
    }

    #[test]
    fn empty_frame_is_silence() {
        let mut decoder = ChannelDecoder::new(SampleFormat::U8, 4, 1);
        decoder.push(&[]);
        assert_eq!(decoder.finish(), Some(vec![128; 4]));
    }
}
