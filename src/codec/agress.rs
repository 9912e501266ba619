//! The `.agr` container
//!
//! ```text
//!  header (8 bytes, little-endian)
//!  +-------+-------------+------------+----------+------+
//!  | magic | sample rate | frame size | channels | bits |
//!  |  u16  |     u16     |    u16     |    u8    |  u8  |
//!  +-------+-------------+------------+----------+------+
//!  then, for every block of `frame size` samples and every stream of the block
//!  +--------+-------------------+
//!  | length | encoded frame ... |
//!  |  u16   |   length bytes    |
//!  +--------+-------------------+
//! ```
//!
//! Stereo layouts store their two streams (left/right or mid/side) alternately.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{
    decode_frame, encode_frame, smooth_edge, wav::WavCodec, AgressError, Result, SampleBits,
    SampleFormat, StreamInfo,
};

mod channel;
mod config;

pub use channel::*;
pub use config::*;

/// `"AG"` read as a little-endian `u16`
pub const MAGIC: u16 = 0x4741;

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub struct AgressHeader {
    pub magic: u16,
    pub sample_rate: u16,
    pub frame_size: u16,
    pub channels: u8,
    pub bits: u8,
}

impl AgressHeader {
    pub fn new(sample_rate: u16, frame_size: u16, mode: ChannelMode, bits: SampleBits) -> Self {
        Self {
            magic: MAGIC,
            sample_rate,
            frame_size,
            channels: mode.tag(),
            bits: u8::from(bits),
        }
    }

    pub fn mode(&self) -> Result<ChannelMode> {
        ChannelMode::from_tag(self.channels)
    }

    pub fn sample_bits(&self) -> Result<SampleBits> {
        SampleBits::try_from(self.bits)
    }

    /// samples per channel in every frame
    pub fn frame_len(&self) -> Result<usize> {
        let frame = self.frame_size as usize;
        if frame < 2 || !frame.is_power_of_two() {
            return Err(AgressError::InvalidConfig(format!(
                "stream header declares frames of {} samples",
                frame
            )));
        }
        Ok(frame)
    }

    pub fn read_from<Resource>(src: Resource) -> Result<Self>
    where
        Resource: Read,
    {
        let header: Self = bincode::deserialize_from(src).map_err(|err| match *err {
            // too short to even hold a header
            bincode::ErrorKind::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                AgressError::NotAgress { found: 0 }
            }
            bincode::ErrorKind::Io(e) => AgressError::Io(e),
            other => AgressError::Header(Box::new(other)),
        })?;
        if header.magic != MAGIC {
            return Err(AgressError::NotAgress {
                found: header.magic,
            });
        }
        Ok(header)
    }

    pub fn write_to<Resource>(&self, dst: Resource) -> Result<()>
    where
        Resource: Write,
    {
        bincode::serialize_into(dst, self)?;
        Ok(())
    }
}

/// # Description
/// Compresses a wav file into an `.agr` stream
/// ## Returns
/// the header that was written
/// ## Comments
/// - the last block is padded with silence up to a whole frame
/// - with the `rayon` feature blocks are compressed in parallel, the output is identical either way
pub fn encode_stream<Resource>(
    wav: &WavCodec,
    config: &EncoderConfig,
    mut dst: Resource,
) -> Result<AgressHeader>
where
    Resource: Write,
{
    config.validate()?;
    let info = wav.info();
    let sample_rate = u16::try_from(info.sample_rate).map_err(|_| {
        AgressError::InvalidConfig(format!(
            "a sample rate of {} Hz does not fit the stream header",
            info.sample_rate
        ))
    })?;

    let frame = config.frame_size;
    let mode = config.effective_mode(info.channels());
    let layout = ChannelLayout::new(mode, info.format(), info.channels());
    let budgets = config.frame_budgets(info.channels(), info.bits);
    log::info!(
        "encoding {} samples per channel as {:?}, {} sample frames, budgets {:?}",
        wav.samples_per_channel(),
        mode,
        frame,
        budgets
    );

    let header = AgressHeader::new(sample_rate, frame as u16, mode, info.bits);
    header.write_to(&mut dst)?;

    let block_len = frame * info.block_align();
    let blocks = wav.pcm().chunks(block_len).collect::<Vec<_>>();
    let encode_block = |block: &[u8]| -> Vec<Vec<u8>> {
        let mut padded = Vec::new();
        let block = if block.len() < block_len {
            padded.resize(block_len, 0);
            padded[..block.len()].copy_from_slice(block);
            info.format().fill_silence(&mut padded[block.len()..]);
            &padded[..]
        } else {
            block
        };

        layout
            .split(block, frame)
            .iter()
            .zip(budgets.iter())
            .map(|(samples, &budget)| {
                let mut encoded = vec![0u8; budget];
                let used = encode_frame(samples, layout.stream_format(), &mut encoded);
                encoded.truncate(used);
                encoded
            })
            .collect()
    };

    #[cfg(feature = "rayon")]
    let encoded = {
        use rayon::prelude::*;
        blocks
            .par_iter()
            .map(|&block| encode_block(block))
            .collect::<Vec<_>>()
    };
    #[cfg(not(feature = "rayon"))]
    let encoded = blocks
        .iter()
        .map(|&block| encode_block(block))
        .collect::<Vec<_>>();

    for (index, frames) in encoded.iter().enumerate() {
        for frame in frames {
            write_frame(&mut dst, frame)?;
        }
        log::debug!(
            "block {}: {:?} bytes",
            index,
            frames.iter().map(Vec::len).collect::<Vec<_>>()
        );
    }
    dst.flush()?;

    Ok(header)
}

/// # Description
/// Decompresses an `.agr` stream back into a wav file
/// ## Comments
/// - consecutive frames of every stream get their seam smoothed, see `DecoderConfig::smooth`
/// - a stream cut short inside a block keeps every block before it
/// - the output always holds whole frames, padding included
pub fn decode_stream<Resource>(mut src: Resource, config: &DecoderConfig) -> Result<WavCodec>
where
    Resource: Read,
{
    let header = AgressHeader::read_from(&mut src)?;
    let mode = header.mode()?;
    let bits = header.sample_bits()?;
    let frame = header.frame_len()?;
    let overlap = config.overlap(frame);
    log::info!(
        "decoding {:?} stream, {} Hz, {} bits, {} sample frames, smoothing over {}",
        mode,
        header.sample_rate,
        u8::from(bits),
        frame,
        overlap
    );

    let info = StreamInfo::new(
        header.sample_rate as u32,
        mode.output_channels() as u32,
        bits,
    );
    let layout = ChannelLayout::new(mode, info.format(), info.channels());
    let mut channels = (0..layout.streams())
        .map(|_| ChannelDecoder::new(layout.stream_format(), frame, overlap))
        .collect::<Vec<_>>();
    let mut block = vec![Vec::new(); layout.streams()];
    let mut pcm = Vec::new();

    let mut blocks = 0;
    loop {
        match read_block(&mut src, &mut block)? {
            BlockRead::Complete => (),
            BlockRead::End => break,
            BlockRead::Truncated => {
                log::warn!("stream ends in the middle of block {}, dropping it", blocks);
                break;
            }
        }

        let ready = channels
            .iter_mut()
            .zip(block.iter())
            .map(|(channel, encoded)| channel.push(encoded))
            .collect::<Vec<_>>();
        if ready.iter().all(Option::is_some) {
            layout.merge(&ready.into_iter().flatten().collect::<Vec<_>>(), &mut pcm);
        }
        blocks += 1;
    }

    let last = channels
        .iter_mut()
        .filter_map(ChannelDecoder::finish)
        .collect::<Vec<_>>();
    if last.len() == layout.streams() {
        layout.merge(&last, &mut pcm);
    }
    log::debug!("decoded {} blocks into {} pcm bytes", blocks, pcm.len());

    Ok(WavCodec::with_pcm(info, pcm))
}

fn write_frame<Resource>(dst: &mut Resource, frame: &[u8]) -> Result<()>
where
    Resource: Write,
{
    let len = u16::try_from(frame.len()).map_err(|_| {
        AgressError::InvalidConfig(format!("frame of {} bytes overflows its length prefix", frame.len()))
    })?;
    dst.write_all(&len.to_le_bytes())?;
    dst.write_all(frame)?;
    Ok(())
}

enum BlockRead {
    Complete,
    /// clean end of stream, right on a block boundary
    End,
    Truncated,
}

/// reads the next frame of every stream into `block`
fn read_block<Resource>(src: &mut Resource, block: &mut [Vec<u8>]) -> Result<BlockRead>
where
    Resource: Read,
{
    for (index, frame) in block.iter_mut().enumerate() {
        let mut prefix = [0u8; 2];
        match read_fully(src, &mut prefix)? {
            0 if index == 0 => return Ok(BlockRead::End),
            2 => (),
            _ => return Ok(BlockRead::Truncated),
        }

        frame.resize(u16::from_le_bytes(prefix) as usize, 0);
        if read_fully(src, frame)? < frame.len() {
            return Ok(BlockRead::Truncated);
        }
    }
    Ok(BlockRead::Complete)
}

/// like `read_exact`, but reports how far it got when the input runs dry
fn read_fully<Resource>(src: &mut Resource, buf: &mut [u8]) -> io::Result<usize>
where
    Resource: Read,
{
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

mod tests {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use std::io::Cursor;

    #[allow(dead_code)]
    fn tone(info: StreamInfo, samples_per_channel: usize) -> WavCodec {
        let format = info.format();
        let amplitude = format.centered_range().1 as f64 * 0.5;
        let mut pcm = vec![0u8; samples_per_channel * info.block_align()];
        let signal = (0..samples_per_channel * info.channels())
            .map(|i| {
                let (k, c) = (i / info.channels(), i % info.channels());
                let t = k as f64 / info.sample_rate as f64;
                let f = 220.0 * (c + 1) as f64;
                amplitude * (2.0 * std::f64::consts::PI * f * t).sin()
            })
            .collect::<Vec<_>>();
        format.from_signal(&signal, &mut pcm);
        WavCodec::with_pcm(info, pcm)
    }

    #[allow(dead_code)]
    fn snr_db(format: SampleFormat, reference: &[u8], decoded: &[u8]) -> f64 {
        let a = format.to_signal(reference);
        let b = format.to_signal(decoded);
        let signal = a.iter().map(|x| x * x).sum::<f64>();
        let noise = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>();
        10.0 * (signal / noise.max(1e-9)).log10()
    }

    #[test]
    fn header_is_eight_bytes() {
        let header = AgressHeader::new(44100, 1024, ChannelMode::JointStereo, SampleBits::Sixteen);
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x41, 0x47, 0x44, 0xac, 0x00, 0x04, 3, 16]);
        assert_eq!(AgressHeader::read_from(&bytes[..]).unwrap(), header);
    }

    #[test]
    fn rejects_foreign_streams() {
        assert!(matches!(
            decode_stream(&b"RIFF\0\0\0\0WAVE"[..], &DecoderConfig::default()),
            Err(AgressError::NotAgress { found: 0x4952 })
        ));
        assert!(matches!(
            decode_stream(&[0x41u8, 0x47][..], &DecoderConfig::default()),
            Err(AgressError::NotAgress { .. })
        ));

        let mut bad_layout = Vec::new();
        AgressHeader::new(8000, 64, ChannelMode::Mono, SampleBits::Eight)
            .write_to(&mut bad_layout)
            .unwrap();
        bad_layout[6] = 9;
        assert!(matches!(
            decode_stream(&bad_layout[..], &DecoderConfig::default()),
            Err(AgressError::UnsupportedChannels(9))
        ));
    }

    #[allow(dead_code)]
    struct BrokenPipe;
    impl Read for BrokenPipe {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn read_failures_are_not_foreign_streams() {
        assert!(matches!(
            AgressHeader::read_from(BrokenPipe),
            Err(AgressError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe
        ));
        assert!(matches!(
            decode_stream(BrokenPipe, &DecoderConfig::default()),
            Err(AgressError::Io(_))
        ));
        assert!(matches!(
            AgressHeader::read_from(&[0x41u8, 0x47, 0x44][..]),
            Err(AgressError::NotAgress { found: 0 })
        ));
    }

    #[test]
    fn every_layout_round_trips() {
        let cases = [
            (1, SampleBits::Sixteen, ChannelMode::JointStereo, ChannelMode::Mono),
            (1, SampleBits::Eight, ChannelMode::Stereo, ChannelMode::Mono),
            (2, SampleBits::Sixteen, ChannelMode::Mono, ChannelMode::Mono),
            (2, SampleBits::Eight, ChannelMode::Stereo, ChannelMode::Stereo),
            (2, SampleBits::Sixteen, ChannelMode::Stereo, ChannelMode::Stereo),
            (2, SampleBits::Eight, ChannelMode::JointStereo, ChannelMode::JointStereo),
            (2, SampleBits::Sixteen, ChannelMode::JointStereo, ChannelMode::JointStereo),
        ];

        for &(channels, bits, requested, stored) in cases.iter() {
            let info = StreamInfo::new(8000, channels, bits);
            // 3.5 frames: the last one gets padded
            let wav = tone(info, 7 * 128);
            let config = EncoderConfig::default()
                .with_frame_size(256)
                .with_ratio(2.0)
                .with_mode(requested);

            let mut agr = Vec::new();
            let header = encode_stream(&wav, &config, &mut agr).unwrap();
            assert_eq!(header.mode().unwrap(), stored);
            assert_eq!(header.frame_size, 256);

            let decoded = decode_stream(Cursor::new(agr), &DecoderConfig::default()).unwrap();
            let out = decoded.info();
            assert_eq!(out.channels(), stored.output_channels());
            assert_eq!(out.bits, bits);
            assert_eq!(out.sample_rate, 8000);
            assert_eq!(decoded.samples_per_channel(), 4 * 256);

            if stored != ChannelMode::Mono || channels == 1 {
                let snr = snr_db(
                    info.format(),
                    wav.pcm(),
                    &decoded.pcm()[..wav.pcm().len()],
                );
                assert!(snr > 15.0, "{:?} {:?}: {} dB", bits, stored, snr);
            }
        }
    }

    #[test]
    fn stream_respects_the_ratio() {
        let info = StreamInfo::new(16000, 2, SampleBits::Sixteen);
        let wav = tone(info, 16 * 512);
        let config = EncoderConfig::default()
            .with_frame_size(512)
            .with_ratio(8.0)
            .with_mode(ChannelMode::Stereo);

        let mut agr = Vec::new();
        encode_stream(&wav, &config, &mut agr).unwrap();
        // prefixes count against the budget, the header does not
        assert!(agr.len() - 8 <= wav.pcm().len() / 8, "{} bytes", agr.len());
    }

    #[test]
    fn silence_is_cheap() {
        let info = StreamInfo::new(8000, 1, SampleBits::Eight);
        let wav = WavCodec::with_pcm(info, vec![128; 1000]);
        let config = EncoderConfig::default().with_frame_size(64);

        let mut agr = Vec::new();
        encode_stream(&wav, &config, &mut agr).unwrap();
        // 16 blocks of a 2 byte prefix and a lone header byte
        assert_eq!(agr.len(), 8 + 16 * 3);

        let decoded = decode_stream(&agr[..], &DecoderConfig::default()).unwrap();
        assert_eq!(decoded.pcm(), &vec![128u8; 16 * 64][..]);
    }

    #[test]
    fn truncated_stream_keeps_whole_blocks() {
        let info = StreamInfo::new(8000, 2, SampleBits::Sixteen);
        let wav = tone(info, 4 * 64);
        let config = EncoderConfig::default().with_frame_size(64);
        let mut agr = Vec::new();
        encode_stream(&wav, &config, &mut agr).unwrap();
        let full = decode_stream(&agr[..], &DecoderConfig::default()).unwrap();
        assert_eq!(full.samples_per_channel(), 4 * 64);

        // chop the stream inside the side frame of the last block
        let cut = &agr[..agr.len() - 3];
        let partial = decode_stream(cut, &DecoderConfig::default()).unwrap();
        assert_eq!(partial.samples_per_channel(), 3 * 64);
        // everything but the seam of the dropped block decodes the same
        let keep = (3 * 64 - 5) * info.block_align();
        assert_eq!(&partial.pcm()[..keep], &full.pcm()[..keep]);
    }

    #[test]
    fn invalid_configs_are_refused() {
        let wav = tone(StreamInfo::new(8000, 1, SampleBits::Sixteen), 64);
        let mut agr = Vec::new();
        let config = EncoderConfig::default().with_frame_size(100);
        assert!(matches!(
            encode_stream(&wav, &config, &mut agr),
            Err(AgressError::InvalidConfig(_))
        ));

        let hifi = tone(StreamInfo::new(96000, 1, SampleBits::Sixteen), 64);
        assert!(matches!(
            encode_stream(&hifi, &EncoderConfig::default(), &mut agr),
            Err(AgressError::InvalidConfig(_))
        ));
    }

    #[test]
    fn encoding_is_deterministic() {
        let info = StreamInfo::new(11025, 2, SampleBits::Eight);
        let wav = tone(info, 10 * 128);
        let config = EncoderConfig::default().with_frame_size(128).with_ratio(3.0);

        let mut first = Vec::new();
        let mut second = Vec::new();
        encode_stream(&wav, &config, &mut first).unwrap();
        encode_stream(&wav, &config, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
