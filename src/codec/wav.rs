use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{AgressError, Result, SampleBits, StreamInfo};

const RIFF: [u8; 4] = *b"RIFF";
const WAVE: [u8; 4] = *b"WAVE";
const FMT: [u8; 4] = *b"fmt ";
const DATA: [u8; 4] = *b"data";

const PCM_FORMAT_TAG: u16 = 1;
/// size of the `fmt ` body for plain PCM
const FMT_BODY_LEN: u32 = 16;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
struct RiffHeader {
    riff: [u8; 4],
    file_size: u32,
    wave: [u8; 4],
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
struct ChunkHeader {
    id: [u8; 4],
    size: u32,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
struct FmtChunk {
    audio_format: u16,
    num_channels: u16,
    frequency: u32,
    bytes_per_sec: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FmtChunk {
    fn from_info(info: StreamInfo) -> Self {
        let block_align = info.block_align() as u16;
        Self {
            audio_format: PCM_FORMAT_TAG,
            num_channels: info.channels as u16,
            frequency: info.sample_rate,
            bytes_per_sec: info.sample_rate * block_align as u32,
            block_align,
            bits_per_sample: u8::from(info.bits) as u16,
        }
    }

    fn to_info(&self) -> Result<StreamInfo> {
        if self.audio_format != PCM_FORMAT_TAG {
            return Err(AgressError::UnsupportedEncoding(self.audio_format));
        }
        let bits = u8::try_from(self.bits_per_sample)
            .map_err(|_| AgressError::UnsupportedBits(self.bits_per_sample))
            .and_then(SampleBits::try_from)?;
        if !(1..=2).contains(&self.num_channels) {
            return Err(AgressError::UnsupportedChannels(self.num_channels));
        }
        Ok(StreamInfo::new(
            self.frequency,
            self.num_channels as u32,
            bits,
        ))
    }
}

/// # Description
/// An in-memory PCM wav file
/// ## Comments
/// - samples are kept exactly as stored on disk: interleaved, 8-bit unsigned or 16-bit signed little-endian
/// - only canonical PCM (format tag 1) with one or two channels is handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WavCodec {
    info: StreamInfo,
    pcm: Vec<u8>,
}

impl WavCodec {
    pub fn new(info: StreamInfo) -> Self {
        Self {
            info,
            pcm: Vec::new(),
        }
    }

    /// # Description
    /// wraps already interleaved `pcm`
    /// ## Comments
    /// a trailing partial block is dropped
    pub fn with_pcm(info: StreamInfo, mut pcm: Vec<u8>) -> Self {
        let block = info.block_align();
        let whole = pcm.len() / block * block;
        if whole != pcm.len() {
            log::warn!(
                "dropping {} bytes that don't make up a whole sample block",
                pcm.len() - whole
            );
            pcm.truncate(whole);
        }
        Self { info, pcm }
    }

    pub fn info(&self) -> StreamInfo {
        self.info
    }

    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// appends interleaved sample blocks
    pub fn extend_from_slice(&mut self, pcm: &[u8]) {
        self.pcm.extend_from_slice(pcm);
    }

    /// number of samples in each channel
    pub fn samples_per_channel(&self) -> usize {
        self.pcm.len() / self.info.block_align()
    }

    /// # Description
    /// Writes a canonical 44-byte header followed by the pcm data
    /// ## Comments
    /// - `Resource` is usually `Vec<u8>` or `fs::File`
    pub fn save_to<Resource>(&self, mut dst: Resource) -> Result<()>
    where
        Resource: Write,
    {
        let data_len = self.pcm.len() as u32;
        let pad = data_len & 1;
        let riff = RiffHeader {
            riff: RIFF,
            file_size: 4 + (8 + FMT_BODY_LEN) + (8 + data_len + pad),
            wave: WAVE,
        };

        bincode::serialize_into(&mut dst, &riff)?;
        bincode::serialize_into(
            &mut dst,
            &ChunkHeader {
                id: FMT,
                size: FMT_BODY_LEN,
            },
        )?;
        bincode::serialize_into(&mut dst, &FmtChunk::from_info(self.info))?;
        bincode::serialize_into(
            &mut dst,
            &ChunkHeader {
                id: DATA,
                size: data_len,
            },
        )?;
        dst.write_all(&self.pcm)?;
        if pad != 0 {
            dst.write_all(&[0])?;
        }
        Ok(())
    }

    /// # Description
    /// parses a wav file
    /// ## Comments
    /// - chunks other than `fmt ` and `data` are skipped
    /// - a `data` chunk cut short by the end of the file is accepted with a warning
    pub fn load<Resource>(mut src: Resource) -> Result<Self>
    where
        Resource: Read,
    {
        let riff: RiffHeader = bincode::deserialize_from(&mut src)
            .map_err(|_| AgressError::NotAWav("file too short for a RIFF header"))?;
        if riff.riff != RIFF || riff.wave != WAVE {
            return Err(AgressError::NotAWav("missing RIFF/WAVE signature"));
        }

        let mut info = None;
        loop {
            let chunk: ChunkHeader = bincode::deserialize_from(&mut src)
                .map_err(|_| AgressError::NotAWav("no data chunk found"))?;
            let padded_size = chunk.size as u64 + (chunk.size & 1) as u64;

            match chunk.id {
                FMT => {
                    if chunk.size < FMT_BODY_LEN {
                        return Err(AgressError::NotAWav("fmt chunk too short"));
                    }
                    let mut body = Vec::new();
                    src.by_ref().take(padded_size).read_to_end(&mut body)?;
                    if (body.len() as u64) < padded_size {
                        return Err(AgressError::NotAWav("fmt chunk cut short"));
                    }
                    let fmt: FmtChunk = bincode::deserialize(&body)?;
                    log::debug!("wav fmt chunk: {:?}", fmt);
                    info = Some(fmt.to_info()?);
                }
                DATA => {
                    let info = info.ok_or(AgressError::NotAWav("data chunk before fmt chunk"))?;
                    let mut pcm = Vec::new();
                    src.by_ref().take(chunk.size as u64).read_to_end(&mut pcm)?;
                    if (pcm.len() as u64) < chunk.size as u64 {
                        log::warn!(
                            "data chunk claims {} bytes but only {} are present",
                            chunk.size,
                            pcm.len()
                        );
                    }
                    return Ok(Self::with_pcm(info, pcm));
                }
                id => {
                    log::debug!(
                        "skipping {:?} chunk ({} bytes)",
                        String::from_utf8_lossy(&id),
                        chunk.size
                    );
                    io::copy(&mut src.by_ref().take(padded_size), &mut io::sink())?;
                }
            }
        }
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use std::io::Cursor;

    #[allow(dead_code)]
    fn chirp(info: StreamInfo, samples_per_channel: usize) -> WavCodec {
        let mut wav = WavCodec::new(info);
        let format = info.format();
        let mut block = vec![0u8; info.block_align()];
        for k in 0..samples_per_channel {
            for c in 0..info.channels() {
                let value = ((k * k + 97 * c) % 251) as f64 - 125.0;
                format.from_signal(&[value * 100.0], &mut block[c * format.bytes_per_sample()..]);
            }
            wav.extend_from_slice(&block);
        }
        wav
    }

    #[test]
    fn save_then_load_in_main_memory() {
        for &info in [
            StreamInfo::new(8000, 1, SampleBits::Eight),
            StreamInfo::new(22050, 2, SampleBits::Eight),
            StreamInfo::new(44100, 1, SampleBits::Sixteen),
            StreamInfo::new(48000, 2, SampleBits::Sixteen),
        ]
        .iter()
        {
            let wav = chirp(info, 301);
            let mut file = Vec::new();
            wav.save_to(&mut file).unwrap();
            assert_eq!(file.len(), 44 + wav.pcm().len() + (wav.pcm().len() & 1));
            assert_eq!(&file[..4], b"RIFF");
            assert_eq!(&file[36..40], b"data");

            let loaded = WavCodec::load(Cursor::new(file)).unwrap();
            assert_eq!(loaded, wav);
            assert_eq!(loaded.samples_per_channel(), 301);
        }
    }

    #[test]
    fn skips_unknown_chunks() {
        let info = StreamInfo::new(16000, 2, SampleBits::Sixteen);
        let wav = chirp(info, 16);
        let mut canonical = Vec::new();
        wav.save_to(&mut canonical).unwrap();

        // splice an odd-sized LIST chunk (plus its pad byte) in front of `data`
        let mut file = canonical[..36].to_vec();
        file.extend_from_slice(b"LIST");
        file.extend_from_slice(&3u32.to_le_bytes());
        file.extend_from_slice(&[1, 2, 3, 0]);
        file.extend_from_slice(&canonical[36..]);

        assert_eq!(WavCodec::load(Cursor::new(file)).unwrap(), wav);
    }

    #[test]
    fn truncated_data_is_kept() {
        let info = StreamInfo::new(8000, 2, SampleBits::Sixteen);
        let wav = chirp(info, 64);
        let mut file = Vec::new();
        wav.save_to(&mut file).unwrap();
        // cut mid-block: the partial block is dropped as well
        file.truncate(44 + 10 * 4 + 3);

        let loaded = WavCodec::load(Cursor::new(file)).unwrap();
        assert_eq!(loaded.samples_per_channel(), 10);
        assert_eq!(loaded.pcm(), &wav.pcm()[..40]);
    }

    #[test]
    fn rejects_what_it_cannot_handle() {
        assert!(matches!(
            WavCodec::load(Cursor::new(b"RIFX\0\0\0\0WAVE".to_vec())),
            Err(AgressError::NotAWav(_))
        ));
        assert!(matches!(
            WavCodec::load(Cursor::new(vec![0u8; 5])),
            Err(AgressError::NotAWav(_))
        ));

        let mut file = Vec::new();
        chirp(StreamInfo::new(8000, 1, SampleBits::Sixteen), 8)
            .save_to(&mut file)
            .unwrap();

        let mut float = file.clone();
        float[20] = 3;
        assert!(matches!(
            WavCodec::load(Cursor::new(float)),
            Err(AgressError::UnsupportedEncoding(3))
        ));

        let mut wide = file.clone();
        wide[34] = 24;
        assert!(matches!(
            WavCodec::load(Cursor::new(wide)),
            Err(AgressError::UnsupportedBits(24))
        ));

        let mut surround = file.clone();
        surround[22] = 6;
        assert!(matches!(
            WavCodec::load(Cursor::new(surround)),
            Err(AgressError::UnsupportedChannels(6))
        ));

        let mut headless = file[..12].to_vec();
        headless.extend_from_slice(&file[36..]);
        assert!(matches!(
            WavCodec::load(Cursor::new(headless)),
            Err(AgressError::NotAWav(_))
        ));
    }
}
