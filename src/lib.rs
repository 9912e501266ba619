//! A progressive, bit-rate bounded wavelet audio codec
//!
//! Frames of PCM are run through a 9/7 lifting wavelet and the coefficients are
//! bit-plane coded most significant first, so an encoded frame can be cut at any
//! byte and still decode.

pub mod codec;
pub mod collections;
pub mod math;

pub use codec::{
    decode_frame, decode_stream, encode_frame, encode_stream, smooth_edge, wav::WavCodec,
    AgressError, ChannelMode, DecoderConfig, EncoderConfig, SampleBits, SampleFormat, StreamInfo,
};
