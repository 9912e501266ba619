use thiserror::Error;

/// Everything that can go wrong reading or writing wav files and `.agr` streams
#[derive(Debug, Error)]
pub enum AgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed header: {0}")]
    Header(#[from] bincode::Error),

    #[error("not a wav file: {0}")]
    NotAWav(&'static str),

    #[error("not an agress stream (magic {found:#06x})")]
    NotAgress { found: u16 },

    #[error("unsupported sample size: {0} bits")]
    UnsupportedBits(u16),

    #[error("unsupported channel layout: {0}")]
    UnsupportedChannels(u16),

    #[error("unsupported wav encoding (format tag {0}), only linear PCM is handled")]
    UnsupportedEncoding(u16),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AgressError>;
