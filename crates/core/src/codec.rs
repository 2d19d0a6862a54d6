//! Table-wide payload encoding.
//!
//! A table is written with exactly one codec; records carry no format flag.
//! Reading a record with the wrong codec fails with [`CodecError`].

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Compression level used when `zstd` is configured without one.
pub const DEFAULT_ZSTD_LEVEL: i32 = 19;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("zstd compression failed: {0}")]
    Compress(std::io::Error),

    #[error("zstd decompression failed: {0}")]
    Decompress(std::io::Error),
}

/// Byte-level encoding applied to every stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadCodec {
    /// Payload bytes are the JSON document itself.
    #[default]
    Plain,
    /// JSON compressed with zstd at the given level.
    Zstd { level: i32 },
}

impl PayloadCodec {
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        match self {
            PayloadCodec::Plain => Ok(raw.to_vec()),
            PayloadCodec::Zstd { level } => {
                zstd::encode_all(raw, *level).map_err(CodecError::Compress)
            }
        }
    }

    pub fn decode(&self, stored: &[u8]) -> Result<Vec<u8>, CodecError> {
        match self {
            PayloadCodec::Plain => Ok(stored.to_vec()),
            PayloadCodec::Zstd { .. } => zstd::decode_all(stored).map_err(CodecError::Decompress),
        }
    }
}

impl fmt::Display for PayloadCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadCodec::Plain => f.write_str("plain"),
            PayloadCodec::Zstd { level } => write!(f, "zstd:{level}"),
        }
    }
}

/// Parses `plain`, `zstd` or `zstd:<level>` (case-insensitive).
impl FromStr for PayloadCodec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.split_once(':') {
            None if lowered == "plain" => Ok(PayloadCodec::Plain),
            None if lowered == "zstd" => Ok(PayloadCodec::Zstd {
                level: DEFAULT_ZSTD_LEVEL,
            }),
            Some(("zstd", level)) => {
                let level: i32 = level
                    .parse()
                    .map_err(|_| CoreError::InvalidCodec(s.to_string()))?;
                if !zstd::compression_level_range().contains(&level) {
                    return Err(CoreError::InvalidCodec(s.to_string()));
                }
                Ok(PayloadCodec::Zstd { level })
            }
            _ => Err(CoreError::InvalidCodec(s.to_string())),
        }
    }
}
