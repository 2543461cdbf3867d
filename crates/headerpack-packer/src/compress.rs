//! Payload compression (zlib via flate2).

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use headerpack_core::config::{CompressionConfig, MAX_COMPRESSION_LEVEL};
use headerpack_core::{Error, Result};
use std::io::{Read, Write};
use tracing::info;

/// zlib compressor with a fixed level
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    level: Compression,
}

impl Compressor {
    /// Create a compressor; `level` must be 0-9
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(Error::Config(format!(
                "compression level {} is out of range 0-{}",
                level, MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(Self {
            level: Compression::new(level),
        })
    }

    /// Compress `input` into a single zlib stream
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(input.len() / 2), self.level);
        encoder.write_all(input)?;
        let compressed = encoder.finish()?;

        info!(
            "Compressed {} bytes to {} bytes (level {})",
            input.len(),
            compressed.len(),
            self.level.level()
        );
        Ok(compressed)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            level: Compression::best(),
        }
    }
}

/// Decompress a zlib stream
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Apply the configured compression, passing the bytes through when disabled
pub fn encode_payload(input: &[u8], config: CompressionConfig) -> Result<Vec<u8>> {
    if config.enabled {
        Compressor::new(config.level)?.compress(input)
    } else {
        info!("Compression disabled, payload is {} bytes", input.len());
        Ok(input.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let samples: [&[u8]; 4] = [
            b"",
            b"int a;\nint b;\n",
            &[0u8, 255, 1, 254, 0, 0, 0, 7],
            &[b'x'; 70_000],
        ];

        for level in [0, 1, 6, 9] {
            let compressor = Compressor::new(level).unwrap();
            for sample in samples {
                let packed = compressor.compress(sample).unwrap();
                assert_eq!(decompress(&packed).unwrap(), sample);
            }
        }
    }

    #[test]
    fn test_output_is_zlib_stream() {
        let packed = Compressor::default().compress(b"namespace a {}\n").unwrap();
        // zlib header: CM = 8 (deflate), header checksum divisible by 31
        assert_eq!(packed[0] & 0x0f, 8);
        assert_eq!((u16::from(packed[0]) << 8 | u16::from(packed[1])) % 31, 0);
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let text = "template <typename T> class Vector;\n".repeat(200);
        let packed = Compressor::default().compress(text.as_bytes()).unwrap();
        assert!(packed.len() < text.len() / 10);
    }

    #[test]
    fn test_level_out_of_range() {
        assert!(matches!(Compressor::new(10), Err(Error::Config(_))));
    }

    #[test]
    fn test_encode_payload_disabled() {
        let config = CompressionConfig {
            enabled: false,
            level: 9,
        };
        assert_eq!(encode_payload(b"int a;\n", config).unwrap(), b"int a;\n");
    }

    #[test]
    fn test_decompress_garbage() {
        assert!(decompress(b"definitely not zlib").is_err());
    }
}
