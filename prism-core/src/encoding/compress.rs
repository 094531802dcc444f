use crate::encoding::EncodingName;
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::Write;

/// Compress `data` into the given encoding.
///
/// `deflate` is the zlib-wrapped stream browsers expect for `Content-Encoding: deflate`.
/// Identity returns the input unchanged.
pub fn compress(encoding: EncodingName, data: &[u8]) -> std::io::Result<Vec<u8>> {
    match encoding {
        EncodingName::Identity => Ok(data.to_vec()),
        EncodingName::Gzip => gzip_compress(data),
        EncodingName::Deflate => deflate_compress(data),
        EncodingName::Brotli => brotli_compress(data),
    }
}

fn gzip_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn deflate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn brotli_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::new();
    let params = brotli::enc::BrotliEncoderParams {
        quality: 11,
        lgwin: 22,
        ..Default::default()
    };
    brotli::enc::BrotliCompress(&mut std::io::Cursor::new(data), &mut output, &params)?;
    Ok(output)
}
