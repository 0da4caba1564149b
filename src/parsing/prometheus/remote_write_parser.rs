use super::remote_write_models::WriteRequest;
use prost::Message;
use snap::raw::{Decoder, Encoder, decompress_len};
use std::io::Cursor;
use thiserror::Error;

/// Upper bound for the size announced in a snappy block header.
///
/// A few bytes of header can announce up to 4GB of output, so the announced
/// size is checked before anything is allocated.
pub const MAX_DECOMPRESSED_SIZE: usize = 512 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid snappy block: {0}")]
    Compression(#[source] snap::Error),

    #[error("Decompressed payload too large: {size} bytes > {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid remote write protobuf: {0}")]
    Schema(#[from] prost::DecodeError),

    #[error("Unable to compress the write request: {0}")]
    Encode(#[source] snap::Error),
}

fn decompress_snappy(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    // We must use the snappy Block format, not the framed format,
    // because the Prometheus remote write protocol uses the block format only.
    let size = decompress_len(input).map_err(CodecError::Compression)?;
    if size > MAX_DECOMPRESSED_SIZE {
        return Err(CodecError::TooLarge {
            size,
            max: MAX_DECOMPRESSED_SIZE,
        });
    }

    Decoder::new()
        .decompress_vec(input)
        .map_err(CodecError::Compression)
}

fn parse_protobuf(input: &[u8]) -> Result<WriteRequest, CodecError> {
    Ok(WriteRequest::decode(&mut Cursor::new(input))?)
}

/// Decompresses and decodes a remote write payload.
pub fn parse_remote_write_request(input: &[u8]) -> Result<WriteRequest, CodecError> {
    let decompressed = decompress_snappy(input)?;
    parse_protobuf(&decompressed)
}

/// Encodes and compresses a write request, the inverse of [`parse_remote_write_request`].
pub fn encode_remote_write_request(write_request: &WriteRequest) -> Result<Vec<u8>, CodecError> {
    let proto_encoded = write_request.encode_to_vec();
    Encoder::new()
        .compress_vec(&proto_encoded)
        .map_err(CodecError::Encode)
}
