//! Payload codec
//!
//! Encoding and decoding of request and response payloads.
//!
//! ## Payload Format
//!
//! Payloads are bincode with varint integers and a size limit. Each value
//! carries its own variant tag, so a decoder never needs to know the command
//! to parse its arguments:
//! ```text
//! Request:  command (len + utf8) | arg count | [tag | value]...
//! Response: success (1)          | result count | [tag | value]...
//! ```
//!
//! The stream helpers at the bottom combine this with the framing codec.

use std::io::{Read, Write};

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::frame::{read_frame, write_frame};
use super::{Request, Response};
use crate::error::{RegistryError, Result};

/// Upper bound for a single encoded payload (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PAYLOAD_SIZE as u64)
        .reject_trailing_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    options()
        .serialize(value)
        .map_err(|e| RegistryError::Protocol(format!("Cannot encode payload: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| RegistryError::MalformedPayload(e.to_string()))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to payload bytes
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    encode(request)
}

/// Decode a request from payload bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let request: Request = decode(bytes)?;
    if request.command.is_empty() {
        return Err(RegistryError::MalformedPayload(
            "empty command name".to_string(),
        ));
    }
    Ok(request)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to payload bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    encode(response)
}

/// Decode a response from payload bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    decode(bytes)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request as one frame
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let payload = encode_request(request)?;
    write_frame(writer, &payload)
}

/// Write a response as one frame
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let payload = encode_response(response)?;
    write_frame(writer, &payload)
}

/// Read one framed response
///
/// Blocks until a complete response is received or an error occurs.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let payload = read_frame(reader, MAX_PAYLOAD_SIZE)?;
    decode_response(&payload)
}
