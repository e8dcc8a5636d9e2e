//! Framing codec
//!
//! Moves length-prefixed byte blocks over a stream. Knows nothing about what
//! the payload means.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{RegistryError, Result};

/// Header size: 4 bytes length + 1 byte protocol version
pub const HEADER_SIZE: usize = 5;

/// Highest protocol version this build speaks
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed-width frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes
    pub length: u32,

    /// Sender's protocol version
    pub version: u8,
}

impl FrameHeader {
    /// Header for a payload of `length` bytes at the local protocol version
    pub fn new(length: u32) -> Self {
        Self {
            length,
            version: PROTOCOL_VERSION,
        }
    }

    /// Encode to network byte order
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_u32(self.length);
        buf.put_u8(self.version);

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&buf);
        header
    }

    /// Decode from the first `HEADER_SIZE` bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RegistryError::TruncatedMessage {
                expected: HEADER_SIZE,
                received: bytes.len(),
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let length = buf.get_u32();
        let version = buf.get_u8();
        Ok(Self { length, version })
    }

    /// Fail if the peer speaks a newer protocol than we do
    pub fn check_version(&self) -> Result<()> {
        if self.version > PROTOCOL_VERSION {
            return Err(RegistryError::IncompatibleVersion {
                peer: self.version,
                supported: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a payload into a complete frame (header + payload)
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let length: u32 = payload.len().try_into().map_err(|_| RegistryError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&FrameHeader::new(length).encode());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Write one frame to a stream and flush it
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Stream decoding
// =============================================================================

/// Read a frame header
///
/// Returns `Ok(None)` when the peer closed the stream before sending any
/// byte of a new header. A header cut short is a `TruncatedMessage`.
/// The version is not checked here.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Option<FrameHeader>> {
    let mut header = [0u8; HEADER_SIZE];
    let received = read_full(reader, &mut header)?;

    match received {
        0 => Ok(None),
        HEADER_SIZE => FrameHeader::decode(&header).map(Some),
        _ => Err(RegistryError::TruncatedMessage {
            expected: HEADER_SIZE,
            received,
        }),
    }
}

/// Read exactly the payload announced by `header`
///
/// The declared length is checked against `max_size` before anything is
/// allocated.
pub fn read_payload<R: Read>(
    reader: &mut R,
    header: &FrameHeader,
    max_size: usize,
) -> Result<Vec<u8>> {
    let length = header.length as usize;
    if length > max_size {
        return Err(RegistryError::PayloadTooLarge {
            size: length,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; length];
    let received = read_full(reader, &mut payload)?;
    if received < length {
        return Err(RegistryError::TruncatedMessage {
            expected: length,
            received,
        });
    }

    Ok(payload)
}

/// Read one complete frame and return its payload
///
/// A clean close before the header is reported as a truncated message, since
/// the caller expected a frame. An incompatible version fails before any
/// payload byte is read.
pub fn read_frame<R: Read>(reader: &mut R, max_size: usize) -> Result<Vec<u8>> {
    let header = read_header(reader)?.ok_or(RegistryError::TruncatedMessage {
        expected: HEADER_SIZE,
        received: 0,
    })?;
    header.check_version()?;
    read_payload(reader, &header, max_size)
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
/// Returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
