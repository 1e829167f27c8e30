//! On-disk layout of a record file.
//!
//! A record file is a 5-byte header followed by exactly one frame:
//!
//! ```text
//! header: "OPXP" | codec version (u8)
//! frame:  codec version (u8) | payload length (u32 LE) | payload | crc32 of payload (u32 LE)
//! ```
//!
//! The payload is the UTF-8 JSON envelope; this layer treats it as bytes.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

/// Layout version written into both the header and the frame.
pub const CODEC_VERSION: u8 = 1;

/// Leading bytes of every record file.
pub const MAGIC: [u8; 4] = *b"OPXP";

const LEN_BYTES: usize = 4;
const CRC_BYTES: usize = 4;

fn invalid_data(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

fn read_u32_le(reader: &mut impl Read) -> IoResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Wrap `payload` in a checksummed frame.
///
/// # Errors
/// - `InvalidInput` if the payload is larger than `u32::MAX` bytes
pub fn encode(payload: &[u8]) -> IoResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        IoError::new(
            ErrorKind::InvalidInput,
            format!("{} byte payload is too large for one record", payload.len()),
        )
    })?;

    let mut frame = Vec::with_capacity(1 + LEN_BYTES + payload.len() + CRC_BYTES);
    frame.push(CODEC_VERSION);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    Ok(frame)
}

/// Read one frame and return its payload.
///
/// # Errors
/// - `InvalidData` if the frame version is not [`CODEC_VERSION`], the length
///   is above `max_len`, or the checksum does not match the payload
/// - `UnexpectedEof` if the frame is cut short
pub fn decode(reader: &mut impl Read, max_len: usize) -> IoResult<Vec<u8>> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != CODEC_VERSION {
        return Err(invalid_data(format!(
            "frame written by layout v{}, this build reads v{CODEC_VERSION}",
            version[0]
        )));
    }

    let len = usize::try_from(read_u32_le(reader)?).unwrap_or(usize::MAX);
    if len > max_len {
        return Err(invalid_data(format!(
            "frame declares {len} bytes, limit is {max_len}"
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let expected = read_u32_le(reader)?;
    let actual = crc32fast::hash(&payload);
    if expected != actual {
        return Err(invalid_data(format!(
            "checksum mismatch in record payload ({actual:08x} != {expected:08x})"
        )));
    }

    Ok(payload)
}

/// Write the record file header.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])
}

/// Check the record file header and return the layout version it names.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut header = [0u8; 5];
    reader.read_exact(&mut header)?;

    if header[..4] != MAGIC {
        return Err(invalid_data(format!(
            "not an operator-xp record file (leading bytes {:?})",
            &header[..4]
        )));
    }
    Ok(header[4])
}
