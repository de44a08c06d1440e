//! Payload framing: `[u32 big-endian byte length][UTF-8 bytes][0xFF]`.
//!
//! Bits are stored one per `u8` (0 or 1), most significant bit of each byte
//! first.

use crate::error::{Result, SteganographyError};

/// Bits of the length prefix
pub const HEADER_BITS: usize = 32;

/// Trailing frame marker
pub const DELIMITER: u8 = 0xFF;

/// Bits taken by the header and the delimiter together
pub const FRAME_OVERHEAD_BITS: usize = HEADER_BITS + 8;

/// Total frame length in bits for a payload of `payload_bytes` bytes
pub fn frame_bit_length(payload_bytes: u64) -> u64 {
    FRAME_OVERHEAD_BITS as u64 + payload_bytes * 8
}

/// Reads the length prefix once at least `HEADER_BITS` bits are present
pub fn declared_length(bit_stream: &[u8]) -> Option<u32> {
    if bit_stream.len() < HEADER_BITS {
        return None;
    }
    Some(
        bit_stream[..HEADER_BITS]
            .iter()
            .fold(0u32, |length, &bit| (length << 1) | (bit & 1) as u32),
    )
}

/// Frames `text` into a bit stream
pub fn encode(text: &str) -> Result<Vec<u8>> {
    let payload = text.as_bytes();
    let payload_length = u32::try_from(payload.len()).map_err(|_| {
        SteganographyError::InvalidInput(format!(
            "message of {} bytes exceeds the 32-bit length field",
            payload.len()
        ))
    })?;

    let mut bit_stream = Vec::with_capacity(FRAME_OVERHEAD_BITS + payload.len() * 8);
    push_byte_bits(&mut bit_stream, &payload_length.to_be_bytes());
    push_byte_bits(&mut bit_stream, payload);
    push_byte_bits(&mut bit_stream, &[DELIMITER]);

    Ok(bit_stream)
}

/// Unframes a bit stream produced by [`encode`]; extra trailing bits are ignored
pub fn decode(bit_stream: &[u8]) -> Result<String> {
    let payload_length = declared_length(bit_stream).ok_or_else(|| {
        SteganographyError::CorruptedPayloadHeader(format!(
            "need {} bits for the length header, got {}",
            HEADER_BITS,
            bit_stream.len()
        ))
    })?;

    let required_bits = frame_bit_length(payload_length as u64);
    if required_bits > bit_stream.len() as u64 {
        return Err(SteganographyError::CorruptedPayloadHeader(format!(
            "header declares {} bytes ({} frame bits) but only {} bits are available",
            payload_length,
            required_bits,
            bit_stream.len()
        )));
    }

    let payload_end = HEADER_BITS + payload_length as usize * 8;
    let payload = collect_bytes(&bit_stream[HEADER_BITS..payload_end]);
    let text = String::from_utf8(payload).map_err(|error| {
        SteganographyError::CorruptedPayloadHeader(format!("payload is not valid UTF-8: {}", error))
    })?;

    let delimiter = collect_bytes(&bit_stream[payload_end..payload_end + 8])[0];
    if delimiter != DELIMITER {
        return Err(SteganographyError::DelimiterMismatch { found: delimiter });
    }

    Ok(text)
}

fn push_byte_bits(bit_stream: &mut Vec<u8>, bytes: &[u8]) {
    for &data_byte in bytes {
        for bit_position in (0..8).rev() {
            bit_stream.push((data_byte >> bit_position) & 1);
        }
    }
}

fn collect_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|bit_chunk| {
            bit_chunk
                .iter()
                .fold(0u8, |byte_value, &bit| (byte_value << 1) | (bit & 1))
        })
        .collect()
}
