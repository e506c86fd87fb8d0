//! BER definite-length encoding.
//!
//! Short form for lengths below 128, long form (`0x80 | n` followed by `n`
//! big-endian octets) otherwise. Indefinite length (`0x80` alone) is rejected.

use crate::error::MalformedKind;

/// Maximum number of octets accepted in a long-form length.
///
/// Four octets already covers anything a UDP datagram could carry.
pub const MAX_LENGTH_OCTETS: usize = 4;

/// Decode a length from the start of `data`.
///
/// Returns `(length, octets_consumed)`.
pub fn decode_length(data: &[u8]) -> Result<(usize, usize), MalformedKind> {
    let first = *data.first().ok_or(MalformedKind::TruncatedData)?;

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let octets = (first & 0x7F) as usize;
    if octets == 0 {
        return Err(MalformedKind::IndefiniteLength);
    }
    if octets > MAX_LENGTH_OCTETS {
        return Err(MalformedKind::LengthTooLong { octets });
    }

    let bytes = data
        .get(1..1 + octets)
        .ok_or(MalformedKind::TruncatedData)?;

    // Non-minimal long forms (leading zero octets) are accepted, as net-snmp does
    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((len, 1 + octets))
}

/// Encode a length for the reverse encode buffer.
///
/// The first `count` bytes of the returned array are in reverse order, ready
/// to be pushed one at a time onto an [`EncodeBuf`](super::EncodeBuf).
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut out = [0u8; 5];

    if len < 0x80 {
        out[0] = len as u8;
        return (out, 1);
    }

    let mut count = 0;
    let mut remaining = len;
    while remaining > 0 {
        out[count] = (remaining & 0xFF) as u8;
        remaining >>= 8;
        count += 1;
    }
    out[count] = 0x80 | count as u8;
    (out, count + 1)
}

/// Number of octets needed to encode `len`.
pub fn length_encoded_len(len: usize) -> usize {
    encode_length(len).1
}
