//! BER decoding.
//!
//! [`Decoder`] reads forward over a shared [`Bytes`] buffer. Constructed types
//! hand out sub-decoders that share the buffer without copying and report
//! offsets relative to the original datagram.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, MalformedKind, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Subsequent identifier octets allowed in the multi-byte tag form. Five
/// carry 35 bits, enough for any 32-bit tag number.
const MAX_TAG_OCTETS: usize = 5;

/// Forward-reading BER decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    data: Bytes,
    pos: usize,
    /// Offset of `data[0]` within the outermost buffer, for error reporting.
    base: usize,
}

impl Decoder {
    /// Create a decoder over the given bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Create a decoder by copying a byte slice.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current offset, relative to the start of the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn malformed(&self, kind: MalformedKind) -> Error {
        tracing::trace!(
            snmp.offset = self.offset(),
            error.kind = %kind,
            "BER decode error"
        );
        Error::malformed(self.offset(), kind)
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self
            .data
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.malformed(MalformedKind::TruncatedData))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a tag byte.
    ///
    /// The multi-byte tag form never frames an SNMP message and is rejected
    /// here. Values read their identifier with
    /// [`read_identifier`](Self::read_identifier) instead.
    pub fn read_tag(&mut self) -> Result<u8> {
        let tag = self.read_byte()?;
        if tag::tag_number(tag) == tag::HIGH_TAG_NUMBER {
            return Err(self.malformed(MalformedKind::HighTagNumber));
        }
        Ok(tag)
    }

    /// Read identifier octets verbatim, including the multi-byte tag form.
    ///
    /// Only value positions accept the multi-byte form; framing positions go
    /// through [`read_tag`](Self::read_tag).
    pub fn read_identifier(&mut self) -> Result<Bytes> {
        let start = self.pos;
        let first = self.read_byte()?;
        if tag::tag_number(first) == tag::HIGH_TAG_NUMBER {
            let mut octets = 0;
            loop {
                let byte = self.read_byte()?;
                octets += 1;
                if octets > MAX_TAG_OCTETS {
                    return Err(self.malformed(MalformedKind::TagTooLong { octets }));
                }
                if byte & 0x80 == 0 {
                    break;
                }
            }
        }
        Ok(self.data.slice(start..self.pos))
    }

    /// Read a definite length.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) =
            decode_length(&self.data[self.pos..]).map_err(|kind| self.malformed(kind))?;
        self.pos += consumed;
        Ok(len)
    }

    /// Read `len` bytes as a zero-copy slice of the underlying buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let available = self.remaining();
        if len > available {
            return Err(self.malformed(MalformedKind::TlvOverflow {
                needed: len,
                available,
            }));
        }
        let bytes = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(bytes)
    }

    /// Read a tag and fail unless it matches `expected`.
    pub fn expect_tag(&mut self, expected: u8) -> Result<()> {
        let start = self.offset();
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(Error::malformed(
                start,
                MalformedKind::UnexpectedTag { expected, actual },
            ));
        }
        Ok(())
    }

    /// Split off the next `len` bytes as a sub-decoder.
    fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder { data, pos: 0, base })
    }

    /// Read a constructed TLV with the given tag, returning a decoder over its
    /// contents. A length that overruns the remaining data is malformed.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        self.expect_tag(expected)?;
        let len = self.read_length()?;
        self.sub_decoder(len)
    }

    /// Read a SEQUENCE.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read the contents of a container whose tag has already been consumed.
    ///
    /// Unlike [`read_constructed`](Self::read_constructed), a declared length
    /// that disagrees with the bytes present is reported as a truncated
    /// message rather than a framing error. Used for the message-level
    /// containers (message, PDU, varbind list).
    pub fn read_container_body(&mut self) -> Result<Decoder> {
        let len = self.read_length()?;
        let available = self.remaining();
        if len > available {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::TruncatedMessage {
                    declared: len,
                    available,
                },
            ));
        }
        self.sub_decoder(len)
    }

    /// Read an INTEGER.
    pub fn read_integer(&mut self) -> Result<i32> {
        self.expect_tag(tag::universal::INTEGER)?;
        let len = self.read_length()?;
        self.read_integer_value(len)
    }

    /// Read the content octets of a signed 32-bit integer.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.malformed(MalformedKind::ZeroLengthInteger));
        }
        if len > 4 {
            return Err(self.malformed(MalformedKind::IntegerOverflow));
        }
        let bytes = self.read_bytes(len)?;

        // Sign-extend from the first content octet
        let init: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes.iter().fold(init, |acc, &b| (acc << 8) | b as i32))
    }

    /// Read the content octets of an unsigned 32-bit value
    /// (Counter32, Gauge32, TimeTicks).
    ///
    /// A fifth octet is allowed only as a leading 0x00 sign pad. Values sent
    /// without the pad are read as unsigned magnitudes, so a counter is never
    /// negative however the agent framed it.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(self.malformed(MalformedKind::ZeroLengthInteger));
        }
        if len > 5 {
            return Err(self.malformed(MalformedKind::IntegerOverflow));
        }
        let bytes = self.read_bytes(len)?;
        if len == 5 && bytes[0] != 0 {
            return Err(Error::malformed(
                self.offset() - len,
                MalformedKind::IntegerOverflow,
            ));
        }
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64) as u32)
    }

    /// Read the content octets of a Counter64.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.malformed(MalformedKind::ZeroLengthInteger));
        }
        if len > 9 {
            return Err(self.malformed(MalformedKind::Integer64TooLong { length: len }));
        }
        let bytes = self.read_bytes(len)?;
        if len == 9 && bytes[0] != 0 {
            return Err(Error::malformed(
                self.offset() - len,
                MalformedKind::Integer64TooLong { length: len },
            ));
        }
        Ok(bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128) as u64)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        self.expect_tag(tag::universal::OCTET_STRING)?;
        let len = self.read_length()?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        self.expect_tag(tag::universal::NULL)?;
        let len = self.read_length()?;
        if len != 0 {
            return Err(self.malformed(MalformedKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        let len = self.read_length()?;
        self.read_oid_value(len)
    }

    /// Read the content octets of an OBJECT IDENTIFIER.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let start = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::decode_ber(&bytes).map_err(|kind| Error::malformed(start, kind))
    }

    /// Read an IpAddress (application tag 0).
    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        self.expect_tag(tag::application::IP_ADDRESS)?;
        let len = self.read_length()?;
        if len != 4 {
            return Err(self.malformed(MalformedKind::InvalidIpAddressLength { length: len }));
        }
        let data = self.read_bytes(4)?;
        Ok([data[0], data[1], data[2], data[3]])
    }

    /// Read a TimeTicks value.
    pub fn read_timeticks(&mut self) -> Result<u32> {
        self.expect_tag(tag::application::TIMETICKS)?;
        let len = self.read_length()?;
        self.read_unsigned32_value(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed_kind(err: Error) -> MalformedKind {
        match err.decode_kind() {
            Some(DecodeErrorKind::MalformedEncoding(kind)) => kind,
            other => panic!("expected malformed encoding, got {:?}", other),
        }
    }

    #[test]
    fn test_read_integer() {
        let mut d = Decoder::from_slice(&[0x02, 0x01, 0x2A]);
        assert_eq!(d.read_integer().unwrap(), 42);
        assert!(d.is_empty());

        let mut d = Decoder::from_slice(&[0x02, 0x01, 0xFF]);
        assert_eq!(d.read_integer().unwrap(), -1);

        let mut d = Decoder::from_slice(&[0x02, 0x02, 0xFF, 0x7F]);
        assert_eq!(d.read_integer().unwrap(), -129);

        let mut d = Decoder::from_slice(&[0x02, 0x04, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(d.read_integer().unwrap(), i32::MIN);
    }

    #[test]
    fn test_integer_zero_length() {
        let mut d = Decoder::from_slice(&[0x02, 0x00]);
        let err = d.read_integer().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::ZeroLengthInteger);
    }

    #[test]
    fn test_integer_overflow() {
        let mut d = Decoder::from_slice(&[0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00]);
        let err = d.read_integer().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::IntegerOverflow);
    }

    #[test]
    fn test_unsigned32_sign_pad() {
        // 0xFFFFFFFF with the 0x00 pad
        let mut d = Decoder::from_slice(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(d.read_unsigned32_value(5).unwrap(), u32::MAX);
    }

    #[test]
    fn test_unsigned32_without_pad_is_not_negative() {
        // Some agents omit the pad; the high bit is magnitude, not sign
        let mut d = Decoder::from_slice(&[0xFF]);
        assert_eq!(d.read_unsigned32_value(1).unwrap(), 255);

        let mut d = Decoder::from_slice(&[0x80, 0x00, 0x00, 0x00]);
        assert_eq!(d.read_unsigned32_value(4).unwrap(), 0x8000_0000);
    }

    #[test]
    fn test_unsigned32_five_bytes_without_zero_pad() {
        let mut d = Decoder::from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00]);
        let err = d.read_unsigned32_value(5).unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::IntegerOverflow);
    }

    #[test]
    fn test_integer64() {
        let mut d = Decoder::from_slice(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(d.read_integer64_value(9).unwrap(), u64::MAX);

        let mut d = Decoder::from_slice(&[0x01; 10]);
        let err = d.read_integer64_value(10).unwrap_err();
        assert_eq!(
            malformed_kind(err),
            MalformedKind::Integer64TooLong { length: 10 }
        );
    }

    #[test]
    fn test_read_octet_string() {
        let mut d = Decoder::from_slice(&[0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c']);
        assert_eq!(d.read_octet_string().unwrap().as_ref(), b"public");
    }

    #[test]
    fn test_octet_string_overflow() {
        let mut d = Decoder::from_slice(&[0x04, 0x10, b'a', b'b']);
        let err = d.read_octet_string().unwrap_err();
        assert_eq!(
            malformed_kind(err),
            MalformedKind::TlvOverflow {
                needed: 16,
                available: 2
            }
        );
    }

    #[test]
    fn test_unexpected_tag() {
        let mut d = Decoder::from_slice(&[0x04, 0x00]);
        let err = d.read_integer().unwrap_err();
        assert_eq!(
            malformed_kind(err),
            MalformedKind::UnexpectedTag {
                expected: 0x02,
                actual: 0x04
            }
        );
    }

    #[test]
    fn test_decode_error_traced() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut d = Decoder::from_slice(&[0x04, 0x05, b'a']);
            d.read_tag().unwrap();
            let len = d.read_length().unwrap();
            let err = d.read_bytes(len).unwrap_err();
            assert_eq!(
                malformed_kind(err),
                MalformedKind::TlvOverflow {
                    needed: 5,
                    available: 1
                }
            );
        });
    }

    #[test]
    fn test_high_tag_number_rejected() {
        let mut d = Decoder::from_slice(&[0x1F, 0x81, 0x00]);
        let err = d.read_tag().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::HighTagNumber);
    }

    #[test]
    fn test_read_identifier() {
        let mut d = Decoder::from_slice(&[0x43, 0x01, 0x00]);
        assert_eq!(&d.read_identifier().unwrap()[..], &[0x43]);
        assert_eq!(d.offset(), 1);

        let mut d = Decoder::from_slice(&[0x5F, 0x81, 0x00, 0x01, 0xAB]);
        assert_eq!(&d.read_identifier().unwrap()[..], &[0x5F, 0x81, 0x00]);
        assert_eq!(d.read_length().unwrap(), 1);
    }

    #[test]
    fn test_read_identifier_limits() {
        // Continuation bit set on every octet
        let mut d = Decoder::from_slice(&[0x5F, 0x81, 0x81, 0x81, 0x81, 0x81, 0x81, 0x01]);
        let err = d.read_identifier().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::TagTooLong { octets: 6 });

        let mut d = Decoder::from_slice(&[0x5F, 0x81]);
        let err = d.read_identifier().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::TruncatedData);
    }

    #[test]
    fn test_read_null() {
        let mut d = Decoder::from_slice(&[0x05, 0x00]);
        d.read_null().unwrap();

        let mut d = Decoder::from_slice(&[0x05, 0x01, 0x00]);
        let err = d.read_null().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::InvalidNull);
    }

    #[test]
    fn test_read_ip_address() {
        let mut d = Decoder::from_slice(&[0x40, 0x04, 10, 0, 0, 5]);
        assert_eq!(d.read_ip_address().unwrap(), [10, 0, 0, 5]);

        let mut d = Decoder::from_slice(&[0x40, 0x03, 10, 0, 0]);
        let err = d.read_ip_address().unwrap_err();
        assert_eq!(
            malformed_kind(err),
            MalformedKind::InvalidIpAddressLength { length: 3 }
        );
    }

    #[test]
    fn test_sequence_offsets_are_absolute() {
        // SEQUENCE { INTEGER 1, NULL with bad length }
        let mut d = Decoder::from_slice(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x05, 0x01, 0x00]);
        let mut seq = d.read_sequence().unwrap();
        assert_eq!(seq.offset(), 2);
        assert_eq!(seq.read_integer().unwrap(), 1);
        let err = seq.read_null().unwrap_err();
        match err {
            Error::Decode { offset, .. } => assert_eq!(offset, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_container_body_truncated() {
        // Declares 16 bytes, only 2 present
        let mut d = Decoder::from_slice(&[0x30, 0x10, 0x05, 0x00]);
        d.read_tag().unwrap();
        let err = d.read_container_body().unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::TruncatedMessage {
                declared: 16,
                available: 2
            })
        );
    }

    #[test]
    fn test_empty_input() {
        let mut d = Decoder::from_slice(&[]);
        assert!(d.is_empty());
        assert_eq!(d.peek_tag(), None);
        let err = d.read_tag().unwrap_err();
        assert_eq!(malformed_kind(err), MalformedKind::TruncatedData);
    }
}
