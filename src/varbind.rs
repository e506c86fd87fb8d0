//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{Error, MalformedKind, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Maximum number of VarBinds accepted in one message.
pub const MAX_VARBINDS: usize = 1024;

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    /// Decode from BER.
    ///
    /// Every inconsistency inside the binding is a malformed encoding,
    /// including bytes left over after the value.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        Self::decode_body(&mut seq)
    }

    fn decode_body(seq: &mut Decoder) -> Result<Self> {
        let oid = seq.read_oid()?;
        let value = Value::decode(seq)?;
        if !seq.is_empty() {
            return Err(Error::malformed(
                seq.offset(),
                MalformedKind::TrailingData {
                    remaining: seq.remaining(),
                },
            ));
        }
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Encode a list of VarBinds.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // Encode in reverse order since we're using reverse buffer
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Decode a list of VarBinds.
///
/// The list itself and the outer SEQUENCE of each binding are containers: a
/// declared length that runs past the data is a truncated message. Problems
/// inside a binding are malformed encodings.
pub fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    decoder.expect_tag(tag::universal::SEQUENCE)?;
    let mut list = decoder.read_container_body()?;
    let mut varbinds = Vec::new();

    while !list.is_empty() {
        if varbinds.len() == MAX_VARBINDS {
            return Err(Error::malformed(
                list.offset(),
                MalformedKind::TooManyVarBinds { max: MAX_VARBINDS },
            ));
        }
        list.expect_tag(tag::universal::SEQUENCE)?;
        let mut seq = list.read_container_body()?;
        varbinds.push(VarBind::decode_body(&mut seq)?);
    }

    Ok(varbinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::oid;
    use bytes::Bytes;

    fn encode_list(varbinds: &[VarBind]) -> Bytes {
        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, varbinds);
        buf.finish()
    }

    #[test]
    fn test_varbind_roundtrip() {
        let vb = VarBind::new(oid!(1, 3, 6, 1), Value::Integer(42));

        let mut buf = EncodeBuf::new();
        vb.encode(&mut buf);
        let bytes = buf.finish();

        let mut decoder = Decoder::new(bytes);
        let decoded = VarBind::decode(&mut decoder).unwrap();

        assert_eq!(vb, decoded);
    }

    #[test]
    fn test_trap_varbind_list() {
        let varbinds = vec![
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(123456)),
            VarBind::new(
                oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0),
                Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 2, 3, 0, 1)),
            ),
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 3),
                Value::OctetString(Bytes::from_static(b"eth0")),
            ),
        ];

        let mut decoder = Decoder::new(encode_list(&varbinds));
        let decoded = decode_varbind_list(&mut decoder).unwrap();

        assert_eq!(varbinds, decoded);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_varbind_list_empty() {
        let mut decoder = Decoder::new(encode_list(&[]));
        let decoded = decode_varbind_list(&mut decoder).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_varbind_list_mixed_value_types() {
        let varbinds = vec![
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                Value::OctetString(Bytes::from_static(b"test")),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), Value::Integer(42)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::Counter32(1000)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::Gauge32(500)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::TimeTicks(99999)),
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 6, 0),
                Value::IpAddress([192, 168, 1, 1]),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Counter64(u64::MAX)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 9, 0), Value::Null),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 10, 0), Value::NoSuchInstance),
        ];

        let mut decoder = Decoder::new(encode_list(&varbinds));
        let decoded = decode_varbind_list(&mut decoder).unwrap();

        assert_eq!(varbinds, decoded);
    }

    #[test]
    fn test_list_length_past_end_is_truncation() {
        let bytes = encode_list(&[VarBind::new(oid!(1, 3, 6, 1), Value::Integer(1))]);
        // Drop the last byte of the only binding
        let mut decoder = Decoder::new(bytes.slice(..bytes.len() - 1));
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert!(
            matches!(
                err.decode_kind(),
                Some(DecodeErrorKind::TruncatedMessage { .. })
            ),
            "got {err}"
        );
    }

    #[test]
    fn test_varbind_length_past_list_is_truncation() {
        // List claims 7 bytes; the binding inside claims 9
        let bytes = [
            0x30, 0x07, 0x30, 0x09, 0x06, 0x03, 0x2B, 0x06, 0x01, 0x05, 0x00,
        ];
        let mut decoder = Decoder::from_slice(&bytes);
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::TruncatedMessage {
                declared: 9,
                available: 5
            })
        );
    }

    #[test]
    fn test_value_past_varbind_is_malformed() {
        // Binding SEQUENCE is 7 bytes but the OCTET STRING inside claims 5
        let bytes = [
            0x30, 0x09, 0x30, 0x07, 0x06, 0x03, 0x2B, 0x06, 0x01, 0x04, 0x05,
        ];
        let mut decoder = Decoder::from_slice(&bytes);
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert!(matches!(
            err.decode_kind(),
            Some(DecodeErrorKind::MalformedEncoding(
                MalformedKind::TlvOverflow { .. }
            ))
        ));
    }

    #[test]
    fn test_trailing_bytes_in_varbind() {
        // OID, NULL, then a stray byte inside the binding
        let bytes = [
            0x30, 0x0A, 0x30, 0x08, 0x06, 0x03, 0x2B, 0x06, 0x01, 0x05, 0x00, 0xFF,
        ];
        let mut decoder = Decoder::from_slice(&bytes);
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::MalformedEncoding(
                MalformedKind::TrailingData { remaining: 1 }
            ))
        );
    }

    #[test]
    fn test_too_many_varbinds() {
        let varbinds: Vec<_> = (0..=MAX_VARBINDS as u32)
            .map(|i| VarBind::new(oid!(1, 3, 6, 1, 4, 1, i), Value::Null))
            .collect();
        let mut decoder = Decoder::new(encode_list(&varbinds));
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::MalformedEncoding(
                MalformedKind::TooManyVarBinds { max: MAX_VARBINDS }
            ))
        );
    }

    #[test]
    fn test_exactly_max_varbinds_accepted() {
        let varbinds: Vec<_> = (0..MAX_VARBINDS as u32)
            .map(|i| VarBind::new(oid!(1, 3, 6, 1, 4, 1, i), Value::Null))
            .collect();
        let mut decoder = Decoder::new(encode_list(&varbinds));
        assert_eq!(decode_varbind_list(&mut decoder).unwrap().len(), MAX_VARBINDS);
    }

    #[test]
    fn test_varbind_display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(42));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.3.0 = 42");
    }
}
