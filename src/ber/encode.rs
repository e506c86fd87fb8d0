//! BER encoding.
//!
//! The receiver never transmits, so this is the reference encoder: it builds
//! the trap datagrams used by `snmp-trapsend`, the tests and the fuzz
//! targets. Bytes are collected back to front, so a container's length is
//! known by the time its header is written.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Reverse-order BER writer.
///
/// Push the last field of a container first:
///
/// ```
/// use snmp_trapd::ber::EncodeBuf;
///
/// let mut buf = EncodeBuf::new();
/// buf.push_sequence(|buf| {
///     buf.push_integer(2);
///     buf.push_integer(1);
/// });
/// // SEQUENCE { INTEGER 1, INTEGER 2 }
/// assert_eq!(&buf.finish()[..], &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
/// ```
#[derive(Debug)]
pub struct EncodeBuf {
    rev: Vec<u8>,
}

impl EncodeBuf {
    pub fn new() -> Self {
        Self {
            rev: Vec::with_capacity(256),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.rev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rev.is_empty()
    }

    fn prepend(&mut self, bytes: &[u8]) {
        self.rev.extend(bytes.iter().rev());
    }

    fn prepend_header(&mut self, tag: u8, content_len: usize) {
        let (len, count) = encode_length(content_len);
        // Already reversed
        self.rev.extend_from_slice(&len[..count]);
        self.rev.push(tag);
    }

    /// Wrap whatever `f` writes in a constructed TLV.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let before = self.len();
        f(self);
        let content_len = self.len() - before;
        self.prepend_header(tag, content_len);
    }

    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Raw content octets under an arbitrary tag (Opaque, exception values,
    /// unrecognized types).
    pub fn push_tagged(&mut self, tag: u8, content: &[u8]) {
        self.prepend(content);
        self.prepend_header(tag, content.len());
    }

    /// Raw content octets under verbatim identifier octets, which may use the
    /// multi-byte tag form.
    pub fn push_identified(&mut self, identifier: &[u8], content: &[u8]) {
        self.prepend(content);
        let (len, count) = encode_length(content.len());
        self.rev.extend_from_slice(&len[..count]);
        self.prepend(identifier);
    }

    /// INTEGER, minimal two's complement.
    pub fn push_integer(&mut self, value: i32) {
        let be = value.to_be_bytes();
        self.push_tagged(tag::universal::INTEGER, minimal_signed(&be));
    }

    /// Counter32, Gauge32 or TimeTicks.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        self.push_unsigned(tag, &value.to_be_bytes());
    }

    pub fn push_counter64(&mut self, value: u64) {
        self.push_unsigned(tag::application::COUNTER64, &value.to_be_bytes());
    }

    /// Minimal magnitude, with a 0x00 pad when the top bit is set so no
    /// decoder can read it as negative.
    fn push_unsigned(&mut self, tag: u8, be: &[u8]) {
        let magnitude = minimal_unsigned(be);
        self.prepend(magnitude);
        let mut len = magnitude.len();
        if magnitude[0] & 0x80 != 0 {
            self.rev.push(0x00);
            len += 1;
        }
        self.prepend_header(tag, len);
    }

    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_tagged(tag::universal::OCTET_STRING, data);
    }

    pub fn push_null(&mut self) {
        self.push_tagged(tag::universal::NULL, &[]);
    }

    pub fn push_oid(&mut self, oid: &Oid) {
        self.push_tagged(tag::universal::OBJECT_IDENTIFIER, &oid.to_ber_smallvec());
    }

    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_tagged(tag::application::IP_ADDRESS, &addr);
    }

    /// Put the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.rev.reverse();
        Bytes::from(self.rev)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop redundant sign octets from big-endian two's complement.
fn minimal_signed(be: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < be.len() {
        let (lead, next) = (be[start], be[start + 1]);
        let redundant = (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &be[start..]
}

/// Drop leading zero octets, keeping at least one.
fn minimal_unsigned(be: &[u8]) -> &[u8] {
    let start = be
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(be.len() - 1);
    &be[start..]
}
