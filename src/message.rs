//! Community-based message envelope (SNMPv1 / SNMPv2c).
//!
//! ```text
//! Message ::= SEQUENCE {
//!     version    INTEGER { v1(0), v2c(1) },
//!     community  OCTET STRING,
//!     data       PDU
//! }
//! ```
//!
//! [`CommunityMessage`] is the wire form. [`TrapMessage`] is what the
//! receive pipeline works with: the envelope plus the source address, with
//! the PDU flattened into SNMPv2 binding layout.

use std::net::SocketAddr;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::{TrapPdu, TrapV2Pdu, ensure_consumed};
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;

/// Community-authenticated trap message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    pub version: Version,
    pub community: Bytes,
    pub pdu: TrapPdu,
}

impl CommunityMessage {
    /// Create a v2c trap message.
    pub fn v2c(community: impl Into<Bytes>, pdu: TrapV2Pdu) -> Self {
        Self {
            version: Version::V2c,
            community: community.into(),
            pdu: TrapPdu::V2(pdu),
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }

    /// Decode from BER.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        decoder.expect_tag(tag::universal::SEQUENCE)?;
        let mut seq = decoder.read_container_body()?;
        let declared = seq.remaining();

        // Anything after the outer SEQUENCE means the datagram and the
        // message disagree about its size
        if !decoder.is_empty() {
            return Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::TruncatedMessage {
                    declared,
                    available: declared + decoder.remaining(),
                },
            ));
        }

        let version_offset = seq.offset();
        let raw_version = seq.read_integer()?;
        let version = Version::from_i32(raw_version).ok_or_else(|| {
            Error::decode(version_offset, DecodeErrorKind::InvalidVersion(raw_version))
        })?;

        let community = seq.read_octet_string()?;

        let expected = match version {
            Version::V1 => tag::pdu::TRAP_V1,
            Version::V2c => tag::pdu::TRAP_V2,
        };
        let pdu = TrapPdu::decode(&mut seq, expected)?;
        ensure_consumed(&seq, declared)?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }
}

/// A decoded trap, ready for authentication and normalization.
///
/// `varbinds[0]` is sysUpTime.0 and `varbinds[1]` is snmpTrapOID.0 by
/// position. SNMPv1 traps are translated on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapMessage {
    pub version: Version,
    pub community: Bytes,
    pub source: SocketAddr,
    pub varbinds: Vec<VarBind>,
}

impl TrapMessage {
    /// Decode a datagram received from `source`.
    pub fn decode(data: Bytes, source: SocketAddr) -> Result<Self> {
        let msg = CommunityMessage::decode(data)?;
        Ok(Self::from_community(msg, source))
    }

    /// Flatten a wire message.
    pub fn from_community(msg: CommunityMessage, source: SocketAddr) -> Self {
        Self {
            version: msg.version,
            community: msg.community,
            source,
            varbinds: msg.pdu.into_varbinds(),
        }
    }

    /// Encode the bindings as an SNMPv2-Trap datagram.
    ///
    /// The bindings are sent as-is, so a translated v1 trap is re-emitted in
    /// v2c form.
    pub fn encode(&self, request_id: i32) -> Bytes {
        CommunityMessage {
            version: Version::V2c,
            community: self.community.clone(),
            pdu: TrapPdu::V2(TrapV2Pdu {
                request_id,
                varbinds: self.varbinds.clone(),
            }),
        }
        .encode()
    }
}
