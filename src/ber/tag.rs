//! BER tags used by SNMP traps (X.690 8.1.2, RFC 2578, RFC 3416).
//!
//! SNMP only uses single-octet tags: two class bits, the constructed bit,
//! and a five-bit tag number.

/// Tag number bits signalling the multi-byte (high tag number) form.
pub const HIGH_TAG_NUMBER: u8 = 0x1F;

/// Tag number (bits 4-0).
#[inline]
pub const fn tag_number(tag: u8) -> u8 {
    tag & 0x1F
}

pub mod universal {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;
}

/// SMIv2 application types.
pub mod application {
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    /// Also Unsigned32.
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
}

/// Exception values. Never meaningful in a trap, but decoded so a binding
/// carrying one is still rendered.
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// PDU tags.
///
/// Only the two trap forms are accepted. The rest are named so a rejected
/// datagram can be logged meaningfully.
pub mod pdu {
    pub const GET_REQUEST: u8 = 0xA0;
    pub const GET_NEXT_REQUEST: u8 = 0xA1;
    pub const RESPONSE: u8 = 0xA2;
    pub const SET_REQUEST: u8 = 0xA3;
    /// SNMPv1 Trap-PDU.
    pub const TRAP_V1: u8 = 0xA4;
    pub const GET_BULK_REQUEST: u8 = 0xA5;
    pub const INFORM_REQUEST: u8 = 0xA6;
    /// SNMPv2-Trap-PDU.
    pub const TRAP_V2: u8 = 0xA7;
    pub const REPORT: u8 = 0xA8;

    /// PDU name for diagnostics.
    pub const fn name(tag: u8) -> &'static str {
        match tag {
            GET_REQUEST => "GetRequest",
            GET_NEXT_REQUEST => "GetNextRequest",
            RESPONSE => "Response",
            SET_REQUEST => "SetRequest",
            TRAP_V1 => "Trap",
            GET_BULK_REQUEST => "GetBulkRequest",
            INFORM_REQUEST => "InformRequest",
            TRAP_V2 => "SNMPv2-Trap",
            REPORT => "Report",
            _ => "unknown",
        }
    }
}
