//! SNMP value types.
//!
//! [`Value`] is a closed set of every type a trap binding can carry, plus an
//! [`Unknown`](Value::Unknown) catch-all so one exotic binding never sinks
//! the whole trap. Each kind has exactly one textual rendering, produced by
//! its `Display` impl.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{Error, MalformedKind, Result};
use crate::oid::Oid;
use bytes::Bytes;
use std::fmt;

/// SNMP value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes)
    ///
    /// Renders as the text itself when it is UTF-8 and does not start with
    /// `0x`, otherwise as `0x` plus lowercase hex. A rendering that starts
    /// with `0x` is therefore always hex.
    OctetString(Bytes),

    /// NULL
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, network order)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32
    Gauge32(u32),

    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),

    /// Opaque (legacy wrapped BER)
    Opaque(Bytes),

    /// Counter64 (unsigned 64-bit, wrapping)
    Counter64(u64),

    /// noSuchObject exception
    NoSuchObject,

    /// noSuchInstance exception
    NoSuchInstance,

    /// endOfMibView exception
    EndOfMibView,

    /// Any type not listed above, kept verbatim. `identifier` holds every
    /// identifier octet, so multi-byte tags survive.
    Unknown { identifier: Bytes, data: Bytes },
}

/// Discriminant of a [`Value`], for logging and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    OctetString,
    Null,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Opaque,
    Counter64,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Unknown,
}

impl ValueKind {
    /// SMI type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::OctetString => "STRING",
            Self::Null => "NULL",
            Self::ObjectIdentifier => "OID",
            Self::IpAddress => "IpAddress",
            Self::Counter32 => "Counter32",
            Self::Gauge32 => "Gauge32",
            Self::TimeTicks => "Timeticks",
            Self::Opaque => "Opaque",
            Self::Counter64 => "Counter64",
            Self::NoSuchObject => "noSuchObject",
            Self::NoSuchInstance => "noSuchInstance",
            Self::EndOfMibView => "endOfMibView",
            Self::Unknown => "Unsupported",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::OctetString(_) => ValueKind::OctetString,
            Value::Null => ValueKind::Null,
            Value::ObjectIdentifier(_) => ValueKind::ObjectIdentifier,
            Value::IpAddress(_) => ValueKind::IpAddress,
            Value::Counter32(_) => ValueKind::Counter32,
            Value::Gauge32(_) => ValueKind::Gauge32,
            Value::TimeTicks(_) => ValueKind::TimeTicks,
            Value::Opaque(_) => ValueKind::Opaque,
            Value::Counter64(_) => ValueKind::Counter64,
            Value::NoSuchObject => ValueKind::NoSuchObject,
            Value::NoSuchInstance => ValueKind::NoSuchInstance,
            Value::EndOfMibView => ValueKind::EndOfMibView,
            Value::Unknown { .. } => ValueKind::Unknown,
        }
    }

    /// Render the value as it appears in a trap event.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Check if this is an exception value.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Try to get as an OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Try to get as bytes (OctetString or Opaque).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) | Value::Opaque(data) => Some(data),
            _ => None,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => buf.push_tagged(tag::application::OPAQUE, data),
            Value::Counter64(v) => buf.push_counter64(*v),
            Value::NoSuchObject => buf.push_tagged(tag::context::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => buf.push_tagged(tag::context::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => buf.push_tagged(tag::context::END_OF_MIB_VIEW, &[]),
            Value::Unknown { identifier, data } => buf.push_identified(identifier, data),
        }
    }

    /// Decode from BER.
    ///
    /// Unrecognized types, including multi-byte tags, become
    /// [`Unknown`](Value::Unknown) rather than an error.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let identifier = decoder.read_identifier()?;
        let len = decoder.read_length()?;
        if identifier.len() != 1 {
            let data = decoder.read_bytes(len)?;
            return Ok(Value::Unknown { identifier, data });
        }
        let tag = identifier[0];

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::malformed(
                        decoder.offset(),
                        MalformedKind::InvalidNull,
                    ));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::malformed(
                        decoder.offset(),
                        MalformedKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_integer64_value(len)?))
            }
            // Exceptions carry no content, but skip any the agent sent anyway
            tag::context::NO_SUCH_OBJECT => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                decoder.read_bytes(len)?;
                Ok(Value::EndOfMibView)
            }
            // Includes constructed OCTET STRING (0x24)
            _ => {
                let data = decoder.read_bytes(len)?;
                Ok(Value::Unknown { identifier, data })
            }
        }
    }
}

const HEX_PREFIX: &str = "0x";

/// Lowercase hex with a `0x` prefix.
fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    f.write_str(HEX_PREFIX)?;
    for b in data {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) if !s.starts_with(HEX_PREFIX) => f.write_str(s),
                _ => write_hex(f, data),
            },
            Value::Null => Ok(()),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::Opaque(data) => write_hex(f, data),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
            Value::Unknown { data, .. } => write_hex(f, data),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<[u8; 4]> for Value {
    fn from(addr: [u8; 4]) -> Self {
        Value::IpAddress(addr)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}
