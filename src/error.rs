//! Error types for snmp-trapd.
//!
//! Only [`Error::Bind`] and [`Error::Config`] are fatal. Everything else is
//! scoped to the single datagram that produced it: the receive loop logs it,
//! bumps a counter and goes back to listening.

use std::net::SocketAddr;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Low-level BER framing problems.
///
/// Wrapped by [`DecodeErrorKind::MalformedEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Multi-byte (high tag number) form.
    HighTagNumber,
    /// Multi-byte tag number longer than 32 bits.
    TagTooLong { octets: usize },
    /// Data ended in the middle of a tag or length.
    TruncatedData,
    /// TLV extends past the end of its enclosing container.
    TlvOverflow { needed: usize, available: usize },
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer value overflow.
    IntegerOverflow,
    /// Integer64 too long.
    Integer64TooLong { length: usize },
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// OID exceeds maximum arc count during decode.
    OidTooLong { count: usize, max: usize },
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Bytes left inside a VarBind after its value.
    TrailingData { remaining: usize },
    /// More VarBinds than a single message may carry.
    TooManyVarBinds { max: usize },
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::HighTagNumber => write!(f, "high tag number form not supported"),
            Self::TagTooLong { octets } => write!(f, "tag number spans {} octets", octets),
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::TlvOverflow { needed, available } => {
                write!(
                    f,
                    "TLV needs {} bytes but only {} remaining",
                    needed, available
                )
            }
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::TrailingData { remaining } => {
                write!(f, "{} unexpected bytes after varbind value", remaining)
            }
            Self::TooManyVarBinds { max } => {
                write!(f, "more than {} varbinds in one message", max)
            }
        }
    }
}

/// Why a datagram could not be turned into a trap event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Version field is neither SNMPv1 (0) nor SNMPv2c (1).
    InvalidVersion(i32),
    /// A declared length disagrees with the bytes actually present.
    TruncatedMessage { declared: usize, available: usize },
    /// BER framing is inconsistent.
    MalformedEncoding(MalformedKind),
    /// PDU is not a trap.
    UnexpectedPduType(u8),
    /// Fewer than the two leading sysUpTime / snmpTrapOID bindings.
    MissingMandatoryBindings { count: usize },
}

impl DecodeErrorKind {
    /// Short stable label, used as a log field.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvalidVersion(_) => "invalid_version",
            Self::TruncatedMessage { .. } => "truncated_message",
            Self::MalformedEncoding(_) => "malformed_encoding",
            Self::UnexpectedPduType(_) => "unexpected_pdu_type",
            Self::MissingMandatoryBindings { .. } => "missing_mandatory_bindings",
        }
    }
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVersion(v) => write!(f, "unsupported SNMP version: {}", v),
            Self::TruncatedMessage {
                declared,
                available,
            } => write!(
                f,
                "truncated message: declared {} bytes, {} available",
                declared, available
            ),
            Self::MalformedEncoding(kind) => write!(f, "malformed encoding: {}", kind),
            Self::UnexpectedPduType(t) => write!(f, "unexpected PDU type: 0x{:02X}", t),
            Self::MissingMandatoryBindings { count } => write!(
                f,
                "trap carries {} varbinds, sysUpTime and snmpTrapOID are required",
                count
            ),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc too large for first arc value.
    InvalidSecondArc { first: u32, second: u32 },
    /// OID too short (minimum 2 arcs).
    TooShort,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {} too large for first arc {}", second, first)
            }
            Self::TooShort => write!(f, "OID must have at least 2 arcs"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// Crate error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The trap socket could not be bound. Fatal.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Invalid startup configuration. Fatal.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// BER decoding or trap-shape error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// Community string not in the accepted set.
    #[error("community rejected for trap from {peer}")]
    AuthRejected { peer: SocketAddr },

    /// Writing an event to the output stream failed.
    #[error("failed to write event: {source}")]
    OutputWrite {
        #[source]
        source: std::io::Error,
    },

    /// Invalid OID format.
    #[error("invalid OID{}: {kind}", input.as_ref().map(|i| format!(" '{}'", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create a malformed-encoding decode error.
    pub fn malformed(offset: usize, kind: MalformedKind) -> Self {
        Self::Decode {
            offset,
            kind: DecodeErrorKind::MalformedEncoding(kind),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// The decode error kind, if this is a decode error.
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_startup_errors_are_fatal() {
        let bind = Error::Bind {
            addr: "0.0.0.0:162".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(bind.is_fatal());
        assert!(Error::config("no community").is_fatal());

        assert!(!Error::decode(0, DecodeErrorKind::InvalidVersion(3)).is_fatal());
        assert!(
            !Error::AuthRejected {
                peer: "10.0.0.5:54321".parse().unwrap()
            }
            .is_fatal()
        );
        assert!(
            !Error::OutputWrite {
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe)
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_decode_error_display() {
        let err = Error::malformed(7, MalformedKind::InvalidNull);
        assert_eq!(
            err.to_string(),
            "decode error at offset 7: malformed encoding: NULL with non-zero length"
        );

        let err = Error::decode(0, DecodeErrorKind::UnexpectedPduType(0xA0));
        assert!(err.to_string().contains("0xA0"));
    }

    #[test]
    fn test_auth_rejected_does_not_leak_community() {
        let err = Error::AuthRejected {
            peer: "10.0.0.5:54321".parse().unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "community rejected for trap from 10.0.0.5:54321"
        );
    }

    #[test]
    fn test_decode_kind_labels() {
        assert_eq!(
            DecodeErrorKind::MissingMandatoryBindings { count: 1 }.label(),
            "missing_mandatory_bindings"
        );
        assert_eq!(
            DecodeErrorKind::TruncatedMessage {
                declared: 10,
                available: 4
            }
            .label(),
            "truncated_message"
        );
    }
}
