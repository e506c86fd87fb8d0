//! Object Identifier (OID) type.
//!
//! OIDs are stored inline for the common case (up to 16 arcs) and spill to
//! the heap beyond that. Traps carry deep enterprise OIDs often enough that
//! the limit is generous, but it is still bounded by [`MAX_OID_LEN`].

use crate::error::{Error, MalformedKind, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs accepted in an OID (RFC 2578 section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an OID from arc values.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse from dotted notation (e.g. `1.3.6.1.6.3.1.1.4.1.0`).
    ///
    /// A single leading dot is accepted, as net-snmp tools print it.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in body.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
            if arcs.len() > MAX_OID_LEN {
                return Err(Error::invalid_oid_with_input(
                    OidErrorKind::TooManyArcs {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                    s,
                ));
            }
        }

        let oid = Self { arcs };
        oid.validate()
            .map_err(|kind| Error::invalid_oid_with_input(kind, s))?;
        Ok(oid)
    }

    /// Check the X.690 constraints on the first two arcs.
    fn validate(&self) -> std::result::Result<(), OidErrorKind> {
        if self.arcs.len() < 2 {
            return Err(OidErrorKind::TooShort);
        }
        let (first, second) = (self.arcs[0], self.arcs[1]);
        if first > 2 {
            return Err(OidErrorKind::InvalidFirstArc(first));
        }
        if first < 2 && second >= 40 {
            return Err(OidErrorKind::InvalidSecondArc { first, second });
        }
        Ok(())
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check whether `self` begins with every arc of `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// Return a new OID with extra arcs appended.
    pub fn child(&self, arcs: &[u32]) -> Self {
        let mut out = self.arcs.clone();
        out.extend_from_slice(arcs);
        Self { arcs: out }
    }

    /// Decode the content octets of a BER OBJECT IDENTIFIER.
    ///
    /// The first subidentifier packs the first two arcs as `40 * X + Y`, with
    /// `X = 2` absorbing everything from 80 upward.
    pub fn decode_ber(data: &[u8]) -> std::result::Result<Self, MalformedKind> {
        if data.is_empty() {
            return Err(MalformedKind::InvalidOidEncoding);
        }

        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut value: u64 = 0;
        let mut in_progress = false;

        for &byte in data {
            // A subidentifier may not start with 0x80 (non-minimal)
            if !in_progress && byte == 0x80 {
                return Err(MalformedKind::InvalidOidEncoding);
            }
            value = (value << 7) | (byte & 0x7F) as u64;
            if value > u32::MAX as u64 + 80 {
                return Err(MalformedKind::InvalidOidEncoding);
            }
            if byte & 0x80 != 0 {
                in_progress = true;
                continue;
            }
            in_progress = false;

            if arcs.is_empty() {
                let (first, second) = match value {
                    0..40 => (0, value),
                    40..80 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(first);
                arcs.push(u32::try_from(second).map_err(|_| MalformedKind::InvalidOidEncoding)?);
            } else {
                arcs.push(u32::try_from(value).map_err(|_| MalformedKind::InvalidOidEncoding)?);
            }
            if arcs.len() > MAX_OID_LEN {
                return Err(MalformedKind::OidTooLong {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                });
            }
            value = 0;
        }

        // Last octet still had its continuation bit set
        if in_progress {
            return Err(MalformedKind::InvalidOidEncoding);
        }

        Ok(Self { arcs })
    }

    /// Encode to BER content octets.
    ///
    /// OIDs shorter than two arcs are padded with zeros so that something
    /// decodable is always produced.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut out = SmallVec::new();
        let first = self.arcs.first().copied().unwrap_or(0) as u64;
        let second = self.arcs.get(1).copied().unwrap_or(0) as u64;
        push_subidentifier(&mut out, first * 40 + second);
        for &arc in self.arcs.iter().skip(2) {
            push_subidentifier(&mut out, arc as u64);
        }
        out
    }
}

fn push_subidentifier(out: &mut SmallVec<[u8; 64]>, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut v = value;
    loop {
        groups[count] = (v & 0x7F) as u8;
        count += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let cont = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | cont);
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::from_slice(&arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_trapd::oid;
///
/// let trap_oid = oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0);
/// assert_eq!(trap_oid.to_string(), "1.3.6.1.6.3.1.1.4.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
