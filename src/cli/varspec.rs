//! `OID=TYPE:VALUE` binding specs for `snmp-trapsend`.
//!
//! Type letters follow net-snmp's `snmptrap`:
//!
//! | Letter | Type |
//! |--------|------|
//! | `i` | INTEGER |
//! | `s` | OCTET STRING (text) |
//! | `x` | OCTET STRING (hex) |
//! | `o` | OBJECT IDENTIFIER |
//! | `a` | IpAddress |
//! | `c` | Counter32 |
//! | `g` | Gauge32 |
//! | `t` | TimeTicks |
//! | `C` | Counter64 |
//! | `n` | NULL |

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::error::Error;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// Why a binding spec could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum VarSpecError {
    #[error("expected OID=TYPE:VALUE, got '{0}'")]
    Syntax(String),

    #[error(transparent)]
    Oid(#[from] Error),

    #[error("unknown type '{0}', expected one of i s x o a c g t C n")]
    UnknownType(String),

    #[error("invalid {kind} value '{value}'")]
    InvalidValue { kind: &'static str, value: String },
}

/// Parse a dotted OID argument.
pub fn parse_oid(s: &str) -> Result<Oid, Error> {
    Oid::parse(s)
}

/// Parse `OID=TYPE:VALUE`. A NULL may be written `OID=n` or `OID=n:`.
pub fn parse_varbind(spec: &str) -> Result<VarBind, VarSpecError> {
    let (oid, rest) = spec
        .split_once('=')
        .ok_or_else(|| VarSpecError::Syntax(spec.to_owned()))?;
    let oid = Oid::parse(oid)?;

    let (kind, value) = match rest.split_once(':') {
        Some((kind, value)) => (kind, value),
        None if rest == "n" => ("n", ""),
        None => return Err(VarSpecError::Syntax(spec.to_owned())),
    };

    Ok(VarBind::new(oid, parse_value(kind, value)?))
}

fn parse_value(kind: &str, value: &str) -> Result<Value, VarSpecError> {
    let invalid = |kind: &'static str| VarSpecError::InvalidValue {
        kind,
        value: value.to_owned(),
    };

    Ok(match kind {
        "i" => Value::Integer(value.parse().map_err(|_| invalid("INTEGER"))?),
        "s" => Value::from(value),
        "x" => Value::OctetString(parse_hex(value).ok_or_else(|| invalid("hex string"))?),
        "o" => Value::ObjectIdentifier(Oid::parse(value)?),
        "a" => Value::from(
            value
                .parse::<Ipv4Addr>()
                .map_err(|_| invalid("IpAddress"))?,
        ),
        "c" => Value::Counter32(value.parse().map_err(|_| invalid("Counter32"))?),
        "g" => Value::Gauge32(value.parse().map_err(|_| invalid("Gauge32"))?),
        "t" => Value::TimeTicks(value.parse().map_err(|_| invalid("TimeTicks"))?),
        "C" => Value::Counter64(value.parse().map_err(|_| invalid("Counter64"))?),
        "n" => Value::Null,
        other => return Err(VarSpecError::UnknownType(other.to_owned())),
    })
}

/// Hex digits with optional `0x` prefix and optional spaces or colons
/// between octets.
fn parse_hex(s: &str) -> Option<Bytes> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let digits: Vec<u8> = s
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':'))
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect::<Option<Vec<u8>>>()
        .map(Bytes::from)
}
