//! Trap normalization.
//!
//! Turns a [`TrapMessage`] into the flat record written to the output
//! stream. The JSON field names are part of the output contract consumed by
//! downstream log collectors and must not change.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::TrapMessage;

/// Value of the `trapType` field. Translated SNMPv1 traps share it.
pub const TRAP_TYPE: &str = "v2";

/// One normalized trap.
///
/// Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapEvent {
    /// Receive time, unix seconds.
    pub timestamp: u64,
    pub remote_ip: String,
    pub remote_port: u16,
    #[serde(rename = "trapType")]
    pub trap_type: String,
    pub trap_oid: String,
    pub uptime: String,
    /// Bindings after the first two, keyed by dotted OID. Sorted; on a
    /// repeated OID the later binding wins.
    #[serde(rename = "Binds")]
    pub binds: BTreeMap<String, String>,
}

impl TrapEvent {
    /// Normalize a trap using an explicit receive timestamp.
    ///
    /// Fails with `MissingMandatoryBindings` when the trap lacks the two
    /// leading sysUpTime / snmpTrapOID bindings; nothing partial is built.
    pub fn from_message(msg: &TrapMessage, timestamp: u64) -> Result<Self> {
        let [uptime, trap_oid, rest @ ..] = msg.varbinds.as_slice() else {
            return Err(Error::decode(
                0,
                DecodeErrorKind::MissingMandatoryBindings {
                    count: msg.varbinds.len(),
                },
            ));
        };

        let binds = rest
            .iter()
            .map(|vb| (vb.oid.to_string(), vb.value.render()))
            .collect();

        Ok(Self {
            timestamp,
            remote_ip: msg.source.ip().to_string(),
            remote_port: msg.source.port(),
            trap_type: TRAP_TYPE.to_owned(),
            trap_oid: trap_oid.value.render(),
            uptime: uptime.value.render(),
            binds,
        })
    }

    /// Normalize a trap, stamping it with the current wall-clock time.
    pub fn normalize(msg: &TrapMessage) -> Result<Self> {
        Self::from_message(msg, unix_now())
    }
}

/// Current time in unix seconds. A clock before the epoch reads as zero.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
