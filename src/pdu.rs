//! Trap PDU types.
//!
//! Two PDU forms are accepted: the SNMPv2-Trap PDU (RFC 3416) and the
//! SNMPv1 Trap-PDU (RFC 1157). The v1 form is translated into the v2 binding
//! layout (RFC 3584 section 3.1) so the rest of the pipeline only ever sees
//! one shape.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// Well-known OIDs used in trap bindings.
pub mod oids {
    use crate::oid;
    use crate::oid::Oid;

    /// sysUpTime.0
    pub fn sys_uptime() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    }

    /// snmpTrapOID.0
    pub fn snmp_trap_oid() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
    }

    /// snmpTraps, the parent of the generic trap notifications.
    pub fn snmp_traps() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5)
    }

    /// snmpTrapAddress.0
    pub fn snmp_trap_address() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 18, 1, 3, 0)
    }

    /// snmpTrapEnterprise.0
    pub fn snmp_trap_enterprise() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 3, 0)
    }
}

/// SNMPv1 generic-trap values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericTrap {
    ColdStart,
    WarmStart,
    LinkDown,
    LinkUp,
    AuthenticationFailure,
    EgpNeighborLoss,
    EnterpriseSpecific,
}

impl GenericTrap {
    /// Map a wire value. Anything outside 0..=5 is treated as
    /// enterprise-specific, which is how agents in the wild use it.
    pub const fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::ColdStart,
            1 => Self::WarmStart,
            2 => Self::LinkDown,
            3 => Self::LinkUp,
            4 => Self::AuthenticationFailure,
            5 => Self::EgpNeighborLoss,
            _ => Self::EnterpriseSpecific,
        }
    }

    /// Wire value.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::ColdStart => 0,
            Self::WarmStart => 1,
            Self::LinkDown => 2,
            Self::LinkUp => 3,
            Self::AuthenticationFailure => 4,
            Self::EgpNeighborLoss => 5,
            Self::EnterpriseSpecific => 6,
        }
    }
}

/// SNMPv2-Trap PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV2Pdu {
    pub request_id: i32,
    /// All bindings, including the leading sysUpTime.0 and snmpTrapOID.0.
    pub varbinds: Vec<VarBind>,
}

impl TrapV2Pdu {
    /// Build a trap with the two mandatory leading bindings followed by
    /// `extra`.
    pub fn new(request_id: i32, uptime: u32, trap_oid: Oid, extra: Vec<VarBind>) -> Self {
        let mut varbinds = Vec::with_capacity(extra.len() + 2);
        varbinds.push(VarBind::new(oids::sys_uptime(), Value::TimeTicks(uptime)));
        varbinds.push(VarBind::new(
            oids::snmp_trap_oid(),
            Value::ObjectIdentifier(trap_oid),
        ));
        varbinds.extend(extra);
        Self {
            request_id,
            varbinds,
        }
    }

    fn decode_body(pdu: &mut Decoder) -> Result<Self> {
        let request_id = pdu.read_integer()?;
        // error-status and error-index are always zero in a trap
        let _error_status = pdu.read_integer()?;
        let _error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(pdu)?;
        Ok(Self {
            request_id,
            varbinds,
        })
    }

    fn encode_body(&self, buf: &mut EncodeBuf) {
        encode_varbind_list(buf, &self.varbinds);
        buf.push_integer(0);
        buf.push_integer(0);
        buf.push_integer(self.request_id);
    }
}

/// SNMPv1 Trap-PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV1Pdu {
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: i32,
    pub specific_trap: i32,
    pub time_stamp: u32,
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    /// The snmpTrapOID.0 value this trap maps to.
    pub fn trap_oid(&self) -> Oid {
        match GenericTrap::from_i32(self.generic_trap) {
            GenericTrap::EnterpriseSpecific => {
                // Negative specific codes are reinterpreted as unsigned
                self.enterprise.child(&[0, self.specific_trap as u32])
            }
            generic => oids::snmp_traps().child(&[generic.as_i32() as u32 + 1]),
        }
    }

    /// Translate into the SNMPv2 binding layout.
    ///
    /// sysUpTime.0 and snmpTrapOID.0 lead, the original bindings follow, and
    /// snmpTrapAddress.0 and snmpTrapEnterprise.0 are appended.
    pub fn into_varbinds(self) -> Vec<VarBind> {
        let trap_oid = self.trap_oid();
        let mut varbinds = Vec::with_capacity(self.varbinds.len() + 4);
        varbinds.push(VarBind::new(
            oids::sys_uptime(),
            Value::TimeTicks(self.time_stamp),
        ));
        varbinds.push(VarBind::new(
            oids::snmp_trap_oid(),
            Value::ObjectIdentifier(trap_oid),
        ));
        varbinds.extend(self.varbinds);
        varbinds.push(VarBind::new(
            oids::snmp_trap_address(),
            Value::IpAddress(self.agent_addr),
        ));
        varbinds.push(VarBind::new(
            oids::snmp_trap_enterprise(),
            Value::ObjectIdentifier(self.enterprise),
        ));
        varbinds
    }

    fn decode_body(pdu: &mut Decoder) -> Result<Self> {
        let enterprise = pdu.read_oid()?;
        let agent_addr = pdu.read_ip_address()?;
        let generic_trap = pdu.read_integer()?;
        let specific_trap = pdu.read_integer()?;
        let time_stamp = pdu.read_timeticks()?;
        let varbinds = decode_varbind_list(pdu)?;
        Ok(Self {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        })
    }

    fn encode_body(&self, buf: &mut EncodeBuf) {
        encode_varbind_list(buf, &self.varbinds);
        buf.push_unsigned32(tag::application::TIMETICKS, self.time_stamp);
        buf.push_integer(self.specific_trap);
        buf.push_integer(self.generic_trap);
        buf.push_ip_address(self.agent_addr);
        buf.push_oid(&self.enterprise);
    }
}

/// A trap PDU in either form.
#[derive(Debug, Clone, PartialEq)]
pub enum TrapPdu {
    V2(TrapV2Pdu),
    V1(TrapV1Pdu),
}

impl TrapPdu {
    /// BER tag for this PDU.
    pub fn tag(&self) -> u8 {
        match self {
            TrapPdu::V2(_) => tag::pdu::TRAP_V2,
            TrapPdu::V1(_) => tag::pdu::TRAP_V1,
        }
    }

    /// Bindings in SNMPv2 layout, translating v1 traps.
    pub fn into_varbinds(self) -> Vec<VarBind> {
        match self {
            TrapPdu::V2(pdu) => pdu.varbinds,
            TrapPdu::V1(pdu) => pdu.into_varbinds(),
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.tag(), |buf| match self {
            TrapPdu::V2(pdu) => pdu.encode_body(buf),
            TrapPdu::V1(pdu) => pdu.encode_body(buf),
        });
    }

    /// Decode a PDU whose tag is `expected`.
    ///
    /// Any other PDU type is rejected before its length is examined. The
    /// PDU's declared length must match the bytes present exactly.
    pub fn decode(decoder: &mut Decoder, expected: u8) -> Result<Self> {
        let start = decoder.offset();
        let pdu_tag = decoder.read_tag()?;
        if pdu_tag != expected {
            return Err(Error::decode(
                start,
                DecodeErrorKind::UnexpectedPduType(pdu_tag),
            ));
        }

        let mut body = decoder.read_container_body()?;
        let declared = body.remaining();
        let pdu = match pdu_tag {
            tag::pdu::TRAP_V1 => TrapPdu::V1(TrapV1Pdu::decode_body(&mut body)?),
            _ => TrapPdu::V2(TrapV2Pdu::decode_body(&mut body)?),
        };
        ensure_consumed(&body, declared)?;
        Ok(pdu)
    }
}

/// Fail if a container has bytes its declared contents did not account for.
pub(crate) fn ensure_consumed(decoder: &Decoder, declared: usize) -> Result<()> {
    if decoder.is_empty() {
        return Ok(());
    }
    let remaining = decoder.remaining();
    Err(Error::decode(
        decoder.offset(),
        DecodeErrorKind::TruncatedMessage {
            declared: declared - remaining,
            available: declared,
        },
    ))
}
