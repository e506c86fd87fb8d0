//! Common test fixtures and constants.

use bytes::Bytes;
use snmp_trapd::{CommunityMessage, Oid, TrapPdu, TrapV1Pdu, TrapV2Pdu, Value, VarBind, Version, oid};

// =============================================================================
// Well-known OIDs
// =============================================================================

pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn snmp_trap_oid() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
}
pub fn if_index(n: u32) -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1).child(&[n])
}

/// linkDown: 1.3.6.1.6.3.1.1.5.3
pub fn link_down() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)
}

/// net-snmp example notification: 1.3.6.1.4.1.8072.2.3.0.1
pub fn net_snmp_example_notification() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072, 2, 3, 0, 1)
}

/// net-snmp enterprise: 1.3.6.1.4.1.8072
pub fn net_snmp_enterprise() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072)
}

// =============================================================================
// Communities
// =============================================================================

pub const COMMUNITY: &str = "public";
pub const OTHER_COMMUNITY: &str = "monitoring";
pub const WRONG_COMMUNITY: &str = "private";

// =============================================================================
// Datagram builders
// =============================================================================

/// A v2c trap with the two mandatory bindings followed by `extra`.
pub fn v2c_trap(community: &str, uptime: u32, trap_oid: Oid, extra: Vec<VarBind>) -> Bytes {
    CommunityMessage::v2c(
        community.as_bytes().to_vec(),
        TrapV2Pdu::new(1, uptime, trap_oid, extra),
    )
    .encode()
}

/// A v2c trap carrying exactly `varbinds`, mandatory or not.
pub fn v2c_raw(community: &str, varbinds: Vec<VarBind>) -> Bytes {
    CommunityMessage::v2c(
        community.as_bytes().to_vec(),
        TrapV2Pdu {
            request_id: 1,
            varbinds,
        },
    )
    .encode()
}

/// The datagram from the documented scenario: uptime 123456, the net-snmp
/// example notification, and one string binding.
pub fn scenario_trap() -> Bytes {
    v2c_trap(
        COMMUNITY,
        123456,
        net_snmp_example_notification(),
        vec![VarBind::new(sys_uptime(), Value::from("hello"))],
    )
}

/// A v1 linkDown trap from 192.0.2.10.
pub fn v1_link_down(community: &str) -> Bytes {
    CommunityMessage {
        version: Version::V1,
        community: Bytes::copy_from_slice(community.as_bytes()),
        pdu: TrapPdu::V1(TrapV1Pdu {
            enterprise: net_snmp_enterprise(),
            agent_addr: [192, 0, 2, 10],
            generic_trap: 2,
            specific_trap: 0,
            time_stamp: 4200,
            varbinds: vec![VarBind::new(if_index(2), Value::Integer(2))],
        }),
    }
    .encode()
}

/// A v2c GetRequest for sysUpTime.0, hand-assembled since the crate only
/// encodes traps.
pub fn get_request(community: &str) -> Vec<u8> {
    let oid = [0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00];
    let mut varbind = vec![0x30, (oid.len() + 2) as u8];
    varbind.extend_from_slice(&oid);
    varbind.extend_from_slice(&[0x05, 0x00]);
    let mut list = vec![0x30, varbind.len() as u8];
    list.extend(varbind);

    let mut pdu_body = vec![0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00];
    pdu_body.extend(list);
    let mut pdu = vec![0xA0, pdu_body.len() as u8];
    pdu.extend(pdu_body);

    let mut body = vec![0x02, 0x01, 0x01, 0x04, community.len() as u8];
    body.extend_from_slice(community.as_bytes());
    body.extend(pdu);
    let mut msg = vec![0x30, body.len() as u8];
    msg.extend(body);
    msg
}
