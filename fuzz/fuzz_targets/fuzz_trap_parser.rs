#![no_main]

use std::net::SocketAddr;

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_trapd::emit::EventEmitter;
use snmp_trapd::event::TrapEvent;
use snmp_trapd::message::{CommunityMessage, TrapMessage};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);
    let source: SocketAddr = ([192, 0, 2, 7], 54321).into();

    let _ = CommunityMessage::decode(bytes.clone());

    // The full receive path short of the socket and community check
    if let Ok(msg) = TrapMessage::decode(bytes, source)
        && let Ok(event) = TrapEvent::from_message(&msg, 0)
    {
        let _ = EventEmitter::to_line(&event);
    }
});
