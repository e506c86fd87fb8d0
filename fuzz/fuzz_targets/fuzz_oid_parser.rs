#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_trapd::oid::Oid;

fuzz_target!(|data: &[u8]| {
    // BER content octets
    if let Ok(oid) = Oid::decode_ber(data) {
        // Whatever decodes must display as something that parses back
        let _ = Oid::parse(&oid.to_string());
    }

    // Dotted notation
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Oid::parse(s);
    }
});
