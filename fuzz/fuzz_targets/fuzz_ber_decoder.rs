#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_trapd::ber::Decoder;
use snmp_trapd::value::Value;
use snmp_trapd::varbind::{VarBind, decode_varbind_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // BER primitives
    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_sequence();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_ip_address();

    // Every value type, rendered the way the output does
    let mut decoder = Decoder::new(bytes.clone());
    if let Ok(value) = Value::decode(&mut decoder) {
        let _ = value.render();
    }

    let mut decoder = Decoder::new(bytes.clone());
    let _ = VarBind::decode(&mut decoder);

    let mut decoder = Decoder::new(bytes);
    let _ = decode_varbind_list(&mut decoder);
});
