//! BER (Basic Encoding Rules) codec for SNMP traps.
//!
//! Decoding follows X.690 definite-length form, permissive where net-snmp is
//! (sign-padded unsigned integers, non-minimal lengths) and strict about
//! framing: nothing is ever read past the end of its enclosing TLV.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
