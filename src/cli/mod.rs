//! CLI support for the `snmp-trapd` and `snmp-trapsend` binaries.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod varspec;
