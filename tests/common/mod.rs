//! Shared test utilities for snmp-trapd integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod harness;

pub use fixtures::*;
pub use harness::{RunningReceiver, SharedBuf};
