//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use snmp_trapd::prelude::*;
//! ```
//!
//! This imports the receiver and its builder, the trap and event types,
//! [`Error`] and [`Result`], and the [`oid!`] macro.

pub use crate::emit::EventEmitter;
pub use crate::error::{Error, Result};
pub use crate::event::TrapEvent;
pub use crate::message::TrapMessage;
pub use crate::oid::Oid;
pub use crate::receiver::{ReceiverState, ReceiverStats, TrapReceiver, TrapReceiverBuilder};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
