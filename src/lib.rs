//! SNMPv1/v2c trap receiver.
//!
//! Listens on a UDP socket, decodes each datagram as an SNMP trap, checks
//! its community string against an accepted set, and writes one JSON object
//! per trap to an output stream (stdout by default).
//!
//! ```json
//! {"timestamp":1700000000,"remote_ip":"10.0.0.5","remote_port":54321,"trapType":"v2","trap_oid":"1.3.6.1.6.3.1.1.5.3","uptime":"123456","Binds":{"1.3.6.1.2.1.2.2.1.1.2":"2"}}
//! ```
//!
//! SNMPv1 traps are translated to the SNMPv2 binding layout first
//! (RFC 3584 section 3.1), so both versions produce the same record shape.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmp_trapd::{EventEmitter, TrapReceiver};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> snmp_trapd::Result<()> {
//! let receiver = TrapReceiver::builder()
//!     .bind("[::]:1162".parse().unwrap())
//!     .communities(["public", "monitoring"])
//!     .emitter(EventEmitter::stdout())
//!     .build()
//!     .await?;
//!
//! let shutdown = CancellationToken::new();
//! let stats = receiver.run(shutdown).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `snmp-trapd` daemon and `snmp-trapsend` binaries
//! - `rt-multi-thread`: multi-threaded tokio runtime

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ber;
pub mod community;
pub mod config;
pub mod emit;
pub mod error;
pub mod event;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod receiver;
pub mod value;
pub mod varbind;
pub mod version;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

pub(crate) mod util;

pub use community::CommunityValidator;
pub use config::Config;
pub use emit::EventEmitter;
pub use error::{DecodeErrorKind, Error, MalformedKind, OidErrorKind, Result};
pub use event::TrapEvent;
pub use message::{CommunityMessage, TrapMessage};
pub use oid::{MAX_OID_LEN, Oid};
pub use pdu::{GenericTrap, TrapPdu, TrapV1Pdu, TrapV2Pdu};
pub use receiver::{
    ReceiverConfig, ReceiverState, ReceiverStats, Stage, StatsHandle, TrapReceiver,
    TrapReceiverBuilder,
};
pub use value::{Value, ValueKind};
pub use varbind::{MAX_VARBINDS, VarBind};
pub use version::Version;
