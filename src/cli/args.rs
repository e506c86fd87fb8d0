//! Command-line argument groups shared by the binaries.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgAction, Args};
use tracing_subscriber::EnvFilter;

use crate::cli::varspec::{parse_oid, parse_varbind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::receiver::DEFAULT_PORT;
use crate::varbind::VarBind;

/// Diagnostic logging options.
///
/// Logs always go to stderr; stdout carries only trap events.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Increase log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log errors only. Overrides RUST_LOG.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl LogArgs {
    /// Filter directive forced by the flags, if any.
    pub fn directive(&self) -> Option<&'static str> {
        match (self.quiet, self.verbose) {
            (true, _) => Some("error"),
            (false, 0) => None,
            (false, 1) => Some("debug"),
            (false, _) => Some("trace"),
        }
    }

    /// Install the global tracing subscriber.
    pub fn init_tracing(&self) {
        let filter = match self.directive() {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// `snmp-trapd` options. Flags override the config file.
#[derive(Debug, Clone, Args)]
pub struct DaemonArgs {
    /// JSON config file.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on (default: 0.0.0.0). Use :: for dual-stack.
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// UDP port to listen on (default: 162).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Accepted community. Repeat to accept several; replaces the config
    /// file list.
    #[arg(short, long, value_name = "COMMUNITY")]
    pub community: Vec<String>,

    /// Traps processed concurrently (default: 4).
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Largest datagram accepted, bytes (default: 65535).
    #[arg(long, value_name = "BYTES")]
    pub max_message_size: Option<usize>,

    /// Socket receive buffer to request, bytes.
    #[arg(long, value_name = "BYTES")]
    pub recv_buffer_size: Option<usize>,
}

impl DaemonArgs {
    /// Build the effective configuration: file, then flags, then validation.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(addr) = self.bind {
            config.bind_address = addr;
        }
        if let Some(port) = self.port {
            config.bind_port = port;
        }
        if !self.community.is_empty() {
            config.community = self.community.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(size) = self.max_message_size {
            config.max_message_size = size;
        }
        if self.recv_buffer_size.is_some() {
            config.recv_buffer_size = self.recv_buffer_size;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `snmp-trapsend` options.
#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    /// Receiver as HOST or HOST:PORT (default port 162).
    #[arg(short, long, value_name = "HOST[:PORT]")]
    pub target: String,

    /// Community string.
    #[arg(short, long, default_value = "public")]
    pub community: String,

    /// sysUpTime.0 value, hundredths of a second.
    #[arg(short, long, default_value_t = 0)]
    pub uptime: u32,

    /// snmpTrapOID.0 value.
    #[arg(long, value_name = "OID", value_parser = parse_oid)]
    pub trap_oid: Oid,

    /// Extra binding as OID=TYPE:VALUE, TYPE one of i s o a c g t C x n.
    #[arg(long = "var", value_name = "OID=TYPE:VALUE", value_parser = parse_varbind)]
    pub vars: Vec<VarBind>,

    /// request-id field of the PDU.
    #[arg(long, default_value_t = 0)]
    pub request_id: i32,
}

impl SendArgs {
    /// Resolve the target to a socket address.
    pub async fn target_addr(&self) -> Result<SocketAddr> {
        resolve_target(&self.target).await
    }
}

/// Resolve `HOST` or `HOST:PORT`, defaulting the port to 162.
pub async fn resolve_target(target: &str) -> Result<SocketAddr> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let lookup = if target.contains(':') {
        tokio::net::lookup_host(target.to_owned())
            .await
            .map(|mut addrs| addrs.next())
    } else {
        tokio::net::lookup_host((target.to_owned(), DEFAULT_PORT))
            .await
            .map(|mut addrs| addrs.next())
    };

    lookup
        .map_err(|e| Error::config(format!("cannot resolve {}: {}", target, e)))?
        .ok_or_else(|| Error::config(format!("no address found for {}", target)))
}
