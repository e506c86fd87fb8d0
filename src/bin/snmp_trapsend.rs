//! snmp-trapsend: Send one SNMPv2c trap.
//!
//! A test companion for snmp-trapd. Fire-and-forget: traps are never
//! acknowledged, so success only means the datagram left this host.

use clap::Parser;
use snmp_trapd::cli::args::{LogArgs, SendArgs};
use snmp_trapd::{CommunityMessage, TrapV2Pdu};
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::net::UdpSocket;

/// Send an SNMPv2c trap.
#[derive(Debug, Parser)]
#[command(name = "snmp-trapsend", version, about)]
struct Args {
    #[command(flatten)]
    send: SendArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.log.init_tracing();

    let target = match args.send.target_addr().await {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pdu = TrapV2Pdu::new(
        args.send.request_id,
        args.send.uptime,
        args.send.trap_oid.clone(),
        args.send.vars.clone(),
    );
    let datagram = CommunityMessage::v2c(args.send.community.clone().into_bytes(), pdu).encode();

    match send(target, &datagram).await {
        Ok(()) => {
            tracing::debug!(
                snmp.target = %target,
                snmp.bytes = datagram.len(),
                "trap sent"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error sending to {}: {}", target, e);
            ExitCode::FAILURE
        }
    }
}

async fn send(target: SocketAddr, datagram: &[u8]) -> std::io::Result<()> {
    let local: SocketAddr = if target.is_ipv6() {
        "[::]:0".parse().map_err(std::io::Error::other)?
    } else {
        "0.0.0.0:0".parse().map_err(std::io::Error::other)?
    };
    let socket = UdpSocket::bind(local).await?;
    socket.send_to(datagram, target).await?;
    Ok(())
}
