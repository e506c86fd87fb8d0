//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Create and bind the trap listening socket.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` so `[::]:162` also takes
/// IPv4 traps. `SO_REUSEADDR` is set so a restarted daemon can rebind at
/// once. The receive buffer request may be capped by the kernel at
/// `net.core.rmem_max`; a refused request is not an error.
///
/// Any failure is reported as [`Error::Bind`].
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> Result<UdpSocket> {
    configure_and_bind(addr, recv_buffer_size).map_err(|source| Error::Bind { addr, source })
}

fn configure_and_bind(addr: SocketAddr, recv_buffer_size: Option<usize>) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    socket.set_reuse_address(true)?;

    if let Some(size) = recv_buffer_size
        && let Err(e) = socket.set_recv_buffer_size(size)
    {
        tracing::warn!(
            snmp.recv_buffer_size = size,
            error = %e,
            "could not set socket receive buffer size"
        );
    }

    // Must be non-blocking before handing to tokio
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}
