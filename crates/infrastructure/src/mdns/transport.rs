//! Multicast UDP sockets (RFC 6762 §3: 224.0.0.251:5353).

use super::wire::{self, WireError};
use mdnsd_domain::{InterfaceInfo, Message};
use rustc_hash::FxHashMap;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info};

pub const MDNS_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
pub const MDNS_PORT: u16 = 5353;
pub const MULTICAST_TTL: u32 = 255;

pub fn mdns_group_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(MDNS_GROUP, MDNS_PORT))
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No socket for interface {0}")]
    UnknownInterface(String),

    #[error("Failed to encode packet: {0}")]
    Encode(#[from] WireError),

    #[error("Socket error on {iface}: {source}")]
    Io {
        iface: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where the engine hands finished packets.
pub trait PacketSink: Send {
    /// Sends `msg` out of `iface`: multicast to the mDNS group when `dest`
    /// is `None`, otherwise unicast to `dest`.
    fn send(
        &mut self,
        iface: &str,
        dest: Option<SocketAddr>,
        msg: &Message,
    ) -> Result<(), TransportError>;
}

/// Opens a UDP socket bound to the mDNS port, joined to the group on the
/// interface's address.
pub fn open_multicast_socket(
    info: &InterfaceInfo,
    multicast_loop: bool,
) -> Result<UdpSocket, TransportError> {
    let io = |source| TransportError::Io {
        iface: info.name.clone(),
        source,
    };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(io)?;
    socket.set_reuse_address(true).map_err(io)?;
    #[cfg(unix)]
    socket.set_reuse_port(true).map_err(io)?;

    let bind = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, MDNS_PORT);
    socket.bind(&SockAddr::from(bind)).map_err(io)?;
    socket
        .join_multicast_v4(&MDNS_GROUP, &info.address)
        .map_err(io)?;
    socket.set_multicast_if_v4(&info.address).map_err(io)?;
    socket.set_multicast_ttl_v4(MULTICAST_TTL).map_err(io)?;
    socket.set_multicast_loop_v4(multicast_loop).map_err(io)?;
    socket.set_nonblocking(true).map_err(io)?;

    let std_socket: std::net::UdpSocket = socket.into();
    let socket = UdpSocket::from_std(std_socket).map_err(io)?;

    info!(iface = %info.name, address = %info.address, "Joined mDNS group");
    Ok(socket)
}

/// Sends through one socket per interface without waiting: a full send
/// buffer is reported as an error and retried by the caller's timer.
#[derive(Default)]
pub struct MulticastSink {
    sockets: FxHashMap<String, Arc<UdpSocket>>,
}

impl MulticastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iface: &str, socket: Arc<UdpSocket>) {
        self.sockets.insert(iface.to_string(), socket);
    }

    pub fn remove(&mut self, iface: &str) -> Option<Arc<UdpSocket>> {
        self.sockets.remove(iface)
    }
}

impl PacketSink for MulticastSink {
    fn send(
        &mut self,
        iface: &str,
        dest: Option<SocketAddr>,
        msg: &Message,
    ) -> Result<(), TransportError> {
        let socket = self
            .sockets
            .get(iface)
            .ok_or_else(|| TransportError::UnknownInterface(iface.to_string()))?;
        let bytes = wire::encode(msg)?;
        let dest = dest.unwrap_or_else(mdns_group_addr);

        socket
            .try_send_to(&bytes, dest)
            .map_err(|source| TransportError::Io {
                iface: iface.to_string(),
                source,
            })?;

        debug!(iface = %iface, dest = %dest, bytes = bytes.len(), "Packet sent");
        Ok(())
    }
}
