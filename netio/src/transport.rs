//! Transport collaborator: datagram send/receive without blocking
//!
//! The engine only relies on [`Transport`]; two implementations are
//! provided. [`UdpTransport`] wraps a tokio UDP socket and is polled with
//! `try_recv_from` / `try_send_to` so a cycle never waits on the network.
//! [`LoopbackTransport`] keeps datagrams in memory and can be paired with
//! another loopback so two engines exchange PDUs without sockets.

use log::{error, info, warn};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::UdpSocket;

pub trait Transport {
    /// Acquires network resources.
    fn open(&mut self) -> io::Result<()>;

    /// Releases network resources.
    fn close(&mut self);

    /// Sends one datagram; false when it could not be sent.
    fn send(&mut self, bytes: &[u8]) -> bool;

    /// Next pending datagram, at most `max_bytes` long, or `None` when
    /// nothing is waiting.
    fn receive(&mut self, max_bytes: usize) -> Option<Vec<u8>>;
}

/// UDP transport sending to a broadcast or unicast destination
#[derive(Debug)]
pub struct UdpTransport {
    bind_addr: SocketAddr,
    destination: SocketAddr,
    broadcast: bool,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(bind_addr: SocketAddr, destination: SocketAddr, broadcast: bool) -> Self {
        Self {
            bind_addr,
            destination,
            broadcast,
            socket: None,
        }
    }

    /// Address the socket is bound to once open
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn set_destination(&mut self, destination: SocketAddr) {
        self.destination = destination;
    }
}

impl Transport for UdpTransport {
    /// Must be called from within a tokio runtime.
    fn open(&mut self) -> io::Result<()> {
        let socket = std::net::UdpSocket::bind(self.bind_addr)?;
        socket.set_nonblocking(true)?;
        socket.set_broadcast(self.broadcast)?;
        let socket = UdpSocket::from_std(socket)?;
        info!(
            "UDP transport bound to {} sending to {}",
            socket.local_addr()?,
            self.destination
        );
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            info!("UDP transport closed");
        }
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        let Some(socket) = self.socket.as_ref() else {
            return false;
        };
        match socket.try_send_to(bytes, self.destination) {
            Ok(sent) => sent == bytes.len(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                warn!("Send buffer full, dropping {} byte datagram", bytes.len());
                false
            }
            Err(e) => {
                error!("Failed to send to {}: {}", self.destination, e);
                false
            }
        }
    }

    fn receive(&mut self, max_bytes: usize) -> Option<Vec<u8>> {
        let socket = self.socket.as_ref()?;
        let mut buffer = vec![0u8; max_bytes];
        match socket.try_recv_from(&mut buffer) {
            Ok((len, _addr)) => {
                buffer.truncate(len);
                Some(buffer)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                error!("Error receiving datagram: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Default)]
struct Queues {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    open: bool,
}

fn lock(queues: &Mutex<Queues>) -> MutexGuard<'_, Queues> {
    queues.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory transport; clones share the same queues
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    local: Arc<Mutex<Queues>>,
    peer: Option<Arc<Mutex<Queues>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two transports where whatever one sends the other receives.
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Mutex::new(Queues::default()));
        let b = Arc::new(Mutex::new(Queues::default()));
        (
            Self {
                local: Arc::clone(&a),
                peer: Some(Arc::clone(&b)),
            },
            Self {
                local: b,
                peer: Some(a),
            },
        )
    }

    /// Queues a datagram for `receive`.
    pub fn inject(&self, datagram: Vec<u8>) {
        lock(&self.local).inbound.push_back(datagram);
    }

    /// Drains everything sent so far.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut lock(&self.local).sent)
    }

    /// Datagrams waiting to be received
    pub fn pending(&self) -> usize {
        lock(&self.local).inbound.len()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.local).open
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self) -> io::Result<()> {
        lock(&self.local).open = true;
        Ok(())
    }

    fn close(&mut self) {
        lock(&self.local).open = false;
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        {
            let mut local = lock(&self.local);
            if !local.open {
                return false;
            }
            local.sent.push(bytes.to_vec());
        }
        if let Some(peer) = &self.peer {
            lock(peer).inbound.push_back(bytes.to_vec());
        }
        true
    }

    fn receive(&mut self, max_bytes: usize) -> Option<Vec<u8>> {
        let mut local = lock(&self.local);
        if !local.open {
            return None;
        }
        let mut datagram = local.inbound.pop_front()?;
        // Datagram sockets discard what does not fit
        datagram.truncate(max_bytes);
        Some(datagram)
    }
}
