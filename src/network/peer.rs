use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::network::message::{Package, PackageReader};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// Opaque handle of a registered connection. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Write half of one live transport to a remote node.
pub struct PeerConnection {
    addr: SocketAddr,
    writer: TcpStream,
}

impl PeerConnection {
    /// Splits `stream` into the registry-owned writer and the reader handed
    /// to the connection's receive loop.
    pub fn open(stream: TcpStream, write_timeout: Duration) -> Result<(PeerConnection, PackageReader)> {
        let addr = stream
            .peer_addr()
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to get peer address: {e}")))?;
        stream
            .set_write_timeout(Some(write_timeout))
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to set write timeout: {e}")))?;
        let reader_stream = stream
            .try_clone()
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to clone stream: {e}")))?;

        Ok((
            PeerConnection {
                addr,
                writer: stream,
            },
            PackageReader::new(reader_stream),
        ))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn send(&self, pkg: &Package) -> Result<()> {
        pkg.send_to(&self.writer)
    }
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// The node's set of live connections, keyed by [`PeerId`].
#[derive(Default)]
pub struct PeerRegistry {
    next_id: u64,
    peers: BTreeMap<PeerId, PeerConnection>,
}

impl PeerRegistry {
    pub fn new() -> PeerRegistry {
        PeerRegistry::default()
    }

    pub fn register(&mut self, conn: PeerConnection) -> PeerId {
        let id = PeerId(self.next_id);
        self.next_id += 1;
        info!("Registered {id} at {}", conn.addr());
        self.peers.insert(id, conn);
        id
    }

    /// Removing an unknown id is a no-op and returns false.
    pub fn remove(&mut self, id: PeerId) -> bool {
        match self.peers.remove(&id) {
            Some(conn) => {
                info!("Removed {id} at {}", conn.addr());
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<PeerId> {
        self.peers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Sends `block` to every registered peer and returns how many writes
    /// succeeded. A failed write is only logged; the peer's receive loop
    /// notices the broken transport and unregisters it.
    pub fn broadcast(&self, block: &Block) -> usize {
        let pkg = Package::BlockAnnounce {
            block: block.clone(),
        };
        let mut delivered = 0;
        for (id, conn) in &self.peers {
            match conn.send(&pkg) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to send block to {id} at {}: {e}", conn.addr()),
            }
        }
        info!(
            "Block {} sent to {delivered}/{} peers",
            block.get_hash(),
            self.peers.len()
        );
        delivered
    }
}
