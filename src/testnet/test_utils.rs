//! Test utilities for node and network testing

use crate::config::NodeConfig;
use crate::error::Result;
use crate::network::{Handshake, Node, Package, PackageReader};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Easy difficulty so tests mine in microseconds
pub const TEST_DIFFICULTY: usize = 1;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Loopback config on a free port
pub fn test_config(peers: Vec<String>) -> NodeConfig {
    NodeConfig {
        port: 0,
        peers,
        difficulty: TEST_DIFFICULTY,
        ..NodeConfig::default()
    }
}

pub fn start_node(peers: &[&Node]) -> Result<Node> {
    let peers = peers
        .iter()
        .map(|node| node.local_addr().to_string())
        .collect();
    Node::new(test_config(peers))
}

/// Polls `condition` until it holds or [`WAIT_TIMEOUT`] passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

/// A bare socket speaking the wire protocol, standing in for a remote node.
pub struct RawPeer {
    pub stream: TcpStream,
    pub reader: PackageReader,
}

impl RawPeer {
    pub fn connect(addr: SocketAddr, handshake: Handshake) -> Result<RawPeer> {
        let stream = TcpStream::connect(addr)?;
        let reader = PackageReader::new(stream.try_clone()?);
        let peer = RawPeer { stream, reader };
        peer.send(&Package::Handshake(handshake))?;
        Ok(peer)
    }

    pub fn send(&self, pkg: &Package) -> Result<()> {
        pkg.send_to(&self.stream)
    }

    pub fn receive(&mut self) -> Result<Package> {
        self.reader.next_package()?
    }
}
