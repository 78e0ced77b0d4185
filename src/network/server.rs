//! Connection threads: one accept loop per node and one receive loop per
//! peer connection, inbound or outbound.

use crate::error::Result;
use crate::network::message::{Handshake, Package, PackageReader};
use crate::network::node::Node;
use crate::network::peer::{PeerConnection, PeerId};
use log::{debug, error, info, warn};
use std::net::{TcpListener, TcpStream};
use std::thread;

pub(crate) fn spawn_accept_loop(node: Node, listener: TcpListener) {
    thread::spawn(move || run_accept_loop(node, listener));
}

pub(crate) fn spawn_receive_loop(node: Node, id: PeerId, reader: PackageReader) {
    thread::spawn(move || run_receive_loop(node, id, reader));
}

fn run_accept_loop(node: Node, listener: TcpListener) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let node = node.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_inbound(node, stream) {
                        warn!("Inbound connection dropped: {e}");
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {e}");
            }
        }
    }
}

/// Reads the handshake, answers a chain request and registers the peer.
/// The snapshot is sent while holding the node lock, so no block accepted
/// after the snapshot can miss this peer's broadcast.
fn handle_inbound(node: Node, stream: TcpStream) -> Result<()> {
    let (conn, mut reader) = PeerConnection::open(stream, node.write_timeout())?;
    let addr = conn.addr();
    info!("Accepted connection from {addr}");

    let handshake = reader.next_package()?;

    let id = {
        let mut state = node.lock();
        match handshake {
            Ok(Package::Handshake(Handshake::ChainRequested)) => {
                let blocks = state.ledger.blocks().to_vec();
                info!("Sending chain of {} blocks to {addr}", blocks.len());
                conn.send(&Package::ChainSnapshot { blocks })?;
            }
            Ok(Package::Handshake(Handshake::NoChainRequest)) => {}
            Ok(other) => {
                warn!(
                    "Protocol violation from {addr}: expected Handshake, got {}",
                    other.kind()
                );
            }
            Err(e) => warn!("{e} (from {addr}, expected Handshake)"),
        }
        state.peers.register(conn)
    };

    run_receive_loop(node, id, reader);
    Ok(())
}

/// Runs until the transport errors or closes, then unregisters the peer.
fn run_receive_loop(node: Node, id: PeerId, mut reader: PackageReader) {
    loop {
        match reader.next_package() {
            Ok(Ok(Package::BlockAnnounce { block })) => {
                debug!("Block {} announced by {id}", block.get_hash());
                node.accept_block(block);
            }
            Ok(Ok(other)) => {
                warn!("Protocol violation from {id}: unexpected {}", other.kind());
            }
            Ok(Err(e)) => warn!("{e} (from {id})"),
            Err(e) => {
                info!("Connection {id} ended: {e}");
                break;
            }
        }
    }
    node.remove_peer(id);
}
