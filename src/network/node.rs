use crate::config::NodeConfig;
use crate::core::{Block, Ledger, ProofOfWork};
use crate::error::{LedgerError, Result};
use crate::network::message::{Handshake, Package};
use crate::network::peer::{PeerConnection, PeerId, PeerRegistry};
use crate::network::server;
use crate::utils::hashing_self_test;
use log::{debug, info, warn};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Everything connection threads and submitters share. One mutex guards
/// both so that an append and the broadcast that follows it see the same
/// peer set.
pub(crate) struct NodeState {
    pub(crate) ledger: Ledger,
    pub(crate) peers: PeerRegistry,
}

struct Shared {
    state: Mutex<NodeState>,
    difficulty: usize,
    validate_snapshot: bool,
    write_timeout: Duration,
    local_addr: SocketAddr,
}

/// A ledger node: one local chain, a set of peer connections and a
/// listening socket. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Node {
    shared: Arc<Shared>,
}

impl Node {
    /// Binds the listener, bootstraps the ledger and starts accepting peers.
    ///
    /// With no peers the ledger starts as `[Genesis]`. Otherwise peers are
    /// dialed in order; the first one that answers supplies the chain and
    /// the rest are told no chain is needed. Fails if no peer supplied one.
    pub fn new(config: NodeConfig) -> Result<Node> {
        config.check()?;
        hashing_self_test()?;
        let peer_addrs = config.peer_addrs()?;

        let listen_addr = config.listen_addr();
        let listener = TcpListener::bind(&listen_addr).map_err(|e| {
            LedgerError::TransportFailure(format!("Failed to bind to {listen_addr}: {e}"))
        })?;
        let local_addr = listener.local_addr()?;

        let node = Node {
            shared: Arc::new(Shared {
                state: Mutex::new(NodeState {
                    ledger: Ledger::empty(),
                    peers: PeerRegistry::new(),
                }),
                difficulty: config.difficulty,
                validate_snapshot: config.validate_snapshot,
                write_timeout: Duration::from_millis(config.write_timeout_ms),
                local_addr,
            }),
        };

        if peer_addrs.is_empty() {
            node.lock().ledger = Ledger::with_genesis()?;
            info!("No peers given, starting a new ledger");
        } else {
            node.bootstrap(&peer_addrs)?;
        }

        server::spawn_accept_loop(node.clone(), listener);
        info!(
            "Node listening on {local_addr} (difficulty {}, {} peers)",
            node.difficulty(),
            node.peer_count()
        );
        Ok(node)
    }

    /// Shorthand for a node on `127.0.0.1:port` with default settings.
    pub fn with_peers(port: u16, peers: Vec<String>) -> Result<Node> {
        Node::new(NodeConfig::new(port, peers))
    }

    fn bootstrap(&self, peer_addrs: &[String]) -> Result<()> {
        let mut has_chain = false;
        for addr in peer_addrs {
            match self.connect_peer(addr, !has_chain) {
                Ok(()) => has_chain = true,
                Err(e) => warn!("Skipping peer {addr}: {e}"),
            }
        }

        if !has_chain {
            return Err(LedgerError::TransportFailure(
                "No peer supplied a chain".to_string(),
            ));
        }
        info!("Bootstrapped ledger with {} blocks", self.lock().ledger.len());
        Ok(())
    }

    /// Dials `addr`, performs the handshake and starts the receive loop.
    fn connect_peer(&self, addr: &str, request_chain: bool) -> Result<()> {
        info!("Connecting to {addr}");
        let stream = TcpStream::connect(addr)
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to connect to {addr}: {e}")))?;
        let (conn, mut reader) = PeerConnection::open(stream, self.shared.write_timeout)?;

        let id = if request_chain {
            conn.send(&Package::Handshake(Handshake::ChainRequested))?;
            let blocks = match reader.next_package()?? {
                Package::ChainSnapshot { blocks } => blocks,
                other => {
                    return Err(LedgerError::ProtocolViolation(format!(
                        "Expected ChainSnapshot from {addr}, got {}",
                        other.kind()
                    )))
                }
            };
            let ledger = self.check_snapshot(blocks)?;

            let mut state = self.lock();
            state.ledger = ledger;
            state.peers.register(conn)
        } else {
            conn.send(&Package::Handshake(Handshake::NoChainRequest))?;
            self.lock().peers.register(conn)
        };

        server::spawn_receive_loop(self.clone(), id, reader);
        Ok(())
    }

    fn check_snapshot(&self, blocks: Vec<Block>) -> Result<Ledger> {
        let ledger = Ledger::from_blocks(blocks);
        if ledger.is_empty() {
            return Err(LedgerError::ProtocolViolation(
                "Received an empty chain snapshot".to_string(),
            ));
        }
        if self.shared.validate_snapshot && !ledger.validate(self.difficulty()) {
            return Err(LedgerError::RejectedBlock(
                "Chain snapshot fails validation".to_string(),
            ));
        }
        Ok(ledger)
    }

    /// Mines `data` on the current tip, appends it and announces it to every
    /// peer. Mining happens without the lock, so if a peer's block moves the
    /// tip in the meantime the mined block no longer links and is rejected.
    pub fn submit_block(&self, data: &str) -> Result<Block> {
        let difficulty = self.difficulty();
        self.submit_block_with(data, |candidate, tip| {
            ProofOfWork::new(candidate, difficulty).run(tip)
        })
    }

    /// [`Node::submit_block`] with the mining step supplied by the caller.
    /// `mine` runs without the lock held.
    pub(crate) fn submit_block_with<F>(&self, data: &str, mine: F) -> Result<Block>
    where
        F: FnOnce(Block, &Block) -> Block,
    {
        let candidate = Block::new(data)?;
        let tip = self.lock().ledger.tip()?.clone();

        let mined = mine(candidate, &tip);

        let mut state = self.lock();
        if !state.ledger.append_if_valid(mined.clone(), self.difficulty()) {
            return Err(LedgerError::RejectedBlock(format!(
                "Block {} does not extend tip {}",
                mined.get_hash(),
                state.ledger.tip()?.get_hash()
            )));
        }
        info!("Appended block {} at height {}", mined.get_hash(), state.ledger.len() - 1);
        state.peers.broadcast(&mined);
        Ok(mined)
    }

    /// Validation-on-receipt. Accepted blocks are re-broadcast to all peers,
    /// including the one that sent them; rejected ones are dropped.
    pub(crate) fn accept_block(&self, block: Block) -> bool {
        let mut state = self.lock();
        let hash = block.get_hash().to_string();
        if !state.ledger.append_if_valid(block.clone(), self.difficulty()) {
            debug!("Dropped block {hash}");
            return false;
        }
        info!("Accepted block {hash} at height {}", state.ledger.len() - 1);
        state.peers.broadcast(&block);
        true
    }

    /// Sends `block` to every registered peer. Returns the number of
    /// successful writes.
    pub fn broadcast(&self, block: &Block) -> usize {
        self.lock().peers.broadcast(block)
    }

    /// Unregisters a connection. Unknown ids are ignored.
    pub fn remove_peer(&self, id: PeerId) -> bool {
        self.lock().peers.remove(id)
    }

    /// Copy of the current chain, genesis first.
    pub fn chain(&self) -> Vec<Block> {
        self.lock().ledger.blocks().to_vec()
    }

    pub fn peer_count(&self) -> usize {
        self.lock().peers.len()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.lock().peers.ids()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }

    pub fn difficulty(&self) -> usize {
        self.shared.difficulty
    }

    pub(crate) fn write_timeout(&self) -> Duration {
        self.shared.write_timeout
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{start_node, test_config, wait_until, RawPeer, TEST_DIFFICULTY};

    #[test]
    fn test_node_without_peers_starts_with_genesis() {
        let node = start_node(&[]).unwrap();
        let chain = node.chain();
        assert_eq!(chain.len(), 1);
        assert!(chain[0].is_genesis());
        assert_eq!(node.peer_count(), 0);
        assert_ne!(node.local_addr().port(), 0);
    }

    #[test]
    fn test_submit_block_extends_tip() {
        let node = start_node(&[]).unwrap();
        let genesis_hash = node.chain()[0].get_hash().to_string();

        let block = node.submit_block("tx1").unwrap();
        assert_eq!(block.get_previous_hash(), genesis_hash);
        assert!(block.get_hash().starts_with('0'));

        let chain = node.chain();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], block);
    }

    #[test]
    fn test_unusable_config_fails_construction() {
        let unminable = NodeConfig {
            difficulty: 65,
            ..test_config(vec![])
        };
        assert!(matches!(Node::new(unminable), Err(LedgerError::Config(_))));

        let no_write_timeout = NodeConfig {
            write_timeout_ms: 0,
            ..test_config(vec![])
        };
        assert!(matches!(
            Node::new(no_write_timeout),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_peer_block_is_ingested_while_mining() {
        let node = start_node(&[]).unwrap();
        let mut peer = RawPeer::connect(node.local_addr(), Handshake::NoChainRequest).unwrap();
        assert!(wait_until(|| node.peer_count() == 1));

        let genesis = node.chain()[0].clone();
        let announced =
            ProofOfWork::new(Block::new("from peer").unwrap(), TEST_DIFFICULTY).run(&genesis);

        let result = node.submit_block_with("local", |candidate, tip| {
            assert_eq!(tip, &genesis);
            peer.send(&Package::BlockAnnounce {
                block: announced.clone(),
            })
            .unwrap();
            // the receive loop appends while this mine is still in progress
            assert!(wait_until(|| node.chain().len() == 2));
            ProofOfWork::new(candidate, TEST_DIFFICULTY).run(tip)
        });

        assert!(matches!(result, Err(LedgerError::RejectedBlock(_))));
        assert_eq!(node.chain(), vec![genesis, announced.clone()]);

        // nothing was broadcast for the rejected block: the flooded echo is
        // followed directly by the next local block
        let next = node.submit_block("after").unwrap();
        assert_eq!(
            peer.receive().unwrap(),
            Package::BlockAnnounce { block: announced }
        );
        assert_eq!(peer.receive().unwrap(), Package::BlockAnnounce { block: next });
    }

    #[test]
    fn test_accept_block_rejects_stale_block() {
        let node = start_node(&[]).unwrap();
        let block = node.submit_block("tx1").unwrap();

        // the same block again no longer links to the tip
        assert!(!node.accept_block(block));
        assert_eq!(node.chain().len(), 2);
    }

    #[test]
    fn test_remove_unknown_peer_is_noop() {
        let node = start_node(&[]).unwrap();
        let mut registry = PeerRegistry::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (conn, _reader) = PeerConnection::open(stream, Duration::from_secs(1)).unwrap();
        let foreign = registry.register(conn);

        assert!(!node.remove_peer(foreign));
        assert!(!node.remove_peer(foreign));
    }

    #[test]
    fn test_unreachable_sole_peer_fails_construction() {
        // grab a free port, then close it so nothing is listening there
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = Node::new(test_config(vec![port.to_string()]));
        assert!(matches!(result, Err(LedgerError::TransportFailure(_))));
    }

    #[test]
    fn test_bootstrap_skips_unreachable_peer() {
        let dead_port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = start_node(&[]).unwrap();
        source.submit_block("tx1").unwrap();

        let joiner = Node::new(test_config(vec![
            dead_port.to_string(),
            source.local_addr().to_string(),
        ]))
        .unwrap();
        assert_eq!(joiner.chain(), source.chain());
        assert_eq!(joiner.peer_count(), 1);
        assert!(wait_until(|| source.peer_count() == 1));
    }

    #[test]
    fn test_validated_snapshot_is_adopted() {
        let source = start_node(&[]).unwrap();
        source.submit_block("tx1").unwrap();

        let config = NodeConfig {
            validate_snapshot: true,
            ..test_config(vec![source.local_addr().to_string()])
        };
        let joiner = Node::new(config).unwrap();
        assert_eq!(joiner.chain(), source.chain());
    }

    #[test]
    fn test_corrupt_snapshot_fails_validated_bootstrap() {
        // a fake source that answers with a chain whose second block is forged
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = crate::network::PackageReader::new(stream.try_clone().unwrap());
            let _ = reader.next_package();
            let genesis = Block::genesis().unwrap();
            let mut forged = Block::new_test_block("tx1", 1, 0, genesis.get_hash());
            forged.tamper_data("rewritten");
            let _ = Package::ChainSnapshot {
                blocks: vec![genesis, forged],
            }
            .send_to(&stream);
            let _ = reader.next_package();
        });

        let config = NodeConfig {
            validate_snapshot: true,
            ..test_config(vec![addr.to_string()])
        };
        let result = Node::new(config);
        assert!(matches!(result, Err(LedgerError::TransportFailure(_))));
    }
}
