//! Peer-to-peer networking
//!
//! Direct TCP connections between nodes: the handshake and block
//! messages, the registry of live connections, the node that ties the
//! ledger to its peers, and the threads that serve each connection.

pub mod message;
pub mod node;
pub mod peer;
mod server;

pub use message::{Handshake, Package, PackageReader};
pub use node::Node;
pub use peer::{PeerConnection, PeerId, PeerRegistry};
