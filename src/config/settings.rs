use crate::core::DEFAULT_DIFFICULTY;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2001;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

const NODE_PORT_KEY: &str = "NODE_PORT";
const NODE_PEERS_KEY: &str = "NODE_PEERS";
const NODE_DIFFICULTY_KEY: &str = "NODE_DIFFICULTY";

/// Settings a node is constructed with. Fixed for the node's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Interface to listen on
    pub host: String,
    /// Port to listen on; 0 picks a free port
    pub port: u16,
    /// Peers dialed at startup, in order. The first reachable one supplies the chain.
    pub peers: Vec<String>,
    /// Leading hex zeros required on every block hash
    pub difficulty: usize,
    /// Run full validation on a bootstrap snapshot before adopting it
    pub validate_snapshot: bool,
    /// Write timeout for peer sockets, in milliseconds
    pub write_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            peers: Vec::new(),
            difficulty: DEFAULT_DIFFICULTY,
            validate_snapshot: false,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl NodeConfig {
    pub fn new(port: u16, peers: Vec<String>) -> NodeConfig {
        NodeConfig {
            port,
            peers,
            ..NodeConfig::default()
        }
    }

    /// Reads a TOML file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<NodeConfig> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: NodeConfig = toml::from_str(&contents)?;
        config.check()?;
        Ok(config)
    }

    /// Overrides fields from `NODE_PORT`, `NODE_PEERS` (space or comma
    /// separated) and `NODE_DIFFICULTY` when they are set.
    pub fn apply_env(mut self) -> Result<NodeConfig> {
        if let Ok(port) = env::var(NODE_PORT_KEY) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| LedgerError::Config(format!("Invalid {NODE_PORT_KEY} {port}: {e}")))?;
        }
        if let Ok(peers) = env::var(NODE_PEERS_KEY) {
            self.peers = peers
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(difficulty) = env::var(NODE_DIFFICULTY_KEY) {
            self.difficulty = difficulty.trim().parse().map_err(|e| {
                LedgerError::Config(format!("Invalid {NODE_DIFFICULTY_KEY} {difficulty}: {e}"))
            })?;
        }
        self.check()?;
        Ok(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Peer addresses in `host:port` form. A bare port means the local host.
    pub fn peer_addrs(&self) -> Result<Vec<String>> {
        self.peers.iter().map(|peer| normalize_peer_addr(peer)).collect()
    }

    /// Rejects settings a node cannot run with.
    pub fn check(&self) -> Result<()> {
        // a SHA-256 hex digest has 64 characters
        if self.difficulty > 64 {
            return Err(LedgerError::Config(format!(
                "Difficulty {} exceeds 64 hex characters",
                self.difficulty
            )));
        }
        if self.write_timeout_ms == 0 {
            return Err(LedgerError::Config(
                "write_timeout_ms must be greater than 0".to_string(),
            ));
        }
        self.peer_addrs()?;
        Ok(())
    }
}

fn normalize_peer_addr(peer: &str) -> Result<String> {
    let peer = peer.trim();
    if let Ok(port) = peer.parse::<u16>() {
        return Ok(format!("{DEFAULT_HOST}:{port}"));
    }
    match peer.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(peer.to_string())
        }
        _ => Err(LedgerError::Config(format!("Invalid peer address: {peer}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.difficulty, 5);
        assert!(config.peers.is_empty());
        assert!(!config.validate_snapshot);
        assert_eq!(config.listen_addr(), "127.0.0.1:2001");
    }

    #[test]
    fn test_peer_address_normalization() {
        let config = NodeConfig::new(2002, vec!["2001".to_string(), "10.0.0.5:7000".to_string()]);
        assert_eq!(
            config.peer_addrs().unwrap(),
            vec!["127.0.0.1:2001".to_string(), "10.0.0.5:7000".to_string()]
        );
    }

    #[test]
    fn test_invalid_peer_address() {
        let config = NodeConfig::new(2002, vec!["not-an-address".to_string()]);
        assert!(matches!(config.peer_addrs(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 3001\npeers = [\"3000\"]\ndifficulty = 2\nvalidate_snapshot = true"
        )
        .unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.peers, vec!["3000".to_string()]);
        assert_eq!(config.difficulty, 2);
        assert!(config.validate_snapshot);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.write_timeout_ms, DEFAULT_WRITE_TIMEOUT_MS);
    }

    #[test]
    fn test_load_rejects_excessive_difficulty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 65").unwrap();
        assert!(matches!(
            NodeConfig::load(file.path()),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_check_rejects_zero_write_timeout() {
        let config = NodeConfig {
            write_timeout_ms: 0,
            ..NodeConfig::default()
        };
        assert!(matches!(config.check(), Err(LedgerError::Config(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "write_timeout_ms = 0").unwrap();
        assert!(matches!(
            NodeConfig::load(file.path()),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_check_accepts_full_length_difficulty() {
        let config = NodeConfig {
            difficulty: 64,
            ..NodeConfig::default()
        };
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = NodeConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }
}
