//! Error handling for the ledger node
//!
//! Transport and protocol problems are contained at the connection boundary.
//! Only rejected blocks, hashing failures and startup errors reach the operator.

use std::fmt;

/// Result type alias for ledger and node operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger has no blocks yet (only possible before initialization)
    EmptyLedger,
    /// Peer unreachable at dial time, or I/O error mid-stream
    TransportFailure(String),
    /// Unexpected message shape on an established connection
    ProtocolViolation(String),
    /// Block failed validation on append
    RejectedBlock(String),
    /// The SHA-256 primitive is missing or broken
    HashingUnavailable(String),
    /// Encoding/decoding errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// Local I/O errors
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::EmptyLedger => write!(f, "Ledger is empty"),
            LedgerError::TransportFailure(msg) => write!(f, "Transport failure: {msg}"),
            LedgerError::ProtocolViolation(msg) => write!(f, "Protocol violation: {msg}"),
            LedgerError::RejectedBlock(msg) => write!(f, "Rejected block: {msg}"),
            LedgerError::HashingUnavailable(msg) => write!(f, "Hashing unavailable: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
