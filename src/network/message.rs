use crate::core::Block;
use crate::error::{LedgerError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Deserializer, StreamDeserializer, Value};
use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;

/// First message a dialing node sends on a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handshake {
    ChainRequested,
    NoChainRequest,
}

/// Everything that travels between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Package {
    Handshake(Handshake),
    ChainSnapshot { blocks: Vec<Block> },
    BlockAnnounce { block: Block },
}

impl Package {
    pub fn kind(&self) -> &'static str {
        match self {
            Package::Handshake(_) => "Handshake",
            Package::ChainSnapshot { .. } => "ChainSnapshot",
            Package::BlockAnnounce { .. } => "BlockAnnounce",
        }
    }

    /// Writes the package as one JSON object, buffered into a single flush.
    pub fn send_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to send {}: {e}", self.kind())))?;
        writer
            .flush()
            .map_err(|e| LedgerError::TransportFailure(format!("Failed to flush: {e}")))
    }
}

type FrameStream = StreamDeserializer<'static, serde_json::de::IoRead<BufReader<TcpStream>>, Value>;

/// Read half of a peer connection.
///
/// Frames are JSON objects written back to back. Each frame is first read
/// as a generic value so a well-formed but unknown message can be skipped
/// without losing the stream.
pub struct PackageReader {
    frames: FrameStream,
}

impl PackageReader {
    pub fn new(stream: TcpStream) -> PackageReader {
        PackageReader {
            frames: Deserializer::from_reader(BufReader::new(stream)).into_iter::<Value>(),
        }
    }

    /// Blocks until the next frame.
    ///
    /// Outer error: the transport is gone (`TransportFailure`), including a
    /// clean close. Inner error: the frame arrived but is not a `Package`
    /// (`ProtocolViolation`); the stream is still usable.
    pub fn next_package(&mut self) -> Result<Result<Package>> {
        let frame = match self.frames.next() {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                return Err(LedgerError::TransportFailure(format!(
                    "Failed to read frame: {e}"
                )))
            }
            None => {
                return Err(LedgerError::TransportFailure(
                    "Connection closed by peer".to_string(),
                ))
            }
        };

        debug!("Read frame ending at byte {}", self.frames.byte_offset());
        Ok(serde_json::from_value::<Package>(frame)
            .map_err(|e| LedgerError::ProtocolViolation(format!("Unrecognized message: {e}"))))
    }
}
