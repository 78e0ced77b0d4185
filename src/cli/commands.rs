use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hashlink-node", about = "Run a peer-to-peer ledger node")]
pub struct Opt {
    #[arg(long, help = "Port to listen on (default 2001, or NODE_PORT)")]
    pub port: Option<u16>,
    #[arg(
        long,
        num_args = 0..,
        help = "Peers to dial at startup, as PORT or HOST:PORT; the first supplies the chain"
    )]
    pub peers: Option<Vec<String>>,
    #[arg(long, help = "Leading hex zeros required on block hashes (default 5)")]
    pub difficulty: Option<usize>,
    #[arg(long, help = "TOML file with node settings")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Validate the chain received from the first peer before adopting it")]
    pub validate_snapshot: bool,
}

/// One line of operator input from the interactive menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    ShowChain,
    SubmitBlock(String),
    Shutdown,
}

impl MenuCommand {
    /// `1` shows the chain, `2 <data>` mines a block, `3` stops the node.
    pub fn parse(line: &str) -> Option<MenuCommand> {
        let line = line.trim();
        let (choice, rest) = match line.split_once(char::is_whitespace) {
            Some((choice, rest)) => (choice, rest.trim()),
            None => (line, ""),
        };
        match choice {
            "1" => Some(MenuCommand::ShowChain),
            "2" => Some(MenuCommand::SubmitBlock(rest.to_string())),
            "3" => Some(MenuCommand::Shutdown),
            _ => None,
        }
    }
}
