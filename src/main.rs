//! Operator entry point: parse startup flags, start the node, then serve a
//! small interactive menu on stdin until the operator shuts it down.

use clap::Parser;
use hashlink_node::{Block, MenuCommand, Node, NodeConfig, Opt};
use log::{error, LevelFilter};
use std::io::{self, BufRead, Write};
use std::process;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn build_config(opt: Opt) -> hashlink_node::Result<NodeConfig> {
    let config = match &opt.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    let mut config = config.apply_env()?;

    if let Some(port) = opt.port {
        config.port = port;
    }
    if let Some(peers) = opt.peers {
        config.peers = peers;
    }
    if let Some(difficulty) = opt.difficulty {
        config.difficulty = difficulty;
    }
    if opt.validate_snapshot {
        config.validate_snapshot = true;
    }
    Ok(config)
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(opt)?;
    let node = Node::new(config)?;
    println!("Node started on {}", node.local_addr());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("\nNODE on {}", node.local_addr());
        println!("1. Display Node's blockchain");
        println!("2. Create/mine new Block");
        println!("3. Kill Node");
        print!("Enter option: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match MenuCommand::parse(&line?) {
            Some(MenuCommand::ShowChain) => print_chain(&node.chain()),
            Some(MenuCommand::SubmitBlock(mut data)) => {
                if data.is_empty() {
                    print!("Enter information for new Block: ");
                    io::stdout().flush()?;
                    data = match lines.next() {
                        Some(line) => line?.trim().to_string(),
                        None => break,
                    };
                }
                match node.submit_block(&data) {
                    Ok(block) => println!("Block {} added", block.get_hash()),
                    Err(e) => println!("{e}"),
                }
            }
            Some(MenuCommand::Shutdown) => break,
            None => println!("Unknown option"),
        }
    }

    println!("Node killed");
    Ok(())
}

fn print_chain(chain: &[Block]) {
    for (i, block) in chain.iter().enumerate() {
        println!("Block {i}:");
        println!("  Timestamp: {}", block.get_timestamp());
        println!("  Nonce: {}", block.get_nonce());
        println!("  Data: {}", block.get_data());
        println!("  Hash: {}", block.get_hash());
        println!("  Previous Hash: {}", block.get_previous_hash());
    }
}
