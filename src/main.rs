//! Microchain node CLI
//!
//! Runs the HTTP node or a mining benchmark.

use clap::{Parser, Subcommand};
use log::{error, info};
use microchain::api::{create_router, ApiState};
use microchain::core::Blockchain;
use microchain::mining::TransactionPool;
use microchain::network::PubSub;
use microchain::wallet::Wallet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "microchain")]
#[command(version)]
#[command(about = "A minimal proof-of-work blockchain node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP node
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Mine a run of empty blocks and report how the difficulty retargets
    Bench {
        /// Number of blocks to mine
        #[arg(short, long, default_value = "20")]
        blocks: u32,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            if let Err(reason) = serve(port).await {
                error!("server error: {reason}");
                std::process::exit(1);
            }
        }
        Commands::Bench { blocks } => bench(blocks),
    }
}

async fn serve(port: u16) -> std::io::Result<()> {
    let blockchain = Arc::new(RwLock::new(Blockchain::new()));
    let pool = Arc::new(RwLock::new(TransactionPool::new()));
    let wallet = Arc::new(RwLock::new(Wallet::new()));
    let pubsub = Arc::new(PubSub::new(blockchain.clone(), pool.clone()));

    info!("node wallet address: {}", wallet.read().await.public_key());

    let state = ApiState {
        blockchain,
        pool,
        wallet,
        pubsub,
    };
    let router = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router).await
}

/// Mine `blocks` empty blocks back to back and print per-block timings.
///
/// With back-to-back mining each block lands well under the target rate, so
/// the difficulty climbs until a block takes longer than the rate, then
/// oscillates around equilibrium.
fn bench(blocks: u32) {
    let mut blockchain = Blockchain::new();
    let mut times = Vec::new();

    for _ in 0..blocks {
        let previous_timestamp = blockchain.last_block().timestamp;
        let block = blockchain.add_block(vec![]);

        let elapsed = block.timestamp - previous_timestamp;
        let difficulty = block.difficulty;
        times.push(elapsed);
        let average = times.iter().sum::<i64>() as f64 / times.len() as f64;

        println!(
            "time to mine block: {elapsed}ms, difficulty: {difficulty}, average: {average:.1}ms"
        );
    }
}
