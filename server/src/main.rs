use clap::Parser;
use log::{error, info};
use server::controller::SessionController;
use server::network::{NetworkServer, WsOutbound};
use server::registry::{RoomConfig, SessionRegistry};
use server::snapshot::MemorySnapshotStore;
use std::sync::Arc;

/// Main-method of the application.
/// Parses command-line arguments, wires the engine together and serves
/// WebSocket connections until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Board width in cells for freshly generated rooms
        #[clap(long, default_value_t = shared::DEFAULT_BOARD_WIDTH)]
        board_width: usize,
        /// Board height in cells for freshly generated rooms
        #[clap(long, default_value_t = shared::DEFAULT_BOARD_HEIGHT)]
        board_height: usize,
        /// Number of words hidden in each fresh board
        #[clap(long, default_value_t = shared::DEFAULT_WORD_COUNT)]
        words: usize,
    }

    env_logger::init();
    let args = Args::parse();

    let store = Arc::new(MemorySnapshotStore::new());
    let registry = Arc::new(SessionRegistry::with_config(
        store,
        RoomConfig {
            board_width: args.board_width,
            board_height: args.board_height,
            word_count: args.words,
        },
    ));
    let outbound = Arc::new(WsOutbound::new());
    let controller = Arc::new(SessionController::new(registry, outbound.clone()));

    let address = format!("{}:{}", args.host, args.port);
    let server = NetworkServer::new(&address, controller, outbound).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
