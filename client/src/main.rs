use clap::Parser;
use client::network::{self, Verdict};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    info!("Controls: type -2..2 and Enter to move, 0 to show the board");

    let client = network::Client::connect(&args.server).await?;
    let verdict = client.run().await?;

    match verdict {
        Some(Verdict::Won) => info!("Game over, you won"),
        Some(Verdict::Lost { .. }) => info!("Game over, you lost"),
        None => info!("Server closed the connection"),
    }

    Ok(())
}
