use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{error, info};
use server::config::{Args, ServerConfig};
use server::network::Server;
use server::shutdown;

/// Parses command-line arguments, then runs game sessions until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => Args::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    let (trigger, shutdown) = shutdown::channel();
    let server = Server::bind(config, shutdown).await?;

    // Let the running session finish, then stop.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, no new sessions will start");
                trigger.trigger();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    if let Err(e) = server.run().await {
        error!("Fatal server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
