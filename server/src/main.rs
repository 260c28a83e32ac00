use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig, DEFAULT_MAX_SESSIONS};
use shared::DEFAULT_PORT;

/// Relay server for two-player snakes and ladders
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Maximum number of concurrent sessions
    #[clap(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        max_sessions: args.max_sessions,
    };

    let server = Server::bind(&config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
