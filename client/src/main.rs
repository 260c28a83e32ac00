use clap::{Parser, Subcommand};
use client::game::Intent;
use client::input::Command;
use client::network::{Client, ClientConfig, DEFAULT_ANIMATION_MS};
use log::{info, warn};
use shared::PlayerInfo;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket address of the relay server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8765")]
    server: String,

    /// Name shown to the opponent
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Avatar shown next to the name
    #[arg(short = 'a', long, default_value = "🙂")]
    avatar: String,

    /// Duration of the dice and token animations in milliseconds
    #[arg(long, default_value_t = DEFAULT_ANIMATION_MS)]
    animation_ms: u64,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Create a session and wait for a guest
    Host,
    /// Join a session with its invite code
    Join { invite_code: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let intent = match args.mode {
        Mode::Host => Intent::Host,
        Mode::Join { invite_code } => Intent::Join(invite_code),
    };
    let mut config = ClientConfig::new(intent, PlayerInfo::new(args.name, args.avatar))?;
    config.server_url = args.server;
    config.animation = Duration::from_millis(args.animation_ms);

    let client = Client::connect(config).await?;
    info!("{}", Command::help());

    let (commands, command_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match Command::parse(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown command {:?}. {}", line.trim(), Command::help()),
            }
        }
    });

    client.run(command_rx).await?;

    Ok(())
}
