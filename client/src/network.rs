use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{Board, ClientMessage, PlayerInfo, ServerMessage, DEFAULT_PORT, LADDERS, SNAKES};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ClientError;
use crate::game::{ClientSession, Intent};
use crate::input::Command;
use crate::profile::{ProfileStore, StatsDelta};

pub const DEFAULT_ANIMATION_MS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub player: PlayerInfo,
    pub intent: Intent,
    /// How long a dice roll or token move takes on screen.
    pub animation: Duration,
    pub board: Board,
}

impl ClientConfig {
    /// Configuration for the standard board. Fails if its tables are invalid.
    pub fn new(intent: Intent, player: PlayerInfo) -> Result<Self, ClientError> {
        Self::with_tables(intent, player, &SNAKES, &LADDERS)
    }

    pub fn with_tables(
        intent: Intent,
        player: PlayerInfo,
        snakes: &[(u8, u8)],
        ladders: &[(u8, u8)],
    ) -> Result<Self, ClientError> {
        Ok(Self {
            server_url: format!("ws://127.0.0.1:{}", DEFAULT_PORT),
            player,
            intent,
            animation: Duration::from_millis(DEFAULT_ANIMATION_MS),
            board: Board::new(snakes, ladders)?,
        })
    }
}

pub struct Client {
    session: ClientSession,
    animation: Duration,
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    incoming: mpsc::UnboundedReceiver<ServerMessage>,
    profile: Option<(Arc<dyn ProfileStore>, String)>,
}

impl Client {
    /// Opens the WebSocket and starts the reader and writer tasks.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        info!("Connecting to {}", config.server_url);
        let (ws_stream, _) = connect_async(config.server_url.as_str()).await?;
        let (mut sink, mut source) = ws_stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (incoming_tx, incoming) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("Failed to send to server: {}", e);
                    break;
                }
            }
            if let Err(e) = sink.close().await {
                debug!("Closing the connection failed: {}", e);
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Connection error: {}", e);
                        break;
                    }
                };
                match ServerMessage::from_json(&text) {
                    Ok(message) => {
                        if incoming_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring unreadable server message: {}", e),
                }
            }
        });

        Ok(Client {
            session: ClientSession::new(config.intent, config.player, config.board),
            animation: config.animation,
            outgoing,
            incoming,
            profile: None,
        })
    }

    /// Reports finished games for `username` to `store`.
    pub fn with_profile(
        mut self,
        store: Arc<dyn ProfileStore>,
        username: impl Into<String>,
    ) -> Self {
        self.profile = Some((store, username.into()));
        self
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.outgoing.send(message).map_err(|_| ClientError::Closed)
    }

    /// Drives the session until the player quits or the server goes away.
    ///
    /// Server messages, commands and animation deadlines are all handled on
    /// this one task, so remote and local changes never interleave.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<ClientSession, ClientError> {
        let opening = self.session.opening_message();
        self.send(opening)?;

        let mut deadline: Option<Instant> = None;

        loop {
            if deadline.is_none() && self.session.animation_pending() {
                deadline = Some(Instant::now() + self.animation);
            }
            let animation_done = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                message = self.incoming.recv() => match message {
                    Some(message) => self.session.handle_server_message(message)?,
                    None => {
                        info!("Server closed the connection");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => {
                        info!("Leaving the game");
                        break;
                    }
                    Some(command) => {
                        for message in self.session.handle_command(command)? {
                            self.send(message)?;
                        }
                    }
                },
                _ = animation_done => {
                    self.session.settle();
                    deadline = None;
                }
            }

            self.report_finished_match().await;
        }

        Ok(self.session)
    }

    async fn report_finished_match(&mut self) {
        let Some(summary) = self.session.take_finished_match() else {
            return;
        };
        info!(
            "Game over: {} in {}s after {} moves",
            if summary.won { "you won" } else { "you lost" },
            summary.duration.as_secs(),
            summary.moves
        );

        if let Some((store, username)) = &self.profile {
            match store.update_stats(username, &StatsDelta::from(&summary)).await {
                Ok(stats) => info!(
                    "{}: {} wins, {} losses, win rate {:.1}%",
                    username,
                    stats.wins,
                    stats.losses,
                    stats.win_rate()
                ),
                Err(e) => warn!("Could not record the game for {}: {}", username, e),
            }
        }
    }
}
