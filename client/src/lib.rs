//! # Ladder Relay Client Library
//!
//! This library provides the player side of two-player snakes and ladders played
//! through the relay server. The server is a dumb pipe, so each client runs the
//! full game rules locally and trusts the opponent's reports about its own moves.
//!
//! ## Architecture Overview
//!
//! ### Mirrored Turn State
//! Both clients hold an identical turn state machine. A local action is
//! validated, applied, and only then described to the opponent as one or more
//! game actions. The opponent mirrors those actions without re-rolling or
//! re-checking turn order, but drops anything that claims to come from its own
//! seat.
//!
//! ### Single Event Loop
//! Server messages, typed commands and animation timers all arrive on one
//! task. A remote action can never land in the middle of a local one, and
//! the in-flight guards keep a second roll or move from being accepted while
//! the dice or a token are still animating.
//!
//! ## Module Organization
//!
//! ### Sync Module (`sync`)
//! The local seat's view of the game:
//! - Local roll, move and reset producing outbound game actions
//! - Mirroring of remote actions with seat filtering
//! - One-time match summary when a game ends
//!
//! ### Game Module (`game`)
//! Lobby flow from connection to a ready game, and the mapping of commands
//! and server messages onto the sync adapter.
//!
//! ### Input Module (`input`)
//! Parsing of terminal commands.
//!
//! ### Network Module (`network`)
//! WebSocket connection, reader and writer tasks, and the event loop.
//!
//! ### Profile Module (`profile`)
//! Interface to the account and statistics store, with an in-memory version.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::Intent;
//! use client::input::Command;
//! use client::network::{Client, ClientConfig};
//! use shared::PlayerInfo;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(Intent::Host, PlayerInfo::new("Alice", "🙂"))?;
//!     let client = Client::connect(config).await?;
//!
//!     let (commands, command_rx) = mpsc::unbounded_channel();
//!     commands.send(Command::Status)?;
//!     client.run(command_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod profile;
pub mod sync;

pub use error::ClientError;
