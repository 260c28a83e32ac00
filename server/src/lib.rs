//! # Ladder Relay Server Library
//!
//! This library provides the session broker for two-player snakes and ladders.
//! The server never plays the game itself. It pairs a host with a guest through
//! a short invite code and then forwards game messages between them untouched.
//!
//! ## Core Responsibilities
//!
//! ### Session Brokering
//! A host asks for a session and receives its id plus an eight character
//! invite code. A guest presents the code to take the second seat, after which
//! both sides are told the game is ready.
//!
//! ### Message Relay
//! Game messages carry an opaque JSON payload. The server forwards each one to
//! the other member of the sender's session and nowhere else. Payloads from
//! strangers, or sent before a guest has joined, are dropped quietly.
//!
//! ### Disconnection Handling
//! When either player leaves, the session is removed and the remaining player
//! receives exactly one `player_disconnected` notice. The invite code stops
//! resolving at the same moment.
//!
//! ## Architecture Design
//!
//! ### Single Relay Task
//! One task owns the session registry and every connection outbox. Connection
//! tasks only report events to it over a channel, so session state is never
//! shared or locked and events are applied strictly in arrival order.
//!
//! ### WebSocket Transport
//! Each client holds one WebSocket carrying JSON text frames. A reader task per
//! connection forwards frames to the relay and a writer task drains the
//! connection's outbox.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! Outbox handles for live connections, keyed by connection id.
//!
//! ### Session Module (`session`)
//! A single session with its host and optional guest.
//!
//! ### Registry Module (`registry`)
//! All live sessions, indexed by id, invite code and member connection:
//! - Session creation with collision-free invite codes
//! - Joining with validation of code, occupancy and ownership
//! - Idempotent teardown reporting the surviving peer
//!
//! ### Relay Module (`relay`)
//! The event loop turning registry answers into outbound messages.
//!
//! ### Network Module (`network`)
//! TCP accept loop, WebSocket handshake and per-connection tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 8765,
//!         max_sessions: 64,
//!     };
//!     let server = Server::bind(&config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod network;
pub mod registry;
pub mod relay;
pub mod session;
