//! Types and rules shared by the relay server and the game client.
//!
//! Nothing in this crate performs I/O. The board model and the turn state
//! machine are pure, and the protocol module only describes what travels on
//! the wire.

pub mod board;
pub mod error;
pub mod protocol;
pub mod turn;

pub use board::{Board, BoardError, RollOutcome, Transition, LADDERS, SNAKES};
pub use error::RelayError;
pub use protocol::{
    invite_code_for, normalize_invite_code, ClientMessage, GameAction, PlayerInfo, ServerMessage,
};
pub use turn::{Animation, IllegalTurnAction, InvalidSeat, MoveOutcome, Phase, Seat, TurnState};

pub const BOARD_SQUARES: u8 = 100;
pub const WINNING_SQUARE: u8 = BOARD_SQUARES;
pub const DICE_FACES: u8 = 6;
pub const INVITE_CODE_LEN: usize = 8;
pub const DEFAULT_PORT: u16 = 8765;
