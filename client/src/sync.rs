//! Client-side turn synchronization
//!
//! Wraps the shared turn state machine for one seat. Local actions validate
//! against the state and, when accepted, yield the game actions the opponent
//! must see. Remote actions are mirrored without re-validating turn order, but
//! anything that claims to be from the local seat is ignored.

use log::{debug, info, warn};
use rand::Rng;
use serde_json::Value;
use shared::{
    Animation, Board, GameAction, IllegalTurnAction, MoveOutcome, RelayError, Seat, Transition,
    TurnState, WINNING_SQUARE,
};
use std::time::{Duration, Instant};

/// Result of a finished game, seen from the local seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub winner: Seat,
    pub local: Seat,
    pub won: bool,
    pub duration: Duration,
    pub moves: u32,
}

pub struct GameSync {
    local: Seat,
    turn: TurnState,
    peer_connected: bool,
    status: String,
    started_at: Instant,
    game_length: Option<Duration>,
    summary_taken: bool,
}

impl GameSync {
    pub fn new(local: Seat, board: Board) -> Self {
        let mut sync = Self {
            local,
            turn: TurnState::new(board),
            peer_connected: true,
            status: String::new(),
            started_at: Instant::now(),
            game_length: None,
            summary_taken: false,
        };
        sync.announce_turn();
        sync
    }

    pub fn local_seat(&self) -> Seat {
        self.local
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_peer_connected(&self) -> bool {
        self.peer_connected
    }

    pub fn is_my_turn(&self) -> bool {
        self.turn.current_player() == self.local && !self.turn.is_game_over()
    }

    /// Rolls the die for the local seat.
    pub fn roll<R: Rng>(&mut self, rng: &mut R) -> Vec<GameAction> {
        if !self.peer_connected {
            return self.refuse("the opponent has left");
        }
        let result = self.turn.roll(self.local, rng);
        self.after_roll(result)
    }

    /// Rolls a known value for the local seat.
    pub fn roll_value(&mut self, value: u8) -> Vec<GameAction> {
        if !self.peer_connected {
            return self.refuse("the opponent has left");
        }
        let result = self.turn.roll_value(self.local, value);
        self.after_roll(result)
    }

    fn after_roll(&mut self, result: Result<u8, IllegalTurnAction>) -> Vec<GameAction> {
        match result {
            Ok(value) => {
                self.set_status(format!("You rolled {}", value));
                vec![GameAction::DiceRoll {
                    player: self.local,
                    value,
                }]
            }
            Err(e) => self.refuse(&e.to_string()),
        }
    }

    /// Moves the local token by the pending roll.
    pub fn move_token(&mut self) -> Vec<GameAction> {
        if !self.peer_connected {
            return self.refuse("the opponent has left");
        }
        let outcome = match self.turn.move_token(self.local) {
            Ok(outcome) => outcome,
            Err(e) => return self.refuse(&e.to_string()),
        };

        match outcome {
            MoveOutcome::Overshoot { next, .. } => {
                self.set_status("Too high to land on 100, turn passes".to_string());
                vec![GameAction::TurnChange {
                    current_player: next,
                }]
            }
            MoveOutcome::Moved {
                to,
                transition,
                next,
                ..
            } => {
                self.set_status(describe_landing(to, transition));
                vec![
                    self.move_complete(to),
                    GameAction::TurnChange {
                        current_player: next,
                    },
                ]
            }
            MoveOutcome::Won { player, .. } => {
                self.mark_game_over();
                self.set_status("You reached 100 and won!".to_string());
                vec![
                    self.move_complete(WINNING_SQUARE),
                    GameAction::GameEnd { winner: player },
                ]
            }
        }
    }

    fn move_complete(&self, position: u8) -> GameAction {
        GameAction::MoveComplete {
            player: self.local,
            position,
            move_count: self.turn.move_count(self.local),
        }
    }

    /// Starts a new game. Refused while an animation is running.
    pub fn reset(&mut self) -> Vec<GameAction> {
        if !self.peer_connected {
            return self.refuse("the opponent has left");
        }
        match self.turn.reset() {
            Ok(()) => {
                self.restart_clock();
                self.announce_turn();
                vec![GameAction::Reset]
            }
            Err(e) => self.refuse(&e.to_string()),
        }
    }

    /// Finishes the running dice or token animation.
    pub fn settle(&mut self) -> Option<Animation> {
        let settled = self.turn.settle();
        if settled == Some(Animation::Token) && !self.turn.is_game_over() {
            self.announce_turn();
        }
        settled
    }

    /// Mirrors an action received from the opponent. Returns false when the
    /// action was ignored.
    pub fn apply_remote(&mut self, action: &GameAction) -> bool {
        let applied = match *action {
            GameAction::DiceRoll { player, value } => {
                let applied = self.turn.apply_remote_roll(self.local, player, value);
                if applied {
                    self.set_status(format!("Opponent rolled {}", value));
                }
                applied
            }
            GameAction::MoveComplete {
                player,
                position,
                move_count,
            } => {
                let applied = self
                    .turn
                    .apply_remote_move(self.local, player, position, move_count);
                if applied {
                    self.set_status(format!("Opponent moved to {}", position));
                }
                applied
            }
            GameAction::TurnChange { current_player } => {
                let applied = self.turn.apply_turn_change(current_player);
                if applied {
                    self.announce_turn();
                }
                applied
            }
            GameAction::GameEnd { winner } => {
                let applied = self.turn.apply_game_end(winner);
                if applied {
                    self.mark_game_over();
                    if winner == self.local {
                        self.set_status("You won!".to_string());
                    } else {
                        self.set_status("Opponent reached 100 and won".to_string());
                    }
                }
                applied
            }
            GameAction::Reset => {
                self.turn.apply_remote_reset();
                self.restart_clock();
                self.announce_turn();
                true
            }
        };

        if !applied {
            warn!("Ignored remote action {:?} for {}", action, self.local);
        }
        applied
    }

    /// Decodes and mirrors a relayed payload.
    pub fn apply_payload(&mut self, payload: Value) -> Result<bool, RelayError> {
        let action = GameAction::from_value(payload)?;
        Ok(self.apply_remote(&action))
    }

    /// Records that the opponent left. Returns true only the first time.
    pub fn peer_disconnected(&mut self) -> bool {
        if !self.peer_connected {
            return false;
        }
        self.peer_connected = false;
        self.set_status("Opponent disconnected".to_string());
        true
    }

    /// The summary of a finished game, handed out once per game.
    pub fn take_finished_match(&mut self) -> Option<MatchSummary> {
        let winner = self.turn.winner()?;
        let duration = self.game_length?;
        if self.summary_taken {
            return None;
        }
        self.summary_taken = true;
        Some(MatchSummary {
            winner,
            local: self.local,
            won: winner == self.local,
            duration,
            moves: self.turn.move_count(self.local),
        })
    }

    fn mark_game_over(&mut self) {
        self.game_length = Some(self.started_at.elapsed());
    }

    fn restart_clock(&mut self) {
        self.started_at = Instant::now();
        self.game_length = None;
        self.summary_taken = false;
    }

    fn announce_turn(&mut self) {
        if self.is_my_turn() {
            self.set_status("Your turn: roll the dice".to_string());
        } else {
            self.set_status("Waiting for the opponent".to_string());
        }
    }

    fn refuse(&mut self, reason: &str) -> Vec<GameAction> {
        debug!("Refused local action for {}: {}", self.local, reason);
        self.status = format!("Can't do that: {}", reason);
        Vec::new()
    }

    fn set_status(&mut self, status: String) {
        info!("{}", status);
        self.status = status;
    }
}

fn describe_landing(square: u8, transition: Option<Transition>) -> String {
    match transition {
        Some(Transition::Ladder { bottom, top }) => {
            format!("Climbed the ladder from {} to {}", bottom, top)
        }
        Some(Transition::Snake { head, tail }) => {
            format!("Bitten by the snake at {}, slid to {}", head, tail)
        }
        None => format!("Moved to {}", square),
    }
}
