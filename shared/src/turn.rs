//! Per-client turn state machine.
//!
//! Both clients hold their own copy of the turn state. They are kept equal by
//! convention: each side applies its own actions locally and mirrors the
//! opponent's actions as they arrive through the relay. There is no consensus
//! step, so the mirror operations trust the peer for its own moves and only
//! refuse actions that claim to be made on behalf of the local seat.
//!
//! The externally visible [`Phase`] is derived from the raw fields:
//!
//! ```text
//! WaitingForRoll(p) --roll--> WaitingForMove(p, d) --move--> WaitingForRoll(other)
//!                                                  \--move onto 100--> GameOver(p)
//! ```
//!
//! Dice and token animations are tracked by an in-flight guard. While an
//! animation is in flight no roll, move or local reset is accepted.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::board::{Board, Transition};
use crate::{DICE_FACES, WINNING_SQUARE};

/// One of the two seats at the table. The host always plays seat 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Seat {
    Host,
    Guest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid seat index {0}")]
pub struct InvalidSeat(pub u8);

impl Seat {
    pub const ALL: [Seat; 2] = [Seat::Host, Seat::Guest];

    pub fn index(self) -> usize {
        match self {
            Seat::Host => 0,
            Seat::Guest => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::Host => Seat::Guest,
            Seat::Guest => Seat::Host,
        }
    }
}

impl TryFrom<u8> for Seat {
    type Error = InvalidSeat;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Seat::Host),
            1 => Ok(Seat::Guest),
            other => Err(InvalidSeat(other)),
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> Self {
        seat.index() as u8
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForRoll(Seat),
    WaitingForMove { player: Seat, dice: u8 },
    GameOver { winner: Seat },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Dice,
    Token,
}

/// Reason a local action was refused. Refusals never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalTurnAction {
    #[error("the game is over")]
    GameOver,
    #[error("it is not {0}'s turn")]
    NotYourTurn(Seat),
    #[error("the dice have already been rolled")]
    AlreadyRolled,
    #[error("roll the dice first")]
    NotRolled,
    #[error("an animation is still in progress")]
    InFlight,
    #[error("{0} is not a dice value")]
    InvalidDice(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The roll would have carried the token past the last square.
    Overshoot { player: Seat, next: Seat },
    Moved {
        player: Seat,
        from: u8,
        to: u8,
        transition: Option<Transition>,
        next: Seat,
    },
    Won {
        player: Seat,
        from: u8,
        transition: Option<Transition>,
    },
}

#[derive(Debug, Clone)]
pub struct TurnState {
    board: Board,
    positions: [u8; 2],
    current_player: Seat,
    dice_value: u8,
    in_flight: Option<Animation>,
    winner: Option<Seat>,
    move_counts: [u32; 2],
}

impl TurnState {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            positions: [0, 0],
            current_player: Seat::Host,
            dice_value: 0,
            in_flight: None,
            winner: None,
            move_counts: [0, 0],
        }
    }

    pub fn phase(&self) -> Phase {
        if let Some(winner) = self.winner {
            Phase::GameOver { winner }
        } else if self.dice_value > 0 {
            Phase::WaitingForMove {
                player: self.current_player,
                dice: self.dice_value,
            }
        } else {
            Phase::WaitingForRoll(self.current_player)
        }
    }

    pub fn positions(&self) -> [u8; 2] {
        self.positions
    }

    pub fn position(&self, seat: Seat) -> u8 {
        self.positions[seat.index()]
    }

    pub fn current_player(&self) -> Seat {
        self.current_player
    }

    pub fn dice_value(&self) -> u8 {
        self.dice_value
    }

    pub fn move_count(&self, seat: Seat) -> u32 {
        self.move_counts[seat.index()]
    }

    pub fn in_flight(&self) -> Option<Animation> {
        self.in_flight
    }

    pub fn is_moving(&self) -> bool {
        self.in_flight == Some(Animation::Token)
    }

    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Rolls a fair die for `actor`.
    pub fn roll<R: Rng>(&mut self, actor: Seat, rng: &mut R) -> Result<u8, IllegalTurnAction> {
        self.check_roll(actor)?;
        let value = rng.gen_range(1..=DICE_FACES);
        self.accept_roll(value);
        Ok(value)
    }

    /// Accepts a roll whose value was produced elsewhere, e.g. a seeded die.
    pub fn roll_value(&mut self, actor: Seat, value: u8) -> Result<u8, IllegalTurnAction> {
        if !(1..=DICE_FACES).contains(&value) {
            return Err(IllegalTurnAction::InvalidDice(value));
        }
        self.check_roll(actor)?;
        self.accept_roll(value);
        Ok(value)
    }

    fn check_roll(&self, actor: Seat) -> Result<(), IllegalTurnAction> {
        self.check_actor(actor)?;
        if self.dice_value != 0 {
            return Err(IllegalTurnAction::AlreadyRolled);
        }
        Ok(())
    }

    fn check_actor(&self, actor: Seat) -> Result<(), IllegalTurnAction> {
        if self.winner.is_some() {
            return Err(IllegalTurnAction::GameOver);
        }
        if self.in_flight.is_some() {
            return Err(IllegalTurnAction::InFlight);
        }
        if actor != self.current_player {
            return Err(IllegalTurnAction::NotYourTurn(actor));
        }
        Ok(())
    }

    fn accept_roll(&mut self, value: u8) {
        self.dice_value = value;
        self.in_flight = Some(Animation::Dice);
        debug!("{} rolled {}", self.current_player, value);
    }

    /// Consumes the pending roll and moves `actor`'s token.
    pub fn move_token(&mut self, actor: Seat) -> Result<MoveOutcome, IllegalTurnAction> {
        self.check_actor(actor)?;
        if self.dice_value == 0 {
            return Err(IllegalTurnAction::NotRolled);
        }

        let from = self.position(actor);
        let outcome = self.board.apply_roll(from, self.dice_value);
        self.dice_value = 0;

        if outcome.overshoot {
            self.current_player = actor.other();
            return Ok(MoveOutcome::Overshoot {
                player: actor,
                next: self.current_player,
            });
        }

        self.positions[actor.index()] = outcome.landing;
        self.move_counts[actor.index()] += 1;
        self.in_flight = Some(Animation::Token);

        if self.board.is_win(outcome.landing) {
            self.winner = Some(actor);
            return Ok(MoveOutcome::Won {
                player: actor,
                from,
                transition: outcome.transition,
            });
        }

        self.current_player = actor.other();
        Ok(MoveOutcome::Moved {
            player: actor,
            from,
            to: outcome.landing,
            transition: outcome.transition,
            next: self.current_player,
        })
    }

    /// Marks the running animation as finished.
    pub fn settle(&mut self) -> Option<Animation> {
        self.in_flight.take()
    }

    pub fn reset(&mut self) -> Result<(), IllegalTurnAction> {
        if self.in_flight.is_some() {
            return Err(IllegalTurnAction::InFlight);
        }
        self.clear();
        Ok(())
    }

    /// Mirrors a peer's reset. Applied even mid-animation.
    pub fn apply_remote_reset(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.positions = [0, 0];
        self.current_player = Seat::Host;
        self.dice_value = 0;
        self.in_flight = None;
        self.winner = None;
        self.move_counts = [0, 0];
    }

    /// Mirrors the opponent's roll. Returns false when the action was ignored.
    pub fn apply_remote_roll(&mut self, local: Seat, player: Seat, value: u8) -> bool {
        if player == local || self.winner.is_some() {
            return false;
        }
        if !(1..=DICE_FACES).contains(&value) {
            return false;
        }
        self.dice_value = value;
        true
    }

    /// Mirrors the opponent's completed move. The reported position is taken
    /// as is; it is not recomputed from the board.
    pub fn apply_remote_move(
        &mut self,
        local: Seat,
        player: Seat,
        position: u8,
        move_count: u32,
    ) -> bool {
        if player == local || self.winner.is_some() {
            return false;
        }
        if position > WINNING_SQUARE {
            return false;
        }
        self.positions[player.index()] = position;
        self.move_counts[player.index()] = move_count;
        self.dice_value = 0;
        true
    }

    pub fn apply_turn_change(&mut self, current_player: Seat) -> bool {
        if self.winner.is_some() {
            return false;
        }
        self.current_player = current_player;
        self.dice_value = 0;
        true
    }

    pub fn apply_game_end(&mut self, winner: Seat) -> bool {
        if self.winner.is_some() {
            return false;
        }
        self.winner = Some(winner);
        self.dice_value = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn standard_state() -> TurnState {
        TurnState::new(Board::standard().unwrap())
    }

    #[test]
    fn test_initial_phase() {
        let state = standard_state();
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Host));
        assert_eq!(state.positions(), [0, 0]);
        assert_eq!(state.dice_value(), 0);
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_roll_is_within_die_faces() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut state = standard_state();
            let value = state.roll(Seat::Host, &mut rng).unwrap();
            assert!((1..=6).contains(&value));
            assert_eq!(
                state.phase(),
                Phase::WaitingForMove {
                    player: Seat::Host,
                    dice: value
                }
            );
        }
    }

    #[test]
    fn test_second_roll_is_rejected() {
        let mut state = standard_state();
        state.roll_value(Seat::Host, 3).unwrap();
        assert_eq!(
            state.roll_value(Seat::Host, 5),
            Err(IllegalTurnAction::InFlight)
        );
        state.settle();
        assert_eq!(
            state.roll_value(Seat::Host, 5),
            Err(IllegalTurnAction::AlreadyRolled)
        );
        assert_eq!(state.dice_value(), 3);
    }

    #[test]
    fn test_out_of_turn_roll_is_rejected() {
        let mut state = standard_state();
        assert_eq!(
            state.roll_value(Seat::Guest, 2),
            Err(IllegalTurnAction::NotYourTurn(Seat::Guest))
        );
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Host));
    }

    #[test]
    fn test_move_requires_roll() {
        let mut state = standard_state();
        assert_eq!(
            state.move_token(Seat::Host),
            Err(IllegalTurnAction::NotRolled)
        );
    }

    #[test]
    fn test_roll_value_range_checked() {
        let mut state = standard_state();
        assert_eq!(
            state.roll_value(Seat::Host, 0),
            Err(IllegalTurnAction::InvalidDice(0))
        );
        assert_eq!(
            state.roll_value(Seat::Host, 7),
            Err(IllegalTurnAction::InvalidDice(7))
        );
    }

    #[test]
    fn test_ladder_then_plain_move() {
        let mut state = standard_state();

        state.roll_value(Seat::Host, 4).unwrap();
        state.settle();
        let outcome = state.move_token(Seat::Host).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                player: Seat::Host,
                from: 0,
                to: 14,
                transition: Some(Transition::Ladder { bottom: 4, top: 14 }),
                next: Seat::Guest,
            }
        );
        assert!(state.is_moving());
        state.settle();

        state.roll_value(Seat::Guest, 6).unwrap();
        state.settle();
        state.move_token(Seat::Guest).unwrap();
        state.settle();

        assert_eq!(state.positions(), [14, 6]);
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Host));
        assert_eq!(state.move_count(Seat::Host), 1);
        assert_eq!(state.move_count(Seat::Guest), 1);
    }

    #[test]
    fn test_overshoot_passes_turn() {
        let mut state = standard_state();
        state.apply_remote_move(Seat::Guest, Seat::Host, 97, 20);

        state.roll_value(Seat::Host, 5).unwrap();
        state.settle();
        let outcome = state.move_token(Seat::Host).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Overshoot {
                player: Seat::Host,
                next: Seat::Guest
            }
        );
        assert_eq!(state.position(Seat::Host), 97);
        assert_eq!(state.move_count(Seat::Host), 20);
        assert_eq!(state.dice_value(), 0);
        assert!(state.in_flight().is_none());
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Guest));
    }

    #[test]
    fn test_exact_landing_wins() {
        let mut state = standard_state();
        state.apply_remote_move(Seat::Guest, Seat::Host, 97, 30);

        state.roll_value(Seat::Host, 3).unwrap();
        state.settle();
        let outcome = state.move_token(Seat::Host).unwrap();

        assert!(matches!(outcome, MoveOutcome::Won { player: Seat::Host, .. }));
        assert_eq!(state.phase(), Phase::GameOver { winner: Seat::Host });
        state.settle();
        assert_eq!(
            state.roll_value(Seat::Host, 1),
            Err(IllegalTurnAction::GameOver)
        );
    }

    #[test]
    fn test_reset_refused_mid_animation() {
        let mut state = standard_state();
        state.roll_value(Seat::Host, 2).unwrap();
        assert_eq!(state.reset(), Err(IllegalTurnAction::InFlight));
        state.settle();
        state.move_token(Seat::Host).unwrap();
        state.settle();
        assert_eq!(state.reset(), Ok(()));
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Host));
        assert_eq!(state.positions(), [0, 0]);
    }

    #[test]
    fn test_remote_actions_for_local_seat_are_ignored() {
        let mut state = standard_state();
        assert!(!state.apply_remote_roll(Seat::Host, Seat::Host, 4));
        assert!(!state.apply_remote_move(Seat::Host, Seat::Host, 50, 1));
        assert_eq!(state.dice_value(), 0);
        assert_eq!(state.position(Seat::Host), 0);
    }

    #[test]
    fn test_remote_mirror_sequence() {
        let mut guest_view = standard_state();
        assert!(guest_view.apply_remote_roll(Seat::Guest, Seat::Host, 4));
        assert_eq!(
            guest_view.phase(),
            Phase::WaitingForMove {
                player: Seat::Host,
                dice: 4
            }
        );
        assert!(guest_view.apply_remote_move(Seat::Guest, Seat::Host, 14, 1));
        assert!(guest_view.apply_turn_change(Seat::Guest));
        assert_eq!(guest_view.phase(), Phase::WaitingForRoll(Seat::Guest));
        assert_eq!(guest_view.position(Seat::Host), 14);
    }

    #[test]
    fn test_remote_values_out_of_range_are_ignored() {
        let mut state = standard_state();
        assert!(!state.apply_remote_roll(Seat::Host, Seat::Guest, 9));
        assert!(!state.apply_remote_move(Seat::Host, Seat::Guest, 140, 1));
        assert_eq!(state.positions(), [0, 0]);
    }

    #[test]
    fn test_remote_game_end_and_reset() {
        let mut state = standard_state();
        state.roll_value(Seat::Host, 1).unwrap();
        assert!(state.apply_game_end(Seat::Guest));
        assert!(!state.apply_game_end(Seat::Host));
        assert_eq!(state.winner(), Some(Seat::Guest));

        state.apply_remote_reset();
        assert!(state.in_flight().is_none());
        assert_eq!(state.phase(), Phase::WaitingForRoll(Seat::Host));
    }

    #[test]
    fn test_seat_conversions() {
        assert_eq!(Seat::try_from(0), Ok(Seat::Host));
        assert_eq!(Seat::try_from(1), Ok(Seat::Guest));
        assert_eq!(Seat::try_from(2), Err(InvalidSeat(2)));
        assert_eq!(u8::from(Seat::Guest), 1);
        assert_eq!(Seat::Host.other(), Seat::Guest);
        assert_eq!(Seat::Guest.to_string(), "player 1");
    }
}
