//! The 100-square board and its snakes and ladders.
//!
//! A landing square is resolved through at most one transition. The lookup
//! never chains, so the tables themselves must not contain a transition that
//! ends on the start of another one; [`Board::new`] refuses such tables.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::{BOARD_SQUARES, WINNING_SQUARE};

/// Snake head → tail.
pub const SNAKES: [(u8, u8); 6] = [(98, 78), (95, 56), (87, 24), (62, 18), (54, 34), (16, 6)];

/// Ladder bottom → top.
pub const LADDERS: [(u8, u8); 8] = [
    (1, 38),
    (4, 14),
    (9, 21),
    (28, 84),
    (36, 44),
    (51, 67),
    (71, 91),
    (80, 100),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Snake { head: u8, tail: u8 },
    Ladder { bottom: u8, top: u8 },
}

impl Transition {
    /// Square the token ends up on after following the transition.
    pub fn destination(&self) -> u8 {
        match *self {
            Transition::Snake { tail, .. } => tail,
            Transition::Ladder { top, .. } => top,
        }
    }
}

/// Result of applying a dice roll to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOutcome {
    /// The roll would carry the token past the last square.
    pub overshoot: bool,
    /// Final resting square. Equal to the starting square on overshoot.
    pub landing: u8,
    /// Snake or ladder followed on the way to `landing`, if any.
    pub transition: Option<Transition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("square {square} is outside the board")]
    OutOfRange { square: u8 },
    #[error("snake at {head} must lead down, not to {tail}")]
    SnakeNotDescending { head: u8, tail: u8 },
    #[error("ladder at {bottom} must lead up, not to {top}")]
    LadderNotAscending { bottom: u8, top: u8 },
    #[error("square {square} is both a snake head and a ladder bottom")]
    Conflict { square: u8 },
    #[error("square {square} is declared twice")]
    Duplicate { square: u8 },
    #[error("transition ending on {square} would chain into another transition")]
    Chained { square: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    snakes: BTreeMap<u8, u8>,
    ladders: BTreeMap<u8, u8>,
}

impl Board {
    /// Builds a board from snake and ladder tables, validating them.
    pub fn new(snakes: &[(u8, u8)], ladders: &[(u8, u8)]) -> Result<Self, BoardError> {
        let mut snake_map = BTreeMap::new();
        for &(head, tail) in snakes {
            check_square(head)?;
            check_square(tail)?;
            if head >= WINNING_SQUARE {
                return Err(BoardError::OutOfRange { square: head });
            }
            if head <= tail {
                return Err(BoardError::SnakeNotDescending { head, tail });
            }
            if snake_map.insert(head, tail).is_some() {
                return Err(BoardError::Duplicate { square: head });
            }
        }

        let mut ladder_map = BTreeMap::new();
        for &(bottom, top) in ladders {
            check_square(bottom)?;
            check_square(top)?;
            if bottom >= top {
                return Err(BoardError::LadderNotAscending { bottom, top });
            }
            if snake_map.contains_key(&bottom) {
                return Err(BoardError::Conflict { square: bottom });
            }
            if ladder_map.insert(bottom, top).is_some() {
                return Err(BoardError::Duplicate { square: bottom });
            }
        }

        let starts_transition = |square: &u8| {
            snake_map.contains_key(square) || ladder_map.contains_key(square)
        };
        if let Some(&square) = snake_map
            .values()
            .chain(ladder_map.values())
            .find(|&&square| starts_transition(&square))
        {
            return Err(BoardError::Chained { square });
        }

        Ok(Self {
            snakes: snake_map,
            ladders: ladder_map,
        })
    }

    /// The board every game is played on, checked like any other table.
    pub fn standard() -> Result<Self, BoardError> {
        Self::new(&SNAKES, &LADDERS)
    }

    pub fn transition_at(&self, square: u8) -> Option<Transition> {
        if let Some(&top) = self.ladders.get(&square) {
            return Some(Transition::Ladder { bottom: square, top });
        }
        self.snakes
            .get(&square)
            .map(|&tail| Transition::Snake { head: square, tail })
    }

    /// Final resting square for a raw landing, following at most one
    /// snake or ladder.
    pub fn resolve_landing(&self, square: u8) -> u8 {
        self.transition_at(square)
            .map_or(square, |transition| transition.destination())
    }

    pub fn apply_roll(&self, current: u8, dice: u8) -> RollOutcome {
        let raw = u16::from(current) + u16::from(dice);
        if raw > u16::from(BOARD_SQUARES) {
            return RollOutcome {
                overshoot: true,
                landing: current,
                transition: None,
            };
        }

        let raw = raw as u8;
        let transition = self.transition_at(raw);
        RollOutcome {
            overshoot: false,
            landing: transition.map_or(raw, |t| t.destination()),
            transition,
        }
    }

    pub fn is_win(&self, square: u8) -> bool {
        square == WINNING_SQUARE
    }
}

fn check_square(square: u8) -> Result<(), BoardError> {
    if (1..=BOARD_SQUARES).contains(&square) {
        Ok(())
    } else {
        Err(BoardError::OutOfRange { square })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DICE_FACES;

    #[test]
    fn test_standard_tables_pass_validation() {
        let board = Board::standard().unwrap();
        assert_eq!(board.snakes.len(), SNAKES.len());
        assert_eq!(board.ladders.len(), LADDERS.len());
    }

    #[test]
    fn test_edited_standard_table_is_refused() {
        let mut snakes = SNAKES.to_vec();
        snakes.push((36, 2));
        let err = Board::new(&snakes, &LADDERS).unwrap_err();
        assert_eq!(err, BoardError::Conflict { square: 36 });
    }

    #[test]
    fn test_resolve_landing() {
        let board = Board::standard().unwrap();
        assert_eq!(board.resolve_landing(4), 14);
        assert_eq!(board.resolve_landing(98), 78);
        assert_eq!(board.resolve_landing(6), 6);
        assert_eq!(board.resolve_landing(80), 100);
    }

    #[test]
    fn test_overshoot_matches_sum() {
        let board = Board::standard().unwrap();
        for position in 1..=BOARD_SQUARES {
            for dice in 1..=DICE_FACES {
                let outcome = board.apply_roll(position, dice);
                let past_end = u16::from(position) + u16::from(dice) > 100;
                assert_eq!(outcome.overshoot, past_end, "{} + {}", position, dice);
                if outcome.overshoot {
                    assert_eq!(outcome.landing, position);
                    assert!(outcome.transition.is_none());
                }
            }
        }
    }

    #[test]
    fn test_landing_is_resolved_once() {
        let board = Board::standard().unwrap();
        for position in 0..BOARD_SQUARES {
            for dice in 1..=DICE_FACES {
                let outcome = board.apply_roll(position, dice);
                if outcome.overshoot {
                    continue;
                }
                assert!(
                    board.transition_at(outcome.landing).is_none(),
                    "landing {} from {} + {} still sits on a transition",
                    outcome.landing,
                    position,
                    dice
                );
            }
        }
    }

    #[test]
    fn test_exact_landing_on_last_square_wins() {
        let board = Board::standard().unwrap();
        let outcome = board.apply_roll(97, 3);
        assert!(!outcome.overshoot);
        assert!(board.is_win(outcome.landing));

        let outcome = board.apply_roll(97, 4);
        assert!(outcome.overshoot);
        assert!(!board.is_win(outcome.landing));
    }

    #[test]
    fn test_ladder_to_last_square() {
        let board = Board::standard().unwrap();
        let outcome = board.apply_roll(76, 4);
        assert_eq!(
            outcome.transition,
            Some(Transition::Ladder {
                bottom: 80,
                top: 100
            })
        );
        assert!(board.is_win(outcome.landing));
    }

    #[test]
    fn test_rejects_conflicting_square() {
        let err = Board::new(&[(40, 10)], &[(40, 60)]).unwrap_err();
        assert_eq!(err, BoardError::Conflict { square: 40 });
    }

    #[test]
    fn test_rejects_chained_transitions() {
        let err = Board::new(&[(50, 20)], &[(20, 30)]).unwrap_err();
        assert_eq!(err, BoardError::Chained { square: 20 });
    }

    #[test]
    fn test_rejects_wrong_direction() {
        assert_eq!(
            Board::new(&[(10, 20)], &[]).unwrap_err(),
            BoardError::SnakeNotDescending { head: 10, tail: 20 }
        );
        assert_eq!(
            Board::new(&[], &[(30, 5)]).unwrap_err(),
            BoardError::LadderNotAscending { bottom: 30, top: 5 }
        );
    }

    #[test]
    fn test_rejects_out_of_range_and_duplicates() {
        assert_eq!(
            Board::new(&[(0, 0)], &[]).unwrap_err(),
            BoardError::OutOfRange { square: 0 }
        );
        assert_eq!(
            Board::new(&[], &[(90, 101)]).unwrap_err(),
            BoardError::OutOfRange { square: 101 }
        );
        assert_eq!(
            Board::new(&[(100, 3)], &[]).unwrap_err(),
            BoardError::OutOfRange { square: 100 }
        );
        assert_eq!(
            Board::new(&[(40, 3), (40, 5)], &[]).unwrap_err(),
            BoardError::Duplicate { square: 40 }
        );
    }
}
