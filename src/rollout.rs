//! Random rollouts (game completion by uniform random play).
//!
//! A rollout replays a move history through a fresh engine, then keeps
//! drawing uniformly random ids from the actions not yet used until the game
//! ends. The result is used to score the first move after the history.

use thiserror::Error;

use crate::action_space::{ActionId, ActionSpace, Move, RemainingActions};
use crate::board::Color;
use crate::constants::QUANTUM_PLIES;
use crate::engine::{QuantumGo, RuleError, Winner};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RolloutError {
    #[error("move {ply} ({id}) was rejected: {source}")]
    Rules {
        ply: usize,
        id: ActionId,
        #[source]
        source: RuleError,
    },
    #[error("resign at move {ply} is not the last move of the history")]
    ResignBeforeEnd { ply: usize },
    #[error("action {id} is played twice (again at move {ply})")]
    RepeatedAction { ply: usize, id: ActionId },
    #[error("action {id} at move {ply} is not on the board")]
    UnknownAction { ply: usize, id: ActionId },
}

/// Color to move after `plies` moves (passes included).
pub fn player_at(plies: usize) -> Color {
    if plies % 2 == 0 { Color::Black } else { Color::White }
}

/// Outcome of a resignation after `plies` moves.
///
/// The side that would be to move is credited with the win; this keeps the
/// scoring used by the hosted bot's evaluation.
pub fn winner_by_parity(plies: usize) -> Winner {
    Winner::from_color(player_at(plies))
}

/// Play `history` through a fresh engine.
///
/// Every id must exist in `space`, placements may not repeat, and a Resign
/// is only accepted as the last move.
pub fn replay(space: &ActionSpace, history: &[ActionId], komi: f32) -> Result<QuantumGo, RolloutError> {
    replay_into(space, history, komi, &mut space.full())
}

fn replay_into(
    space: &ActionSpace,
    history: &[ActionId],
    komi: f32,
    working: &mut RemainingActions,
) -> Result<QuantumGo, RolloutError> {
    let mut game = QuantumGo::new(space.size(), komi);
    for (ply, &id) in history.iter().enumerate() {
        let mv = space
            .move_of(id)
            .ok_or(RolloutError::UnknownAction { ply, id })?;
        match mv {
            Move::Resign if ply + 1 < history.len() => {
                return Err(RolloutError::ResignBeforeEnd { ply });
            }
            Move::Place(_) if !working.remove(id) => {
                return Err(RolloutError::RepeatedAction { ply, id });
            }
            _ => {}
        }
        game.apply_move(player_at(ply), mv)
            .map_err(|source| RolloutError::Rules { ply, id, source })?;
    }
    Ok(game)
}

/// Finish the game after `history` with random play and report the winner.
///
/// Pass is never drawn while at most two moves have been played, a Resign
/// draw decides by [`winner_by_parity`], and a Pass drawn right after a Pass
/// ends the game with the engine's score.
pub fn rollout(
    space: &ActionSpace,
    history: &[ActionId],
    komi: f32,
    rng: &mut fastrand::Rng,
) -> Result<Winner, RolloutError> {
    let mut working = space.full();
    let mut game = replay_into(space, history, komi, &mut working)?;
    if history.last().is_some_and(|&last| space.is_resign(last)) {
        return Ok(winner_by_parity(history.len()));
    }
    if let Some(result) = game.result() {
        return Ok(result.winner());
    }

    let pass = space.pass_id();
    let mut plies = history.len();

    loop {
        let mut id = working.choose(rng).unwrap_or(pass);
        while plies <= QUANTUM_PLIES && space.is_pass(id) {
            id = working.choose(rng).unwrap_or(pass);
        }
        let mv = space
            .move_of(id)
            .ok_or(RolloutError::UnknownAction { ply: plies, id })?;

        if mv == Move::Resign {
            return Ok(winner_by_parity(plies));
        }

        game.apply_move(game.current_player(), mv)
            .map_err(|source| RolloutError::Rules { ply: plies, id, source })?;

        // The engine ends the game on the second consecutive pass.
        if let Some(result) = game.result() {
            return Ok(result.winner());
        }
        if mv != Move::Pass {
            working.remove(id);
        }
        plies += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_space::build_action_space;
    use crate::engine::Phase;

    #[test]
    fn test_player_and_parity() {
        assert_eq!(player_at(0), Color::Black);
        assert_eq!(player_at(3), Color::White);
        assert_eq!(winner_by_parity(4), Winner::Black);
        assert_eq!(winner_by_parity(5), Winner::White);
    }

    #[test]
    fn test_replay_two_passes_ends_game() {
        let space = build_action_space(5);
        let game = replay(&space, &[0, 24, 25, 25], 6.5).unwrap();
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.result().unwrap().to_string(), "W+6.5");
    }

    #[test]
    fn test_resign_before_end_is_rejected() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            rollout(&space, &[0, 26, 3], 6.5, &mut rng),
            Err(RolloutError::ResignBeforeEnd { ply: 1 })
        );
    }

    #[test]
    fn test_trailing_resign_decides_by_parity() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(rollout(&space, &[0, 1, 26], 6.5, &mut rng), Ok(Winner::White));
        assert_eq!(rollout(&space, &[0, 1, 2, 26], 6.5, &mut rng), Ok(Winner::Black));
    }

    #[test]
    fn test_resign_after_game_over_is_rejected() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(1);
        let history = [0, 1, 25, 25, 26];
        let expected = RolloutError::Rules {
            ply: 4,
            id: 26,
            source: RuleError::GameAlreadyOver,
        };
        assert_eq!(rollout(&space, &history, 6.5, &mut rng), Err(expected.clone()));
        assert_eq!(replay(&space, &history, 6.5), Err(expected));
    }

    #[test]
    fn test_repeated_action_is_rejected() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            rollout(&space, &[0, 1, 0], 6.5, &mut rng),
            Err(RolloutError::RepeatedAction { ply: 2, id: 0 })
        );
    }

    #[test]
    fn test_pass_during_placement_is_reported() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(1);
        let err = rollout(&space, &[0, 25], 6.5, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            RolloutError::Rules {
                ply: 1,
                source: RuleError::IllegalPassDuringPlacement,
                ..
            }
        ));
    }

    #[test]
    fn test_rollouts_terminate_from_empty_history() {
        let space = build_action_space(5);
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..200 {
            rollout(&space, &[], 6.5, &mut rng).unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_winner() {
        let space = build_action_space(9);
        let history = [40, 41, 0];
        for seed in 0..20 {
            let a = rollout(&space, &history, 6.5, &mut fastrand::Rng::with_seed(seed));
            let b = rollout(&space, &history, 6.5, &mut fastrand::Rng::with_seed(seed));
            assert_eq!(a, b);
        }
    }
}
