/// WorldState: one running level instance.
///
/// ## Boards
///
///   - `board`   : the live board. Mutated in place by the turn engine.
///   - `initial` : the board as parsed. **Never mutated**; `reset()` clones
///                 it back into `board`.
///
/// A WorldState always holds a parsed level: the only constructor takes a
/// Board, so there is no "not yet initialized" state to guard against.

use super::event::{LossReason, Notice};
use crate::domain::board::Board;

/// Turn-engine state.
///
/// `Idle → PlayerMoving → GuardsMoving → Resetting → Idle`, with `Won` and
/// `Lost` reachable from inside a turn. Terminal phases ignore commands
/// until the level is restarted or another level is started.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    PlayerMoving,
    GuardsMoving,
    Resetting,
    Won,
    Lost(LossReason),
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost(_))
    }
}

pub struct WorldState {
    pub board: Board,
    initial: Board,

    // ── Turn engine ──
    pub phase: Phase,
    pub turn: u64,
    /// Last gameplay rejection of the most recent turn.
    pub status: Option<Notice>,

    // ── Meta ──
    pub level_number: usize,
    pub level_name: String,
}

impl WorldState {
    pub fn new(level_number: usize, level_name: impl Into<String>, board: Board) -> Self {
        WorldState {
            initial: board.clone(),
            board,
            phase: Phase::Idle,
            turn: 0,
            status: None,
            level_number,
            level_name: level_name.into(),
        }
    }

    /// Throw away the live board and start over from the parsed one.
    pub fn reset(&mut self) {
        self.board = self.initial.clone();
        self.phase = Phase::Idle;
        self.turn = 0;
        self.status = None;
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn keys_held(&self) -> u32 {
        self.board.player_entity().keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::domain::tile::Tile;

    #[test]
    fn reset_restores_the_parsed_board() {
        let board = Board::new(4, 4, Position::new(1, 1));
        let mut world = WorldState::new(3, "Test", board);
        let p = world.board.player();

        world.board.relocate(p, Position::new(2, 2));
        world.board.set_stationary(Position::new(1, 2), Tile::Wall);
        world.turn = 7;
        world.phase = Phase::Lost(LossReason::Caught);
        world.status = Some(Notice::HitWall);

        world.reset();
        assert_eq!(world.board.entity(p).pos, Position::new(1, 1));
        assert_eq!(world.board.stationary_at(Position::new(1, 2)), Tile::EmptyPassage);
        assert_eq!(world.turn, 0);
        assert_eq!(world.phase, Phase::Idle);
        assert_eq!(world.status, None);
        assert_eq!(world.level_number, 3);
    }

    #[test]
    fn only_won_and_lost_are_terminal() {
        for phase in [Phase::Idle, Phase::PlayerMoving, Phase::GuardsMoving, Phase::Resetting] {
            assert!(!phase.is_terminal());
        }
        assert!(Phase::Won.is_terminal());
        assert!(Phase::Lost(LossReason::Spotted).is_terminal());
    }
}
