/// Guard line of sight.
///
/// A ray leaves the guard's cell along its facing, one cell at a time:
///   - player in the cell       → spotted, stop
///   - box or guard in the cell → blocked, stop
///   - empty see-through floor  → keep going
///   - wall / lock / field      → blocked, stop
///
/// The scan is a pure query; the resolver decides what being seen means.

use super::board::Board;
use super::entity::{EntityId, Position};

/// Where the ray from `guard` ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sight {
    /// The player stands at this cell, `distance` cells ahead.
    Player { at: Position, distance: usize },
    /// Something opaque at this cell stopped the ray.
    Blocked { at: Position },
    /// The ray ran off the grid.
    Edge,
}

/// Cast the guard's ray and report what stopped it.
pub fn scan(board: &Board, guard: EntityId) -> Sight {
    let g = board.entity(guard);
    let facing = g.facing;
    let mut cursor = g.pos;
    let mut distance = 0;

    while let Some(next) = board.neighbor(cursor, facing) {
        distance += 1;
        match board.entity_at(next) {
            Some(e) if e.is_player() => return Sight::Player { at: next, distance },
            Some(_) => return Sight::Blocked { at: next },
            None => {}
        }
        if !board.stationary_at(next).is_transparent() {
            return Sight::Blocked { at: next };
        }
        cursor = next;
    }
    Sight::Edge
}

/// Convenience: does `guard` currently see the player?
#[allow(dead_code)]
pub fn sees_player(board: &Board, guard: EntityId) -> bool {
    matches!(scan(board, guard), Sight::Player { .. })
}
