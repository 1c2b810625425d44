/// Entities: Player, Box, Guard.
/// Records live in the board's arena and are addressed by `EntityId`;
/// nothing holds a reference to another entity directly.

use super::tile::TurnBias;

/// Grid coordinate, 0-indexed from the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// Orthogonal facing / movement direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Clockwise order, starting north.
    #[allow(dead_code)]
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// 90° clockwise.
    pub fn turn_right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// 90° counter-clockwise.
    pub fn turn_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Turn as a switch-direction tile with `bias` dictates.
    pub fn turned(self, bias: TurnBias) -> Self {
        match bias {
            TurnBias::Left => self.turn_left(),
            TurnBias::Right => self.turn_right(),
        }
    }

    /// (d_row, d_col)
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    /// The single axis-aligned direction leading from `from` to `to`.
    /// Same row → east/west, same column → north/south, otherwise none.
    pub fn toward(from: Position, to: Position) -> Option<Self> {
        if from.row == to.row {
            if to.col > from.col {
                Some(Direction::East)
            } else if to.col < from.col {
                Some(Direction::West)
            } else {
                None
            }
        } else if from.col == to.col {
            if to.row > from.row {
                Some(Direction::South)
            } else {
                Some(Direction::North)
            }
        } else {
            None
        }
    }
}

/// Handle into the board's entity arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EntityId(pub(crate) usize);

/// Closed set of movable kinds; per-kind state rides in the payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Player { keys: u32 },
    Box,
    /// `turned`: forced to reverse or re-decide during the current turn.
    Guard { turned: bool },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Entity {
    pub pos: Position,
    /// Meaningful for Player and Guard; cosmetic for Box.
    pub facing: Direction,
    pub moved_this_turn: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(pos: Position) -> Self {
        Entity {
            pos,
            facing: Direction::South,
            moved_this_turn: false,
            kind: EntityKind::Player { keys: 0 },
        }
    }

    pub fn crate_box(pos: Position) -> Self {
        Entity {
            pos,
            facing: Direction::North,
            moved_this_turn: false,
            kind: EntityKind::Box,
        }
    }

    pub fn guard(pos: Position, facing: Direction) -> Self {
        Entity {
            pos,
            facing,
            moved_this_turn: false,
            kind: EntityKind::Guard { turned: false },
        }
    }

    pub fn is_guard(&self) -> bool {
        matches!(self.kind, EntityKind::Guard { .. })
    }

    #[allow(dead_code)]
    pub fn is_box(&self) -> bool {
        matches!(self.kind, EntityKind::Box)
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player { .. })
    }

    /// Keys held; zero for anything but the player.
    pub fn keys(&self) -> u32 {
        match self.kind {
            EntityKind::Player { keys } => keys,
            _ => 0,
        }
    }

    #[allow(dead_code)]
    pub fn turned(&self) -> bool {
        matches!(self.kind, EntityKind::Guard { turned: true })
    }

    pub fn set_turned(&mut self, value: bool) {
        if let EntityKind::Guard { turned } = &mut self.kind {
            *turned = value;
        }
    }

    /// Clear per-turn flags.
    pub fn reset_turn(&mut self) {
        self.moved_this_turn = false;
        self.set_turned(false);
    }
}
