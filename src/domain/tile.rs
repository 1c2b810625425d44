/// Stationary tiles: the floor layer of every cell.
/// Properties are queried via methods, not stored as flags,
/// so the resolver and the vision scanner share one definition.

/// Force-field group color. Openers and fields pair up by color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FieldColor {
    Blue,
    Red,
}

impl FieldColor {
    /// Slot in per-color tables.
    pub fn index(self) -> usize {
        match self {
            FieldColor::Blue => 0,
            FieldColor::Red => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldColor::Blue => "blue",
            FieldColor::Red => "red",
        }
    }
}

/// Which way a switch-direction tile turns a guard standing on it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnBias {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    EmptyPassage,
    Gap,
    PlayerGoal,
    Key,
    Lock,
    OpenLock,
    SwitchDirection(TurnBias),
    ForceFieldOpener(FieldColor),
    /// `active` is the only thing gating movement; an inactive field
    /// still renders as an (open) force field.
    ForceField { color: FieldColor, active: bool },
    BoxInGap,
}

impl Tile {
    /// Can an entity step onto this tile without any special handling?
    pub fn is_passable(self) -> bool {
        match self {
            Tile::EmptyPassage
            | Tile::PlayerGoal
            | Tile::Key
            | Tile::OpenLock
            | Tile::SwitchDirection(_)
            | Tile::ForceFieldOpener(_)
            | Tile::BoxInGap
            | Tile::ForceField { active: false, .. } => true,
            Tile::Wall | Tile::Gap | Tile::Lock | Tile::ForceField { active: true, .. } => false,
        }
    }

    /// Does a guard's line of sight continue across this tile (when unoccupied)?
    /// Plain floor and gaps are see-through; walls, locks and force fields
    /// (open or closed) stop the ray.
    pub fn is_transparent(self) -> bool {
        match self {
            Tile::ForceField { .. } => false,
            Tile::Gap => true,
            other => other.is_passable(),
        }
    }

    /// Is this a closed force field?
    #[allow(dead_code)]
    pub fn is_closed_field(self) -> bool {
        matches!(self, Tile::ForceField { active: true, .. })
    }

    /// Force-field color, if this tile belongs to a group.
    pub fn field_color(self) -> Option<FieldColor> {
        match self {
            Tile::ForceField { color, .. } => Some(color),
            _ => None,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::EmptyPassage
    }
}
