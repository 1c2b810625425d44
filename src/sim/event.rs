/// Events emitted while a command resolves.
/// The presentation layer drains these after the command returns,
/// for redraws, the status line and sound.

use std::fmt;

use crate::domain::entity::Position;
use crate::domain::tile::FieldColor;

/// Why a level was lost.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LossReason {
    /// A guard's line of sight reached the player.
    Spotted,
    /// A guard walked into the player.
    Caught,
    /// The player stepped into a gap.
    FellInGap,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LossReason::Spotted => "A guard spotted you!",
            LossReason::Caught => "A guard walked right into you!",
            LossReason::FellInGap => "You fell into a gap!",
        };
        f.write_str(text)
    }
}

/// Recoverable gameplay rejections, shown on the status line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Notice {
    HitWall,
    NoKeys,
    FieldClosed,
    BoxStuck,
    BoxesJammed,
    NearMiss,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::HitWall => "You hit a wall!",
            Notice::NoKeys => "You don't have enough keys.",
            Notice::FieldClosed => "You can't move through yet.",
            Notice::BoxStuck => "You can't move this box.",
            Notice::BoxesJammed => "The boxes are jammed together.",
            Notice::NearMiss => "You got lucky, the guard didn't see you.",
        };
        f.write_str(text)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    TileChanged { pos: Position },
    Status(Notice),
    LevelWon,
    LevelLost(LossReason),
    KeyCollected { pos: Position },
    LockOpened { pos: Position },
    ForceFieldsOpened { color: FieldColor },
    BoxFilledGap { pos: Position },
}

impl GameEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::LevelWon | GameEvent::LevelLost(_))
    }
}
