/// The turn engine: advances the world by one player command.
///
/// Processing order:
///   1. Clear the status line
///   2. Player movement (may push boxes, open locks and fields)
///   3. Guard movement: as many passes as there are guards, each in
///      map-scan order, skipping guards already moved this turn. A guard
///      that jostled the one ahead, or turned back from a gap, walks on a
///      later pass.
///   4. Per-turn flag reset
///
/// A turn that ends the level stops where it is: guards do not move after
/// the player wins or falls, and no new guard starts after a capture.
/// Commands submitted once the level is won or lost produce nothing.

use tracing::{debug, info};

use super::event::GameEvent;
use super::resolve::{Outcome, Resolver};
use super::world::{Phase, WorldState};
use crate::domain::entity::{Direction, Position};

/// One player command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    /// A clicked cell, translated into a direction from the player.
    Click(Position),
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, command: Command) -> Vec<GameEvent> {
    let mut events = vec![];
    if world.is_over() {
        return events;
    }
    let Some(dir) = command_direction(world, command) else {
        return events;
    };

    world.status = None;
    world.turn += 1;
    debug!(turn = world.turn, ?dir, "turn begins");

    let outcome = {
        let mut resolver = Resolver::new(&mut world.board, &mut events);

        world.phase = Phase::PlayerMoving;
        let player = resolver.board().player();
        resolver.attempt_step(player, dir);

        if resolver.outcome().is_none() {
            world.phase = Phase::GuardsMoving;
            let guards = resolver.board().guards().to_vec();
            'passes: for _ in 0..guards.len() {
                for &id in &guards {
                    if resolver.outcome().is_some() {
                        break 'passes;
                    }
                    let guard = resolver.board().entity(id);
                    if guard.moved_this_turn {
                        continue;
                    }
                    let facing = guard.facing;
                    resolver.attempt_step(id, facing);
                }
            }
        }
        resolver.outcome()
    };

    world.phase = Phase::Resetting;
    world.board.reset_turn_flags();
    debug_assert!(world.board.occupancy_consistent(), "occupancy broken after turn {}", world.turn);

    world.status = events.iter().rev().find_map(|e| match e {
        GameEvent::Status(notice) => Some(*notice),
        _ => None,
    });
    world.phase = match outcome {
        None => Phase::Idle,
        Some(Outcome::Won) => Phase::Won,
        Some(Outcome::Lost(reason)) => Phase::Lost(reason),
    };
    debug!(turn = world.turn, phase = ?world.phase, events = events.len(), "turn ends");
    events
}

/// Clicks count only along the player's row or column, and not on the
/// player's own cell.
fn command_direction(world: &WorldState, command: Command) -> Option<Direction> {
    match command {
        Command::Move(dir) => Some(dir),
        Command::Click(target) => {
            if !world.board.in_bounds(target) {
                return None;
            }
            Direction::toward(world.board.player_entity().pos, target)
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Controller surface
// ══════════════════════════════════════════════════════════════

pub fn submit_direction(world: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
    step(world, Command::Move(dir))
}

pub fn submit_click(world: &mut WorldState, row: usize, col: usize) -> Vec<GameEvent> {
    step(world, Command::Click(Position::new(row, col)))
}

pub fn restart_level(world: &mut WorldState) {
    world.reset();
    info!(number = world.level_number, name = %world.level_name, "level restarted");
}
