/// Movement resolver: what happens when one entity tries to step.
///
/// One call resolves one attempted step and everything it drags along:
/// pushed boxes, jostled guards, keys spent on locks, force fields opened,
/// guards turning and looking around. Dispatch is on the mover's kind and
/// on whatever is in the target cell (occupant first, then floor).
///
/// ## Floor ahead (target unoccupied)
/// ┌──────────────────┬────────────────────┬──────────────────┬─────────────┐
/// │ Target floor      │ Player             │ Guard            │ Box         │
/// ├──────────────────┼────────────────────┼──────────────────┼─────────────┤
/// │ passable floor    │ move, then goal /  │ move, then look  │ move        │
/// │                   │ opener / key       │                  │             │
/// │ Lock              │ key? open + retry  │ reverse + retry  │ stall       │
/// │                   │ : notice           │                  │             │
/// │ closed ForceField │ notice             │ reverse + retry  │ stall       │
/// │ Wall / grid edge  │ notice             │ reverse + retry  │ stall       │
/// │ Gap               │ move, lost         │ reverse          │ fills gap   │
/// └──────────────────┴────────────────────┴──────────────────┴─────────────┘
///
/// ## Occupant ahead
/// ┌────────┬───────────────────────────┬───────────────────────────┬────────┐
/// │ Mover   │ Box                        │ Guard                      │ Player │
/// ├────────┼───────────────────────────┼───────────────────────────┼────────┤
/// │ Player  │ push, follow / notice      │ near-miss notice           │ -      │
/// │ Guard   │ push, follow / reverse x2  │ jostle / reverse           │ caught │
/// │ Box     │ jammed notice, stall       │ stall                      │ stall  │
/// └────────┴───────────────────────────┴───────────────────────────┴────────┘
///
/// "stall" marks the box as moved this turn without moving it, so nothing
/// can push it again until the turn ends. "reverse" is a 180° turn that sets
/// the guard's `turned` flag and immediately re-scans its line of sight.
///
/// ## Termination
/// Every nested attempt either moves an entity into a different cell, or
/// ends at something that cannot move. A guard's reverse-and-retry happens
/// at most `MAX_REDIRECTS` times per chain, so a guard walled in on both
/// sides settles instead of spinning.

use tracing::{debug, trace};

use super::event::{GameEvent, LossReason, Notice};
use crate::domain::board::Board;
use crate::domain::entity::{Direction, EntityId, EntityKind, Position};
use crate::domain::tile::{FieldColor, Tile};
use crate::domain::vision::{self, Sight};

/// How a level ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost(LossReason),
}

/// Reverse-and-retry rounds allowed within one attempt chain.
const MAX_REDIRECTS: u8 = 1;

/// Resolution context for one command. Borrows the board and the
/// command's event queue; records the first terminal outcome reached.
pub struct Resolver<'a> {
    board: &'a mut Board,
    events: &'a mut Vec<GameEvent>,
    outcome: Option<Outcome>,
}

impl<'a> Resolver<'a> {
    pub fn new(board: &'a mut Board, events: &'a mut Vec<GameEvent>) -> Self {
        Resolver { board, events, outcome: None }
    }

    pub fn board(&self) -> &Board {
        self.board
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Attempt to move `mover` one cell in `dir`.
    /// No-op if the mover has already moved this turn.
    pub fn attempt_step(&mut self, mover: EntityId, dir: Direction) {
        self.attempt(mover, dir);
    }

    /// Open every force field of `color`. One-way: fields never re-close.
    pub fn open_force_field_group(&mut self, color: FieldColor) {
        let changed = self.board.open_force_fields(color);
        if changed.is_empty() {
            return;
        }
        debug!(color = color.name(), count = changed.len(), "force fields opened");
        for pos in changed {
            self.events.push(GameEvent::TileChanged { pos });
        }
        self.events.push(GameEvent::ForceFieldsOpened { color });
    }
}

// ══════════════════════════════════════════════════════════════
// Attempt chain
// ══════════════════════════════════════════════════════════════

impl<'a> Resolver<'a> {
    /// A fresh attempt: a guard standing on a switch tile turns first.
    fn attempt(&mut self, id: EntityId, dir: Direction) {
        let entity = self.board.entity(id);
        if entity.moved_this_turn {
            return;
        }
        let mut dir = dir;
        if entity.is_guard() {
            if let Tile::SwitchDirection(bias) = self.board.stationary_at(entity.pos) {
                dir = dir.turned(bias);
                trace!(?id, ?bias, ?dir, "switch tile turns guard");
            }
        }
        self.advance(id, dir, 0);
    }

    /// Resolve the step itself. Re-attempts inside a chain come back here
    /// directly, keeping whatever facing the chain has settled on.
    fn advance(&mut self, id: EntityId, dir: Direction, redirects: u8) {
        let entity = self.board.entity(id);
        if entity.moved_this_turn {
            return;
        }
        let from = entity.pos;
        let kind = entity.kind;
        if !matches!(kind, EntityKind::Box) {
            self.board.entity_mut(id).facing = dir;
        }
        trace!(?id, ?kind, row = from.row, col = from.col, ?dir, "attempt step");

        let Some(target) = self.board.neighbor(from, dir) else {
            // Maps are walled at the edges; running off the grid is a wall.
            self.obstructed(id, kind, Notice::HitWall, redirects);
            return;
        };

        match self.board.occupant_at(target) {
            Some(other) => self.meet(id, kind, other, dir, redirects),
            None => self.enter(id, kind, target, dir, redirects),
        }
    }

    /// Target cell is unoccupied: dispatch on its floor.
    fn enter(&mut self, id: EntityId, kind: EntityKind, target: Position, dir: Direction, redirects: u8) {
        match self.board.stationary_at(target) {
            Tile::EmptyPassage
            | Tile::PlayerGoal
            | Tile::Key
            | Tile::OpenLock
            | Tile::SwitchDirection(_)
            | Tile::ForceFieldOpener(_)
            | Tile::BoxInGap
            | Tile::ForceField { active: false, .. } => {
                self.relocate(id, target);
                self.arrived(id);
            }
            Tile::Lock => match kind {
                EntityKind::Player { keys } if keys > 0 => self.unlock(id, target, dir, redirects),
                _ => self.obstructed(id, kind, Notice::NoKeys, redirects),
            },
            Tile::ForceField { active: true, .. } => {
                self.obstructed(id, kind, Notice::FieldClosed, redirects)
            }
            Tile::Wall => self.obstructed(id, kind, Notice::HitWall, redirects),
            Tile::Gap => match kind {
                EntityKind::Player { .. } => {
                    self.relocate(id, target);
                    self.conclude(Outcome::Lost(LossReason::FellInGap));
                }
                EntityKind::Guard { .. } => self.turn_180(id),
                EntityKind::Box => self.fill_gap(id, target),
            },
        }
    }

    /// Target cell holds another entity.
    fn meet(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        other: EntityId,
        dir: Direction,
        redirects: u8,
    ) {
        let blocker = self.board.entity(other);
        let blocker_kind = blocker.kind;
        let blocker_moved = blocker.moved_this_turn;
        let blocker_facing = blocker.facing;

        match (kind, blocker_kind) {
            (EntityKind::Player { .. }, EntityKind::Box) => {
                if blocker_moved {
                    self.notify(Notice::BoxStuck);
                    return;
                }
                trace!(?id, box_id = ?other, "player pushes box");
                self.attempt(other, dir);
                self.advance(id, dir, redirects);
            }
            (EntityKind::Guard { .. }, EntityKind::Box) => {
                if blocker_moved {
                    self.turn_180(id);
                    return;
                }
                trace!(?id, box_id = ?other, "guard pushes box");
                self.attempt(other, dir);
                // A box that stayed put turns the guard here, and once more below.
                self.advance(id, dir, redirects);
                if !self.board.entity(id).moved_this_turn {
                    self.turn_180(id);
                }
            }
            (EntityKind::Box, EntityKind::Box) => {
                self.notify(Notice::BoxesJammed);
                self.stall(id);
            }
            (EntityKind::Guard { .. }, EntityKind::Guard { turned }) => {
                if turned {
                    self.turn_180(id);
                } else {
                    self.board.entity_mut(id).set_turned(true);
                    if !blocker_moved {
                        trace!(?id, blocker = ?other, "guard jostles guard ahead");
                        self.attempt(other, blocker_facing);
                    }
                }
            }
            (EntityKind::Player { .. }, EntityKind::Guard { .. }) => self.notify(Notice::NearMiss),
            (EntityKind::Guard { .. }, EntityKind::Player { .. }) => {
                self.conclude(Outcome::Lost(LossReason::Caught))
            }
            (EntityKind::Box, EntityKind::Guard { .. })
            | (EntityKind::Box, EntityKind::Player { .. }) => self.stall(id),
            (EntityKind::Player { .. }, EntityKind::Player { .. }) => {
                unreachable!("a board holds exactly one player")
            }
        }
    }

    /// Wall, closed force field, lock without a key, or the grid edge.
    fn obstructed(&mut self, id: EntityId, kind: EntityKind, notice: Notice, redirects: u8) {
        match kind {
            EntityKind::Player { .. } => self.notify(notice),
            EntityKind::Guard { .. } => self.reverse_and_retry(id, redirects),
            EntityKind::Box => self.stall(id),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Effects
// ══════════════════════════════════════════════════════════════

impl<'a> Resolver<'a> {
    fn relocate(&mut self, id: EntityId, to: Position) {
        let from = self.board.entity(id).pos;
        self.board.relocate(id, to);
        self.board.entity_mut(id).moved_this_turn = true;
        self.events.push(GameEvent::TileChanged { pos: from });
        self.events.push(GameEvent::TileChanged { pos: to });
    }

    /// Post-move checks for whoever just arrived.
    fn arrived(&mut self, id: EntityId) {
        let entity = self.board.entity(id);
        let pos = entity.pos;
        match entity.kind {
            EntityKind::Guard { .. } => self.watch(id),
            EntityKind::Box => {}
            EntityKind::Player { .. } => match self.board.stationary_at(pos) {
                Tile::PlayerGoal => self.conclude(Outcome::Won),
                Tile::ForceFieldOpener(color) => {
                    self.open_force_field_group(color);
                    self.board.set_stationary(pos, Tile::EmptyPassage);
                }
                Tile::Key => {
                    if let EntityKind::Player { keys } = &mut self.board.entity_mut(id).kind {
                        *keys += 1;
                    }
                    self.board.set_stationary(pos, Tile::EmptyPassage);
                    self.events.push(GameEvent::KeyCollected { pos });
                }
                _ => {}
            },
        }
    }

    /// Spend a key on the lock ahead, then try the same step again.
    fn unlock(&mut self, id: EntityId, lock: Position, dir: Direction, redirects: u8) {
        if let EntityKind::Player { keys } = &mut self.board.entity_mut(id).kind {
            *keys -= 1;
        }
        self.board.set_stationary(lock, Tile::OpenLock);
        self.events.push(GameEvent::TileChanged { pos: lock });
        self.events.push(GameEvent::LockOpened { pos: lock });
        self.advance(id, dir, redirects);
    }

    /// The box drops into the gap and stays there as floor.
    fn fill_gap(&mut self, id: EntityId, gap: Position) {
        let from = self.board.entity(id).pos;
        self.board.set_stationary(gap, Tile::BoxInGap);
        self.board.retire(id);
        trace!(?id, row = gap.row, col = gap.col, "box fills gap");
        self.events.push(GameEvent::TileChanged { pos: from });
        self.events.push(GameEvent::TileChanged { pos: gap });
        self.events.push(GameEvent::BoxFilledGap { pos: gap });
    }

    /// Committed for this turn without moving.
    fn stall(&mut self, id: EntityId) {
        self.board.entity_mut(id).moved_this_turn = true;
    }

    fn notify(&mut self, notice: Notice) {
        self.events.push(GameEvent::Status(notice));
    }

    /// First terminal outcome wins; later ones in the same chain are dropped.
    fn conclude(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            return;
        }
        debug!(?outcome, "level concluded");
        self.outcome = Some(outcome);
        self.events.push(match outcome {
            Outcome::Won => GameEvent::LevelWon,
            Outcome::Lost(reason) => GameEvent::LevelLost(reason),
        });
    }
}

// ══════════════════════════════════════════════════════════════
// Guard turning and looking
// ══════════════════════════════════════════════════════════════

impl<'a> Resolver<'a> {
    /// About-face: flags the guard as turned and looks the new way.
    fn turn_180(&mut self, id: EntityId) {
        let guard = self.board.entity_mut(id);
        guard.facing = guard.facing.reverse();
        guard.set_turned(true);
        let pos = guard.pos;
        trace!(?id, facing = ?guard.facing, "guard turns around");
        self.events.push(GameEvent::TileChanged { pos });
        self.watch(id);
    }

    fn reverse_and_retry(&mut self, id: EntityId, redirects: u8) {
        self.turn_180(id);
        if redirects < MAX_REDIRECTS {
            let facing = self.board.entity(id).facing;
            self.advance(id, facing, redirects + 1);
        }
    }

    /// Vision scan from the guard's current cell and facing.
    fn watch(&mut self, id: EntityId) {
        match vision::scan(self.board, id) {
            Sight::Player { at, distance } => {
                debug!(?id, row = at.row, col = at.col, distance, "guard spots player");
                self.conclude(Outcome::Lost(LossReason::Spotted));
            }
            Sight::Blocked { at } => trace!(?id, row = at.row, col = at.col, "guard view blocked"),
            Sight::Edge => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Direction::{East, North, South, West};
    use crate::sim::level::parse_board;

    fn board(rows: &[&str]) -> Board {
        parse_board(rows).expect("test map parses")
    }

    /// Resolve one attempt on a fresh resolver.
    fn push(b: &mut Board, id: EntityId, dir: Direction) -> (Vec<GameEvent>, Option<Outcome>) {
        let mut events = vec![];
        let outcome = {
            let mut r = Resolver::new(b, &mut events);
            r.attempt_step(id, dir);
            r.outcome()
        };
        assert!(b.occupancy_consistent(), "occupancy broken after step");
        (events, outcome)
    }

    fn at(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn notices(events: &[GameEvent]) -> Vec<Notice> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Status(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    // ── Player on plain floor ──

    #[test]
    fn player_walks_onto_empty_passage() {
        let mut b = board(&[
            "#####",
            "#@  #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, outcome) = push(&mut b, p, East);
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert!(b.entity(p).moved_this_turn);
        assert_eq!(b.entity(p).facing, East);
        assert_eq!(
            events,
            vec![
                GameEvent::TileChanged { pos: at(1, 1) },
                GameEvent::TileChanged { pos: at(1, 2) },
            ]
        );
        assert_eq!(outcome, None);
    }

    #[test]
    fn already_moved_entity_is_untouched() {
        let mut b = board(&[
            "#####",
            "#@  #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        b.entity_mut(p).moved_this_turn = true;
        let (events, _) = push(&mut b, p, East);
        assert!(events.is_empty());
        assert_eq!(b.entity(p).pos, at(1, 1));
        assert_eq!(b.entity(p).facing, South);
    }

    #[test]
    fn walls_block_the_player_in_every_direction() {
        let mut b = board(&[
            "#####",
            "##@##",
            "#####",
            "#####",
        ]);
        let p = b.player();
        for dir in Direction::ALL {
            let (events, _) = push(&mut b, p, dir);
            assert_eq!(notices(&events), vec![Notice::HitWall]);
            assert_eq!(b.entity(p).pos, at(1, 2));
            assert!(!b.entity(p).moved_this_turn);
        }
    }

    #[test]
    fn reaching_the_goal_wins() {
        let mut b = board(&[
            "#####",
            "#@. #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, outcome) = push(&mut b, p, East);
        assert_eq!(outcome, Some(Outcome::Won));
        assert_eq!(events.last(), Some(&GameEvent::LevelWon));
        assert_eq!(b.stationary_at(at(1, 2)), Tile::PlayerGoal);
    }

    #[test]
    fn stepping_into_a_gap_loses() {
        let mut b = board(&[
            "#####",
            "#@! #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, outcome) = push(&mut b, p, East);
        assert_eq!(outcome, Some(Outcome::Lost(LossReason::FellInGap)));
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert!(events.contains(&GameEvent::LevelLost(LossReason::FellInGap)));
    }

    // ── Keys and locks ──

    #[test]
    fn key_is_counted_once() {
        let mut b = board(&[
            "######",
            "#@z  #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(p).keys(), 1);
        assert_eq!(b.stationary_at(at(1, 2)), Tile::EmptyPassage);
        assert!(events.contains(&GameEvent::KeyCollected { pos: at(1, 2) }));

        b.reset_turn_flags();
        push(&mut b, p, East);
        b.reset_turn_flags();
        push(&mut b, p, West);
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert_eq!(b.standing_tile(p), Tile::EmptyPassage);
        assert_eq!(b.entity(p).keys(), 1);
    }

    #[test]
    fn lock_without_key_blocks() {
        let mut b = board(&[
            "#####",
            "#@Z #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(notices(&events), vec![Notice::NoKeys]);
        assert_eq!(b.entity(p).pos, at(1, 1));
        assert_eq!(b.stationary_at(at(1, 2)), Tile::Lock);
    }

    #[test]
    fn key_opens_lock_and_player_walks_through() {
        let mut b = board(&[
            "######",
            "#@zZ #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        push(&mut b, p, East);
        b.reset_turn_flags();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(p).pos, at(1, 3));
        assert_eq!(b.entity(p).keys(), 0);
        assert_eq!(b.standing_tile(p), Tile::OpenLock);
        assert!(events.contains(&GameEvent::LockOpened { pos: at(1, 3) }));

        // Stepping off leaves the lock open.
        b.reset_turn_flags();
        push(&mut b, p, East);
        assert_eq!(b.stationary_at(at(1, 3)), Tile::OpenLock);
    }

    #[test]
    fn boxes_stall_against_locks() {
        let mut b = board(&[
            "######",
            "#@$Z #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        let bx = b.boxes()[0];
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(bx).pos, at(1, 2));
        assert!(b.entity(bx).moved_this_turn);
        assert_eq!(b.entity(p).pos, at(1, 1));
        assert_eq!(notices(&events), vec![Notice::BoxStuck]);
    }

    // ── Force fields ──

    #[test]
    fn closed_field_blocks_the_player() {
        let mut b = board(&[
            "#####",
            "#@X #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(notices(&events), vec![Notice::FieldClosed]);
        assert_eq!(b.entity(p).pos, at(1, 1));
    }

    #[test]
    fn opener_opens_its_whole_color_group() {
        let mut b = board(&[
            "#######",
            "#@x X #",
            "#  X Y#",
            "#######",
        ]);
        let p = b.player();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.standing_tile(p), Tile::EmptyPassage);
        for pos in [at(1, 4), at(2, 3)] {
            assert_eq!(
                b.stationary_at(pos),
                Tile::ForceField { color: FieldColor::Blue, active: false }
            );
            assert!(events.contains(&GameEvent::TileChanged { pos }));
        }
        assert!(b.stationary_at(at(2, 5)).is_closed_field());
        assert!(events.contains(&GameEvent::ForceFieldsOpened { color: FieldColor::Blue }));
    }

    #[test]
    fn open_field_is_kept_as_standing_tile() {
        let mut b = board(&[
            "######",
            "#@xX #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        push(&mut b, p, East);
        b.reset_turn_flags();
        push(&mut b, p, East);
        assert_eq!(b.entity(p).pos, at(1, 3));
        assert_eq!(
            b.standing_tile(p),
            Tile::ForceField { color: FieldColor::Blue, active: false }
        );
        b.reset_turn_flags();
        push(&mut b, p, East);
        assert_eq!(
            b.stationary_at(at(1, 3)),
            Tile::ForceField { color: FieldColor::Blue, active: false }
        );
    }

    // ── Boxes ──

    #[test]
    fn player_pushes_box_into_open_floor() {
        let mut b = board(&[
            "######",
            "#@$  #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        let bx = b.boxes()[0];
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(bx).pos, at(1, 3));
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert!(notices(&events).is_empty());
        // Box orientation is cosmetic and unaffected.
        assert_eq!(b.entity(bx).facing, North);
    }

    #[test]
    fn box_against_wall_stays_and_is_committed() {
        let mut b = board(&[
            "#####",
            "#@$##",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let bx = b.boxes()[0];
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(bx).pos, at(1, 2));
        assert_eq!(b.entity(p).pos, at(1, 1));
        assert!(b.entity(bx).moved_this_turn);
        assert!(!b.entity(p).moved_this_turn);
        assert_eq!(notices(&events), vec![Notice::BoxStuck]);
    }

    #[test]
    fn box_cannot_push_box() {
        let mut b = board(&[
            "#######",
            "#@$$  #",
            "#     #",
            "#######",
        ]);
        let p = b.player();
        let (first, second) = (b.boxes()[0], b.boxes()[1]);
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.entity(first).pos, at(1, 2));
        assert_eq!(b.entity(second).pos, at(1, 3));
        assert_eq!(b.entity(p).pos, at(1, 1));
        assert_eq!(notices(&events), vec![Notice::BoxesJammed, Notice::BoxStuck]);
    }

    #[test]
    fn box_fills_gap_and_leaves_play() {
        let mut b = board(&[
            "######",
            "#@$! #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        let (events, _) = push(&mut b, p, East);
        assert_eq!(b.stationary_at(at(1, 3)), Tile::BoxInGap);
        assert_eq!(b.occupant_at(at(1, 3)), None);
        assert!(b.boxes().is_empty());
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert!(events.contains(&GameEvent::BoxFilledGap { pos: at(1, 3) }));

        // The filled gap is plain floor now.
        b.reset_turn_flags();
        let (_, outcome) = push(&mut b, p, East);
        assert_eq!(b.entity(p).pos, at(1, 3));
        assert_eq!(outcome, None);
    }

    #[test]
    fn box_stalls_against_guard() {
        let mut b = board(&[
            "######",
            "#@$N #",
            "#    #",
            "######",
        ]);
        let p = b.player();
        let bx = b.boxes()[0];
        push(&mut b, p, East);
        assert_eq!(b.entity(bx).pos, at(1, 2));
        assert!(b.entity(bx).moved_this_turn);
    }

    // ── Guards ──

    #[test]
    fn moving_guard_spots_player_ahead() {
        let mut b = board(&[
            "#######",
            "#O   @#",
            "#     #",
            "#######",
        ]);
        let g = b.guards()[0];
        let (events, outcome) = push(&mut b, g, East);
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(outcome, Some(Outcome::Lost(LossReason::Spotted)));
        assert_eq!(
            events.iter().filter(|e| e.is_terminal()).count(),
            1,
            "exactly one terminal event"
        );
    }

    #[test]
    fn guard_reversing_at_wall_spots_player_behind() {
        let mut b = board(&[
            "#####",
            "#@O##",
            "#   #",
            "#####",
        ]);
        let g = b.guards()[0];
        let (events, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, Some(Outcome::Lost(LossReason::Spotted)));
        assert_eq!(b.entity(g).facing, West);
        assert!(events.contains(&GameEvent::LevelLost(LossReason::Spotted)));
        assert!(!events.contains(&GameEvent::LevelLost(LossReason::Caught)));
    }

    #[test]
    fn guard_reverses_at_wall_and_walks_back() {
        let mut b = board(&[
            "#####",
            "#  O#",
            "#####",
            "#@  #",
            "#####",
        ]);
        let g = b.guards()[0];
        let (_, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, None);
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(b.entity(g).facing, West);
        assert!(b.entity(g).turned());
        assert!(b.entity(g).moved_this_turn);
    }

    #[test]
    fn guard_walled_in_settles_facing_its_start() {
        let mut b = board(&[
            "#####",
            "##N##",
            "#####",
            "#@  #",
            "#####",
        ]);
        let g = b.guards()[0];
        let (events, outcome) = push(&mut b, g, North);
        assert_eq!(outcome, None);
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(b.entity(g).facing, North);
        assert!(b.entity(g).turned());
        let turns = events
            .iter()
            .filter(|e| **e == GameEvent::TileChanged { pos: at(1, 2) })
            .count();
        assert_eq!(turns, 2);
    }

    #[test]
    fn guard_turns_back_from_gap_without_stepping() {
        let mut b = board(&[
            "######",
            "# O! #",
            "#    #",
            "#@   #",
            "######",
        ]);
        let g = b.guards()[0];
        push(&mut b, g, East);
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(b.entity(g).facing, West);
        assert!(!b.entity(g).moved_this_turn);
    }

    #[test]
    fn guard_reverses_at_closed_field_and_lock() {
        for field in ['X', 'Z'] {
            let row = format!("# O{field}#");
            let mut b = board(&["#####", row.as_str(), "#####", "#@  #", "#####"]);
            let g = b.guards()[0];
            push(&mut b, g, East);
            assert_eq!(b.entity(g).pos, at(1, 1), "guard should walk back from {field}");
            assert_eq!(b.entity(g).facing, West);
        }
    }

    #[test]
    fn guard_walks_into_player_and_catches() {
        let mut b = board(&[
            "#####",
            "#W@ #",
            "#   #",
            "#####",
        ]);
        let g = b.guards()[0];
        let p = b.player();
        let (events, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, Some(Outcome::Lost(LossReason::Caught)));
        assert_eq!(events, vec![GameEvent::LevelLost(LossReason::Caught)]);
        assert_eq!(b.entity(p).pos, at(1, 2));
        assert_eq!(b.entity(g).pos, at(1, 1));
    }

    #[test]
    fn player_bumping_guard_is_a_near_miss() {
        let mut b = board(&[
            "#####",
            "#@S #",
            "#   #",
            "#####",
        ]);
        let p = b.player();
        let (events, outcome) = push(&mut b, p, East);
        assert_eq!(outcome, None);
        assert_eq!(notices(&events), vec![Notice::NearMiss]);
        assert_eq!(b.entity(p).pos, at(1, 1));
    }

    #[test]
    fn switch_tile_turns_guard_before_moving() {
        let mut b = board(&[
            "######",
            "#  R #",
            "#    #",
            "#   @#",
            "######",
        ]);
        let g = b.spawn(crate::domain::entity::Entity::guard(at(2, 3), North));
        // Walk the guard onto the switch, then let it leave.
        push(&mut b, g, North);
        assert_eq!(b.entity(g).pos, at(1, 3));
        b.reset_turn_flags();
        push(&mut b, g, North);
        assert_eq!(b.entity(g).facing, East);
        assert_eq!(b.entity(g).pos, at(1, 4));
    }

    #[test]
    fn switch_tile_turns_only_the_first_attempt() {
        let mut b = board(&[
            "######",
            "#  R##",
            "#    #",
            "#   @#",
            "######",
        ]);
        let g = b.spawn(crate::domain::entity::Entity::guard(at(1, 3), North));
        // North turns east into the wall; the retry west is not turned again.
        let (events, outcome) = push(&mut b, g, North);
        assert_eq!(outcome, None);
        assert!(notices(&events).is_empty());
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(b.entity(g).facing, West);
        assert_eq!(b.stationary_at(at(1, 3)), Tile::SwitchDirection(crate::domain::tile::TurnBias::Right));
    }

    #[test]
    fn guard_pushes_box_and_follows() {
        let mut b = board(&[
            "#######",
            "#O$   #",
            "#     #",
            "#    @#",
            "#######",
        ]);
        let g = b.guards()[0];
        let bx = b.boxes()[0];
        let (_, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, None);
        assert_eq!(b.entity(bx).pos, at(1, 3));
        assert_eq!(b.entity(g).pos, at(1, 2));
        assert_eq!(b.entity(g).facing, East);
    }

    #[test]
    fn guard_turns_twice_at_an_immovable_box() {
        let mut b = board(&[
            "######",
            "# O$##",
            "#    #",
            "#   @#",
            "######",
        ]);
        let g = b.guards()[0];
        let bx = b.boxes()[0];
        let (events, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, None);
        assert_eq!(b.entity(bx).pos, at(1, 3));
        assert!(b.entity(bx).moved_this_turn);
        assert_eq!(b.entity(g).pos, at(1, 2));
        // Back to facing the box after two about-faces.
        assert_eq!(b.entity(g).facing, East);
        assert!(b.entity(g).turned());
        assert!(!b.entity(g).moved_this_turn);
        let turns = events.iter().filter(|e| **e == GameEvent::TileChanged { pos: at(1, 2) }).count();
        assert_eq!(turns, 2);
    }

    #[test]
    fn guard_turning_from_an_immovable_box_spots_the_player() {
        let mut b = board(&[
            "######",
            "#@O$##",
            "#    #",
            "#    #",
            "######",
        ]);
        let g = b.guards()[0];
        let (_, outcome) = push(&mut b, g, East);
        assert_eq!(outcome, Some(Outcome::Lost(LossReason::Spotted)));
    }

    #[test]
    fn guard_jostles_guard_ahead() {
        let mut b = board(&[
            "#######",
            "#OO   #",
            "#     #",
            "#    @#",
            "#######",
        ]);
        let (first, second) = (b.guards()[0], b.guards()[1]);
        push(&mut b, first, East);
        // The blocked guard waits; the one ahead resolved its own move.
        assert_eq!(b.entity(first).pos, at(1, 1));
        assert!(b.entity(first).turned());
        assert!(!b.entity(first).moved_this_turn);
        assert_eq!(b.entity(second).pos, at(1, 3));
        assert!(b.entity(second).moved_this_turn);
    }

    #[test]
    fn facing_guards_turn_away_from_each_other() {
        let mut b = board(&[
            "#######",
            "# OW  #",
            "#     #",
            "#    @#",
            "#######",
        ]);
        let (first, second) = (b.guards()[0], b.guards()[1]);
        push(&mut b, first, East);
        assert_eq!(b.entity(first).pos, at(1, 2));
        assert_eq!(b.entity(first).facing, East);
        assert!(b.entity(first).turned());
        assert_eq!(b.entity(second).facing, East);
        assert!(b.entity(second).turned());
        assert_eq!(b.entity(second).pos, at(1, 3));
    }

    #[test]
    fn guard_passes_open_field() {
        let mut b = board(&[
            "#######",
            "#@xO X#",
            "#     #",
            "#######",
        ]);
        let p = b.player();
        let g = b.guards()[0];
        push(&mut b, p, East);
        b.reset_turn_flags();
        b.entity_mut(g).facing = East;
        push(&mut b, g, East);
        push(&mut b, g, East);
        assert_eq!(b.entity(g).pos, at(1, 4));
        b.reset_turn_flags();
        push(&mut b, g, East);
        assert_eq!(b.entity(g).pos, at(1, 5));
    }
}
