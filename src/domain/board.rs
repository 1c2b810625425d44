/// Board: the grid plus the entity arena.
///
/// ## Layers
///
/// Every cell holds two layers:
///   - `floor`    : the stationary tile. For an occupied cell this is the
///                  occupant's *standing tile*, revealed when it moves away.
///   - `occupant` : at most one movable entity, by `EntityId`.
///
/// Entities themselves live in a flat arena (`entities`). A box that falls
/// into a gap is retired: its slot becomes `None` and it leaves the box list.
///
/// ## Mutation primitives
///
/// `place()`, `vacate()` and `set_stationary()` are the only ways cells
/// change. `place()` refuses to double-book a cell and keeps the entity's
/// stored position in lock-step with the cell that holds it.
///
/// Out-of-bounds access is a programming error and panics.

use super::entity::{Direction, Entity, EntityId, EntityKind, Position};
use super::tile::{FieldColor, Tile};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct Cell {
    floor: Tile,
    occupant: Option<EntityId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,

    entities: Vec<Option<Entity>>,
    player: EntityId,
    /// Map-scan order; this is the guard movement order within a turn.
    guards: Vec<EntityId>,
    boxes: Vec<EntityId>,
    /// Force-field positions per color, in map-scan order.
    fields: [Vec<Position>; 2],
}

// ── Construction ──

impl Board {
    /// An all-EmptyPassage board with the player already standing at `player_pos`.
    pub fn new(width: usize, height: usize, player_pos: Position) -> Self {
        let mut board = Board {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            entities: vec![],
            player: EntityId(0),
            guards: vec![],
            boxes: vec![],
            fields: [vec![], vec![]],
        };
        board.player = board.spawn(Entity::player(player_pos));
        board
    }

    /// Add an entity to the arena and put it on the board at its stored position.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        let pos = entity.pos;
        let kind = entity.kind;
        self.entities.push(Some(entity));
        self.place(pos, id);
        match kind {
            EntityKind::Guard { .. } => self.guards.push(id),
            EntityKind::Box => self.boxes.push(id),
            EntityKind::Player { .. } => {}
        }
        id
    }
}

// ── Geometry ──

impl Board {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        assert!(
            self.in_bounds(pos),
            "cell ({}, {}) is outside the {}x{} board",
            pos.row, pos.col, self.height, self.width,
        );
        pos.row * self.width + pos.col
    }

    /// Adjacent cell in `dir`, or None past the grid edge.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        let next = Position::new(row, col);
        self.in_bounds(next).then_some(next)
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Position::new(row, col)))
    }
}

// ── Reads ──

impl Board {
    /// Floor layer at `pos` (the standing tile when occupied).
    pub fn stationary_at(&self, pos: Position) -> Tile {
        self.cells[self.index(pos)].floor
    }

    pub fn occupant_at(&self, pos: Position) -> Option<EntityId> {
        self.cells[self.index(pos)].occupant
    }

    pub fn entity_at(&self, pos: Position) -> Option<&Entity> {
        self.occupant_at(pos).map(|id| self.entity(id))
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        match self.entities.get(id.0) {
            Some(Some(e)) => e,
            _ => panic!("entity {:?} is not on the board", id),
        }
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        match self.entities.get_mut(id.0) {
            Some(Some(e)) => e,
            _ => panic!("entity {:?} is not on the board", id),
        }
    }

    /// The tile `id` is resting on.
    #[allow(dead_code)]
    pub fn standing_tile(&self, id: EntityId) -> Tile {
        self.stationary_at(self.entity(id).pos)
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn player_entity(&self) -> &Entity {
        self.entity(self.player)
    }

    pub fn guards(&self) -> &[EntityId] {
        &self.guards
    }

    #[allow(dead_code)]
    pub fn boxes(&self) -> &[EntityId] {
        &self.boxes
    }

    /// Members of one force-field group.
    #[allow(dead_code)]
    pub fn force_fields(&self, color: FieldColor) -> &[Position] {
        &self.fields[color.index()]
    }

    /// All live entities, with their handles.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EntityId(i), e)))
    }
}

// ── Mutation primitives ──

impl Board {
    /// Put `id` into the empty cell at `pos` and record the new position.
    /// The entity must not be held by any other cell.
    pub fn place(&mut self, pos: Position, id: EntityId) {
        let idx = self.index(pos);
        if let Some(existing) = self.cells[idx].occupant {
            panic!(
                "cannot place {:?} at ({}, {}): already held by {:?}",
                id, pos.row, pos.col, existing,
            );
        }
        let old = self.entity(id).pos;
        if old != pos && self.in_bounds(old) {
            assert!(
                self.occupant_at(old) != Some(id),
                "{:?} must be vacated from ({}, {}) before placing",
                id, old.row, old.col,
            );
        }
        self.cells[idx].occupant = Some(id);
        self.entity_mut(id).pos = pos;
    }

    /// Empty the occupant layer at `pos`, returning whoever was there.
    pub fn vacate(&mut self, pos: Position) -> Option<EntityId> {
        let idx = self.index(pos);
        self.cells[idx].occupant.take()
    }

    /// Replace the floor layer at `pos`. Force fields join their color group.
    pub fn set_stationary(&mut self, pos: Position, tile: Tile) {
        let idx = self.index(pos);
        self.cells[idx].floor = tile;
        if let Some(color) = tile.field_color() {
            let group = &mut self.fields[color.index()];
            if !group.contains(&pos) {
                group.push(pos);
            }
        }
    }

    /// Move `id` from its cell to the empty cell at `to`.
    pub fn relocate(&mut self, id: EntityId, to: Position) {
        let from = self.entity(id).pos;
        let held = self.vacate(from);
        assert_eq!(held, Some(id), "entity {:?} was not at its recorded cell", id);
        self.place(to, id);
    }

    /// Take an entity off the board for good (a box swallowed by a gap).
    pub fn retire(&mut self, id: EntityId) {
        assert!(id != self.player, "the player cannot be retired");
        let pos = self.entity(id).pos;
        if self.occupant_at(pos) == Some(id) {
            self.vacate(pos);
        }
        self.boxes.retain(|&b| b != id);
        self.guards.retain(|&g| g != id);
        self.entities[id.0] = None;
    }

    /// Deactivate every force field of `color`. Returns the positions that
    /// actually changed (already-open members are skipped).
    pub fn open_force_fields(&mut self, color: FieldColor) -> Vec<Position> {
        let members = self.fields[color.index()].clone();
        let mut changed = vec![];
        for pos in members {
            let idx = self.index(pos);
            if let Tile::ForceField { active: true, color } = self.cells[idx].floor {
                self.cells[idx].floor = Tile::ForceField { color, active: false };
                changed.push(pos);
            }
        }
        changed
    }

    /// End-of-turn: clear `moved_this_turn` everywhere and `turned` on guards.
    pub fn reset_turn_flags(&mut self) {
        for e in self.entities.iter_mut().flatten() {
            e.reset_turn();
        }
    }
}

// ── Consistency ──

impl Board {
    /// Every live entity sits in exactly the cell that names it, and every
    /// occupied cell names a live entity standing there.
    pub fn occupancy_consistent(&self) -> bool {
        let entities_ok = self.entities().all(|(id, e)| {
            self.in_bounds(e.pos) && self.occupant_at(e.pos) == Some(id)
        });
        let cells_ok = self.positions().all(|pos| match self.occupant_at(pos) {
            Some(id) => matches!(self.entities.get(id.0), Some(Some(e)) if e.pos == pos),
            None => true,
        });
        entities_ok && cells_ok
    }
}
