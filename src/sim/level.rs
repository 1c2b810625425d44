/// Level loading: map text → Board, and the catalog of numbered levels.
///
/// ## Sources (priority order):
///   1. The configured levels directory (individual `.txt` files)
///   2. Built-in embedded levels
///
/// Files are ordered by the number at the end of their stem, so
/// `Level2.txt` comes before `Level10.txt`. Files that fail to read or
/// parse are skipped with a warning.
///
/// ## File format (`.txt`):
///   Lines starting with `;` are comments. The first comment names the level.
///   Every other line is a map row. Short rows are padded with floor.
///
/// ## Tile legend:
///   ' ' = Empty passage          '#' = Wall
///   '$' = Box                    '@' = Player
///   '.' = Goal                   '*' = Box on a goal
///   '!' = Gap                    'z' / 'Z' = Key / Lock
///   'N' 'O'/'E' 'S' 'W' = Guard facing north / east / south / west
///   'R' / 'L' = Switch tile turning right / left
///   'X' / 'Y' = Blue / red force field (closed)
///   'x' / 'y' = Blue / red force-field opener

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::board::Board;
use crate::domain::entity::{Direction, Entity, Position};
use crate::domain::tile::{FieldColor, Tile, TurnBias};
use crate::sim::world::WorldState;

/// Smallest playable map side.
const MIN_SIDE: usize = 4;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown tile {ch:?} at row {row}, column {col}")]
    UnknownTile { ch: char, row: usize, col: usize },
    #[error("level has no player")]
    MissingPlayer,
    #[error("second player at row {row}, column {col}")]
    MultiplePlayers { row: usize, col: usize },
    #[error("level is {width}x{height}, smaller than {min}x{min}", min = MIN_SIDE)]
    TooSmall { width: usize, height: usize },
    #[error("no level {number} (the catalog has {count})")]
    NoSuchLevel { number: usize, count: usize },
    #[error("level text has no map rows")]
    EmptyLevel,
}

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Map parsing
// ══════════════════════════════════════════════════════════════

/// Build a Board from map rows. Guards, boxes and force fields are
/// registered in row-major order.
pub fn parse_board<S: AsRef<str>>(rows: &[S]) -> Result<Board, LevelError> {
    let height = rows.len();
    if height == 0 {
        return Err(LevelError::EmptyLevel);
    }
    let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(LevelError::TooSmall { width, height });
    }

    let mut player = None;
    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.as_ref().chars().enumerate() {
            if ch != '@' {
                continue;
            }
            if player.is_some() {
                return Err(LevelError::MultiplePlayers { row, col });
            }
            player = Some(Position::new(row, col));
        }
    }
    let player = player.ok_or(LevelError::MissingPlayer)?;

    let mut board = Board::new(width, height, player);
    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.as_ref().chars().enumerate() {
            let pos = Position::new(row, col);
            let floor = floor_for(ch).ok_or(LevelError::UnknownTile { ch, row, col })?;
            board.set_stationary(pos, floor);
            if ch == '$' || ch == '*' {
                board.spawn(Entity::crate_box(pos));
            } else if let Some(facing) = guard_facing(ch) {
                board.spawn(Entity::guard(pos, facing));
            }
        }
    }
    Ok(board)
}

fn floor_for(ch: char) -> Option<Tile> {
    let tile = match ch {
        ' ' | '@' | '$' | 'N' | 'O' | 'E' | 'S' | 'W' => Tile::EmptyPassage,
        '#' => Tile::Wall,
        '.' | '*' => Tile::PlayerGoal,
        '!' => Tile::Gap,
        'z' => Tile::Key,
        'Z' => Tile::Lock,
        'R' => Tile::SwitchDirection(TurnBias::Right),
        'L' => Tile::SwitchDirection(TurnBias::Left),
        'X' => Tile::ForceField { color: FieldColor::Blue, active: true },
        'Y' => Tile::ForceField { color: FieldColor::Red, active: true },
        'x' => Tile::ForceFieldOpener(FieldColor::Blue),
        'y' => Tile::ForceFieldOpener(FieldColor::Red),
        _ => return None,
    };
    Some(tile)
}

fn guard_facing(ch: char) -> Option<Direction> {
    match ch {
        'N' => Some(Direction::North),
        'O' | 'E' => Some(Direction::East),
        'S' => Some(Direction::South),
        'W' => Some(Direction::West),
        _ => None,
    }
}

/// Split level file text into its name and map rows.
pub fn parse_level_text(content: &str, fallback_name: &str) -> Result<LevelDef, LevelError> {
    let mut name = None;
    let mut rows = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(comment) = line.strip_prefix(';') {
            let comment = comment.trim();
            if name.is_none() && !comment.is_empty() {
                name = Some(comment.to_string());
            }
            continue;
        }
        rows.push(line.to_string());
    }

    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    let leading = rows.iter().take_while(|r| r.trim().is_empty()).count();
    rows.drain(..leading);
    if rows.is_empty() {
        return Err(LevelError::EmptyLevel);
    }

    Ok(LevelDef {
        name: name.unwrap_or_else(|| fallback_name.to_string()),
        rows,
    })
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

/// Numbered levels, 1-based.
pub struct LevelCatalog {
    levels: Vec<LevelDef>,
}

impl LevelCatalog {
    /// Levels from `dir` if it holds any valid ones, otherwise the built-ins.
    pub fn load(dir: Option<&Path>) -> Self {
        let levels = dir.map(load_from_directory).unwrap_or_default();
        if levels.is_empty() {
            info!("using built-in levels");
            return Self::builtin();
        }
        info!(count = levels.len(), "loaded level files");
        LevelCatalog { levels }
    }

    pub fn builtin() -> Self {
        LevelCatalog { levels: embedded_levels() }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn get(&self, number: usize) -> Result<&LevelDef, LevelError> {
        number
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .ok_or(LevelError::NoSuchLevel { number, count: self.levels.len() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.levels.iter().map(|l| l.name.as_str())
    }

    /// The level after `number`, or None once the last one is done.
    pub fn next_after(&self, number: usize) -> Option<usize> {
        (number < self.levels.len()).then_some(number + 1)
    }
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) => {
            debug!(dir = %dir.display(), %err, "levels directory not readable");
            return vec![];
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect();
    files.sort_by_cached_key(|p| {
        let stem = file_stem(p);
        (trailing_number(&stem).unwrap_or(u64::MAX), stem)
    });

    let mut levels = vec![];
    for path in files {
        match read_level_file(&path) {
            Ok(def) => levels.push(def),
            Err(err) => warn!(path = %path.display(), %err, "skipping level file"),
        }
    }
    levels
}

/// Read and validate one level file.
fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let def = parse_level_text(&content, &file_stem(path))?;
    parse_board(&def.rows)?;
    Ok(def)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().unwrap_or_default().to_string_lossy().into_owned()
}

/// `"Level12"` → 12.
fn trailing_number(stem: &str) -> Option<u64> {
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[stem.len() - digits..].parse().ok()
}

// ══════════════════════════════════════════════════════════════
// Level lifecycle
// ══════════════════════════════════════════════════════════════

/// Parse level `number` into a fresh world.
pub fn load_world(catalog: &LevelCatalog, number: usize) -> Result<WorldState, LevelError> {
    let def = catalog.get(number)?;
    let board = parse_board(&def.rows)?;
    info!(number, name = %def.name, "level started");
    Ok(WorldState::new(number, def.name.clone(), board))
}

/// Replace `world` with level `number`. On error `world` is left as it was.
pub fn start_level(
    world: &mut WorldState,
    catalog: &LevelCatalog,
    number: usize,
) -> Result<(), LevelError> {
    *world = load_world(catalog, number)?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("First Steps", &[
            "##########",
            "#@   #   #",
            "#  $ #   #",
            "#    $ . #",
            "#   ##   #",
            "##########",
        ]),
        make_embedded("Keys and Locks", &[
            "###########",
            "#@  #  z  #",
            "#   #     #",
            "#   Z     #",
            "# z ###Z###",
            "#   #  .  #",
            "###########",
        ]),
        make_embedded("The Watchman", &[
            "############",
            "#@    $    #",
            "#######  ###",
            "#W        .#",
            "############",
        ]),
        make_embedded("Force Fields", &[
            "############",
            "#@ x#  y   #",
            "#   X      #",
            "#   #      #",
            "#####Y######",
            "#E   .     #",
            "############",
        ]),
        make_embedded("Gaps and Switches", &[
            "#############",
            "#@  $  !   .#",
            "#      #   ##",
            "#E  R   L   #",
            "#           #",
            "#############",
        ]),
        make_embedded("Crowded Hall", &[
            "##############",
            "#@ $  #      #",
            "#  z $#  S   #",
            "#  !  Z      #",
            "#  !  #  $ ! #",
            "#N    #    W.#",
            "##############",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
