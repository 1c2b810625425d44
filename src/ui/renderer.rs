/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each board cell is drawn two terminal columns wide so the grid looks
/// square. The renderer only reads the world; it never mutates it.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Direction, EntityKind, Position};
use crate::domain::tile::{FieldColor, Tile, TurnBias};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so row
    /// gaps match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Each board cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const DIM: Color = Color::DarkGrey;

/// Map a terminal position onto a board cell of a `width`×`height` board.
fn screen_to_cell(x: u16, y: u16, width: usize, height: usize) -> Option<Position> {
    let (x, y) = (x as usize, y as usize);
    if x < MAP_COL || y < MAP_ROW {
        return None;
    }
    let row = y - MAP_ROW;
    let col = (x - MAP_COL) / CELL_W;
    (row < height && col < width).then(|| Position::new(row, col))
}

/// What the frame should show besides the board.
pub enum View<'a> {
    Game,
    LevelSelect { names: &'a [String], cursor: usize },
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Board size of the last frame, for mapping clicks.
    board_dims: (usize, usize),
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            board_dims: (0, 0),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    /// Which board cell sits under terminal position (x, y), if any.
    pub fn cell_at(&self, x: u16, y: u16) -> Option<Position> {
        screen_to_cell(x, y, self.board_dims.0, self.board_dims.1)
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.invalidate();
    }

    pub fn render(&mut self, world: &WorldState, view: View<'_>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.board_dims = (world.board.width(), world.board.height());

        self.front.clear();
        match view {
            View::Game => self.compose_game(world),
            View::LevelSelect { names, cursor } => self.compose_level_select(world, names, cursor),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let board = &w.board;

        // ── HUD row ──
        let hud = format!(
            " Level {}: {}   Keys: {}   Turn: {} ",
            w.level_number, w.level_name, w.keys_held(), w.turn,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for pos in board.positions() {
            let (c0, c1, fg, bg) = cell_glyph(w, pos);
            let x = MAP_COL + pos.col * CELL_W;
            let y = MAP_ROW + pos.row;
            self.front.set(x, y, Cell::new(c0, fg, bg));
            self.front.set(x + 1, y, Cell::new(c1, fg, bg));
        }

        // ── Status bar ──
        let status_row = MAP_ROW + board.height() + 1;
        if let Some(notice) = w.status {
            let msg = format!(" ◈ {notice} ");
            let bg = Color::Rgb { r: 200, g: 180, b: 50 };
            self.front.fill_row(status_row, bg);
            self.front.put_str(0, status_row, &msg, Color::Black, bg);
        }

        // ── Help bar ──
        let help = " ←↑↓→/WASD/click: move   R: restart   N: next   L: levels   Q: quit";
        self.front.put_str(0, status_row + 2, help, DIM, Color::Reset);

        match w.phase {
            Phase::Won => self.compose_banner(w, "LEVEL COMPLETE", "N: next level   R: replay   L: levels"),
            Phase::Lost(reason) => {
                let reason = reason.to_string();
                self.compose_banner(w, &reason, "R: try again   L: levels")
            }
            _ => {}
        }
    }

    /// A two-line banner centered over the board.
    fn compose_banner(&mut self, w: &WorldState, title: &str, hint: &str) {
        let map_cols = w.board.width() * CELL_W;
        let box_w = title.chars().count().max(hint.chars().count()) + 4;
        let x = MAP_COL + map_cols.saturating_sub(box_w) / 2;
        let y = MAP_ROW + w.board.height().saturating_sub(2) / 2;
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };

        for dy in 0..4 {
            for dx in 0..box_w {
                self.front.set(x + dx, y + dy, Cell::new(' ', Color::White, bg));
            }
        }
        let center = |s: &str| x + (box_w - s.chars().count()) / 2;
        self.front.put_str(center(title), y + 1, title, GOLD, bg);
        self.front.put_str(center(hint), y + 2, hint, Color::Rgb { r: 100, g: 200, b: 255 }, bg);
    }

    fn compose_level_select(&mut self, w: &WorldState, names: &[String], cursor: usize) {
        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        let cursor_bg = Color::Rgb { r: 30, g: 60, b: 30 };

        self.front.put_str(2, 1, "╔═══════════════════════════════╗", GOLD, Color::Reset);
        self.front.put_str(2, 2, "║          LEVEL  SELECT        ║", GOLD, Color::Reset);
        self.front.put_str(2, 3, "╚═══════════════════════════════╝", GOLD, Color::Reset);

        let list_top = 5;
        let visible = self.front.height.saturating_sub(list_top + 3).max(1);
        let scroll = cursor.saturating_sub(visible - 1);

        for (i, name) in names.iter().enumerate().skip(scroll).take(visible) {
            let row = list_top + i - scroll;
            let line = format!("{:>3}. {}", i + 1, name);
            if i == cursor {
                for x in 0..40.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, cursor_bg));
                }
                self.front.put_str(2, row, "▸", hi, cursor_bg);
                self.front.put_str(3, row, &line, hi, cursor_bg);
            } else {
                let fg = if i + 1 == w.level_number { GOLD } else { Color::White };
                self.front.put_str(3, row, &line, fg, Color::Reset);
            }
        }

        let footer = list_top + visible.min(names.len()) + 1;
        self.front.put_str(2, footer, "ENTER: play   ↑↓: choose   ESC: back", DIM, Color::Reset);
    }
}

/// Two glyphs plus colors for one board cell: occupant first, then floor.
fn cell_glyph(w: &WorldState, pos: Position) -> (char, char, Color, Color) {
    let board = &w.board;
    let floor = board.stationary_at(pos);
    let floor_bg = match floor {
        Tile::PlayerGoal => Color::Rgb { r: 20, g: 70, b: 20 },
        Tile::Gap => Color::Black,
        _ => Color::Reset,
    };

    if let Some(e) = board.entity_at(pos) {
        return match e.kind {
            EntityKind::Player { .. } => {
                let fg = match w.phase {
                    Phase::Lost(_) => Color::Red,
                    _ => Color::Rgb { r: 255, g: 230, b: 80 },
                };
                ('◖', '◗', fg, floor_bg)
            }
            EntityKind::Guard { .. } => {
                let ch = match e.facing {
                    Direction::North => '▲',
                    Direction::East => '▶',
                    Direction::South => '▼',
                    Direction::West => '◀',
                };
                (ch, ch, Color::Rgb { r: 255, g: 80, b: 80 }, floor_bg)
            }
            EntityKind::Box => ('[', ']', Color::Rgb { r: 200, g: 140, b: 70 }, Color::Rgb { r: 80, g: 50, b: 20 }),
        };
    }

    match floor {
        Tile::EmptyPassage => (' ', ' ', Color::Reset, Color::Reset),
        Tile::Wall => ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        Tile::Gap => (' ', ' ', Color::Reset, Color::Black),
        Tile::PlayerGoal => ('◎', ' ', Color::Rgb { r: 80, g: 255, b: 80 }, floor_bg),
        Tile::Key => ('o', '╖', GOLD, Color::Reset),
        Tile::Lock => ('╞', '╡', GOLD, Color::Rgb { r: 90, g: 70, b: 10 }),
        Tile::OpenLock => ('╞', '╡', DIM, Color::Reset),
        Tile::SwitchDirection(TurnBias::Right) => ('↻', ' ', Color::Rgb { r: 180, g: 100, b: 200 }, Color::Reset),
        Tile::SwitchDirection(TurnBias::Left) => ('↺', ' ', Color::Rgb { r: 180, g: 100, b: 200 }, Color::Reset),
        Tile::ForceFieldOpener(color) => ('◆', '◆', field_fg(color), Color::Reset),
        Tile::ForceField { color, active: true } => ('▓', '▓', field_fg(color), Color::Reset),
        Tile::ForceField { color, active: false } => ('░', '░', field_fg(color), Color::Reset),
        Tile::BoxInGap => ('▒', '▒', Color::Rgb { r: 120, g: 80, b: 40 }, Color::Rgb { r: 40, g: 25, b: 10 }),
    }
}

fn field_fg(color: FieldColor) -> Color {
    match color {
        FieldColor::Blue => Color::Rgb { r: 80, g: 140, b: 255 },
        FieldColor::Red => Color::Rgb { r: 255, g: 90, b: 90 },
    }
}
