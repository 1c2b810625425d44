/// Input collector.
///
/// The game is turn-based, so every key press (or terminal auto-repeat)
/// is one action; there is no held-key tracking. Left mouse presses are
/// kept as raw terminal coordinates for the renderer to map onto cells.
///
/// Key Release events are ignored; terminals that report them would
/// otherwise double every move.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::entity::Direction;

/// Something the player asked for this frame, from keyboard or gamepad.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(Direction),
    Restart,
    NextLevel,
    LevelSelect,
    Confirm,
    Quit,
}

pub struct InputState {
    /// Key presses collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,
    actions: Vec<Action>,
    /// Left-button presses as (column, row) terminal coordinates.
    clicks: Vec<(u16, u16)>,
    /// The terminal was resized; the renderer should repaint everything.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            raw_events: Vec::with_capacity(8),
            actions: Vec::with_capacity(8),
            clicks: Vec::with_capacity(2),
            resized: false,
        }
    }

    /// Drain all pending terminal events, waiting up to `timeout` for the first.
    pub fn drain_events(&mut self, timeout: Duration) {
        self.raw_events.clear();
        self.actions.clear();
        self.clicks.clear();
        self.resized = false;

        let mut wait = timeout;
        while poll(wait).unwrap_or(false) {
            wait = Duration::ZERO;
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    self.raw_events.push(key);
                    if let Some(action) = action_for(key.code) {
                        self.actions.push(action);
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        self.clicks.push((mouse.column, mouse.row));
                    }
                }
                Ok(Event::Resize(..)) => self.resized = true,
                _ => {}
            }
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn clicks(&self) -> &[(u16, u16)] {
        &self.clicks
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

fn action_for(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Up => Action::Move(Direction::North),
        KeyCode::Down => Action::Move(Direction::South),
        KeyCode::Left => Action::Move(Direction::West),
        KeyCode::Right => Action::Move(Direction::East),
        KeyCode::Enter => Action::Confirm,
        KeyCode::Esc => Action::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Action::Move(Direction::North),
            's' => Action::Move(Direction::South),
            'a' => Action::Move(Direction::West),
            'd' => Action::Move(Direction::East),
            'r' => Action::Restart,
            'n' => Action::NextLevel,
            'l' => Action::LevelSelect,
            'q' => Action::Quit,
            ' ' => Action::Confirm,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_move() {
        assert_eq!(action_for(KeyCode::Up), Some(Action::Move(Direction::North)));
        assert_eq!(action_for(KeyCode::Char('a')), Some(Action::Move(Direction::West)));
        assert_eq!(action_for(KeyCode::Char('D')), Some(Action::Move(Direction::East)));
    }

    #[test]
    fn meta_keys() {
        assert_eq!(action_for(KeyCode::Char('r')), Some(Action::Restart));
        assert_eq!(action_for(KeyCode::Char('n')), Some(Action::NextLevel));
        assert_eq!(action_for(KeyCode::Char('l')), Some(Action::LevelSelect));
        assert_eq!(action_for(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(action_for(KeyCode::Char('x')), None);
    }
}
