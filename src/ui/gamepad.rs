/// Gamepad input using gilrs.
///
/// Every press is one action, same as the keyboard:
///   D-pad / Left Stick    →  Move (stick fires once per push past the deadzone)
///   Select                →  Restart
///   Start / A             →  Next level / Confirm
///   Y                     →  Level select
///   Mode                  →  Quit
///
/// Button lists for restart, next level, level select and quit come from
/// the `[gamepad]` section of config.toml.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;
use crate::ui::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
    Mode,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            "MODE" | "HOME" | "GUIDE" => Some(Btn::Mode),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            Button::Mode => Some(Btn::Mode),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    restart: Vec<Btn>,
    next_level: Vec<Btn>,
    level_select: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    /// Unknown names are dropped; an empty list keeps the default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: &[Btn]) -> Vec<Btn> {
            let btns: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if btns.is_empty() { fallback.to_vec() } else { btns }
        }
        ActionMap {
            restart: parse_list(&cfg.restart, &[Btn::Select]),
            next_level: parse_list(&cfg.next_level, &[Btn::Start, Btn::A]),
            level_select: parse_list(&cfg.level_select, &[Btn::Y]),
            quit: parse_list(&cfg.quit, &[Btn::Mode]),
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn action_for(&self, btn: Btn) -> Option<Action> {
        if self.restart.contains(&btn) {
            Some(Action::Restart)
        } else if self.next_level.contains(&btn) {
            Some(Action::NextLevel)
        } else if self.level_select.contains(&btn) {
            Some(Action::LevelSelect)
        } else if self.quit.contains(&btn) {
            Some(Action::Quit)
        } else {
            None
        }
    }
}

/// Which way the stick points, if it is past the deadzone.
/// The dominant axis wins; gilrs reports +Y as up.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    Some(if x.abs() >= y.abs() {
        if x > 0.0 { Direction::East } else { Direction::West }
    } else if y > 0.0 {
        Direction::North
    } else {
        Direction::South
    })
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    stick_x: f32,
    stick_y: f32,
    /// Stick direction as of the last update, for edge detection.
    stick_dir: Option<Direction>,

    action_map: ActionMap,
    actions: Vec<Action>,

    #[allow(dead_code)]
    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            stick_x: 0.0,
            stick_y: 0.0,
            stick_dir: None,
            action_map: ActionMap::from_config(cfg),
            actions: Vec::with_capacity(4),
            connected,
        }
    }

    /// Poll the controller; returns this frame's actions.
    pub fn update(&mut self) -> &[Action] {
        self.actions.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        &self.actions
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir.is_some() && dir != self.stick_dir {
            self.actions.extend(dir.map(Action::Move));
        }
        self.stick_dir = dir;
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        let dpad = match gilrs_btn {
            Button::DPadUp => Some(Direction::North),
            Button::DPadDown => Some(Direction::South),
            Button::DPadLeft => Some(Direction::West),
            Button::DPadRight => Some(Direction::East),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.actions.push(Action::Move(dir));
            return;
        }
        if let Some(action) = Btn::from_gilrs(gilrs_btn).and_then(|b| self.action_map.action_for(b)) {
            self.actions.push(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(restart: &[&str]) -> GamepadConfig {
        GamepadConfig {
            restart: restart.iter().map(|s| s.to_string()).collect(),
            next_level: vec![],
            level_select: vec!["north".into()],
            quit: vec!["bogus".into()],
        }
    }

    #[test]
    fn configured_buttons_map_to_actions() {
        let map = ActionMap::from_config(&cfg(&["B", "l1"]));
        assert_eq!(map.action_for(Btn::B), Some(Action::Restart));
        assert_eq!(map.action_for(Btn::L1), Some(Action::Restart));
        assert_eq!(map.action_for(Btn::Y), Some(Action::LevelSelect));
        assert_eq!(map.action_for(Btn::X), None);
    }

    #[test]
    fn empty_or_unknown_lists_keep_defaults() {
        let map = ActionMap::from_config(&cfg(&[]));
        assert_eq!(map.action_for(Btn::Select), Some(Action::Restart));
        assert_eq!(map.action_for(Btn::Start), Some(Action::NextLevel));
        assert_eq!(map.action_for(Btn::Mode), Some(Action::Quit));
    }

    #[test]
    fn stick_uses_the_dominant_axis() {
        assert_eq!(stick_direction(0.1, 0.2), None);
        assert_eq!(stick_direction(0.9, 0.3), Some(Direction::East));
        assert_eq!(stick_direction(-0.2, -0.8), Some(Direction::South));
        assert_eq!(stick_direction(0.0, 0.7), Some(Direction::North));
    }
}
