/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use sim::event::GameEvent;
use sim::level::{load_world, start_level, LevelCatalog};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState};
use ui::renderer::{Renderer, View};
use ui::sound::{effects_for, SoundEngine};

const FRAME_WAIT: Duration = Duration::from_millis(50);

/// Which screen owns the input this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Screen {
    Playing,
    LevelSelect { cursor: usize },
}

fn main() {
    let config = GameConfig::load();
    init_tracing(&config.log);

    if let Err(e) = run(&config) {
        error!(%e, "game error");
        eprintln!("Game error: {e}");
    }
}

/// Logging goes to a file only; stdout is the game screen.
fn init_tracing(log: &LogConfig) {
    let Some(path) = &log.file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn run(config: &GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = LevelCatalog::load(config.levels_dir.as_deref());
    let mut world = match load_world(&catalog, config.start_level) {
        Ok(w) => w,
        Err(e) => {
            warn!(%e, start = config.start_level, "falling back to level 1");
            load_world(&catalog, 1)?
        }
    };

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };

    let mut renderer = Renderer::new();
    renderer.init()?;

    let result = game_loop(&mut world, &catalog, &mut renderer, sound.as_ref(), config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!("Thanks for playing DisCaptive!");
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    catalog: &LevelCatalog,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let names: Vec<String> = catalog.names().map(str::to_owned).collect();
    let mut screen = Screen::Playing;

    loop {
        kb.drain_events(FRAME_WAIT);
        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.resized {
            renderer.invalidate();
        }

        let mut actions: Vec<Action> = kb.actions().to_vec();
        actions.extend_from_slice(gp.update());

        for action in actions {
            let next = match screen {
                Screen::Playing => handle_playing(world, catalog, sound, action),
                Screen::LevelSelect { cursor } => {
                    handle_level_select(world, catalog, cursor, action)
                }
            };
            match next {
                Some(s) => screen = s,
                None => return Ok(()),
            }
        }

        if screen == Screen::Playing {
            for &(x, y) in kb.clicks() {
                if let Some(pos) = renderer.cell_at(x, y) {
                    let events = step::submit_click(world, pos.row, pos.col);
                    play_effects(sound, &events);
                }
            }
        }

        let view = match screen {
            Screen::Playing => View::Game,
            Screen::LevelSelect { cursor } => View::LevelSelect { names: &names, cursor },
        };
        renderer.render(world, view)?;
    }

    Ok(())
}

/// Returns the next screen, or None to quit.
fn handle_playing(
    world: &mut WorldState,
    catalog: &LevelCatalog,
    sound: Option<&SoundEngine>,
    action: Action,
) -> Option<Screen> {
    match action {
        Action::Quit => return None,
        Action::Move(dir) => {
            let events = step::submit_direction(world, dir);
            play_effects(sound, &events);
        }
        Action::Restart => step::restart_level(world),
        Action::NextLevel | Action::Confirm => match world.phase {
            Phase::Won => advance(world, catalog),
            Phase::Lost(_) => step::restart_level(world),
            _ => {}
        },
        Action::LevelSelect => {
            return Some(Screen::LevelSelect { cursor: world.level_number.saturating_sub(1) });
        }
    }
    Some(Screen::Playing)
}

fn handle_level_select(
    world: &mut WorldState,
    catalog: &LevelCatalog,
    cursor: usize,
    action: Action,
) -> Option<Screen> {
    use domain::entity::Direction;

    let last = catalog.len().saturating_sub(1);
    let cursor = match action {
        Action::Quit | Action::LevelSelect => return Some(Screen::Playing),
        Action::Move(Direction::North | Direction::West) => cursor.saturating_sub(1),
        Action::Move(Direction::South | Direction::East) => (cursor + 1).min(last),
        Action::Confirm | Action::NextLevel => {
            if let Err(e) = start_level(world, catalog, cursor + 1) {
                warn!(%e, "level select failed");
            }
            return Some(Screen::Playing);
        }
        Action::Restart => cursor,
    };
    Some(Screen::LevelSelect { cursor })
}

/// Move on after a win; the last level wraps around to the first.
fn advance(world: &mut WorldState, catalog: &LevelCatalog) {
    let next = catalog.next_after(world.level_number).unwrap_or(1);
    if next == 1 {
        info!("all levels cleared");
    }
    if let Err(e) = start_level(world, catalog, next) {
        warn!(%e, next, "could not start next level");
    }
}

fn play_effects(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for effect in effects_for(events) {
        sfx.play(effect);
    }
}
