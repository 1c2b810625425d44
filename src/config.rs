/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/discaptive`. Falls back to defaults if the file is
/// missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Resolved levels directory, or None if it does not exist anywhere.
    pub levels_dir: Option<PathBuf>,
    pub start_level: usize,
    pub sound_enabled: bool,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub restart: Vec<String>,
    pub next_level: Vec<String>,
    pub level_select: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Log file. None keeps logging off (the terminal belongs to the game).
    pub file: Option<PathBuf>,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_level")]
    start_level: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_next_level")]
    next_level: Vec<String>,
    #[serde(default = "default_level_select")]
    level_select: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default)]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_start_level() -> usize { 1 }
fn default_true() -> bool { true }
fn default_log_filter() -> String { "info".into() }

fn default_restart() -> Vec<String> { vec!["Select".into()] }
fn default_next_level() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_level_select() -> Vec<String> { vec!["Y".into()] }
fn default_quit() -> Vec<String> { vec!["Mode".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: true }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            restart: default_restart(),
            next_level: default_next_level(),
            level_select: default_level_select(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: String::new(),
            filter: default_log_filter(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let file = cfg.log.file.trim();
        GameConfig {
            levels_dir: resolve_levels_dir(&cfg.general.levels_dir, search_dirs),
            start_level: cfg.general.start_level.max(1),
            sound_enabled: cfg.sound.enabled,
            gamepad: GamepadConfig {
                restart: cfg.gamepad.restart,
                next_level: cfg.gamepad.next_level,
                level_select: cfg.gamepad.level_select,
                quit: cfg.gamepad.quit,
            },
            log: LogConfig {
                file: (!file.is_empty()).then(|| PathBuf::from(file)),
                filter: cfg.log.filter,
            },
        }
    }
}

/// Absolute paths are taken as given; relative ones are looked up in each
/// search directory in turn.
fn resolve_levels_dir(levels_dir: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let path = Path::new(levels_dir);
    if path.is_absolute() {
        return path.is_dir().then(|| path.to_path_buf());
    }
    search_dirs.iter().map(|d| d.join(path)).find(|p| p.is_dir())
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. ~/.local/share/discaptive
    if let Ok(home) = std::env::var("HOME") {
        let data = PathBuf::from(&home).join(".local/share/discaptive");
        if data.is_dir() && !dirs.iter().any(|d| d == &data) {
            dirs.push(data);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is set up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text),
            Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    toml::from_str(text).unwrap_or_else(|e| {
        eprintln!("Warning: config.toml parse error: {e}");
        eprintln!("Using default settings.");
        TomlConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml(parse_toml(""), &[]);
        assert_eq!(cfg.start_level, 1);
        assert!(cfg.sound_enabled);
        assert!(cfg.levels_dir.is_none());
        assert!(cfg.log.file.is_none());
        assert_eq!(cfg.log.filter, "info");
        assert_eq!(cfg.gamepad.restart, vec!["Select".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [general]
            start_level = 4

            [sound]
            enabled = false

            [log]
            file = "discaptive.log"
        "#;
        let cfg = GameConfig::from_toml(parse_toml(text), &[]);
        assert_eq!(cfg.start_level, 4);
        assert!(!cfg.sound_enabled);
        assert_eq!(cfg.log.file, Some(PathBuf::from("discaptive.log")));
        assert_eq!(cfg.log.filter, "info");
        assert_eq!(cfg.gamepad.quit, vec!["Mode".to_string()]);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let cfg = GameConfig::from_toml(parse_toml("[general\nstart_level = "), &[]);
        assert_eq!(cfg.start_level, 1);
    }

    #[test]
    fn level_zero_is_clamped() {
        let cfg = GameConfig::from_toml(parse_toml("[general]\nstart_level = 0"), &[]);
        assert_eq!(cfg.start_level, 1);
    }

    #[test]
    fn levels_dir_is_found_in_search_dirs() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("levels")).unwrap();
        let dirs = vec![root.path().join("missing"), root.path().to_path_buf()];
        assert_eq!(
            resolve_levels_dir("levels", &dirs),
            Some(root.path().join("levels"))
        );
        assert_eq!(resolve_levels_dir("other", &dirs), None);
    }
}
