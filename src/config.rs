/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/ninja-dash`. Missing files and missing keys fall back
/// to defaults. Problems found while loading are kept in `warnings` so
/// they can be logged once the log file is open.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".local/share/ninja-dash";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
    pub sound: SoundConfig,
    pub levels_dir: PathBuf,
    /// Where high scores (and by default the log) are written.
    pub data_dir: PathBuf,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub dash: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

/// Per-effect playback volume, 0.0..=1.0.
#[derive(Clone, Debug)]
pub struct SoundConfig {
    pub jump: f32,
    pub dash: f32,
    pub hit: f32,
    pub shoot: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump_buttons")]
    jump: Vec<String>,
    #[serde(default = "default_dash_buttons")]
    dash: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_jump_volume")]
    jump: f32,
    #[serde(default = "default_dash_volume")]
    dash: f32,
    #[serde(default = "default_hit_volume")]
    hit: f32,
    #[serde(default = "default_shoot_volume")]
    shoot: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    data_dir: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 } // ~60 fps

fn default_jump_buttons() -> Vec<String> { vec!["A".into()] }
fn default_dash_buttons() -> Vec<String> { vec!["X".into(), "B".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

fn default_jump_volume() -> f32 { 0.2 }
fn default_dash_volume() -> f32 { 0.3 }
fn default_hit_volume() -> f32 { 0.8 }
fn default_shoot_volume() -> f32 { 0.4 }

fn default_levels_dir() -> String { "levels".into() }

const DEFAULT_LOG_FILE: &str = "ninja-dash.log";

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump_buttons(),
            dash: default_dash_buttons(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound {
            jump: default_jump_volume(),
            dash: default_dash_volume(),
            hit: default_hit_volume(),
            shoot: default_shoot_volume(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            data_dir: None,
            seed: None,
            log_file: None,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/ninja-dash`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        cfg.warnings.extend(warnings);
        cfg
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let mut warnings = Vec::new();

        // Resolve levels directory against the search dirs.
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let data_dir = match &toml_cfg.general.data_dir {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                if let Err(e) = std::fs::create_dir_all(&dir) {
                    warnings.push(format!("could not create data_dir {}: {e}", dir.display()));
                }
                dir
            }
            None => writable_data_dir(),
        };

        let log_file = match &toml_cfg.general.log_file {
            Some(f) if Path::new(f).is_absolute() => PathBuf::from(f),
            Some(f) => data_dir.join(f),
            None => data_dir.join(DEFAULT_LOG_FILE),
        };

        let s = &toml_cfg.sound;
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                dash: toml_cfg.gamepad.dash,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            sound: SoundConfig {
                jump: s.jump.clamp(0.0, 1.0),
                dash: s.dash.clamp(0.0, 1.0),
                hit: s.hit.clamp(0.0, 1.0),
                shoot: s.shoot.clamp(0.0, 1.0),
            },
            levels_dir,
            data_dir,
            seed: toml_cfg.general.seed,
            log_file,
            warnings,
        }
    }
}

fn parse_toml(text: &str) -> Result<TomlConfig> {
    toml::from_str::<TomlConfig>(text).context("config.toml parse error")
}

/// Candidate directories to search: exe dir + CWD + app data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let app = PathBuf::from(&home).join(APP_DIR);
        if app.is_dir() && !dirs.iter().any(|d| d == &app) {
            dirs.push(app);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First writable of: exe dir, `~/.local/share/ninja-dash`, CWD.
fn writable_data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let probe = parent.join(".write_test_ninja_dash");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let app = PathBuf::from(&home).join(APP_DIR);
        if std::fs::create_dir_all(&app).is_ok() {
            return app;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Use the first `config.toml` found. A broken file means defaults.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match parse_toml(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warnings.push(format!("{}: {e:#}; using default settings", path.display()));
                    return TomlConfig::default();
                }
            },
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    TomlConfig::default()
}
