/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::assets::AssetTable;
use sim::event::GameEvent;
use sim::highscore::{record_run, FileScoreStore, ScoreStore};
use sim::level::load_levels;
use sim::step::{self, FrameInput};
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, CONFIRM_KEYS, DASH_KEYS, JUMP_KEYS};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    let config = GameConfig::load();
    init_logging(&config.log_file);
    for w in &config.warnings {
        tracing::warn!("{w}");
    }
    tracing::info!(
        levels_dir = %config.levels_dir.display(),
        data_dir = %config.data_dir.display(),
        tick_ms = config.speed.tick_rate_ms,
        "starting ninja-dash"
    );

    let assets = AssetTable::builtin().context("building sprite table")?;
    let levels = load_levels(&config.levels_dir);
    let mut world = WorldState::new(assets, levels, config.speed.tick_rate_ms, config.seed);

    let mut store = FileScoreStore::new(&config.data_dir);
    world.high_score = store.get_high_score();
    tracing::info!(path = %store.path().display(), best = world.high_score.0, "score store");

    let sound = SoundEngine::new(&config.sound);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let mut kb = InputState::new();
    // Real key releases when the terminal can report them.
    if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        if execute!(std::io::stdout(), PushKeyboardEnhancementFlags(flags)).is_ok() {
            kb.honor_release = true;
        }
    }

    let result = game_loop(&mut world, &mut renderer, &mut kb, &mut store, sound.as_ref(), &config);

    if kb.honor_release {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    renderer.cleanup().context("terminal cleanup failed")?;
    result?;

    println!();
    println!("Thanks for playing Ninja Dash!");
    println!("Score: {}   Best: {}", world.score.total, world.high_score.0);
    Ok(())
}

/// Logs go to a file because the terminal is in raw mode. If the file can't
/// be opened the game runs without logging.
fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    store: &mut dyn ScoreStore,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Edge-triggered actions are latched until the next tick consumes them.
    let mut pending_jump = false;
    let mut pending_dash = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        let phase_before = world.phase;
        if handle_meta(world, kb, &gp) {
            break;
        }

        // The confirm that started a run is not also its first jump.
        if world.phase == Phase::Playing && phase_before == Phase::Playing && !world.paused {
            pending_jump |= kb.any_pressed(JUMP_KEYS) || gp.jump_pressed();
            pending_dash |= kb.any_pressed(DASH_KEYS) || gp.dash_pressed();
        } else {
            pending_jump = false;
            pending_dash = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.phase == Phase::Playing && !world.paused {
                let input = FrameInput {
                    movement_x: detect_movement(kb, &gp),
                    jump: std::mem::take(&mut pending_jump),
                    dash: std::mem::take(&mut pending_dash),
                };
                let events = step::step(world, input);
                process_events(world, store, sound, &events);
            }
            last_tick = Instant::now();
        }

        renderer.render(world).context("drawing frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn detect_movement(kb: &InputState, gp: &GamepadState) -> f32 {
    let keys = kb.movement_x();
    if keys != 0.0 {
        return keys;
    }
    (gp.right_held() as i32 - gp.left_held() as i32) as f32
}

fn process_events(
    world: &mut WorldState,
    store: &mut dyn ScoreStore,
    sound: Option<&SoundEngine>,
    events: &[GameEvent],
) {
    for event in events {
        match *event {
            GameEvent::Sound(sfx) => {
                if let Some(s) = sound {
                    s.play(sfx);
                }
            }
            GameEvent::RunEnded { score, level } => {
                record_run(world, store, score, level);
            }
            GameEvent::GameComplete { score } => {
                let level = world.total_levels() as u32;
                record_run(world, store, score, level);
            }
            _ => {}
        }
    }
}

/// Phase navigation and meta keys. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(CONFIRM_KEYS) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    if esc {
        return true;
    }

    // F1: Pause / Resume
    if world.phase == Phase::Playing && kb.any_pressed(&[KeyCode::F(1)]) {
        world.paused = !world.paused;
        return false;
    }

    match world.phase {
        Phase::Title => {
            if confirm {
                step::start_game(world);
            }
        }
        Phase::Playing => {}
        Phase::GameOver => {
            if confirm {
                step::restart_level(world);
            }
        }
        Phase::GameComplete => {
            if confirm {
                world.phase = Phase::Title;
            }
        }
    }

    false
}
