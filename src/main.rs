/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use log::info;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::{load_level, load_levels, LevelDef};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, Key};
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let levels = load_levels(&config);
    info!("{} level(s) available, seed {:#x}", levels.len(), config.seed);

    let mut world = WorldState::new(&config);
    world.total_levels = levels.len();

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, &levels);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Qixline!");
    println!(
        "Reached level {}/{} with {}% claimed.",
        world.current_level + 1,
        world.total_levels,
        world.territory.captured_percent()
    );
}

/// The terminal belongs to the renderer, so log records only go to a
/// file. `RUST_LOG` overrides the configured level.
fn init_logging(config: &GameConfig) {
    let path = match &config.log_file {
        Some(p) => p,
        None => return,
    };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    levels: &[LevelDef],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced;
    let mut gp = GamepadState::new(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // Edge-triggered between ticks, consumed by the next one
    let mut pending_incursion = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.pressed(Key::Quit) {
            break;
        }
        if handle_meta(world, &kb, &gp, levels) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused {
            if kb.pressed(Key::Incursion) || gp.incursion_pressed() {
                pending_incursion = true;
            }
        } else {
            pending_incursion = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.phase == Phase::Playing && !world.paused {
                let input = FrameInput {
                    movement: kb.movement().or_else(|| gp.movement()),
                    start_incursion: std::mem::take(&mut pending_incursion),
                };
                let events = step::step(world, input);
                process_sound_events(sound, &events);
            } else if world.message_timer > 0 {
                // step() owns the timer while playing
                world.message_timer -= 1;
                if world.message_timer == 0 { world.message.clear(); }
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Messages are set by `step`; events only drive sound here.
fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for effect in events.iter().filter_map(Sfx::for_event) {
        sfx.play(effect);
    }
}

/// Start a new game from level 0.
fn start_new_game(world: &mut WorldState, levels: &[LevelDef]) {
    load_level(world, 0, levels, false);
    if world.phase != Phase::GameComplete {
        world.phase = Phase::Playing;
        world.set_message(&format!("Level 1: {}", world.level_name), 40);
    }
}

fn advance_level(world: &mut WorldState, levels: &[LevelDef]) {
    let next = world.current_level + 1;
    load_level(world, next, levels, true);
    if world.phase == Phase::GameComplete {
        info!("all {} level(s) cleared", levels.len());
    } else {
        world.phase = Phase::Playing;
        world.set_message(&format!("Level {}: {}", next + 1, world.level_name), 40);
    }
}

fn return_to_title(world: &mut WorldState) {
    world.paused = false;
    world.message.clear();
    world.message_timer = 0;
    world.phase = Phase::Title;
}

/// Phase transitions driven by menu keys. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, levels: &[LevelDef]) -> bool {
    let confirm = kb.pressed(Key::Confirm) || gp.confirm_pressed();
    let back = kb.pressed(Key::Back) || gp.cancel_pressed();
    let restart = kb.pressed(Key::Restart) || gp.restart_pressed();

    match world.phase {
        Phase::Title => {
            if confirm {
                start_new_game(world, levels);
            } else if back {
                return true;
            }
        }
        Phase::Playing => {
            if kb.pressed(Key::Pause) {
                world.paused = !world.paused;
            } else if restart {
                world.paused = false;
                step::restart_level(world);
                world.set_message("Level Restarted", 30);
            } else if back {
                return_to_title(world);
            }
        }
        Phase::LevelComplete => {
            if confirm {
                advance_level(world, levels);
            } else if back {
                return_to_title(world);
            }
        }
        Phase::GameOver => {
            if confirm || restart {
                step::restart_level(world);
            } else if back {
                return_to_title(world);
            }
        }
        Phase::GameComplete => {
            if confirm || back {
                return_to_title(world);
            }
        }
    }
    false
}
