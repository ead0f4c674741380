use anyhow::Result;
use clap::Parser;
use log::info;
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

mod core;
mod engine;
mod game;

use engine::game_loop::FrameClock;
use engine::input::{Action, InputManager};
use game::{FightSequence, FightStatus, SceneConfig, SceneLoader, TuningPreset, DEFAULT_FIGHT};

const TITLE: &str = "Bot Clash";

/// Scripted bot collision with rigid-body debris
#[derive(Parser, Debug)]
#[command(name = "bot-clash", about = "Two bots collide and break into debris")]
struct Options {
    /// Explosion tuning preset.
    #[arg(long, value_enum, default_value_t)]
    preset: TuningPreset,

    /// Seed for the random source (random if omitted).
    #[arg(long)]
    seed: Option<u64>,
}

fn status_title(status: &FightStatus, loaded: bool, fps: f32) -> String {
    if !loaded {
        return format!("{} - loading", TITLE);
    }
    if !status.collided {
        return format!("{} - {} (space to start, R to reset)", TITLE, status.phase.label());
    }
    format!(
        "{} - {} | spin {:.2} | settled {}/{} | {:.1}s | {:.0} fps",
        TITLE,
        status.phase.label(),
        status.weapon_spin,
        status.settled_pieces,
        status.total_pieces,
        status.explosion_elapsed,
        fps
    )
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = Options::parse();
    let seed = options.seed.unwrap_or_else(rand::random);
    info!("Starting {} (preset {}, seed {})", TITLE, options.preset, seed);

    let mut sequence = FightSequence::with_seed(options.preset.tuning(), DEFAULT_FIGHT, seed)?;
    let mut loader = SceneLoader::spawn(SceneConfig::new(&DEFAULT_FIGHT))?;
    let mut input = InputManager::default();
    let mut clock = FrameClock::new();
    let mut title = String::new();

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(TITLE)
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("Window created successfully");

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event, .. },
                ..
            } => {
                input.process_keyboard_event(&event);
            }
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                ..
            } => {
                if !loader.is_finished() {
                    for actor in loader.poll() {
                        sequence.insert_actor(actor);
                    }
                }

                for action in input.drain() {
                    match action {
                        Action::Start => sequence.start(),
                        Action::Reset => {
                            sequence.reset();
                            clock.restart();
                        }
                        Action::Quit => {
                            info!("Quit requested, shutting down...");
                            elwt.exit();
                        }
                    }
                }

                let dt = clock.begin_frame();
                let status = sequence.update(dt);

                let next = status_title(&status, sequence.is_loaded(), clock.fps());
                if next != title {
                    window.set_title(&next);
                    title = next;
                }
            }
            Event::AboutToWait => {
                // Request redraw on next frame
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
