//! Scroller -- entry point.
//!
//! Windowed mode: winit drives the event loop via `ApplicationHandler` and the
//! controller runs inside `RedrawRequested` on a fixed timestep (see
//! `TimeState`). Key and resize events are merged as they arrive; ticks only
//! ever see them between steps.
//!
//! `--replay <file>` runs a recorded input sequence headless instead, with a
//! manual clock, and logs the final player state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use scroller_core::input::Key;
use scroller_core::time::{Clock, ManualClock, SystemClock, TimeState};
use scroller_game::collision::KinematicWorld;
use scroller_game::config::{load_config_from_path, GameConfig};
use scroller_game::level::{load_level_from_path, LevelFile};
use scroller_game::replay::{load_replay_from_path, run_replay};
use scroller_game::world::ViewportSize;
use scroller_game::Game;
use scroller_platform::{create_window, map_key, PlatformConfig};

#[derive(Debug, Default)]
struct CliArgs {
    config: Option<PathBuf>,
    level: Option<PathBuf>,
    replay: Option<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut out = CliArgs::default();
    let mut args = args;
    while let Some(flag) = args.next() {
        let slot = match flag.as_str() {
            "--config" => &mut out.config,
            "--level" => &mut out.level,
            "--replay" => &mut out.replay,
            other => return Err(format!("Unknown argument '{other}'")),
        };
        let value = args
            .next()
            .ok_or_else(|| format!("Missing value for {flag}"))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(out)
}

fn build_game(args: &CliArgs) -> Result<Game<KinematicWorld>, String> {
    let config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => GameConfig::default(),
    };
    let level = match &args.level {
        Some(path) => load_level_from_path(path)?,
        None => LevelFile::builtin(),
    };
    Game::new(config, &level, KinematicWorld::new(config.simulation))
}

fn run_headless(args: &CliArgs, replay_path: &Path) -> Result<(), String> {
    let replay = load_replay_from_path(replay_path)?;
    let mut game = build_game(args)?;
    let clock = ManualClock::new(0);
    let reports = run_replay(&mut game, &replay, &clock);

    let jumps = reports.iter().filter(|r| r.jumped.is_some()).count();
    let shots = reports.iter().filter(|r| r.fired.is_some()).count();
    log::info!(
        "Replay finished: {} ticks, {} jump(s), {} shot(s), {} projectile(s) live",
        reports.len(),
        jumps,
        shots,
        game.projectiles().len()
    );
    if let Some(player) = game.player_snapshot() {
        log::info!(
            "Player at ({:.2}, {:.2}) vel ({:.2}, {:.2}) facing {:?} grounded {} stage {}",
            player.position.x,
            player.position.y,
            player.velocity.x,
            player.velocity.y,
            player.facing,
            player.grounded,
            player.jump_stage.index()
        );
    }
    Ok(())
}

struct RunState {
    window: Arc<Window>,
    game: Game<KinematicWorld>,
    time: TimeState,
    clock: SystemClock,
}

impl RunState {
    fn apply_window_size(&mut self) {
        let scale = self.window.scale_factor();
        let logical = self.window.inner_size().to_logical::<f64>(scale);
        let size = ViewportSize::new(logical.width as f32, logical.height as f32, scale as f32);
        if let Err(e) = self.game.handle_resize(size) {
            log::warn!("{e}");
        }
    }
}

struct App {
    args: CliArgs,
    platform: PlatformConfig,
    state: Option<RunState>,
}

impl App {
    fn new(args: CliArgs) -> Self {
        Self {
            args,
            platform: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let started = create_window(event_loop, &self.platform).and_then(|window| {
            let game = build_game(&self.args)?;
            Ok(RunState {
                window,
                game,
                time: TimeState::new(),
                clock: SystemClock::new(),
            })
        });
        match started {
            Ok(mut state) => {
                state.apply_window_size();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                state.apply_window_size();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    let Some(key) = map_key(key_code) else {
                        return;
                    };
                    let pressed = event.state == ElementState::Pressed;
                    if key == Key::Escape && pressed {
                        event_loop.exit();
                        return;
                    }
                    state.game.handle_key(key, pressed);
                }
            }

            WindowEvent::RedrawRequested => {
                state.time.begin_frame();
                while state.time.should_step() {
                    let report = state.game.tick(state.clock.now_ms());
                    log::trace!(
                        "tick {} bounds ({:.1}, {:.1})..({:.1}, {:.1})",
                        report.tick,
                        report.bounds.min.x,
                        report.bounds.min.y,
                        report.bounds.max.x,
                        report.bounds.max.y
                    );
                }
                state.time.end_frame();
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            log::error!("usage: scroller_game [--config FILE] [--level FILE] [--replay FILE]");
            std::process::exit(2);
        }
    };

    if let Some(replay) = args.replay.clone() {
        if let Err(e) = run_headless(&args, &replay) {
            log::error!("{e}");
            std::process::exit(1);
        }
        return;
    }

    log::info!("Scroller starting...");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
        std::process::exit(1);
    }
}
