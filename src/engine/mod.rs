//! Minimal 2D game host: runs one scene's lifecycle over a fixed-timestep
//! frame loop and renders its display list to the terminal.

pub mod assets;
pub mod display;
pub mod input;
pub mod physics;
pub mod scene;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use ratatui::{backend::Backend, Terminal};
use tracing::{debug, info};

use crate::config::Config;
use crate::ui;
use assets::{AssetLoader, TextureCache};
use display::DisplayList;
use input::{parse_key, KeyboardState};
use physics::PhysicsWorld;
use scene::{Scene, SceneContext};

pub use display::{Anchor, ObjectId};
pub use physics::{Body, BodyId, Collision};

/// Host settings that are not part of the scene's own logic.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub world_width: f32,
    pub world_height: f32,
    pub target_fps: u64,
    pub quit_keys: Vec<KeyCode>,
    pub pause_key: KeyCode,
    /// Whether the terminal delivers key release events
    pub reports_release: bool,
    pub key_hold: Duration,
    /// Controls line shown above the playfield
    pub hint: String,
}

impl EngineSettings {
    pub fn from_config(config: &Config, reports_release: bool) -> Result<Self> {
        let keys = &config.keybindings;
        let quit = parse_key(&keys.quit).context("keybindings.quit")?;
        let pause = parse_key(&keys.pause).context("keybindings.pause")?;

        let hint = format!(
            "{}/{}: Left  {}/{}: Right  {}: Serve  {}: Pause  {}: Quit",
            keys.left_paddle_up,
            keys.left_paddle_down,
            keys.right_paddle_up,
            keys.right_paddle_down,
            keys.serve,
            keys.pause,
            keys.quit,
        );

        Ok(Self {
            world_width: config.physics.field_width,
            world_height: config.physics.field_height,
            target_fps: config.display.target_fps,
            // Esc always quits so a bad binding can't trap the player
            quit_keys: vec![quit, KeyCode::Esc],
            pause_key: pause,
            reports_release,
            key_hold: Duration::from_millis(config.input.key_hold_ms),
            hint,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Quit,
}

pub struct Engine<S: Scene> {
    scene: S,
    physics: PhysicsWorld,
    display: DisplayList,
    textures: TextureCache,
    keyboard: KeyboardState,
    rng: StdRng,
    settings: EngineSettings,
    paused: bool,
}

impl<S: Scene> Engine<S> {
    /// Run the scene's `preload` and `create` hooks.
    pub fn boot(mut scene: S, settings: EngineSettings, rng: StdRng) -> Result<Self> {
        let mut loader = AssetLoader::default();
        scene.preload(&mut loader);
        let textures = loader.load();

        let mut engine = Self {
            physics: PhysicsWorld::new(settings.world_width, settings.world_height),
            display: DisplayList::default(),
            textures,
            keyboard: KeyboardState::new(settings.reports_release, settings.key_hold),
            rng,
            settings,
            paused: false,
            scene,
        };

        let mut ctx = SceneContext {
            physics: &mut engine.physics,
            display: &mut engine.display,
            keyboard: &engine.keyboard,
            rng: &mut engine.rng,
        };
        engine
            .scene
            .create(&mut ctx)
            .with_context(|| format!("creating scene {}", engine.scene.key()))?;

        info!(scene = engine.scene.key(), "scene started");
        Ok(engine)
    }

    fn timestep(&self) -> f32 {
        1.0 / self.settings.target_fps as f32
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    #[cfg(test)]
    pub(crate) fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Advance one frame: input, key-down callbacks, physics with collider
    /// callbacks, then the scene's `update`.
    pub fn step(&mut self, events: &[KeyEvent], now: Instant) -> StepOutcome {
        self.keyboard.begin_frame(now);

        let mut key_downs = Vec::new();
        for event in events {
            let Some(code) = self.keyboard.apply(event) else {
                continue;
            };
            if self.settings.quit_keys.contains(&code) {
                info!("quit requested");
                return StepOutcome::Quit;
            }
            if code == self.settings.pause_key {
                self.paused = !self.paused;
                debug!(paused = self.paused, "pause toggled");
                continue;
            }
            key_downs.push(code);
        }

        if self.paused {
            return StepOutcome::Continue;
        }

        let dt = self.timestep();
        let mut ctx = SceneContext {
            physics: &mut self.physics,
            display: &mut self.display,
            keyboard: &self.keyboard,
            rng: &mut self.rng,
        };

        for code in key_downs {
            self.scene.on_key_down(code, &mut ctx);
        }

        for hit in ctx.physics.step(dt) {
            self.scene.on_collide(hit, &mut ctx);
        }

        self.scene.update(&mut ctx);

        StepOutcome::Continue
    }

    /// Drive the frame loop until the quit key is pressed.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.target_fps as f64);

        loop {
            let frame_start = Instant::now();

            let events = input::poll_events().context("polling keyboard")?;
            if self.step(&events, frame_start) == StepOutcome::Quit {
                return Ok(());
            }

            let stage = ui::Stage {
                display: self.display(),
                physics: self.physics(),
                textures: &self.textures,
                hint: &self.settings.hint,
                paused: self.paused(),
            };
            terminal
                .draw(|f| ui::render(f, &stage))
                .context("drawing frame")?;

            limit_frame_rate(frame_start, frame_duration);
        }
    }
}

/// Sleep for whatever is left of the frame so the loop runs at a steady rate.
fn limit_frame_rate(frame_start: Instant, frame_duration: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < frame_duration {
        std::thread::sleep(frame_duration - elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyModifiers};
    use glam::Vec2;
    use rand::SeedableRng;

    /// Records every hook call so the dispatch order can be checked.
    #[derive(Default)]
    struct Probe {
        calls: Vec<String>,
        ball: Option<BodyId>,
    }

    impl Scene for Probe {
        fn key(&self) -> &str {
            "Probe"
        }

        fn preload(&mut self, loader: &mut AssetLoader) {
            loader.image("ball", "/missing/ball.txt");
            self.calls.push("preload".into());
        }

        fn create(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
            let wall = ctx.physics.add_body(
                Body::new(Vec2::new(50.0, 50.0), Vec2::new(10.0, 100.0)).immovable(),
            );
            let mut ball = Body::new(Vec2::new(60.0, 50.0), Vec2::splat(10.0)).with_bounce(1.0, 1.0);
            ball.velocity = Vec2::new(-60.0, 0.0);
            let ball = ctx.physics.add_body(ball);
            ctx.physics.add_collider(ball, wall);
            self.ball = Some(ball);
            self.calls.push("create".into());
            Ok(())
        }

        fn update(&mut self, _ctx: &mut SceneContext<'_>) {
            self.calls.push("update".into());
        }

        fn on_key_down(&mut self, key: KeyCode, _ctx: &mut SceneContext<'_>) {
            self.calls.push(format!("key {:?}", key));
        }

        fn on_collide(&mut self, _hit: Collision, _ctx: &mut SceneContext<'_>) {
            self.calls.push("collide".into());
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            world_width: 200.0,
            world_height: 100.0,
            target_fps: 60,
            quit_keys: vec![KeyCode::Char('q'), KeyCode::Esc],
            pause_key: KeyCode::Char('p'),
            reports_release: true,
            key_hold: Duration::from_millis(200),
            hint: String::new(),
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn boot() -> Engine<Probe> {
        Engine::boot(Probe::default(), settings(), StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn test_boot_runs_preload_then_create() {
        let engine = boot();
        assert_eq!(engine.scene().calls, vec!["preload", "create"]);
    }

    #[test]
    fn test_frame_dispatch_order() {
        let mut engine = boot();

        let outcome = engine.step(&[press(KeyCode::Char(' '))], Instant::now());

        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(
            engine.scene().calls[2..],
            ["key Char(' ')", "collide", "update"]
        );
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = EngineSettings::from_config(&Config::default(), false).unwrap();
        assert_eq!(settings.quit_keys, vec![KeyCode::Char('q'), KeyCode::Esc]);
        assert_eq!(settings.pause_key, KeyCode::Char('p'));
        assert_eq!(settings.key_hold, Duration::from_millis(200));
        assert!(settings.hint.contains("W/S: Left"));
        assert!(settings.hint.contains("Space: Serve"));
    }

    #[test]
    fn test_settings_reject_bad_binding() {
        let mut config = Config::default();
        config.keybindings.pause = "Pause Button".into();
        let err = EngineSettings::from_config(&config, false).unwrap_err();
        assert!(format!("{:#}", err).contains("keybindings.pause"));
    }

    #[test]
    fn test_quit_key_stops() {
        let mut engine = boot();
        assert_eq!(engine.step(&[press(KeyCode::Esc)], Instant::now()), StepOutcome::Quit);
    }

    #[test]
    fn test_pause_freezes_scene() {
        let mut engine = boot();
        let ball = engine.scene().ball.unwrap();
        let before = engine.physics().body(ball).position;

        engine.step(&[press(KeyCode::Char('p'))], Instant::now());
        assert!(engine.paused());
        assert_eq!(engine.physics().body(ball).position, before);
        assert_eq!(engine.scene().calls.len(), 2);

        engine.step(&[press(KeyCode::Char('p'))], Instant::now());
        assert!(!engine.paused());
        assert_eq!(engine.scene().calls.last().map(String::as_str), Some("update"));
    }
}
