use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use glam::Vec2;
use tracing::{debug, info};

use crate::config::{AssetConfig, Config, DisplayConfig, PhysicsConfig};
use crate::engine::assets::AssetLoader;
use crate::engine::input::parse_key;
use crate::engine::scene::{Scene, SceneContext};
use crate::engine::{Anchor, Body, BodyId, Collision};

use super::physics::{self, PaddleMove};
use super::state::{Entities, Score, Side};

// Score labels sit this far in from each side wall, near the top
const SCORE_TEXT_INSET: f32 = 100.0;
const SCORE_TEXT_Y: f32 = 50.0;

#[derive(Debug, Clone, Copy)]
struct Controls {
    left_up: KeyCode,
    left_down: KeyCode,
    right_up: KeyCode,
    right_down: KeyCode,
    serve: KeyCode,
}

/// The two-player match: paddles, ball, and the score.
pub struct PongScene {
    physics: PhysicsConfig,
    colors: DisplayConfig,
    assets: AssetConfig,
    controls: Controls,
    entities: Option<Entities>,
    ball_in_motion: bool,
    score: Score,
}

impl PongScene {
    pub fn new(config: &Config) -> Result<Self> {
        let bindings = &config.keybindings;
        let key = |name: &str, binding: &str| {
            parse_key(binding).with_context(|| format!("keybindings.{}", name))
        };

        Ok(Self {
            physics: config.physics.clone(),
            colors: config.display.clone(),
            assets: config.assets.clone(),
            controls: Controls {
                left_up: key("left_paddle_up", &bindings.left_paddle_up)?,
                left_down: key("left_paddle_down", &bindings.left_paddle_down)?,
                right_up: key("right_paddle_up", &bindings.right_paddle_up)?,
                right_down: key("right_paddle_down", &bindings.right_paddle_down)?,
                serve: key("serve", &bindings.serve)?,
            },
            entities: None,
            ball_in_motion: false,
            score: Score::default(),
        })
    }

    pub fn score(&self) -> Score {
        self.score
    }

    #[cfg(test)]
    pub fn ball_in_motion(&self) -> bool {
        self.ball_in_motion
    }

    #[cfg(test)]
    pub fn entities(&self) -> Option<Entities> {
        self.entities
    }

    fn center(&self) -> Vec2 {
        Vec2::new(self.physics.field_width, self.physics.field_height) / 2.0
    }

    /// Launch the ball in a random diagonal unless it is already moving.
    fn start_ball(&mut self, ball: BodyId, ctx: &mut SceneContext<'_>) {
        if self.ball_in_motion {
            return;
        }

        let velocity = physics::serve_velocity(self.physics.serve_speed, ctx.rng);
        ctx.physics.body_mut(ball).velocity = velocity;
        self.ball_in_motion = true;
        info!(vx = velocity.x, vy = velocity.y, "serve");
    }

    /// Speed the ball up and knock it off its line after a paddle contact.
    fn hit_paddle(&mut self, ball: BodyId, ctx: &mut SceneContext<'_>) {
        let degrees = physics::random_deviation(self.physics.max_deflection_degrees, ctx.rng);
        let body = ctx.physics.body_mut(ball);
        body.velocity = physics::deflect(body.velocity, self.physics.speed_multiplier, degrees);
        debug!(
            degrees,
            speed = body.velocity.length(),
            "paddle hit"
        );
    }

    fn reset_ball(&mut self, ball: BodyId, ctx: &mut SceneContext<'_>) {
        let body = ctx.physics.body_mut(ball);
        body.position = self.center();
        body.velocity = Vec2::ZERO;
        self.ball_in_motion = false;
        self.start_ball(ball, ctx);
    }

    fn move_paddle(&self, paddle: BodyId, up: KeyCode, down: KeyCode, ctx: &mut SceneContext<'_>) {
        let movement = PaddleMove::from_keys(ctx.keyboard.is_down(up), ctx.keyboard.is_down(down));
        if movement == PaddleMove::Still {
            return;
        }
        let body = ctx.physics.body_mut(paddle);
        body.position.y = physics::move_paddle(
            body.position.y,
            movement,
            self.physics.paddle_speed,
            self.physics.field_height,
        );
    }
}

impl Scene for PongScene {
    fn key(&self) -> &str {
        "Game"
    }

    fn preload(&mut self, loader: &mut AssetLoader) {
        loader.image("background", &self.assets.background);
        loader.image("ball", &self.assets.ball);
        loader.image("paddle", &self.assets.paddle);
    }

    fn create(&mut self, ctx: &mut SceneContext<'_>) -> Result<()> {
        let p = &self.physics;
        let center = self.center();
        let field = Vec2::new(p.field_width, p.field_height);

        ctx.display.add_image(
            "background",
            Anchor::Fixed(center),
            field,
            self.colors.background_color,
        );

        let paddle_size = Vec2::new(p.paddle_width, p.paddle_height);
        let left_paddle = ctx.physics.add_body(
            Body::new(Vec2::new(p.paddle_offset, center.y), paddle_size).immovable(),
        );
        let right_paddle = ctx.physics.add_body(
            Body::new(Vec2::new(p.field_width - p.paddle_offset, center.y), paddle_size)
                .immovable(),
        );
        for paddle in [left_paddle, right_paddle] {
            ctx.display
                .add_image("paddle", Anchor::Body(paddle), paddle_size, self.colors.paddle_color);
        }

        let left_score_text = ctx.display.add_text(
            Vec2::new(SCORE_TEXT_INSET, SCORE_TEXT_Y),
            "0",
            self.colors.score_color,
        );
        let right_score_text = ctx.display.add_text(
            Vec2::new(p.field_width - SCORE_TEXT_INSET, SCORE_TEXT_Y),
            "0",
            self.colors.score_color,
        );

        let mut ball = Body::new(center, Vec2::splat(p.ball_size))
            .with_world_bounds()
            .with_bounce(1.0, 1.0);
        ball.velocity = Vec2::from(p.initial_velocity);
        let ball = ctx.physics.add_body(ball);
        ctx.display.add_image(
            "ball",
            Anchor::Body(ball),
            Vec2::splat(p.ball_size),
            self.colors.ball_color,
        );

        ctx.physics.add_collider(ball, left_paddle);
        ctx.physics.add_collider(ball, right_paddle);

        self.entities = Some(Entities {
            ball,
            left_paddle,
            right_paddle,
            left_score_text,
            right_score_text,
        });
        self.ball_in_motion = false;
        Ok(())
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(entities) = self.entities else {
            return;
        };
        let c = self.controls;

        self.move_paddle(entities.left_paddle, c.left_up, c.left_down, ctx);
        self.move_paddle(entities.right_paddle, c.right_up, c.right_down, ctx);

        let ball_x = ctx.physics.body(entities.ball).position.x;
        if let Some(side) =
            physics::point_winner(ball_x, self.physics.field_width, self.physics.score_margin)
        {
            let total = self.score.award(side);
            ctx.display.set_text(entities.score_text(side), total.to_string());
            info!(
                ?side,
                left = self.score.left,
                right = self.score.right,
                "point scored"
            );
            self.reset_ball(entities.ball, ctx);
        }
    }

    fn on_key_down(&mut self, key: KeyCode, ctx: &mut SceneContext<'_>) {
        if key != self.controls.serve {
            return;
        }
        if let Some(entities) = self.entities {
            self.start_ball(entities.ball, ctx);
        }
    }

    fn on_collide(&mut self, hit: Collision, ctx: &mut SceneContext<'_>) {
        let Some(entities) = self.entities else {
            return;
        };
        let paddles = [entities.paddle(Side::Left), entities.paddle(Side::Right)];
        if hit.body == entities.ball && paddles.contains(&hit.other) {
            self.hit_paddle(entities.ball, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineSettings};
    use crossterm::event::{KeyEvent, KeyEventKind, KeyModifiers};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    const EPS: f32 = 1e-3;

    fn boot(seed: u64) -> Engine<PongScene> {
        let mut config = Config::default();
        config.assets = AssetConfig {
            background: "/missing/background.txt".into(),
            ball: "/missing/ball.txt".into(),
            paddle: "/missing/paddle.txt".into(),
        };
        let settings = EngineSettings::from_config(&config, true).unwrap();
        let scene = PongScene::new(&config).unwrap();
        Engine::boot(scene, settings, StdRng::seed_from_u64(seed)).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn entities(engine: &Engine<PongScene>) -> Entities {
        engine.scene().entities().unwrap()
    }

    #[test]
    fn test_create_lays_out_the_court() {
        let engine = boot(1);
        let e = entities(&engine);
        let world = engine.physics();

        assert_eq!(world.body(e.left_paddle).position, Vec2::new(50.0, 384.0));
        assert_eq!(world.body(e.right_paddle).position, Vec2::new(974.0, 384.0));
        assert_eq!(world.body(e.ball).position, Vec2::new(512.0, 384.0));
        assert_eq!(world.body(e.ball).velocity, Vec2::new(200.0, 200.0));
        assert!(!engine.scene().ball_in_motion());
        assert_eq!(engine.display().text(e.left_score_text), Some("0"));
        assert_eq!(engine.display().text(e.right_score_text), Some("0"));
    }

    #[test]
    fn test_serve_only_when_ball_is_idle() {
        let mut engine = boot(2);
        let ball = entities(&engine).ball;

        engine.step(&[press(KeyCode::Char(' '))], Instant::now());
        assert!(engine.scene().ball_in_motion());
        let served = engine.physics().body(ball).velocity;
        assert_eq!(served.x.abs(), 200.0);
        assert_eq!(served.y.abs(), 200.0);

        // A second press while moving leaves the velocity alone
        engine.step(&[press(KeyCode::Char(' '))], Instant::now());
        assert_eq!(engine.physics().body(ball).velocity, served);
    }

    #[test]
    fn test_unbound_keys_do_not_serve() {
        let mut engine = boot(2);
        engine.step(&[press(KeyCode::Char('x'))], Instant::now());
        assert!(!engine.scene().ball_in_motion());
    }

    #[test]
    fn test_held_keys_drive_paddles_within_field() {
        let mut engine = boot(3);
        let e = entities(&engine);

        engine.step(&[press(KeyCode::Char('w')), press(KeyCode::Down)], Instant::now());
        assert_eq!(engine.physics().body(e.left_paddle).position.y, 379.0);
        assert_eq!(engine.physics().body(e.right_paddle).position.y, 389.0);

        for _ in 0..200 {
            engine.step(&[], Instant::now());
            let left = engine.physics().body(e.left_paddle).position.y;
            let right = engine.physics().body(e.right_paddle).position.y;
            assert!((0.0..=768.0).contains(&left));
            assert!((0.0..=768.0).contains(&right));
        }
        assert_eq!(engine.physics().body(e.left_paddle).position.y, 0.0);
        assert_eq!(engine.physics().body(e.right_paddle).position.y, 768.0);
    }

    #[test]
    fn test_miss_on_left_scores_for_right_once() {
        let mut engine = boot(4);
        let e = entities(&engine);
        {
            let ball = engine.physics_mut().body_mut(e.ball);
            ball.position = Vec2::new(20.0, 200.0);
            ball.velocity = Vec2::new(-900.0, 0.0);
        }

        engine.step(&[], Instant::now());

        assert_eq!(engine.scene().score(), Score { left: 0, right: 1 });
        assert_eq!(engine.display().text(e.right_score_text), Some("1"));
        assert_eq!(engine.display().text(e.left_score_text), Some("0"));

        // Reset to center, then re-served at serve speed
        let ball = engine.physics().body(e.ball);
        assert_eq!(ball.position, Vec2::new(512.0, 384.0));
        assert_eq!(ball.velocity.x.abs(), 200.0);
        assert_eq!(ball.velocity.y.abs(), 200.0);
        assert!(engine.scene().ball_in_motion());

        engine.step(&[], Instant::now());
        assert_eq!(engine.scene().score(), Score { left: 0, right: 1 });
    }

    #[test]
    fn test_miss_on_right_scores_for_left() {
        let mut engine = boot(5);
        let e = entities(&engine);
        engine.physics_mut().body_mut(e.ball).position = Vec2::new(1000.0, 600.0);

        engine.step(&[], Instant::now());

        assert_eq!(engine.scene().score(), Score { left: 1, right: 0 });
        assert_eq!(engine.display().text(e.left_score_text), Some("1"));
    }

    #[test]
    fn test_paddle_hit_speeds_up_and_returns_ball() {
        let mut engine = boot(6);
        let e = entities(&engine);
        {
            let ball = engine.physics_mut().body_mut(e.ball);
            ball.position = Vec2::new(75.0, 384.0);
            ball.velocity = Vec2::new(-260.0, 0.0);
        }

        engine.step(&[], Instant::now());

        let v = engine.physics().body(e.ball).velocity;
        assert!((v.length() - 260.0 * 1.3).abs() < EPS);
        assert!(v.x > 0.0);
        // Deviation is at most 30 degrees off the rebound line
        assert!(v.y.abs() <= v.length() * 0.5 + EPS);
    }

    #[test]
    fn test_fast_ball_is_returned_by_centered_paddle() {
        let mut engine = boot(8);
        let e = entities(&engine);
        {
            let ball = engine.physics_mut().body_mut(e.ball);
            ball.position = Vec2::new(73.0, 384.0);
            ball.velocity = Vec2::new(-1500.0, 0.0);
        }

        engine.step(&[], Instant::now());

        assert_eq!(engine.scene().score(), Score::default());
        let ball = engine.physics().body(e.ball);
        assert!(ball.velocity.x > 0.0);
        assert!((ball.velocity.length() - 1500.0 * 1.3).abs() < 1e-2);
        assert!(ball.position.x >= 72.0 - EPS);
    }

    #[test]
    fn test_consecutive_hits_compound_speed() {
        let mut engine = boot(7);
        let e = entities(&engine);
        let start = engine.physics().body(e.ball).velocity.length();

        for n in 1..=6 {
            {
                let ball = engine.physics_mut().body_mut(e.ball);
                ball.position = Vec2::new(70.0, 384.0);
                ball.velocity = Vec2::new(-ball.velocity.x.abs(), ball.velocity.y);
            }
            engine.step(&[], Instant::now());

            let speed = engine.physics().body(e.ball).velocity.length();
            let expected = start * 1.3_f32.powi(n);
            assert!(
                (speed - expected).abs() / expected < 1e-4,
                "hit {}: speed {} expected {}",
                n,
                speed,
                expected
            );
        }
        assert_eq!(engine.scene().score(), Score::default());
    }
}
