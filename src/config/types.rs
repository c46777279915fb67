// twopong configuration types
// Defaults reproduce the classic 1024x768 scene

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub keybindings: KeyBindings,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub assets: AssetConfig,
}

impl Config {
    /// Reject values the match loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;

        for (name, value) in [
            ("field_width", p.field_width),
            ("field_height", p.field_height),
            ("paddle_width", p.paddle_width),
            ("paddle_height", p.paddle_height),
            ("ball_size", p.ball_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{} must be a positive number, got {}", name, value);
            }
        }
        if p.paddle_offset.is_nan()
            || p.paddle_offset <= 0.0
            || p.paddle_offset >= p.field_width / 2.0
        {
            bail!(
                "paddle_offset must lie between 0 and half the field width, got {}",
                p.paddle_offset
            );
        }
        if p.score_margin * 2.0 >= p.field_width {
            bail!("score_margin {} leaves no playable width", p.score_margin);
        }
        // The ball is held inside the world bounds, so its center must be able to reach the margin.
        if p.ball_size / 2.0 >= p.score_margin {
            bail!(
                "ball_size {} is too large to ever cross score_margin {}",
                p.ball_size,
                p.score_margin
            );
        }
        if !p.speed_multiplier.is_finite() || p.speed_multiplier < 1.0 {
            bail!("speed_multiplier must be at least 1.0, got {}", p.speed_multiplier);
        }
        if !(0..90).contains(&p.max_deflection_degrees) {
            bail!(
                "max_deflection_degrees must be in 0..90, got {}",
                p.max_deflection_degrees
            );
        }
        if p.paddle_speed < 0.0 || p.serve_speed < 0.0 {
            bail!("paddle_speed and serve_speed must not be negative");
        }
        if self.display.target_fps == 0 {
            bail!("target_fps must be greater than zero");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyBindings {
    // Left player
    pub left_paddle_up: String,
    pub left_paddle_down: String,

    // Right player
    pub right_paddle_up: String,
    pub right_paddle_down: String,

    // Shared
    pub serve: String,
    pub pause: String,
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left_paddle_up: "W".to_string(),
            left_paddle_down: "S".to_string(),
            right_paddle_up: "Up".to_string(),
            right_paddle_down: "Down".to_string(),
            serve: "Space".to_string(),
            pause: "P".to_string(),
            quit: "Q".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // Playfield dimensions in world units
    pub field_width: f32,
    pub field_height: f32,

    // Distance of each paddle's center from its side wall
    pub paddle_offset: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,

    // Paddle movement per frame while a key is held
    pub paddle_speed: f32,

    pub ball_size: f32,

    // Velocity given to the ball at scene start, before the first serve
    pub initial_velocity: [f32; 2],

    // Per-axis speed of a serve; the sign of each axis is random
    pub serve_speed: f32,

    // Ball speed multiplier on paddle hit (1.3 = 30% increase)
    pub speed_multiplier: f32,

    // Random rotation applied on paddle hit, in whole degrees either way
    pub max_deflection_degrees: i32,

    // Distance from a side wall at which the ball counts as missed
    pub score_margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            field_width: 1024.0,
            field_height: 768.0,
            paddle_offset: 50.0,
            paddle_width: 20.0,
            paddle_height: 100.0,
            paddle_speed: 5.0,
            ball_size: 24.0,
            initial_velocity: [200.0, 200.0],
            serve_speed: 200.0,
            speed_multiplier: 1.3,
            max_deflection_degrees: 30,
            score_margin: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    // Target frames per second; also fixes the physics timestep
    pub target_fps: u64,

    // RGB values 0-255
    pub score_color: [u8; 3],
    pub paddle_color: [u8; 3],
    pub ball_color: [u8; 3],
    pub background_color: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            score_color: [255, 255, 255],      // White
            paddle_color: [255, 255, 255],     // White
            ball_color: [255, 220, 120],       // Amber
            background_color: [70, 70, 90],    // Slate
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    // How long a key counts as held after its last press/repeat when the
    // terminal cannot report key releases
    pub key_hold_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { key_hold_ms: 200 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    pub background: String,
    pub ball: String,
    pub paddle: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            background: "./assets/background.txt".to_string(),
            ball: "./assets/ball.txt".to_string(),
            paddle: "./assets/paddle.txt".to_string(),
        }
    }
}
