use glam::Vec2;
use rand::Rng;

use super::state::Side;

/// Direction a paddle is being driven this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleMove {
    Up,
    Down,
    Still,
}

impl PaddleMove {
    /// Up wins when both keys are held.
    pub fn from_keys(up: bool, down: bool) -> Self {
        if up {
            PaddleMove::Up
        } else if down {
            PaddleMove::Down
        } else {
            PaddleMove::Still
        }
    }
}

/// Next paddle y, clamped to the visible range `[0, field_height]`.
pub fn move_paddle(y: f32, movement: PaddleMove, speed: f32, field_height: f32) -> f32 {
    let next = match movement {
        PaddleMove::Up => y - speed,
        PaddleMove::Down => y + speed,
        PaddleMove::Still => y,
    };
    next.clamp(0.0, field_height)
}

/// The side that wins the point when the ball has crossed a wall margin.
pub fn point_winner(ball_x: f32, field_width: f32, margin: f32) -> Option<Side> {
    if ball_x < margin {
        Some(Side::Right)
    } else if ball_x > field_width - margin {
        Some(Side::Left)
    } else {
        None
    }
}

/// Serve velocity: `speed` on each axis with an independent random sign.
pub fn serve_velocity<R: Rng>(speed: f32, rng: &mut R) -> Vec2 {
    let sign = |heads: bool| if heads { 1.0 } else { -1.0 };
    Vec2::new(speed * sign(rng.gen_bool(0.5)), speed * sign(rng.gen_bool(0.5)))
}

/// Velocity after a paddle hit: scaled by `factor`, rotated by `degrees`.
pub fn deflect(velocity: Vec2, factor: f32, degrees: i32) -> Vec2 {
    Vec2::from_angle((degrees as f32).to_radians()).rotate(velocity * factor)
}

/// Uniform whole-degree deviation in `[-max, max]`.
pub fn random_deviation<R: Rng>(max_degrees: i32, rng: &mut R) -> i32 {
    rng.gen_range(-max_degrees..=max_degrees)
}
