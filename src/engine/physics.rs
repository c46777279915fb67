//! Arcade-style body physics: axis-aligned boxes, world-bounds bounce and
//! collider pairs that report hits back to the scene.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

#[derive(Debug, Clone)]
pub struct Body {
    /// Center of the box
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_size: Vec2,
    /// Fraction of velocity kept on rebound, per axis
    pub bounce: Vec2,
    /// Immovable bodies are never integrated or pushed by collisions
    pub immovable: bool,
    pub collide_world_bounds: bool,
    /// Center at the start of the current step
    previous: Vec2,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_size: size / 2.0,
            bounce: Vec2::ZERO,
            immovable: false,
            collide_world_bounds: false,
            previous: position,
        }
    }

    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self
    }

    pub fn with_bounce(mut self, x: f32, y: f32) -> Self {
        self.bounce = Vec2::new(x, y);
        self
    }

    pub fn with_world_bounds(mut self) -> Self {
        self.collide_world_bounds = true;
        self
    }

    fn overlap(&self, other: &Body) -> Option<Vec2> {
        let overlap = self.overlap_at(self.position, other);
        (overlap.x > 0.0 && overlap.y > 0.0).then_some(overlap)
    }

    /// Per-axis penetration if this body were centered at `position`.
    fn overlap_at(&self, position: Vec2, other: &Body) -> Vec2 {
        let reach = self.half_size + other.half_size;
        reach - (other.position - position).abs()
    }
}

/// A collider hit, in the order the pair was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub body: BodyId,
    pub other: BodyId,
}

#[derive(Debug)]
pub struct PhysicsWorld {
    bounds: Vec2,
    bodies: Vec<Body>,
    colliders: Vec<(BodyId, BodyId)>,
}

impl PhysicsWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Vec2::new(width, height),
            bodies: Vec::new(),
            colliders: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        BodyId(self.bodies.len() - 1)
    }

    pub fn add_collider(&mut self, body: BodyId, other: BodyId) {
        self.colliders.push((body, other));
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.0]
    }

    /// Advance every movable body by `dt` seconds and resolve colliders.
    pub fn step(&mut self, dt: f32) -> Vec<Collision> {
        let bounds = self.bounds;
        for body in self.bodies.iter_mut().filter(|b| !b.immovable) {
            body.previous = body.position;
            body.position += body.velocity * dt;
            if body.collide_world_bounds {
                keep_in_bounds(body, bounds);
            }
        }

        let mut hits = Vec::new();
        for i in 0..self.colliders.len() {
            let (a, b) = self.colliders[i];
            if self.separate(a, b) {
                hits.push(Collision { body: a, other: b });
            }
        }
        hits
    }

    fn separate(&mut self, a: BodyId, b: BodyId) -> bool {
        let (mover, wall) = match (self.body(a).immovable, self.body(b).immovable) {
            (false, _) => (a, b),
            (true, false) => (b, a),
            (true, true) => return false,
        };

        let wall_body = self.body(wall).clone();
        let body = self.body_mut(mover);
        let Some(overlap) = body.overlap(&wall_body) else {
            return false;
        };

        // Resolve on the face the body came through, judged from where it
        // started the step. Bodies that started inside fall back to the axis
        // of least penetration.
        let before = body.overlap_at(body.previous, &wall_body);
        let reach = body.half_size + wall_body.half_size;
        if before.y > 0.0 && before.x <= 0.0 {
            let dir = side_of(body.previous.x, wall_body.position.x, body.velocity.x);
            body.position.x = wall_body.position.x + reach.x * dir;
            rebound_x(body, dir);
        } else if before.x > 0.0 && before.y <= 0.0 {
            let dir = side_of(body.previous.y, wall_body.position.y, body.velocity.y);
            body.position.y = wall_body.position.y + reach.y * dir;
            rebound_y(body, dir);
        } else if overlap.x <= overlap.y {
            let dir = side_of(body.position.x, wall_body.position.x, body.velocity.x);
            body.position.x += overlap.x * dir;
            rebound_x(body, dir);
        } else {
            let dir = side_of(body.position.y, wall_body.position.y, body.velocity.y);
            body.position.y += overlap.y * dir;
            rebound_y(body, dir);
        }
        true
    }
}

/// Which side of `wall` a coordinate lies on, or against the motion when level.
fn side_of(coord: f32, wall: f32, velocity: f32) -> f32 {
    if coord == wall {
        -velocity.signum()
    } else {
        (coord - wall).signum()
    }
}

fn rebound_x(body: &mut Body, dir: f32) {
    if body.velocity.x * dir < 0.0 {
        body.velocity.x = -body.velocity.x * body.bounce.x;
    }
}

fn rebound_y(body: &mut Body, dir: f32) {
    if body.velocity.y * dir < 0.0 {
        body.velocity.y = -body.velocity.y * body.bounce.y;
    }
}

fn keep_in_bounds(body: &mut Body, bounds: Vec2) {
    let min = body.half_size;
    let max = bounds - body.half_size;

    if body.position.x < min.x {
        body.position.x = min.x;
        body.velocity.x = body.velocity.x.abs() * body.bounce.x;
    } else if body.position.x > max.x {
        body.position.x = max.x;
        body.velocity.x = -body.velocity.x.abs() * body.bounce.x;
    }

    if body.position.y < min.y {
        body.position.y = min.y;
        body.velocity.y = body.velocity.y.abs() * body.bounce.y;
    } else if body.position.y > max.y {
        body.position.y = max.y;
        body.velocity.y = -body.velocity.y.abs() * body.bounce.y;
    }
}
