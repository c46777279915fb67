use anyhow::Result;
use crossterm::event::KeyCode;
use rand::rngs::StdRng;

use super::assets::AssetLoader;
use super::display::DisplayList;
use super::input::KeyboardState;
use super::physics::{Collision, PhysicsWorld};

/// What a scene hook may touch during a frame.
pub struct SceneContext<'a> {
    pub physics: &'a mut PhysicsWorld,
    pub display: &'a mut DisplayList,
    pub keyboard: &'a KeyboardState,
    pub rng: &'a mut StdRng,
}

/// Game logic driven by the engine's lifecycle.
///
/// The engine calls `preload` once to queue assets, `create` once after they
/// load, then each frame dispatches key-downs, steps physics (reporting
/// collider hits), and finally calls `update`.
pub trait Scene {
    fn key(&self) -> &str;

    fn preload(&mut self, loader: &mut AssetLoader);

    fn create(&mut self, ctx: &mut SceneContext<'_>) -> Result<()>;

    fn update(&mut self, ctx: &mut SceneContext<'_>);

    fn on_key_down(&mut self, _key: KeyCode, _ctx: &mut SceneContext<'_>) {}

    fn on_collide(&mut self, _hit: Collision, _ctx: &mut SceneContext<'_>) {}
}
