pub mod physics;
pub mod scene;
pub mod state;

pub use scene::PongScene;
