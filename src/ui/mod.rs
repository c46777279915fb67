pub mod overlay;
pub mod render;

pub use render::{render, Stage};
