// Image assets for the terminal host
// An image is a text sprite: one row of glyphs per line, spaces are transparent

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl Texture {
    pub fn parse(source: &str) -> Self {
        let rows: Vec<Vec<char>> = source
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    /// Stand-in for an image that failed to load
    pub fn placeholder() -> Self {
        Self::parse("▚")
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Glyph at the given texel, or `None` if transparent
    pub fn glyph(&self, x: usize, y: usize) -> Option<char> {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .filter(|c| *c != ' ')
    }

    /// Nearest-neighbour sample at normalized coordinates in `[0, 1)`.
    pub fn sample(&self, u: f32, v: f32) -> Option<char> {
        if self.width == 0 || self.rows.is_empty() {
            return None;
        }
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.rows.len() as f32) as usize).min(self.rows.len() - 1);
        self.glyph(x, y)
    }
}

#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
}

impl TextureCache {
    pub fn insert(&mut self, key: impl Into<String>, texture: Texture) {
        self.textures.insert(key.into(), texture);
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key)
    }
}

/// Queue of images requested during a scene's preload phase.
#[derive(Debug, Default)]
pub struct AssetLoader {
    queue: Vec<(String, PathBuf)>,
}

impl AssetLoader {
    pub fn image(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.queue.push((key.into(), path.into()));
    }

    /// Load every queued image. Files that cannot be read get a placeholder.
    pub fn load(self) -> TextureCache {
        let mut cache = TextureCache::default();
        for (key, path) in self.queue {
            let texture = match fs::read_to_string(&path) {
                Ok(source) => {
                    let texture = Texture::parse(&source);
                    debug!(
                        key = %key,
                        path = %path.display(),
                        width = texture.width(),
                        height = texture.height(),
                        "loaded image"
                    );
                    texture
                }
                Err(e) => {
                    warn!(key = %key, path = %path.display(), error = %e, "image missing, using placeholder");
                    Texture::placeholder()
                }
            };
            cache.insert(key, texture);
        }
        cache
    }
}
