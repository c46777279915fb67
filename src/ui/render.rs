use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::engine::assets::TextureCache;
use crate::engine::display::{DisplayList, GameObject, Image, Text};
use crate::engine::physics::PhysicsWorld;
use crate::engine::Anchor;

use super::overlay::{render_overlay, OverlayMessage};

// Row 0: controls hint
// Rows 1..N: playfield
const UI_HEADER_ROWS: u16 = 1;

/// Everything the renderer reads for one frame.
pub struct Stage<'a> {
    pub display: &'a DisplayList,
    pub physics: &'a PhysicsWorld,
    pub textures: &'a TextureCache,
    pub hint: &'a str,
    pub paused: bool,
}

/// Maps world units onto terminal cells inside the playfield.
struct Viewport {
    area: Rect,
    scale_x: f32,
    scale_y: f32,
}

impl Viewport {
    fn cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            self.area.x as i32 + (x * self.scale_x).floor() as i32,
            self.area.y as i32 + (y * self.scale_y).floor() as i32,
        )
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.area.x as i32
            && y >= self.area.y as i32
            && x < self.area.right() as i32
            && y < self.area.bottom() as i32
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

pub fn render(frame: &mut Frame, stage: &Stage) {
    let area = frame.area();

    let bg = Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0)));
    frame.render_widget(bg, area);

    draw_controls(frame, area, stage.hint);

    if area.height <= UI_HEADER_ROWS || area.width == 0 {
        return;
    }
    let field = Rect {
        x: area.x,
        y: area.y + UI_HEADER_ROWS,
        width: area.width,
        height: area.height - UI_HEADER_ROWS,
    };
    let world = stage.physics.bounds();
    let view = Viewport {
        area: field,
        scale_x: field.width as f32 / world.x,
        scale_y: field.height as f32 / world.y,
    };

    for object in stage.display.iter() {
        match object {
            GameObject::Image(image) => draw_image(frame, &view, stage, image),
            GameObject::Text(text) => draw_text(frame, &view, text),
        }
    }

    if stage.paused {
        let message = OverlayMessage::new(vec![
            "Game paused".to_string(),
            "".to_string(),
            "Press the pause key to resume".to_string(),
        ])
        .with_title("PAUSED");
        render_overlay(frame, &message, field);
    }
}

fn draw_image(frame: &mut Frame, view: &Viewport, stage: &Stage, image: &Image) {
    let Some(texture) = stage.textures.get(&image.texture) else {
        return;
    };
    let center = match image.anchor {
        Anchor::Fixed(point) => point,
        Anchor::Body(id) => stage.physics.body(id).position,
    };

    let top_left = center - image.size / 2.0;
    let (x0, y0) = view.cell(top_left.x, top_left.y);
    // Never let an object vanish by rounding down to zero cells
    let cols = ((image.size.x * view.scale_x).round() as i32).max(1);
    let rows = ((image.size.y * view.scale_y).round() as i32).max(1);

    let style = Style::default().fg(rgb(image.tint));
    let buf = frame.buffer_mut();
    for j in 0..rows {
        for i in 0..cols {
            let (x, y) = (x0 + i, y0 + j);
            if !view.contains(x, y) {
                continue;
            }
            let u = (i as f32 + 0.5) / cols as f32;
            let v = (j as f32 + 0.5) / rows as f32;
            if let Some(glyph) = texture.sample(u, v) {
                if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
                    cell.set_char(glyph).set_style(style);
                }
            }
        }
    }
}

fn draw_text(frame: &mut Frame, view: &Viewport, text: &Text) {
    let (x, y) = view.cell(text.position.x, text.position.y);
    if !view.contains(x, y) {
        return;
    }

    let max_width = (view.area.right() as i32 - x) as usize;
    let style = Style::default()
        .fg(rgb(text.color))
        .add_modifier(Modifier::BOLD);
    frame
        .buffer_mut()
        .set_stringn(x as u16, y as u16, &text.content, max_width, style);
}

fn draw_controls(frame: &mut Frame, area: Rect, hint: &str) {
    let controls = Paragraph::new(hint.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);

    let controls_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: UI_HEADER_ROWS.min(area.height),
    };

    frame.render_widget(controls, controls_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::Texture;
    use crate::engine::physics::Body;
    use glam::Vec2;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect()
    }

    fn draw(stage: &Stage, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, stage)).unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_images_follow_bodies_and_texts_render() {
        // 100x50 world on a 100x51 terminal: one cell per world unit below the header
        let mut physics = PhysicsWorld::new(100.0, 50.0);
        let ball = physics.add_body(Body::new(Vec2::new(10.5, 20.5), Vec2::ONE));

        let mut display = DisplayList::default();
        display.add_image("ball", Anchor::Body(ball), Vec2::ONE, [255, 255, 255]);
        display.add_text(Vec2::new(40.0, 2.0), "7", [255, 255, 255]);

        let mut textures = TextureCache::default();
        textures.insert("ball", Texture::parse("o"));

        let stage = Stage {
            display: &display,
            physics: &physics,
            textures: &textures,
            hint: "W/S: Left",
            paused: false,
        };
        let buffer = draw(&stage, 100, 51);

        assert!(row(&buffer, 0).contains("W/S: Left"));
        assert_eq!(buffer.cell((10, 21)).unwrap().symbol(), "o");
        assert_eq!(buffer.cell((40, 3)).unwrap().symbol(), "7");
    }

    #[test]
    fn test_transparent_texels_and_clipping() {
        let physics = PhysicsWorld::new(20.0, 10.0);
        let mut display = DisplayList::default();
        // Half of this image hangs off the left edge
        display.add_image("bar", Anchor::Fixed(Vec2::new(0.0, 5.0)), Vec2::new(4.0, 1.0), [1, 2, 3]);

        let mut textures = TextureCache::default();
        textures.insert("bar", Texture::parse("ab c"));

        let stage = Stage {
            display: &display,
            physics: &physics,
            textures: &textures,
            hint: "",
            paused: false,
        };
        let buffer = draw(&stage, 20, 11);

        // Texels a, b, blank, c; only the blank and c land on screen
        assert_eq!(buffer.cell((0, 5)).unwrap().symbol(), " ");
        assert_eq!(buffer.cell((1, 5)).unwrap().symbol(), "c");
    }

    #[test]
    fn test_pause_overlay() {
        let physics = PhysicsWorld::new(80.0, 23.0);
        let display = DisplayList::default();
        let textures = TextureCache::default();
        let stage = Stage {
            display: &display,
            physics: &physics,
            textures: &textures,
            hint: "",
            paused: true,
        };
        let buffer = draw(&stage, 80, 24);

        assert!((0..24).any(|y| row(&buffer, y).contains("PAUSED")));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let physics = PhysicsWorld::new(1024.0, 768.0);
        let display = DisplayList::default();
        let textures = TextureCache::default();
        let stage = Stage {
            display: &display,
            physics: &physics,
            textures: &textures,
            hint: "hint",
            paused: true,
        };
        draw(&stage, 3, 1);
    }
}
