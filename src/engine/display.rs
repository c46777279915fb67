use glam::Vec2;

use super::physics::BodyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectId(usize);

/// Where an image is drawn: a fixed point, or following a physics body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Fixed(Vec2),
    Body(BodyId),
}

#[derive(Debug, Clone)]
pub struct Image {
    pub texture: String,
    /// Center of the image
    pub anchor: Anchor,
    /// Display size in world units
    pub size: Vec2,
    pub tint: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct Text {
    /// Top-left corner
    pub position: Vec2,
    pub content: String,
    pub color: [u8; 3],
}

#[derive(Debug, Clone)]
pub enum GameObject {
    Image(Image),
    Text(Text),
}

/// Everything the scene has added, drawn in insertion order.
#[derive(Debug, Default)]
pub struct DisplayList {
    objects: Vec<GameObject>,
}

impl DisplayList {
    pub fn add_image(
        &mut self,
        texture: impl Into<String>,
        anchor: Anchor,
        size: Vec2,
        tint: [u8; 3],
    ) -> ObjectId {
        self.push(GameObject::Image(Image {
            texture: texture.into(),
            anchor,
            size,
            tint,
        }))
    }

    pub fn add_text(
        &mut self,
        position: Vec2,
        content: impl Into<String>,
        color: [u8; 3],
    ) -> ObjectId {
        self.push(GameObject::Text(Text {
            position,
            content: content.into(),
            color,
        }))
    }

    fn push(&mut self, object: GameObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    /// Replace a text's content. Ids that refer to images are ignored.
    pub fn set_text(&mut self, id: ObjectId, content: impl Into<String>) {
        if let Some(GameObject::Text(text)) = self.objects.get_mut(id.0) {
            text.content = content.into();
        }
    }

    #[cfg(test)]
    pub fn text(&self, id: ObjectId) -> Option<&str> {
        match self.objects.get(id.0) {
            Some(GameObject::Text(text)) => Some(&text.content),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }
}
