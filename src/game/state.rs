use crate::engine::{BodyId, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    /// Award a point and return the side's new total.
    pub fn award(&mut self, side: Side) -> u32 {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *slot += 1;
        *slot
    }
}

/// Handles to everything the scene created, valid for the scene's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Entities {
    pub ball: BodyId,
    pub left_paddle: BodyId,
    pub right_paddle: BodyId,
    pub left_score_text: ObjectId,
    pub right_score_text: ObjectId,
}

impl Entities {
    pub fn paddle(&self, side: Side) -> BodyId {
        match side {
            Side::Left => self.left_paddle,
            Side::Right => self.right_paddle,
        }
    }

    pub fn score_text(&self, side: Side) -> ObjectId {
        match side {
            Side::Left => self.left_score_text,
            Side::Right => self.right_score_text,
        }
    }
}
