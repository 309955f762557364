//! The sticky note record.
//!
//! A note is plain data: geometry, content, color, stacking order and the
//! three optional timestamps. Only the board mutates notes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Point, Rect, Rgba, Size};

/// Smallest width a note can be resized to.
pub const MIN_WIDTH: f64 = 100.0;
/// Smallest height a note can be resized to.
pub const MIN_HEIGHT: f64 = 60.0;

/// Timestamps are stored at whole-second UTC precision.
pub type Timestamp = DateTime<Utc>;

/// Represents a single note on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, never reused within a session
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Multi-line content, empty for a fresh note
    pub text: String,
    /// Paint order; higher values are drawn on top
    pub order: i64,
    #[serde(default)]
    pub color: Rgba,
    /// Set when the note is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Set whenever edited text is committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<Timestamp>,
    /// Set on any geometry, order or color change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_at: Option<Timestamp>,
}

impl Note {
    /// Creates a note with no timestamps; the size is clamped to the minimum.
    pub fn new(id: u64, position: Point, size: Size, text: String, order: i64, color: Rgba) -> Self {
        let size = clamp_size(size);
        Note {
            id,
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            text,
            order,
            color,
            created_at: None,
            edited_at: None,
            adjusted_at: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.position(), self.size())
    }
}

/// Clamps a size to the minimum note floor.
pub fn clamp_size(size: Size) -> Size {
    Size::new(size.width.max(MIN_WIDTH), size.height.max(MIN_HEIGHT))
}
