//! Core value types shared across the pinboard application.
//!
//! Geometry and color values used by notes, the history and the canvas,
//! plus the command line subcommands.
use std::{fmt, path::PathBuf};

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::PinError;

/// A specialized Result type for pinboard operations.
pub type Result<T> = std::result::Result<T, PinError>;

/// An RGBA color, stored in the note file as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba([r, g, b, a])
    }
}

impl Default for Rgba {
    /// The pale yellow every note had before palettes existed.
    fn default() -> Self {
        Rgba::new(255, 255, 200, 255)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "rgba({}, {}, {}, {})", r, g, b, a)
    }
}

/// A position in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// A note size in board units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// An axis-aligned rectangle in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn from_origin(origin: Point, size: Size) -> Self {
        Rect {
            min_x: origin.x,
            min_y: origin.y,
            max_x: origin.x + size.width,
            max_y: origin.y + size.height,
        }
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Which side of the anchor note a new note is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Right,
    Below,
}

/// Available subcommands for the pinboard application
#[derive(Subcommand)]
pub enum Commands {
    /// Open a pinboard file in an interactive session
    Open {
        /// Path to the YAML file
        file: PathBuf,
    },

    /// Add a new note to a pinboard file
    Push {
        /// Path to the YAML file
        file: PathBuf,

        /// Text content for the new note
        text: String,
    },

    /// List the notes of a pinboard file in stacking order
    List {
        /// Path to the YAML file
        file: PathBuf,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },
}
