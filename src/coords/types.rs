//! Coordinate module core types
//!
//! Bounding boxes in the two coordinate systems, page rotation, and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Default overlap ratio for treating two boxes as the same area
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.5;

/// Default viewport scale
pub const DEFAULT_SCALE: f64 = 1.0;

// ============================================================
// Error Types
// ============================================================

/// Coordinate conversion error types
#[derive(Debug, Error, PartialEq)]
pub enum CoordError {
    #[error("Invalid rotation: {0} (must be a multiple of 90)")]
    InvalidRotation(i32),

    #[error("Invalid scale: {0} (must be finite and positive)")]
    InvalidScale(f64),

    #[error("Invalid page height: {0} (must be finite and positive)")]
    InvalidPageHeight(f64),
}

pub type Result<T> = std::result::Result<T, CoordError>;

// ============================================================
// Rotation
// ============================================================

/// Page rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees (0, 90, 180 or 270)
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse degrees, normalizing negative and full-turn values (`-90` → 270)
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(CoordError::InvalidRotation(degrees)),
        }
    }

    /// Whether the rotation swaps width and height
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = CoordError;

    fn try_from(degrees: i32) -> Result<Self> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> i32 {
        rotation.degrees()
    }
}

// ============================================================
// Bounding Boxes
// ============================================================

/// Axis-aligned rectangle spans, shared by both coordinate systems
pub trait Bounds {
    /// `(min_x, min_y, max_x, max_y)`
    fn bounds(&self) -> (f64, f64, f64, f64);

    /// Rectangle area; zero for degenerate or inverted boxes
    fn area(&self) -> f64 {
        let (x0, y0, x1, y1) = self.bounds();
        let area = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
        if area.is_finite() {
            area
        } else {
            0.0
        }
    }
}

/// Rectangle in extraction coordinates: bottom-left origin, unscaled points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ExtractionBox {
    /// Create a box from its corners
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a box from its lower-left corner and size
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// `x1 >= x0` and `y1 >= y0` with finite coordinates
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.y1 >= self.y0
    }
}

impl Bounds for ExtractionBox {
    fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.x0, self.y0, self.x1, self.y1)
    }
}

/// Rectangle in rendering coordinates: top-left origin, scaled pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: Rotation,
}

impl RenderBox {
    /// Create an unrotated render box
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: Rotation::Deg0,
        }
    }

    /// Attach the rotation the box was rendered under
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

impl Bounds for RenderBox {
    fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.right(), self.bottom())
    }
}
