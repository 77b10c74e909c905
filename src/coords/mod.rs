//! Coordinate reconciliation module
//!
//! Converts bounding boxes between the offline text-extraction coordinate
//! system (bottom-left origin, unscaled page points) and the interactive
//! renderer's coordinate system (top-left origin, scaled pixels, rotated),
//! and measures how much two boxes overlap.
//!
//! # Example
//!
//! ```rust
//! use canonical_pages::{CoordinateTransformer, ExtractionBox, Rotation};
//!
//! let transformer = CoordinateTransformer::new(792.0, 1.5, Rotation::Deg0).unwrap();
//! let bbox = ExtractionBox::new(72.0, 36.0, 144.0, 54.0);
//!
//! let render = transformer.to_render(&bbox);
//! assert_eq!(render.y, (792.0 - 54.0) * 1.5);
//!
//! let back = transformer.to_extraction(&render);
//! assert!((back.x0 - bbox.x0).abs() < 1e-9);
//! ```

// Submodules
mod transform;
mod types;

// Re-export public API
pub use transform::{
    overlap_ratio, overlaps, overlaps_default, to_extraction_coords, to_render_coords,
    CoordinateTransformer,
};
pub use types::{
    Bounds, CoordError, ExtractionBox, RenderBox, Result, Rotation, DEFAULT_OVERLAP_THRESHOLD,
    DEFAULT_SCALE,
};
