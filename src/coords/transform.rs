//! Coordinate transformation implementation
//!
//! Extraction → rendering is the composition `scale ∘ rotate ∘ flip`:
//!
//! 1. flip the Y axis about the page height (bottom-left → top-left origin)
//! 2. rotate by the page rotation inside the unscaled page frame
//! 3. scale to viewport pixels
//!
//! Each step is an invertible affine map, so rendering → extraction is the
//! inverse matrix and round trips are exact up to floating-point error.

use super::types::{
    Bounds, CoordError, ExtractionBox, RenderBox, Result, Rotation, DEFAULT_OVERLAP_THRESHOLD,
};

/// 2D affine transform.
///
/// ```text
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
/// ```
///
/// Transformed point: (x', y') = (a*x + c*y + e, b*x + d*y + f)
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn scale(factor: f64) -> Self {
        Self::new(factor, 0.0, 0.0, factor, 0.0, 0.0)
    }

    /// Mirror the Y axis about `height`: (x, y) → (x, h - y)
    fn flip_y(height: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, -1.0, 0.0, height)
    }

    /// Quarter-turn rotation inside a frame of extent `extent`
    fn rotation(rotation: Rotation, extent: f64) -> Self {
        match rotation {
            // (x, y) → (x, y)
            Rotation::Deg0 => Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            // (x, y) → (y, h - x)
            Rotation::Deg90 => Self::new(0.0, -1.0, 1.0, 0.0, 0.0, extent),
            // (x, y) → (h - x, h - y)
            Rotation::Deg180 => Self::new(-1.0, 0.0, 0.0, -1.0, extent, extent),
            // (x, y) → (h - y, x)
            Rotation::Deg270 => Self::new(0.0, 1.0, -1.0, 0.0, extent, 0.0),
        }
    }

    /// Apply `self`, then `next`
    fn then(&self, next: &Affine) -> Affine {
        Affine::new(
            self.a * next.a + self.b * next.c,
            self.a * next.b + self.b * next.d,
            self.c * next.a + self.d * next.c,
            self.c * next.b + self.d * next.d,
            self.e * next.a + self.f * next.c + next.e,
            self.e * next.b + self.f * next.d + next.f,
        )
    }

    fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Affine::new(
            a,
            b,
            c,
            d,
            -(self.e * a + self.f * c),
            -(self.e * b + self.f * d),
        ))
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Map both corners and re-normalize to min/max
    fn apply_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> (f64, f64, f64, f64) {
        let (ax, ay) = self.apply(x0, y0);
        let (bx, by) = self.apply(x1, y1);
        (ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }
}

/// Converts boxes between extraction and rendering coordinates for one page view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    page_height: f64,
    scale: f64,
    rotation: Rotation,
    forward: Affine,
    inverse: Affine,
}

impl CoordinateTransformer {
    /// Create a transformer for a page of `page_height` points viewed at
    /// `scale` under `rotation`.
    ///
    /// The rotation frame uses the page height as its extent on both axes.
    pub fn new(page_height: f64, scale: f64, rotation: Rotation) -> Result<Self> {
        if !page_height.is_finite() || page_height <= 0.0 {
            return Err(CoordError::InvalidPageHeight(page_height));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CoordError::InvalidScale(scale));
        }

        let forward = Affine::flip_y(page_height)
            .then(&Affine::rotation(rotation, page_height))
            .then(&Affine::scale(scale));
        let inverse = forward.inverse().ok_or(CoordError::InvalidScale(scale))?;

        Ok(Self {
            page_height,
            scale,
            rotation,
            forward,
            inverse,
        })
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Extraction (bottom-left, unscaled) → rendering (top-left, scaled)
    pub fn to_render(&self, bbox: &ExtractionBox) -> RenderBox {
        let (x0, y0, x1, y1) = self.forward.apply_rect(bbox.x0, bbox.y0, bbox.x1, bbox.y1);
        RenderBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
            rotation: self.rotation,
        }
    }

    /// Rendering (top-left, scaled) → extraction (bottom-left, unscaled)
    pub fn to_extraction(&self, bbox: &RenderBox) -> ExtractionBox {
        let (x0, y0, x1, y1) = self
            .inverse
            .apply_rect(bbox.x, bbox.y, bbox.right(), bbox.bottom());
        ExtractionBox { x0, y0, x1, y1 }
    }
}

/// Convert an extraction box to rendering coordinates
pub fn to_render_coords(
    bbox: &ExtractionBox,
    page_height: f64,
    scale: f64,
    rotation: Rotation,
) -> Result<RenderBox> {
    Ok(CoordinateTransformer::new(page_height, scale, rotation)?.to_render(bbox))
}

/// Convert a rendering box back to extraction coordinates
pub fn to_extraction_coords(
    bbox: &RenderBox,
    page_height: f64,
    scale: f64,
    rotation: Rotation,
) -> Result<ExtractionBox> {
    Ok(CoordinateTransformer::new(page_height, scale, rotation)?.to_extraction(bbox))
}

/// Intersection area divided by the smaller box's area.
///
/// Disjoint boxes, edge contact and zero-area boxes all give 0.
pub fn overlap_ratio<A: Bounds, B: Bounds>(a: &A, b: &B) -> f64 {
    let (ax0, ay0, ax1, ay1) = a.bounds();
    let (bx0, by0, bx1, by1) = b.bounds();

    let width = ax1.min(bx1) - ax0.max(bx0);
    let height = ay1.min(by1) - ay0.max(by0);
    if !(width > 0.0 && height > 0.0) {
        return 0.0;
    }

    let smaller = a.area().min(b.area());
    if smaller <= 0.0 {
        return 0.0;
    }

    let ratio = width * height / smaller;
    if ratio.is_finite() {
        ratio.min(1.0)
    } else {
        0.0
    }
}

/// Whether two boxes overlap by at least `threshold` of the smaller box
pub fn overlaps<A: Bounds, B: Bounds>(a: &A, b: &B, threshold: f64) -> bool {
    overlap_ratio(a, b) >= threshold
}

/// [`overlaps`] with the default threshold of 0.5
pub fn overlaps_default<A: Bounds, B: Bounds>(a: &A, b: &B) -> bool {
    overlaps(a, b, DEFAULT_OVERLAP_THRESHOLD)
}
