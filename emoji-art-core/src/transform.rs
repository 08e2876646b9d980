//! Coordinate transforms between canvas space and view space.
//!
//! Canvas space uses integer coordinates with the origin at the document
//! center. View space is the presentation layer's point grid. The mapping is
//! parameterized by a pan offset (already multiplied by the zoom scale), the
//! zoom scale, and the center of the view.

use serde::{Deserialize, Serialize};

/// A point in view space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 2D offset in view space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal component.
    pub dx: f64,
    /// Vertical component.
    pub dy: f64,
}

impl Vector {
    /// The zero offset.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create an offset.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.dx * factor, self.dy * factor)
    }
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

/// A width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The center point of a rectangle with this size at the origin.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Saturating float-to-int cast; `as` already truncates toward zero and
/// clamps out-of-range values.
#[allow(clippy::cast_possible_truncation)]
fn trunc_to_i32(v: f64) -> i32 {
    v as i32
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i32(v: f64) -> i32 {
    v.round() as i32
}

/// Mapping between canvas and view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Pan offset in view points, already multiplied by the zoom scale.
    pub pan_offset: Vector,
    /// Zoom scale, always positive.
    pub zoom_scale: f64,
    /// Center of the view in view points.
    pub view_center: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan_offset: Vector::ZERO,
            zoom_scale: 1.0,
            view_center: Point::default(),
        }
    }
}

impl ViewTransform {
    /// Create a transform.
    #[must_use]
    pub fn new(pan_offset: Vector, zoom_scale: f64, view_center: Point) -> Self {
        Self {
            pan_offset,
            zoom_scale,
            view_center,
        }
    }

    /// Map a canvas coordinate into view space.
    #[must_use]
    pub fn to_view(&self, canvas: (i32, i32)) -> Point {
        Point::new(
            self.view_center.x + f64::from(canvas.0) * self.zoom_scale + self.pan_offset.dx,
            self.view_center.y + f64::from(canvas.1) * self.zoom_scale + self.pan_offset.dy,
        )
    }

    /// Map a view point into canvas space, truncating toward zero.
    ///
    /// Truncation biases negative coordinates toward the origin by up to one
    /// unit; stored documents were placed with this rule.
    #[must_use]
    pub fn to_canvas(&self, view: Point) -> (i32, i32) {
        let (x, y) = self.unscaled(view);
        (trunc_to_i32(x), trunc_to_i32(y))
    }

    /// Map a view point into canvas space, rounding to the nearest unit.
    #[must_use]
    pub fn to_canvas_rounded(&self, view: Point) -> (i32, i32) {
        let (x, y) = self.unscaled(view);
        (round_to_i32(x), round_to_i32(y))
    }

    fn unscaled(&self, view: Point) -> (f64, f64) {
        (
            (view.x - self.pan_offset.dx - self.view_center.x) / self.zoom_scale,
            (view.y - self.pan_offset.dy - self.view_center.y) / self.zoom_scale,
        )
    }

    /// Convert a view-space drag offset into canvas-space deltas, rounding
    /// half away from zero.
    #[must_use]
    pub fn canvas_delta(&self, offset: Vector) -> (i32, i32) {
        (
            round_to_i32(offset.dx / self.zoom_scale),
            round_to_i32(offset.dy / self.zoom_scale),
        )
    }

    /// Fit an image into the viewport, resetting the pan offset.
    ///
    /// Returns `self` unchanged if either size has a non-positive dimension.
    #[must_use]
    pub fn zoomed_to_fit(&self, image: Size, viewport: Size) -> Self {
        match zoom_to_fit(image, viewport) {
            Some(zoom_scale) => Self {
                pan_offset: Vector::ZERO,
                zoom_scale,
                ..*self
            },
            None => *self,
        }
    }
}

/// Scale that fits `image` inside `viewport`, or `None` if either size has a
/// non-positive dimension.
#[must_use]
pub fn zoom_to_fit(image: Size, viewport: Size) -> Option<f64> {
    if !image.is_positive() || !viewport.is_positive() {
        return None;
    }
    Some((viewport.width / image.width).min(viewport.height / image.height))
}

/// Pan and zoom state of a document view.
///
/// The settled ("steady") values are combined with the values of a gesture in
/// progress. Pan translations are stored in canvas units (divided by zoom)
/// and multiplied back when producing the view offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    steady_zoom: f64,
    gesture_zoom: f64,
    steady_pan: Vector,
    gesture_pan: Vector,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            steady_zoom: 1.0,
            gesture_zoom: 1.0,
            steady_pan: Vector::ZERO,
            gesture_pan: Vector::ZERO,
        }
    }
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective zoom scale.
    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        self.steady_zoom * self.gesture_zoom
    }

    /// Effective pan offset in view points.
    #[must_use]
    pub fn pan_offset(&self) -> Vector {
        (self.steady_pan + self.gesture_pan).scaled(self.zoom_scale())
    }

    /// Transform for a view of the given size.
    #[must_use]
    pub fn transform(&self, view_size: Size) -> ViewTransform {
        ViewTransform::new(self.pan_offset(), self.zoom_scale(), view_size.center())
    }

    /// Track an in-progress pinch. Non-positive or non-finite scales are ignored.
    pub fn update_pinch(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.gesture_zoom = scale;
        }
    }

    /// Commit a finished pinch into the steady zoom.
    pub fn end_pinch(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.steady_zoom *= scale;
        }
        self.gesture_zoom = 1.0;
    }

    /// Track an in-progress pan by its view-space translation.
    pub fn update_pan(&mut self, translation: Vector) {
        self.gesture_pan = translation.scaled(1.0 / self.zoom_scale());
    }

    /// Commit a finished pan.
    pub fn end_pan(&mut self, translation: Vector) {
        self.steady_pan = self.steady_pan + translation.scaled(1.0 / self.zoom_scale());
        self.gesture_pan = Vector::ZERO;
    }

    /// Zoom so `image` fills `view_size` and clear the pan. No-op if either
    /// size has a non-positive dimension.
    pub fn zoom_to_fit(&mut self, image: Size, view_size: Size) {
        if let Some(zoom) = zoom_to_fit(image, view_size) {
            self.steady_pan = Vector::ZERO;
            self.steady_zoom = zoom;
        }
    }

    /// Canvas-space deltas for a view-space drag of an element.
    #[must_use]
    pub fn canvas_delta(&self, offset: Vector) -> (i32, i32) {
        self.transform(Size::default()).canvas_delta(offset)
    }

    /// Size for an emoji dropped at the current zoom, so it appears at
    /// `nominal` points on screen.
    #[must_use]
    pub fn default_emoji_size(&self, nominal: f64) -> i64 {
        #[allow(clippy::cast_possible_truncation)]
        let size = (nominal / self.zoom_scale()).round() as i64;
        size.max(1)
    }
}
