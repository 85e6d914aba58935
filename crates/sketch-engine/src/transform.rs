//! Pan and zoom transform between canvas space and screen space
//!
//! `screen = canvas * scale + (x, y)`. Node positions are always stored in
//! canvas space; the transform only changes how they are viewed.

use serde::{Deserialize, Serialize};

use crate::constants::zoom;
use crate::types::Point;

/// Affine map from canvas (logical) space to screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasTransform {
    pub x: f64,
    pub y: f64,
    /// Zoom factor (1.0 = 100%, clamped to 0.1..10.0)
    pub scale: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CanvasTransform {
    pub const IDENTITY: CanvasTransform = CanvasTransform {
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };

    /// Build a transform; non-finite components fall back to the identity's
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self {
            x: if x.is_finite() { x } else { Self::IDENTITY.x },
            y: if y.is_finite() { y } else { Self::IDENTITY.y },
            scale: clamp_scale(scale).unwrap_or(Self::IDENTITY.scale),
        }
    }

    /// Every component is finite and the scale is within the zoom clamp
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (zoom::MIN_SCALE..=zoom::MAX_SCALE).contains(&self.scale)
    }

    /// The translation component
    pub fn offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Map a screen point into canvas space
    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    /// Map a canvas point onto the screen
    pub fn to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.scale + self.x, canvas.y * self.scale + self.y)
    }

    /// Same scale, new translation; a non-finite offset is ignored
    pub fn with_offset(&self, offset: Point) -> Self {
        if !offset.is_finite() {
            return *self;
        }
        Self {
            x: offset.x,
            y: offset.y,
            scale: self.scale,
        }
    }

    /// Zoom by `factor`, keeping `screen` fixed under the cursor
    ///
    /// A non-finite or non-positive factor leaves the transform unchanged.
    pub fn zoom_about(&self, screen: Point, factor: f64) -> Self {
        if !screen.is_finite() || !(factor.is_finite() && factor > 0.0) {
            return *self;
        }
        let Some(scale) = clamp_scale(self.scale * factor) else {
            return *self;
        };
        let ratio = scale / self.scale;
        Self {
            x: screen.x - (screen.x - self.x) * ratio,
            y: screen.y - (screen.y - self.y) * ratio,
            scale,
        }
    }
}

fn clamp_scale(scale: f64) -> Option<f64> {
    if scale.is_nan() {
        return None;
    }
    Some(scale.clamp(zoom::MIN_SCALE, zoom::MAX_SCALE))
}
