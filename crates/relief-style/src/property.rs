//! Paint property values and zoom-dependent curves.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Values that can be blended between two endpoints.
pub trait Interpolate: Sized {
    /// Blend from `a` (t = 0) to `b` (t = 1).
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Interpolate for Color {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        Color::new(
            f32::interpolate(&a.r, &b.r, t),
            f32::interpolate(&a.g, &b.g, t),
            f32::interpolate(&a.b, &b.b, t),
            f32::interpolate(&a.a, &b.a, t),
        )
    }
}

/// Piecewise curve over zoom, exponential between stops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomCurve<T> {
    /// Exponential base; 1.0 is linear.
    #[serde(default = "default_base")]
    pub base: f32,
    /// `(zoom, value)` pairs in ascending zoom order.
    pub stops: Vec<(f32, T)>,
}

fn default_base() -> f32 {
    1.0
}

impl<T: Interpolate + Clone> ZoomCurve<T> {
    pub fn new(base: f32, stops: Vec<(f32, T)>) -> Self {
        Self { base, stops }
    }

    /// Evaluate at `zoom`, clamping outside the first and last stop.
    ///
    /// Returns `None` if the curve has no stops.
    pub fn evaluate(&self, zoom: f32) -> Option<T> {
        let (first, last) = (self.stops.first()?, self.stops.last()?);
        if zoom <= first.0 {
            return Some(first.1.clone());
        }
        if zoom >= last.0 {
            return Some(last.1.clone());
        }

        let upper = self.stops.iter().position(|(z, _)| *z > zoom)?;
        let (z0, v0) = &self.stops[upper - 1];
        let (z1, v1) = &self.stops[upper];
        let t = interpolation_factor(self.base, zoom - z0, z1 - z0);
        Some(T::interpolate(v0, v1, t))
    }
}

/// Position of `progress` within `range` under an exponential curve.
fn interpolation_factor(base: f32, progress: f32, range: f32) -> f32 {
    if range == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / range
    } else {
        (base.powf(progress) - 1.0) / (base.powf(range) - 1.0)
    }
}

/// The authored value of a paint property.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue<T> {
    /// Not set; the property default applies.
    #[default]
    Undefined,
    /// Same value at every zoom.
    Constant(T),
    /// Varies with the camera zoom.
    Zoom(ZoomCurve<T>),
}

impl<T: Interpolate + Clone> PropertyValue<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropertyValue::Undefined)
    }

    /// Resolve at `zoom`, falling back to `default` when undefined.
    pub fn evaluate(&self, zoom: f32, default: &T) -> T {
        match self {
            PropertyValue::Undefined => default.clone(),
            PropertyValue::Constant(value) => value.clone(),
            PropertyValue::Zoom(curve) => curve.evaluate(zoom).unwrap_or_else(|| default.clone()),
        }
    }
}
