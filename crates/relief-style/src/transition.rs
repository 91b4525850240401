//! Time-based transitions between successive values of a paint property.
//!
//! A [`Transitionable`] is what a style author sets: a value plus optional
//! transition timing. Calling [`Transitionable::transition`] against the
//! previous [`Transitioning`] state produces a new one that eases from the old
//! value to the new one between `begin` and `end`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::property::{Interpolate, PropertyValue};

/// Transition timing. Unset fields fall back to the caller's defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOptions {
    pub duration: Option<Duration>,
    pub delay: Option<Duration>,
}

impl TransitionOptions {
    pub fn new(duration: Duration, delay: Duration) -> Self {
        Self {
            duration: Some(duration),
            delay: Some(delay),
        }
    }

    /// Fill unset fields from `defaults`.
    #[must_use]
    pub fn reverse_merge(&self, defaults: &TransitionOptions) -> TransitionOptions {
        TransitionOptions {
            duration: self.duration.or(defaults.duration),
            delay: self.delay.or(defaults.delay),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.duration.is_some() || self.delay.is_some()
    }
}

/// Inputs for starting transitions.
#[derive(Clone, Copy, Debug)]
pub struct TransitionParameters {
    pub now: Instant,
    /// Defaults for properties that carry no timing of their own.
    pub transition: TransitionOptions,
}

/// Inputs for evaluating properties for one frame.
#[derive(Clone, Copy, Debug)]
pub struct PropertyEvaluationParameters {
    pub zoom: f32,
    pub now: Instant,
}

impl PropertyEvaluationParameters {
    pub fn new(zoom: f32, now: Instant) -> Self {
        Self { zoom, now }
    }
}

/// An authored property value with its transition timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transitionable<T> {
    pub value: PropertyValue<T>,
    #[serde(default)]
    pub transition: TransitionOptions,
}

impl<T> Default for Transitionable<T> {
    fn default() -> Self {
        Self {
            value: PropertyValue::Undefined,
            transition: TransitionOptions::default(),
        }
    }
}

impl<T: Interpolate + Clone> Transitionable<T> {
    pub fn constant(value: T) -> Self {
        Self {
            value: PropertyValue::Constant(value),
            transition: TransitionOptions::default(),
        }
    }

    /// Start a transition from `prior` towards this value.
    pub fn transition(&self, params: &TransitionParameters, prior: Transitioning<T>) -> Transitioning<T> {
        let options = self.transition.reverse_merge(&params.transition);
        let begin = params.now + options.delay.unwrap_or_default();
        let end = begin + options.duration.unwrap_or_default();

        let prior = (options.is_defined() && end > params.now).then(|| {
            Box::new(Prior {
                value: prior,
                begin,
                end,
            })
        });
        Transitioning {
            value: self.value.clone(),
            prior,
        }
    }

    /// The same value with no transition history.
    pub fn untransitioned(&self) -> Transitioning<T> {
        Transitioning::new(self.value.clone())
    }
}

#[derive(Clone, Debug)]
struct Prior<T> {
    value: Transitioning<T>,
    begin: Instant,
    end: Instant,
}

/// A property value that may still be easing in from an earlier value.
#[derive(Clone, Debug)]
pub struct Transitioning<T> {
    value: PropertyValue<T>,
    prior: Option<Box<Prior<T>>>,
}

impl<T> Default for Transitioning<T> {
    fn default() -> Self {
        Self {
            value: PropertyValue::Undefined,
            prior: None,
        }
    }
}

impl<T: Interpolate + Clone> Transitioning<T> {
    pub fn new(value: PropertyValue<T>) -> Self {
        Self { value, prior: None }
    }

    /// The target value.
    pub fn value(&self) -> &PropertyValue<T> {
        &self.value
    }

    /// Resolve for one frame. Finished priors are dropped.
    pub fn evaluate(&mut self, params: &PropertyEvaluationParameters, default: &T) -> T {
        let target = self.value.evaluate(params.zoom, default);
        let Some(prior) = self.prior.as_mut() else {
            return target;
        };

        if params.now >= prior.end {
            self.prior = None;
            return target;
        }
        if params.now < prior.begin {
            return prior.value.evaluate(params, default);
        }

        let span = (prior.end - prior.begin).as_secs_f64();
        let t = (params.now - prior.begin).as_secs_f64() / span;
        let from = prior.value.evaluate(params, default);
        T::interpolate(&from, &target, ease(t) as f32)
    }

    /// True while an earlier value is still blended in.
    pub fn has_transition(&self) -> bool {
        self.prior.is_some()
    }
}

/// `cubic-bezier(0, 0, 0.25, 1)`, the ease-out curve used for property
/// transitions.
fn ease(t: f64) -> f64 {
    const P1: (f64, f64) = (0.0, 0.0);
    const P2: (f64, f64) = (0.25, 1.0);

    let cx = 3.0 * P1.0;
    let bx = 3.0 * (P2.0 - P1.0) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * P1.1;
    let by = 3.0 * (P2.1 - P1.1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |s: f64| ((ax * s + bx) * s + cx) * s;
    let sample_y = |s: f64| ((ay * s + by) * s + cy) * s;
    let slope_x = |s: f64| (3.0 * ax * s + 2.0 * bx) * s + cx;

    let t = t.clamp(0.0, 1.0);

    // Newton first, bisection if the slope flattens out.
    let mut s = t;
    for _ in 0..8 {
        let err = sample_x(s) - t;
        if err.abs() < 1e-6 {
            return sample_y(s);
        }
        let d = slope_x(s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = t;
    while hi - lo > 1e-6 {
        let x = sample_x(s);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if t > x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample_y(s)
}
