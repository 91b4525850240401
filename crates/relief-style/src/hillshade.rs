//! Hillshade paint properties.
//!
//! The lifecycle per frame is:
//!
//! 1. [`HillshadePaintProperties`] holds what the style author set.
//! 2. [`HillshadePaintProperties::transitioned`] turns it into
//!    [`HillshadeUnevaluated`], blending from the previous values.
//! 3. [`HillshadeUnevaluated::evaluate`] resolves zoom curves and transitions
//!    into the plain [`HillshadeEvaluated`] snapshot a frame is drawn with.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::property::Interpolate;
use crate::render_pass::{RenderPass, RenderPasses};
use crate::transition::{
    PropertyEvaluationParameters, TransitionParameters, Transitionable, Transitioning,
};

/// Frame of reference for the light direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IlluminationAnchor {
    /// Direction is relative to north and turns with the map.
    Map,
    /// Direction is relative to the top of the screen.
    #[default]
    Viewport,
}

impl Interpolate for IlluminationAnchor {
    fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        if t < 1.0 { *a } else { *b }
    }
}

pub const DEFAULT_EXAGGERATION: f32 = 0.5;
pub const DEFAULT_ILLUMINATION_DIRECTION: f32 = 335.0;
pub const DEFAULT_HIGHLIGHT: Color = Color::WHITE;
pub const DEFAULT_SHADOW: Color = Color::BLACK;
pub const DEFAULT_ACCENT: Color = Color::BLACK;

/// Authored hillshade paint properties. Undefined values fall back to the
/// `DEFAULT_*` constants at evaluation time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadePaintProperties {
    pub exaggeration: Transitionable<f32>,
    /// Degrees clockwise from the anchor's up direction.
    pub illumination_direction: Transitionable<f32>,
    pub illumination_anchor: Transitionable<IlluminationAnchor>,
    pub highlight_color: Transitionable<Color>,
    pub shadow_color: Transitionable<Color>,
    pub accent_color: Transitionable<Color>,
}

impl HillshadePaintProperties {
    /// Current values with no transition history.
    pub fn untransitioned(&self) -> HillshadeUnevaluated {
        HillshadeUnevaluated {
            exaggeration: self.exaggeration.untransitioned(),
            illumination_direction: self.illumination_direction.untransitioned(),
            illumination_anchor: self.illumination_anchor.untransitioned(),
            highlight_color: self.highlight_color.untransitioned(),
            shadow_color: self.shadow_color.untransitioned(),
            accent_color: self.accent_color.untransitioned(),
        }
    }

    /// Start transitions from `prior` towards the current values.
    pub fn transitioned(
        &self,
        params: &TransitionParameters,
        prior: HillshadeUnevaluated,
    ) -> HillshadeUnevaluated {
        HillshadeUnevaluated {
            exaggeration: self.exaggeration.transition(params, prior.exaggeration),
            illumination_direction: self
                .illumination_direction
                .transition(params, prior.illumination_direction),
            illumination_anchor: self
                .illumination_anchor
                .transition(params, prior.illumination_anchor),
            highlight_color: self.highlight_color.transition(params, prior.highlight_color),
            shadow_color: self.shadow_color.transition(params, prior.shadow_color),
            accent_color: self.accent_color.transition(params, prior.accent_color),
        }
    }
}

/// Hillshade properties with transition state, ready to evaluate.
#[derive(Clone, Debug, Default)]
pub struct HillshadeUnevaluated {
    exaggeration: Transitioning<f32>,
    illumination_direction: Transitioning<f32>,
    illumination_anchor: Transitioning<IlluminationAnchor>,
    highlight_color: Transitioning<Color>,
    shadow_color: Transitioning<Color>,
    accent_color: Transitioning<Color>,
}

impl HillshadeUnevaluated {
    pub fn evaluate(&mut self, params: &PropertyEvaluationParameters) -> HillshadeEvaluated {
        HillshadeEvaluated {
            exaggeration: self.exaggeration.evaluate(params, &DEFAULT_EXAGGERATION),
            illumination_direction: self
                .illumination_direction
                .evaluate(params, &DEFAULT_ILLUMINATION_DIRECTION),
            illumination_anchor: self
                .illumination_anchor
                .evaluate(params, &IlluminationAnchor::default()),
            highlight: self.highlight_color.evaluate(params, &DEFAULT_HIGHLIGHT),
            shadow: self.shadow_color.evaluate(params, &DEFAULT_SHADOW),
            accent: self.accent_color.evaluate(params, &DEFAULT_ACCENT),
        }
    }

    pub fn has_transition(&self) -> bool {
        self.exaggeration.has_transition()
            || self.illumination_direction.has_transition()
            || self.illumination_anchor.has_transition()
            || self.highlight_color.has_transition()
            || self.shadow_color.has_transition()
            || self.accent_color.has_transition()
    }
}

/// Resolved hillshade properties for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HillshadeEvaluated {
    pub exaggeration: f32,
    /// Degrees.
    pub illumination_direction: f32,
    pub illumination_anchor: IlluminationAnchor,
    pub highlight: Color,
    pub shadow: Color,
    pub accent: Color,
}

impl HillshadeEvaluated {
    /// Passes a layer with these properties draws in. A flat (zero or negative)
    /// exaggeration draws nothing.
    pub fn render_passes(&self) -> RenderPasses {
        if self.exaggeration > 0.0 {
            RenderPasses::of(&[RenderPass::Translucent, RenderPass::Pass3D])
        } else {
            RenderPasses::NONE
        }
    }
}

impl Default for HillshadeEvaluated {
    fn default() -> Self {
        Self {
            exaggeration: DEFAULT_EXAGGERATION,
            illumination_direction: DEFAULT_ILLUMINATION_DIRECTION,
            illumination_anchor: IlluminationAnchor::default(),
            highlight: DEFAULT_HIGHLIGHT,
            shadow: DEFAULT_SHADOW,
            accent: DEFAULT_ACCENT,
        }
    }
}
