//! Paint properties for hillshade layers: values, zoom curves, transitions and
//! the evaluated snapshot a frame is drawn with.

pub mod color;
pub mod hillshade;
pub mod property;
pub mod render_pass;
pub mod transition;

pub use color::{Color, ColorParseError};
pub use hillshade::{
    HillshadeEvaluated, HillshadePaintProperties, HillshadeUnevaluated, IlluminationAnchor,
};
pub use property::{Interpolate, PropertyValue, ZoomCurve};
pub use render_pass::{RenderPass, RenderPasses};
pub use transition::{
    PropertyEvaluationParameters, TransitionOptions, TransitionParameters, Transitionable,
    Transitioning,
};
