//! Keyframed curves and their interpolation.

pub mod curve;
pub mod interpolation;

pub use curve::{Curve, KeyDefinition, SharedCurve, revision_shared, sample_shared};
pub use interpolation::{Interpolation, OutsideCurveBehavior};
