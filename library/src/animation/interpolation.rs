use serde::{Deserialize, Serialize};

/// How a curve segment leaves a key (out side) or arrives at a key (in side).
///
/// Stored by variant name, so adding a kind never changes the key format.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Hold the left key's value until the next key.
    Constant,
    Linear,
    /// Cubic Hermite with a Catmull-Rom tangent taken from the neighbouring keys.
    #[default]
    Spline,
    /// Cubic Hermite with a flat tangent on this side.
    Horizontal,
}

/// What a curve does for query times before its first or after its last key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutsideCurveBehavior {
    /// Clamp to the nearest key's value.
    #[default]
    Constant,
    Cycle,
    /// Like `Cycle`, but every repetition is shifted by the value delta of one pass.
    CycleWithOffset,
    /// Ping-pong through the key range.
    Oscillate,
}

/// Evaluates a cubic Hermite segment at normalized position `s` in `[0, 1]`.
///
/// `m0` and `m1` are slopes in value-per-time; `span` is the segment duration.
pub(crate) fn hermite(p0: f64, m0: f64, p1: f64, m1: f64, span: f64, s: f64) -> f64 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p0 + h10 * span * m0 + h01 * p1 + h11 * span * m1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hermite_with_secant_slopes_is_linear() {
        let slope = (7.0 - 5.0) / 2.0;
        for s in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let v = hermite(5.0, slope, 7.0, slope, 2.0, s);
            assert!((v - (5.0 + 2.0 * s)).abs() < 1e-9);
        }
    }

    #[test]
    fn hermite_with_flat_slopes_is_smoothstep() {
        assert_eq!(hermite(0.0, 0.0, 1.0, 0.0, 1.0, 0.5), 0.5);
        assert!(hermite(0.0, 0.0, 1.0, 0.0, 1.0, 0.25) < 0.25);
    }

    #[test]
    fn kinds_serialize_by_name() {
        let json = serde_json::to_string(&Interpolation::Horizontal).unwrap();
        assert_eq!(json, "\"Horizontal\"");
        let parsed: OutsideCurveBehavior = serde_json::from_str("\"CycleWithOffset\"").unwrap();
        assert_eq!(parsed, OutsideCurveBehavior::CycleWithOffset);
    }
}
