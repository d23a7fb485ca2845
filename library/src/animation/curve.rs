use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use log::warn;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::interpolation::{Interpolation, OutsideCurveBehavior, hermite};

/// Value and interpolation of a single key. The key time is the map key in [`Curve`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct KeyDefinition {
    pub value: f64,
    pub in_type: Interpolation,
    pub out_type: Interpolation,
}

impl KeyDefinition {
    pub fn new(value: f64, interpolation: Interpolation) -> Self {
        Self {
            value,
            in_type: interpolation,
            out_type: interpolation,
        }
    }

    pub fn spline(value: f64) -> Self {
        Self::new(value, Interpolation::Spline)
    }
}

/// A sparse, time-keyed scalar function.
///
/// Keys are unique by time and always sorted. Sampling is a pure function of the
/// key sequence and the two outside-range behaviors.
///
/// Every edit bumps [`Curve::revision`]; animated slots compare it to notice
/// edits made at a time they already sampled.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Curve {
    #[serde(default)]
    pre_curve: OutsideCurveBehavior,
    #[serde(default)]
    post_curve: OutsideCurveBehavior,
    #[serde(default, with = "key_list")]
    keys: BTreeMap<OrderedFloat<f64>, KeyDefinition>,
    #[serde(skip)]
    revision: u64,
}

impl PartialEq for Curve {
    /// Equal shape; the edit count is not part of it.
    fn eq(&self, other: &Self) -> bool {
        self.pre_curve == other.pre_curve
            && self.post_curve == other.post_curve
            && self.keys == other.keys
    }
}

/// Curves are shared between the animator registry and the update actions it installs.
pub type SharedCurve = Arc<RwLock<Curve>>;

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    /// A curve holding one spline key.
    pub fn with_key(time: f64, value: f64) -> Self {
        let mut curve = Self::new();
        curve.upsert(time, KeyDefinition::spline(value));
        curve
    }

    pub fn into_shared(self) -> SharedCurve {
        Arc::new(RwLock::new(self))
    }

    /// Inserts a key or replaces the one already at `time`. Returns the replaced key.
    pub fn upsert(&mut self, time: f64, definition: KeyDefinition) -> Option<KeyDefinition> {
        if time.is_nan() {
            warn!("Ignoring curve key with NaN time");
            return None;
        }
        self.revision += 1;
        self.keys.insert(OrderedFloat(time), definition)
    }

    pub fn remove_key(&mut self, time: f64) -> Option<KeyDefinition> {
        let removed = self.keys.remove(&OrderedFloat(time));
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn pre_curve(&self) -> OutsideCurveBehavior {
        self.pre_curve
    }

    pub fn set_pre_curve(&mut self, behavior: OutsideCurveBehavior) {
        self.pre_curve = behavior;
        self.revision += 1;
    }

    pub fn post_curve(&self) -> OutsideCurveBehavior {
        self.post_curve
    }

    pub fn set_post_curve(&mut self, behavior: OutsideCurveBehavior) {
        self.post_curve = behavior;
        self.revision += 1;
    }

    /// Number of edits since the curve was created or loaded.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn key_at(&self, time: f64) -> Option<&KeyDefinition> {
        self.keys.get(&OrderedFloat(time))
    }

    pub fn keys(&self) -> impl Iterator<Item = (f64, &KeyDefinition)> {
        self.keys.iter().map(|(time, def)| (time.0, def))
    }

    pub fn first_key(&self) -> Option<(f64, &KeyDefinition)> {
        self.keys.first_key_value().map(|(time, def)| (time.0, def))
    }

    pub fn last_key(&self) -> Option<(f64, &KeyDefinition)> {
        self.keys.last_key_value().map(|(time, def)| (time.0, def))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.revision += 1;
    }

    /// Samples the curve at `time`.
    ///
    /// An empty curve (or a NaN query) yields 0.0 so that a binding under
    /// construction never breaks evaluation.
    pub fn sample(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        let (Some((first_time, first)), Some((last_time, last))) = (self.first_key(), self.last_key())
        else {
            return 0.0;
        };

        if time < first_time {
            self.sample_outside(self.pre_curve, time, first_time, last_time, first.value, last.value)
        } else if time > last_time {
            self.sample_outside(self.post_curve, time, first_time, last_time, first.value, last.value)
        } else {
            self.sample_inside(time)
        }
    }

    fn sample_outside(
        &self,
        behavior: OutsideCurveBehavior,
        time: f64,
        first_time: f64,
        last_time: f64,
        first_value: f64,
        last_value: f64,
    ) -> f64 {
        let clamped = if time < first_time { first_value } else { last_value };
        let span = last_time - first_time;
        if span <= f64::EPSILON {
            return clamped;
        }

        let offset = time - first_time;
        match behavior {
            OutsideCurveBehavior::Constant => clamped,
            OutsideCurveBehavior::Cycle => self.sample_inside(first_time + offset.rem_euclid(span)),
            OutsideCurveBehavior::CycleWithOffset => {
                let cycles = (offset / span).floor();
                self.sample_inside(first_time + offset.rem_euclid(span))
                    + cycles * (last_value - first_value)
            }
            OutsideCurveBehavior::Oscillate => {
                let phase = offset.rem_euclid(2.0 * span);
                let local = if phase <= span {
                    first_time + phase
                } else {
                    last_time - (phase - span)
                };
                self.sample_inside(local)
            }
        }
    }

    /// `time` must lie within the key range.
    fn sample_inside(&self, time: f64) -> f64 {
        let at = OrderedFloat(time);
        let Some((&left_time, left)) = self.keys.range(..=at).next_back() else {
            return self.first_key().map(|(_, def)| def.value).unwrap_or(0.0);
        };
        let Some((&right_time, right)) = self
            .keys
            .range((Bound::Excluded(at), Bound::Unbounded))
            .next()
        else {
            return left.value;
        };

        let span = right_time.0 - left_time.0;
        if span <= f64::EPSILON
            || left.out_type == Interpolation::Constant
            || right.in_type == Interpolation::Constant
        {
            return left.value;
        }

        let s = (time - left_time.0) / span;
        let secant = (right.value - left.value) / span;
        if left.out_type == Interpolation::Linear && right.in_type == Interpolation::Linear {
            return left.value + (right.value - left.value) * s;
        }

        let out_slope = match left.out_type {
            Interpolation::Linear => secant,
            Interpolation::Spline => self.catmull_slope(left_time, right_time, right.value, true),
            Interpolation::Horizontal | Interpolation::Constant => 0.0,
        };
        let in_slope = match right.in_type {
            Interpolation::Linear => secant,
            Interpolation::Spline => self.catmull_slope(right_time, left_time, left.value, false),
            Interpolation::Horizontal | Interpolation::Constant => 0.0,
        };

        hermite(left.value, out_slope, right.value, in_slope, span, s)
    }

    /// Catmull-Rom slope at `key_time`, using `neighbour` on one side and the
    /// adjacent key on the other. Keys at either end of the curve get a flat tangent.
    fn catmull_slope(
        &self,
        key_time: OrderedFloat<f64>,
        neighbour_time: OrderedFloat<f64>,
        neighbour_value: f64,
        look_back: bool,
    ) -> f64 {
        let other = if look_back {
            self.keys.range(..key_time).next_back()
        } else {
            self.keys
                .range((Bound::Excluded(key_time), Bound::Unbounded))
                .next()
        };
        match other {
            Some((&other_time, other_def)) => {
                let dt = neighbour_time.0 - other_time.0;
                if dt.abs() <= f64::EPSILON {
                    0.0
                } else {
                    (neighbour_value - other_def.value) / dt
                }
            }
            None => 0.0,
        }
    }
}

/// Reads the value of a shared curve. A poisoned lock still holds a valid curve.
pub fn sample_shared(curve: &SharedCurve, time: f64) -> f64 {
    match curve.read() {
        Ok(curve) => curve.sample(time),
        Err(poisoned) => poisoned.into_inner().sample(time),
    }
}

/// Edit count of a shared curve, read the same way as [`sample_shared`].
pub fn revision_shared(curve: &SharedCurve) -> u64 {
    match curve.read() {
        Ok(curve) => curve.revision(),
        Err(poisoned) => poisoned.into_inner().revision(),
    }
}

/// Keys are written as an ordered list of `{Time, Value, InType, OutType}` objects.
mod key_list {
    use std::collections::BTreeMap;

    use ordered_float::OrderedFloat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::KeyDefinition;
    use crate::animation::interpolation::Interpolation;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct KeyEntry {
        time: f64,
        value: f64,
        #[serde(default)]
        in_type: Interpolation,
        #[serde(default)]
        out_type: Interpolation,
    }

    pub fn serialize<S: Serializer>(
        keys: &BTreeMap<OrderedFloat<f64>, KeyDefinition>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(keys.iter().map(|(time, def)| KeyEntry {
            time: time.0,
            value: def.value,
            in_type: def.in_type,
            out_type: def.out_type,
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<OrderedFloat<f64>, KeyDefinition>, D::Error> {
        let entries = Vec::<KeyEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.time.is_nan())
            .map(|entry| {
                (
                    OrderedFloat(entry.time),
                    KeyDefinition {
                        value: entry.value,
                        in_type: entry.in_type,
                        out_type: entry.out_type,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_keys(kind: Interpolation) -> Curve {
        let mut curve = Curve::new();
        curve.upsert(0.0, KeyDefinition::new(5.0, kind));
        curve.upsert(1.0, KeyDefinition::new(7.0, kind));
        curve
    }

    #[test]
    fn empty_curve_samples_zero() {
        let curve = Curve::new();
        assert_eq!(curve.sample(3.0), 0.0);
        assert_eq!(curve.sample(f64::NAN), 0.0);
    }

    #[test]
    fn single_key_is_constant_everywhere() {
        let curve = Curve::with_key(2.0, 4.5);
        assert_eq!(curve.sample(-10.0), 4.5);
        assert_eq!(curve.sample(2.0), 4.5);
        assert_eq!(curve.sample(10.0), 4.5);
    }

    #[test]
    fn step_holds_left_value() {
        let curve = two_keys(Interpolation::Constant);
        assert_eq!(curve.sample(0.5), 5.0);
        assert_eq!(curve.sample(0.999), 5.0);
        assert_eq!(curve.sample(1.0), 7.0);
    }

    #[test]
    fn linear_and_spline_stay_between_keys() {
        let linear = two_keys(Interpolation::Linear);
        assert!((linear.sample(0.5) - 6.0).abs() < 1e-9);

        let spline = two_keys(Interpolation::Spline);
        let v = spline.sample(0.5);
        assert!(v > 5.0 && v < 7.0);
        // Flat end tangents ease in.
        assert!(spline.sample(0.1) < linear.sample(0.1));
    }

    #[test]
    fn asymmetric_sides_are_combined() {
        let mut curve = Curve::new();
        curve.upsert(
            0.0,
            KeyDefinition {
                value: 0.0,
                in_type: Interpolation::Linear,
                out_type: Interpolation::Linear,
            },
        );
        curve.upsert(
            1.0,
            KeyDefinition {
                value: 1.0,
                in_type: Interpolation::Horizontal,
                out_type: Interpolation::Linear,
            },
        );
        // Leaves with the secant slope, arrives flat: above the straight line.
        assert!(curve.sample(0.5) > 0.5);
        assert!(curve.sample(0.5) < 1.0);
    }

    #[test]
    fn upsert_replaces_key_at_same_time() {
        let mut curve = Curve::with_key(1.0, 1.0);
        let previous = curve.upsert(1.0, KeyDefinition::spline(3.0));
        assert_eq!(previous.map(|def| def.value), Some(1.0));
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.sample(1.0), 3.0);
    }

    #[test]
    fn keys_stay_sorted() {
        let mut curve = Curve::new();
        for time in [3.0, -1.0, 2.0, 0.5] {
            curve.upsert(time, KeyDefinition::spline(time));
        }
        let times: Vec<f64> = curve.keys().map(|(time, _)| time).collect();
        assert_eq!(times, vec![-1.0, 0.5, 2.0, 3.0]);
        assert!(curve.upsert(f64::NAN, KeyDefinition::spline(0.0)).is_none());
        assert_eq!(curve.len(), 4);
    }

    #[test]
    fn outside_behaviors() {
        let mut curve = two_keys(Interpolation::Linear);
        assert_eq!(curve.sample(-3.0), 5.0);
        assert_eq!(curve.sample(3.0), 7.0);

        curve.set_post_curve(OutsideCurveBehavior::Cycle);
        assert!((curve.sample(1.25) - 5.5).abs() < 1e-9);

        curve.set_post_curve(OutsideCurveBehavior::CycleWithOffset);
        assert!((curve.sample(1.25) - 7.5).abs() < 1e-9);

        curve.set_pre_curve(OutsideCurveBehavior::Oscillate);
        assert!((curve.sample(-0.25) - 5.5).abs() < 1e-9);
    }

    #[test]
    fn serialization_keeps_key_sequence() {
        let mut curve = two_keys(Interpolation::Spline);
        curve.upsert(0.5, KeyDefinition::new(9.0, Interpolation::Constant));
        curve.set_post_curve(OutsideCurveBehavior::Oscillate);

        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(json["Keys"].as_array().unwrap().len(), 3);
        assert_eq!(json["Keys"][1]["Time"], 0.5);
        assert_eq!(json["Keys"][1]["InType"], "Constant");
        assert_eq!(json["PostCurve"], "Oscillate");

        let parsed: Curve = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, curve);
        assert_eq!(parsed.revision(), 0);
    }

    #[test]
    fn edits_bump_revision() {
        let mut curve = two_keys(Interpolation::Linear);
        let start = curve.revision();
        assert!(curve.remove_key(0.5).is_none());
        assert_eq!(curve.revision(), start);

        curve.remove_key(1.0);
        curve.set_post_curve(OutsideCurveBehavior::Cycle);
        assert_eq!(curve.revision(), start + 2);
    }
}
