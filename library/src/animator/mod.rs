//! Curve binding registry.
//!
//! The animator maps `(instance id, input id, component index)` to a curve.
//! It never stores slot references: the only thing that survives a document
//! save/load cycle is the id pair, so bindings are re-attached to freshly
//! built instances by [`Animator::rebind`].

mod resolver;
mod serialization;

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use log::{debug, error};
use uuid::Uuid;

use crate::animation::{Curve, SharedCurve};
use crate::error::LibraryError;
use crate::graph::{EvaluationContext, Slot};

pub use resolver::RebindReport;
pub use serialization::AnimatorEntry;

/// Identity of one animated component of one input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurveBindingKey {
    pub instance_id: Uuid,
    pub slot_id: Uuid,
    /// 0 for scalar inputs; X, Y, Z, W = 0..3 for vector inputs.
    pub index: usize,
}

impl CurveBindingKey {
    pub fn new(instance_id: Uuid, slot_id: Uuid, index: usize) -> Self {
        Self {
            instance_id,
            slot_id,
            index,
        }
    }

    pub fn for_slot(slot: &Slot, index: usize) -> Self {
        Self::new(slot.parent_id(), slot.id(), index)
    }

    fn matches(&self, instance_id: Uuid, slot_id: Uuid) -> bool {
        self.instance_id == instance_id && self.slot_id == slot_id
    }
}

#[derive(Debug, Default)]
pub struct Animator {
    curves: IndexMap<CurveBindingKey, SharedCurve>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Keys in registry order.
    pub fn keys(&self) -> impl Iterator<Item = &CurveBindingKey> {
        self.curves.keys()
    }

    /// Distinct `(instance id, input id)` pairs in registry order.
    pub fn bound_inputs(&self) -> Vec<(Uuid, Uuid)> {
        let pairs: IndexSet<(Uuid, Uuid)> = self
            .curves
            .keys()
            .map(|key| (key.instance_id, key.slot_id))
            .collect();
        pairs.into_iter().collect()
    }

    pub fn curve(&self, key: &CurveBindingKey) -> Option<SharedCurve> {
        self.curves.get(key).cloned()
    }

    /// Registers a curve under `key`, returning the one it replaced.
    pub fn insert(&mut self, key: CurveBindingKey, curve: SharedCurve) -> Option<SharedCurve> {
        self.curves.insert(key, curve)
    }

    /// Starts animating `slot`.
    ///
    /// Creates one curve per component, each seeded with a single key at
    /// `context.time` holding the slot's current value, so the animation starts
    /// where the input already was. Fails without side effects when the slot is
    /// an output, is already animated or its type cannot be sampled.
    pub fn create_binding(
        &mut self,
        slot: &Slot,
        context: &EvaluationContext,
    ) -> Result<(), LibraryError> {
        if !slot.is_input() {
            return Err(LibraryError::InvalidArgument(format!(
                "slot {} of instance {} is an output; only inputs can be animated",
                slot.id(),
                slot.parent_id()
            )));
        }
        if self.is_bound(slot) {
            return Err(LibraryError::AlreadyAnimated {
                instance_id: slot.parent_id(),
                slot_id: slot.id(),
            });
        }

        let current = slot.get_value(context);
        let Some(count) = current.component_count() else {
            error!(
                "Could not create animation for slot {}: {} values cannot be animated",
                slot.id(),
                current.type_name()
            );
            return Err(LibraryError::UnsupportedType {
                slot_id: slot.id(),
                type_name: current.type_name().to_string(),
            });
        };

        let curves: Vec<SharedCurve> = current
            .components()
            .into_iter()
            .map(|component| Curve::with_key(context.time, component).into_shared())
            .collect();
        slot.bind_curves(curves.clone())?;

        for (index, curve) in curves.into_iter().enumerate() {
            self.curves
                .insert(CurveBindingKey::for_slot(slot, index), curve);
        }
        debug!(
            "Animated slot {} of instance {} with {} curve(s) at t={}",
            slot.id(),
            slot.parent_id(),
            count,
            context.time
        );
        Ok(())
    }

    /// Stops animating `slot` and drops all of its component curves.
    ///
    /// Returns the number of curves removed.
    pub fn remove_binding(&mut self, slot: &Slot) -> usize {
        slot.unbind_curves();
        self.remove_curves(slot.parent_id(), slot.id())
    }

    fn remove_curves(&mut self, instance_id: Uuid, slot_id: Uuid) -> usize {
        let keys: Vec<CurveBindingKey> = self
            .curves
            .keys()
            .filter(|key| key.matches(instance_id, slot_id))
            .copied()
            .collect();
        for key in &keys {
            self.curves.shift_remove(key);
        }
        keys.len()
    }

    /// Drops every curve bound to inputs of `instance_id`.
    pub fn remove_instance(&mut self, instance_id: Uuid) -> usize {
        let before = self.curves.len();
        self.curves.retain(|key, _| key.instance_id != instance_id);
        before - self.curves.len()
    }

    pub fn is_bound(&self, slot: &Slot) -> bool {
        self.is_bound_by_id(slot.parent_id(), slot.id())
    }

    pub fn is_bound_by_id(&self, instance_id: Uuid, slot_id: Uuid) -> bool {
        self.curves
            .keys()
            .any(|key| key.matches(instance_id, slot_id))
    }

    /// Curves of `slot` ordered by component index.
    ///
    /// Edits made through the returned handles reach a bound slot on its next
    /// pull, since the slot tracks each curve's revision.
    pub fn curves_for(&self, slot: &Slot) -> Vec<SharedCurve> {
        self.curves_for_id(slot.parent_id(), slot.id())
    }

    pub fn curves_for_id(&self, instance_id: Uuid, slot_id: Uuid) -> Vec<SharedCurve> {
        let mut matches: Vec<(usize, SharedCurve)> = self
            .curves
            .iter()
            .filter(|(key, _)| key.matches(instance_id, slot_id))
            .map(|(key, curve)| (key.index, Arc::clone(curve)))
            .collect();
        matches.sort_by_key(|(index, _)| *index);
        matches.into_iter().map(|(_, curve)| curve).collect()
    }
}

impl PartialEq for Animator {
    /// Same keys in the same order with equal curve contents.
    fn eq(&self, other: &Self) -> bool {
        self.curves.len() == other.curves.len()
            && self
                .curves
                .iter()
                .zip(other.curves.iter())
                .all(|((key_a, curve_a), (key_b, curve_b))| {
                    key_a == key_b && curves_equal(curve_a, curve_b)
                })
    }
}

fn curves_equal(a: &SharedCurve, b: &SharedCurve) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    match (a.read(), b.read()) {
        (Ok(a), Ok(b)) => *a == *b,
        _ => false,
    }
}
