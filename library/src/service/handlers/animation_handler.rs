use log::debug;

use super::lock_helpers::{with_document_read, with_document_write};
use crate::animation::{Interpolation, KeyDefinition, SharedCurve};
use crate::animator::RebindReport;
use crate::document::{Document, SharedDocument};
use crate::error::LibraryError;
use crate::graph::{EvaluationContext, Instance, Slot, SlotValue};

/// Editing entry points for curve bindings on a shared document.
///
/// Every registry mutation holds the document's write lock for its whole
/// duration; queries take the read lock.
pub struct AnimationHandler;

impl AnimationHandler {
    pub fn create_binding(
        document: &SharedDocument,
        slot: &Slot,
        context: &EvaluationContext,
    ) -> Result<(), LibraryError> {
        with_document_write(document, |doc| doc.animator.create_binding(slot, context))
    }

    /// Returns the number of component curves dropped.
    pub fn remove_binding(document: &SharedDocument, slot: &Slot) -> Result<usize, LibraryError> {
        with_document_write(document, |doc| Ok(doc.animator.remove_binding(slot)))
    }

    /// Animates `slot` if it is static, otherwise removes its animation.
    /// Returns whether the slot is animated afterwards.
    pub fn toggle_binding(
        document: &SharedDocument,
        slot: &Slot,
        context: &EvaluationContext,
    ) -> Result<bool, LibraryError> {
        with_document_write(document, |doc| {
            if doc.animator.is_bound(slot) {
                doc.animator.remove_binding(slot);
                Ok(false)
            } else {
                doc.animator.create_binding(slot, context)?;
                Ok(true)
            }
        })
    }

    pub fn is_bound(document: &SharedDocument, slot: &Slot) -> Result<bool, LibraryError> {
        with_document_read(document, |doc| Ok(doc.animator.is_bound(slot)))
    }

    pub fn curves_for(
        document: &SharedDocument,
        slot: &Slot,
    ) -> Result<Vec<SharedCurve>, LibraryError> {
        with_document_read(document, |doc| Ok(doc.animator.curves_for(slot)))
    }

    /// Writes `value` as a key at `time`, one key per component curve.
    ///
    /// An existing key at exactly `time` is replaced. All components are
    /// written under one document write lock, so readers never see a
    /// partially keyed vector.
    pub fn add_keyframe(
        document: &SharedDocument,
        slot: &Slot,
        time: f64,
        value: &SlotValue,
        interpolation: Interpolation,
    ) -> Result<(), LibraryError> {
        with_document_write(document, |doc| {
            let curves = Self::bound_curves(doc, slot)?;
            if !value.same_type(&slot.value()) {
                return Err(LibraryError::InvalidArgument(format!(
                    "slot {} expects a {} value, got {}",
                    slot.id(),
                    slot.value().type_name(),
                    value.type_name()
                )));
            }

            for (curve, component) in curves.iter().zip(value.components()) {
                let mut curve = curve.write().map_err(|_| LibraryError::LockPoisoned)?;
                curve.upsert(time, KeyDefinition::new(component, interpolation));
            }
            debug!("Keyed slot {} at t={}", slot.id(), time);
            Ok(())
        })
    }

    /// Removes the keys at exactly `time` from every component curve.
    /// Returns how many were removed.
    pub fn remove_keyframe(
        document: &SharedDocument,
        slot: &Slot,
        time: f64,
    ) -> Result<usize, LibraryError> {
        with_document_write(document, |doc| {
            let curves = Self::bound_curves(doc, slot)?;
            let mut removed = 0;
            for curve in &curves {
                let mut curve = curve.write().map_err(|_| LibraryError::LockPoisoned)?;
                if curve.remove_key(time).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    /// Re-attaches the document's curves to the children of `root`.
    pub fn rebind(document: &SharedDocument, root: &Instance) -> Result<RebindReport, LibraryError> {
        with_document_write(document, |doc| Ok(doc.animator.rebind(root)))
    }

    /// Merges a serialized `Animator` array into the document's registry.
    pub fn read_animator(
        document: &SharedDocument,
        token: &serde_json::Value,
    ) -> Result<usize, LibraryError> {
        with_document_write(document, |doc| doc.animator.read(token))
    }

    pub fn write_animator(document: &SharedDocument) -> Result<serde_json::Value, LibraryError> {
        with_document_read(document, |doc| doc.animator.write())
    }

    fn bound_curves(doc: &Document, slot: &Slot) -> Result<Vec<SharedCurve>, LibraryError> {
        let curves = doc.animator.curves_for(slot);
        if curves.is_empty() {
            return Err(LibraryError::NotAnimated {
                instance_id: slot.parent_id(),
                slot_id: slot.id(),
            });
        }
        Ok(curves)
    }
}
