use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::{Animator, CurveBindingKey};
use crate::animation::Curve;
use crate::error::LibraryError;

/// One persisted binding: `{InstanceId, InputId, Index?, Curve}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AnimatorEntry {
    pub instance_id: Uuid,
    pub input_id: Uuid,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub index: usize,
    pub curve: Curve,
}

fn is_zero(index: &usize) -> bool {
    *index == 0
}

impl AnimatorEntry {
    pub fn key(&self) -> CurveBindingKey {
        CurveBindingKey::new(self.instance_id, self.input_id, self.index)
    }
}

impl Animator {
    /// Entries in registry order.
    pub fn to_entries(&self) -> Vec<AnimatorEntry> {
        self.curves
            .iter()
            .map(|(key, curve)| AnimatorEntry {
                instance_id: key.instance_id,
                input_id: key.slot_id,
                index: key.index,
                curve: match curve.read() {
                    Ok(curve) => curve.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                },
            })
            .collect()
    }

    /// Adds entries to the registry. Later entries replace earlier ones with the same key.
    ///
    /// Groups are not validated here; an incomplete vector group is only
    /// rejected when [`Animator::rebind`] tries to attach it.
    pub fn extend_entries(&mut self, entries: impl IntoIterator<Item = AnimatorEntry>) {
        for entry in entries {
            let key = entry.key();
            if self
                .curves
                .insert(key, entry.curve.into_shared())
                .is_some()
            {
                warn!(
                    "Duplicate animation entry for input {} of instance {} (index {})",
                    key.slot_id, key.instance_id, key.index
                );
            }
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = AnimatorEntry>) -> Self {
        let mut animator = Self::new();
        animator.extend_entries(entries);
        animator
    }

    /// Writes the `Animator` array.
    pub fn write(&self) -> Result<serde_json::Value, LibraryError> {
        Ok(serde_json::to_value(self.to_entries())?)
    }

    /// Reads an `Animator` array into this registry.
    pub fn read(&mut self, token: &serde_json::Value) -> Result<usize, LibraryError> {
        let entries: Vec<AnimatorEntry> = Vec::deserialize(token)?;
        let count = entries.len();
        self.extend_entries(entries);
        Ok(count)
    }
}

impl Serialize for Animator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_entries())
    }
}

impl<'de> Deserialize<'de> for Animator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<AnimatorEntry>::deserialize(deserializer)?;
        Ok(Animator::from_entries(entries))
    }
}

impl Clone for Animator {
    /// Deep copy: the clone does not share curves with the original.
    fn clone(&self) -> Self {
        Animator::from_entries(self.to_entries())
    }
}
