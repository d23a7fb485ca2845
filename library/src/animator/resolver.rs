use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::Animator;
use crate::animation::SharedCurve;
use crate::error::LibraryError;
use crate::graph::Instance;

/// Outcome of [`Animator::rebind`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RebindReport {
    /// `(instance id, input id)` pairs whose sampling action was installed.
    pub bound: Vec<(Uuid, Uuid)>,
    /// Groups whose curve count or indices do not match the input's components.
    pub corrupt: Vec<(Uuid, Uuid)>,
    /// Groups targeting an input whose type cannot be animated.
    pub unsupported: Vec<(Uuid, Uuid)>,
    /// Groups with no matching live input. Kept in the registry.
    pub unresolved: Vec<(Uuid, Uuid)>,
}

impl RebindReport {
    /// True when nothing had to be skipped because of bad data.
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.unsupported.is_empty()
    }
}

/// True when sorted `indices` are distinct, in range and fewer than `expected`:
/// a group still being written rather than bad data.
fn is_incomplete_group(indices: &[usize], expected: usize) -> bool {
    indices.len() < expected
        && indices.iter().all(|index| *index < expected)
        && indices.windows(2).all(|adjacent| adjacent[0] != adjacent[1])
}

impl Animator {
    /// Re-attaches stored curves to the direct children of `root`.
    ///
    /// Matches registry entries to live inputs by `(instance id, input id)`.
    /// A single curve becomes a scalar binding; several curves must form a
    /// complete group with indices `0..N` where N is the input's component
    /// count, otherwise the group is skipped and reported as corrupt. Entries
    /// whose instance or input does not exist are left alone so that a later
    /// instance with the same ids can still pick them up.
    pub fn rebind(&self, root: &Instance) -> RebindReport {
        let mut report = RebindReport::default();
        let groups = self.grouped();
        let mut resolved: HashSet<(Uuid, Uuid)> = HashSet::new();

        for child in root.children() {
            for input in child.inputs() {
                let pair = (child.id(), input.id());
                let Some(group) = groups.get(&pair) else {
                    continue;
                };
                resolved.insert(pair);

                let Some(expected) = input.component_count() else {
                    error!(
                        "Skipping animation of input {} on {}: {} values cannot be animated",
                        input.id(),
                        child.id(),
                        input.value().type_name()
                    );
                    report.unsupported.push(pair);
                    continue;
                };

                let mut entries = group.clone();
                entries.sort_by_key(|(index, _)| *index);
                let complete = entries.len() == expected
                    && entries
                        .iter()
                        .enumerate()
                        .all(|(position, (index, _))| position == *index);
                if !complete {
                    let indices: Vec<usize> = entries.iter().map(|(index, _)| *index).collect();
                    let err = LibraryError::Corruption {
                        instance_id: child.id(),
                        slot_id: input.id(),
                        reason: format!(
                            "expected component indices 0..{}, found {:?}",
                            expected, indices
                        ),
                    };
                    if is_incomplete_group(&indices, expected) {
                        warn!("{}", err);
                    } else {
                        error!("{}", err);
                    }
                    report.corrupt.push(pair);
                    continue;
                }

                let curves = entries.into_iter().map(|(_, curve)| curve).collect();
                match input.bind_curves(curves) {
                    Ok(()) => report.bound.push(pair),
                    Err(err) => {
                        error!("{}", err);
                        report.corrupt.push(pair);
                    }
                }
            }
        }

        for pair in groups.keys() {
            if !resolved.contains(pair) {
                debug!(
                    "Animation for input {} of instance {} left unresolved",
                    pair.1, pair.0
                );
                report.unresolved.push(*pair);
            }
        }

        info!(
            "Rebound {} animated input(s) under {} ({} corrupt, {} unsupported, {} unresolved)",
            report.bound.len(),
            root.id(),
            report.corrupt.len(),
            report.unsupported.len(),
            report.unresolved.len()
        );
        report
    }

    /// Registry entries grouped by `(instance id, input id)` in registry order.
    fn grouped(&self) -> IndexMap<(Uuid, Uuid), Vec<(usize, SharedCurve)>> {
        let mut groups: IndexMap<(Uuid, Uuid), Vec<(usize, SharedCurve)>> = IndexMap::new();
        for (key, curve) in &self.curves {
            groups
                .entry((key.instance_id, key.slot_id))
                .or_default()
                .push((key.index, Arc::clone(curve)));
        }
        groups
    }
}
