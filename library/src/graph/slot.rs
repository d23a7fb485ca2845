use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use log::{debug, error, warn};
use uuid::Uuid;

use super::context::EvaluationContext;
use super::dirty::{DirtyFlag, DirtyTrigger};
use super::value::SlotValue;
use crate::animation::{SharedCurve, revision_shared, sample_shared};
use crate::error::LibraryError;

pub type SlotId = Uuid;

/// Recompute closure: receives the context and the cached value to mutate.
pub type ComputeFn = dyn Fn(&EvaluationContext, &mut SlotValue);

/// The recompute hook of a slot. Exactly one is active at a time.
#[derive(Clone)]
pub enum UpdateAction {
    /// Copy from the upstream connection, or from the slot's own input value
    /// when unconnected. Default for inputs.
    PullInput,
    Compute(Rc<ComputeFn>),
}

impl UpdateAction {
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&EvaluationContext, &mut SlotValue) + 'static,
    {
        UpdateAction::Compute(Rc::new(f))
    }
}

impl fmt::Debug for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateAction::PullInput => write!(f, "PullInput"),
            UpdateAction::Compute(_) => write!(f, "Compute(..)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotDirection {
    Input,
    Output,
}

/// Upstream slot plus the version last consumed from it.
#[derive(Debug)]
struct Dependency {
    slot: Weak<Slot>,
    seen_version: u64,
}

impl Dependency {
    fn new(slot: &Rc<Slot>) -> Self {
        Self {
            slot: Rc::downgrade(slot),
            seen_version: slot.version(),
        }
    }

    /// Brings the upstream slot up to date; true when it produced a new value.
    fn refresh(&mut self, context: &EvaluationContext) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        slot.update(context);
        let version = slot.version();
        let changed = version != self.seen_version;
        self.seen_version = version;
        changed
    }
}

/// A typed, cache-holding endpoint of a node instance.
///
/// Evaluation is pull-based and single threaded: [`Slot::get_value`] recomputes
/// the cached value only when the dirty flag or an upstream version says so.
pub struct Slot {
    id: SlotId,
    parent_id: Uuid,
    direction: SlotDirection,
    value: RefCell<SlotValue>,
    /// The user-set value of an input; the initial value of an output.
    input_value: RefCell<SlotValue>,
    dirty: RefCell<DirtyFlag>,
    update_action: RefCell<UpdateAction>,
    default_action: UpdateAction,
    connection: RefCell<Option<Dependency>>,
    dependencies: RefCell<Vec<Dependency>>,
    /// Bound curves and the revision each had at the last recompute.
    curves: RefCell<Vec<(SharedCurve, u64)>>,
    /// Bumped whenever the cached value actually changes.
    version: Cell<u64>,
    evaluating: Cell<bool>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("direction", &self.direction)
            .field("value", &self.value.borrow())
            .field("trigger", &self.dirty.borrow().trigger())
            .field("update_action", &self.update_action.borrow())
            .finish()
    }
}

impl Slot {
    pub fn new_input(parent_id: Uuid, id: SlotId, default: SlotValue) -> Rc<Self> {
        Rc::new(Self::new(parent_id, id, SlotDirection::Input, default, UpdateAction::PullInput))
    }

    pub fn new_output(
        parent_id: Uuid,
        id: SlotId,
        default: SlotValue,
        action: UpdateAction,
    ) -> Rc<Self> {
        Rc::new(Self::new(parent_id, id, SlotDirection::Output, default, action))
    }

    fn new(
        parent_id: Uuid,
        id: SlotId,
        direction: SlotDirection,
        default: SlotValue,
        action: UpdateAction,
    ) -> Self {
        Self {
            id,
            parent_id,
            direction,
            value: RefCell::new(default.clone()),
            input_value: RefCell::new(default),
            dirty: RefCell::new(DirtyFlag::new()),
            update_action: RefCell::new(action.clone()),
            default_action: action,
            connection: RefCell::new(None),
            dependencies: RefCell::new(Vec::new()),
            curves: RefCell::new(Vec::new()),
            version: Cell::new(0),
            evaluating: Cell::new(false),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Id of the owning node instance.
    pub fn parent_id(&self) -> Uuid {
        self.parent_id
    }

    pub fn direction(&self) -> SlotDirection {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    /// The cached value, without evaluating.
    pub fn value(&self) -> SlotValue {
        self.value.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Returns the value for `context`, recomputing it first when dirty.
    pub fn get_value(&self, context: &EvaluationContext) -> SlotValue {
        self.update(context);
        self.value()
    }

    /// Recomputes the cached value if anything requires it.
    pub fn update(&self, context: &EvaluationContext) {
        if self.evaluating.get() {
            warn!(
                "Cycle detected at slot {} of instance {}; using cached value",
                self.id, self.parent_id
            );
            return;
        }
        self.evaluating.set(true);

        let action = self.update_action.borrow().clone();
        let mut reasons = self.dirty.borrow().reasons(context);

        if matches!(action, UpdateAction::PullInput) {
            if let Some(connection) = self.connection.borrow_mut().as_mut() {
                if connection.refresh(context) {
                    reasons |= DirtyTrigger::VALUE_CHANGED;
                }
            }
        }
        for dependency in self.dependencies.borrow_mut().iter_mut() {
            if dependency.refresh(context) {
                reasons |= DirtyTrigger::VALUE_CHANGED;
            }
        }
        for (curve, seen) in self.curves.borrow_mut().iter_mut() {
            let revision = revision_shared(curve);
            if revision != *seen {
                *seen = revision;
                reasons |= DirtyTrigger::VALUE_CHANGED;
            }
        }

        if !reasons.is_empty() {
            let mut value = self.value();
            match &action {
                UpdateAction::PullInput => value = self.pulled_value(),
                UpdateAction::Compute(compute) => compute(context, &mut value),
            }
            self.store(value);
            self.dirty.borrow_mut().clear(context);
        }

        self.evaluating.set(false);
    }

    fn pulled_value(&self) -> SlotValue {
        let upstream = self
            .connection
            .borrow()
            .as_ref()
            .and_then(|connection| connection.slot.upgrade());
        match upstream {
            Some(slot) => slot.value(),
            None => self.input_value.borrow().clone(),
        }
    }

    fn store(&self, value: SlotValue) {
        let changed = *self.value.borrow() != value;
        if changed {
            *self.value.borrow_mut() = value;
            self.version.set(self.version.get() + 1);
        }
    }

    pub fn input_value(&self) -> SlotValue {
        self.input_value.borrow().clone()
    }

    /// Sets the static value used while the input is unconnected and not animated.
    pub fn set_input_value(&self, value: SlotValue) -> Result<(), LibraryError> {
        let current = self.input_value();
        if !current.same_type(&value) {
            return Err(LibraryError::InvalidArgument(format!(
                "slot {} expects a {} value, got {}",
                self.id,
                current.type_name(),
                value.type_name()
            )));
        }
        *self.input_value.borrow_mut() = value;
        self.invalidate();
        Ok(())
    }

    /// Connects this input to an upstream slot.
    pub fn connect(&self, upstream: &Rc<Slot>) -> Result<(), LibraryError> {
        if !self.is_input() {
            return Err(LibraryError::InvalidArgument(format!(
                "slot {} is an output and cannot be connected",
                self.id
            )));
        }
        *self.connection.borrow_mut() = Some(Dependency::new(upstream));
        self.invalidate();
        debug!(
            "Connected {}.{} -> {}.{}",
            upstream.parent_id, upstream.id, self.parent_id, self.id
        );
        Ok(())
    }

    pub fn disconnect(&self) {
        if self.connection.borrow_mut().take().is_some() {
            self.invalidate();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .borrow()
            .as_ref()
            .is_some_and(|connection| connection.slot.strong_count() > 0)
    }

    pub fn connected_slot(&self) -> Option<Rc<Slot>> {
        self.connection
            .borrow()
            .as_ref()
            .and_then(|connection| connection.slot.upgrade())
    }

    /// Declares that this slot's update action reads `slot`.
    pub fn add_dependency(&self, slot: &Rc<Slot>) {
        self.dependencies.borrow_mut().push(Dependency::new(slot));
        self.invalidate();
    }

    pub fn update_action(&self) -> UpdateAction {
        self.update_action.borrow().clone()
    }

    /// Replaces the active update action.
    pub fn set_update_action(&self, action: UpdateAction) {
        *self.update_action.borrow_mut() = action;
        self.invalidate();
    }

    pub fn set_update_action_back_to_default(&self) {
        self.set_update_action(self.default_action.clone());
    }

    pub fn has_default_update_action(&self) -> bool {
        match (&*self.update_action.borrow(), &self.default_action) {
            (UpdateAction::PullInput, UpdateAction::PullInput) => true,
            (UpdateAction::Compute(active), UpdateAction::Compute(default)) => {
                Rc::ptr_eq(active, default)
            }
            _ => false,
        }
    }

    pub fn trigger(&self) -> DirtyTrigger {
        self.dirty.borrow().trigger()
    }

    pub fn add_trigger(&self, trigger: DirtyTrigger) {
        self.dirty.borrow_mut().add_trigger(trigger);
    }

    pub fn remove_trigger(&self, trigger: DirtyTrigger) {
        self.dirty.borrow_mut().remove_trigger(trigger);
    }

    pub fn is_animated(&self) -> bool {
        self.trigger().contains(DirtyTrigger::ANIMATED)
    }

    /// True when the next pull at `context.time` will recompute, ignoring upstream.
    pub fn is_dirty(&self, context: &EvaluationContext) -> bool {
        self.dirty.borrow().is_dirty(context)
    }

    pub fn invalidate(&self) {
        self.dirty.borrow_mut().invalidate();
    }

    /// Number of curves this slot needs to be animated, if its type supports it.
    pub fn component_count(&self) -> Option<usize> {
        self.value.borrow().component_count()
    }

    /// Installs an update action sampling `curves` (one per component, in
    /// X, Y, Z, W order) at the evaluation time, and marks the slot animated.
    ///
    /// Only inputs can be animated. On error the slot is left untouched.
    pub fn bind_curves(&self, curves: Vec<SharedCurve>) -> Result<(), LibraryError> {
        if !self.is_input() {
            return Err(LibraryError::InvalidArgument(format!(
                "slot {} is an output and cannot be animated",
                self.id
            )));
        }
        let value = self.value();
        let Some(expected) = value.component_count() else {
            error!(
                "Cannot animate slot {} of instance {}: unsupported type {}",
                self.id,
                self.parent_id,
                value.type_name()
            );
            return Err(LibraryError::UnsupportedType {
                slot_id: self.id,
                type_name: value.type_name().to_string(),
            });
        };
        if curves.len() != expected {
            return Err(LibraryError::Corruption {
                instance_id: self.parent_id,
                slot_id: self.id,
                reason: format!("expected {} curves, found {}", expected, curves.len()),
            });
        }

        *self.curves.borrow_mut() = curves
            .iter()
            .map(|curve| (Arc::clone(curve), revision_shared(curve)))
            .collect();
        self.set_update_action(UpdateAction::compute(move |context, value| {
            for (index, curve) in curves.iter().enumerate() {
                value.set_component(index, sample_shared(curve, context.time));
            }
        }));
        self.add_trigger(DirtyTrigger::ANIMATED);
        Ok(())
    }

    /// Restores the default update action and drops the animated trigger.
    pub fn unbind_curves(&self) {
        self.curves.borrow_mut().clear();
        self.set_update_action_back_to_default();
        self.remove_trigger(DirtyTrigger::ANIMATED);
    }
}
