//! Dirty-flag bookkeeping for slots.
//!
//! A slot is dirty for a given evaluation when any of these holds:
//!
//! - **VALUE_CHANGED**: one-shot. Set when the slot's own input value, its
//!   connection or its update action changed, or when an upstream dependency
//!   produced a new value. Consumed by the next recompute.
//! - **ANIMATED**: sticky. The slot's value is a function of time, so it is
//!   recomputed once per distinct query time and kept until unbound.
//! - **ALWAYS**: sticky. Recomputed on every pull.

use bitflags::bitflags;
use ordered_float::OrderedFloat;

use super::context::EvaluationContext;

bitflags! {
    /// Reasons a slot needs recomputation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyTrigger: u8 {
        const VALUE_CHANGED = 1 << 0;
        const ANIMATED = 1 << 1;
        const ALWAYS = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirtyFlag {
    /// Sticky triggers (ANIMATED, ALWAYS).
    trigger: DirtyTrigger,
    /// One-shot reasons waiting to be consumed.
    pending: DirtyTrigger,
    last_evaluated_time: Option<OrderedFloat<f64>>,
}

impl Default for DirtyFlag {
    fn default() -> Self {
        // A fresh slot has never been computed.
        Self {
            trigger: DirtyTrigger::empty(),
            pending: DirtyTrigger::VALUE_CHANGED,
            last_evaluated_time: None,
        }
    }
}

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> DirtyTrigger {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: DirtyTrigger) {
        self.trigger = trigger - DirtyTrigger::VALUE_CHANGED;
    }

    pub fn add_trigger(&mut self, trigger: DirtyTrigger) {
        self.set_trigger(self.trigger | trigger);
    }

    pub fn remove_trigger(&mut self, trigger: DirtyTrigger) {
        self.trigger.remove(trigger);
    }

    pub fn invalidate(&mut self) {
        self.pending.insert(DirtyTrigger::VALUE_CHANGED);
    }

    /// Everything that makes the slot dirty for an evaluation at `context.time`.
    pub fn reasons(&self, context: &EvaluationContext) -> DirtyTrigger {
        let mut reasons = self.pending;
        if self.trigger.contains(DirtyTrigger::ALWAYS) {
            reasons |= DirtyTrigger::ALWAYS;
        }
        if self.trigger.contains(DirtyTrigger::ANIMATED)
            && self.last_evaluated_time != Some(OrderedFloat(context.time))
        {
            reasons |= DirtyTrigger::ANIMATED;
        }
        reasons
    }

    pub fn is_dirty(&self, context: &EvaluationContext) -> bool {
        !self.reasons(context).is_empty()
    }

    /// Consumes the one-shot reasons after a recompute at `context.time`.
    pub fn clear(&mut self, context: &EvaluationContext) {
        self.pending = DirtyTrigger::empty();
        self.last_evaluated_time = Some(OrderedFloat(context.time));
    }
}
