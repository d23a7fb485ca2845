//! Live graph: node instances, their slots and lazy pull-based evaluation.

pub mod context;
pub mod dirty;
pub mod instance;
pub mod operator;
pub mod slot;
pub mod value;

pub use context::EvaluationContext;
pub use dirty::{DirtyFlag, DirtyTrigger};
pub use instance::{COMPOSITION_OPERATOR_ID, Instance, InstanceBuilder, InstanceId};
pub use operator::{Operator, OperatorRegistry};
pub use slot::{Slot, SlotDirection, SlotId, UpdateAction};
pub use value::{SlotValue, TryGetValue, Vec2, Vec3, Vec4};
