use std::rc::Rc;

use uuid::Uuid;

use super::context::EvaluationContext;
use super::slot::{Slot, SlotId, UpdateAction};
use super::value::SlotValue;

pub type InstanceId = Uuid;

/// Operator id used for the root instance that owns a document's children.
pub const COMPOSITION_OPERATOR_ID: &str = "composition";

/// A live operator occurrence in the graph.
///
/// Owns its slots and child instances. Nothing outside refers to it by
/// pointer; bindings and connections are resolved through ids.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    operator_id: String,
    name: Option<String>,
    inputs: Vec<Rc<Slot>>,
    outputs: Vec<Rc<Slot>>,
    children: Vec<Instance>,
}

impl Instance {
    /// An empty root instance holding children.
    pub fn composition(id: InstanceId) -> Self {
        Self {
            id,
            operator_id: COMPOSITION_OPERATOR_ID.to_string(),
            name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn operator_id(&self) -> &str {
        &self.operator_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn inputs(&self) -> &[Rc<Slot>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Rc<Slot>] {
        &self.outputs
    }

    pub fn input(&self, id: SlotId) -> Option<&Rc<Slot>> {
        self.inputs.iter().find(|slot| slot.id() == id)
    }

    pub fn output(&self, id: SlotId) -> Option<&Rc<Slot>> {
        self.outputs.iter().find(|slot| slot.id() == id)
    }

    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    pub fn child(&self, id: InstanceId) -> Option<&Instance> {
        self.children.iter().find(|child| child.id == id)
    }

    pub fn add_child(&mut self, child: Instance) {
        self.children.push(child);
    }

    /// Removes a child. Slots connected to its outputs fall back to their own values.
    pub fn remove_child(&mut self, id: InstanceId) -> Option<Instance> {
        let pos = self.children.iter().position(|child| child.id == id)?;
        let removed = self.children.remove(pos);
        for child in &self.children {
            for input in &child.inputs {
                let upstream_removed = input
                    .connected_slot()
                    .is_some_and(|upstream| upstream.parent_id() == id);
                if upstream_removed {
                    input.disconnect();
                }
            }
        }
        Some(removed)
    }
}

/// Collects slots for a new instance.
///
/// Outputs depend on every input declared before them.
pub struct InstanceBuilder {
    id: InstanceId,
    operator_id: String,
    inputs: Vec<Rc<Slot>>,
    outputs: Vec<Rc<Slot>>,
}

impl InstanceBuilder {
    pub fn new(id: InstanceId, operator_id: &str) -> Self {
        Self {
            id,
            operator_id: operator_id.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn input(&mut self, id: SlotId, default: SlotValue) -> Rc<Slot> {
        let slot = Slot::new_input(self.id, id, default);
        self.inputs.push(Rc::clone(&slot));
        slot
    }

    pub fn output<F>(&mut self, id: SlotId, default: SlotValue, compute: F) -> Rc<Slot>
    where
        F: Fn(&EvaluationContext, &mut SlotValue) + 'static,
    {
        let slot = Slot::new_output(self.id, id, default, UpdateAction::compute(compute));
        for input in &self.inputs {
            slot.add_dependency(input);
        }
        self.outputs.push(Rc::clone(&slot));
        slot
    }

    pub fn build(self) -> Instance {
        Instance {
            id: self.id,
            operator_id: self.operator_id,
            name: None,
            inputs: self.inputs,
            outputs: self.outputs,
            children: Vec::new(),
        }
    }
}
