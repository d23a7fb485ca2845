use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::instance::{Instance, InstanceBuilder, InstanceId};
use crate::error::LibraryError;

/// An operator type that can be instantiated into the graph.
///
/// Implementations declare their slots on the builder with stable slot ids, so
/// that documents and animation bindings can refer to them across sessions.
pub trait Operator: Send + Sync {
    /// Stable type id, e.g. "math.invert".
    fn id(&self) -> &'static str;

    fn name(&self) -> String;

    fn build(&self, builder: &mut InstanceBuilder);
}

#[derive(Default, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator: Arc<dyn Operator>) {
        debug!("Registering operator {}", operator.id());
        self.operators.insert(operator.id().to_string(), operator);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Operator>> {
        self.operators.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.operators.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Builds a fresh instance of `operator_id` carrying `instance_id`.
    pub fn instantiate(
        &self,
        operator_id: &str,
        instance_id: InstanceId,
    ) -> Result<Instance, LibraryError> {
        let operator = self
            .get(operator_id)
            .ok_or_else(|| LibraryError::UnknownOperator(operator_id.to_string()))?;
        let mut builder = InstanceBuilder::new(instance_id, operator_id);
        operator.build(&mut builder);
        Ok(builder.build())
    }
}
