//! Persisted composition: child operators, connections, animation and layers.
//!
//! A document is plain data. [`Document::instantiate`] turns it into a live
//! [`Instance`] tree and re-attaches the stored animation by id.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animator::{Animator, RebindReport};
use crate::error::LibraryError;
use crate::graph::{Instance, OperatorRegistry, SlotValue};
use crate::timeline::{Clip, Layer};

/// Documents are shared with presentation layers behind a lock.
pub type SharedDocument = Arc<RwLock<Document>>;

/// A child operator occurrence as stored on disk.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ChildRecord {
    pub id: Uuid,
    pub operator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Static input values by input id.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input_values: IndexMap<Uuid, SlotValue>,
}

impl ChildRecord {
    pub fn new(operator_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            operator_id: operator_id.to_string(),
            name: None,
            input_values: IndexMap::new(),
        }
    }
}

/// Output slot of one child feeding an input slot of another.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    pub source_instance_id: Uuid,
    pub source_slot_id: Uuid,
    pub target_instance_id: Uuid,
    pub target_slot_id: Uuid,
}

impl Connection {
    pub fn new(
        source_instance_id: Uuid,
        source_slot_id: Uuid,
        target_instance_id: Uuid,
        target_slot_id: Uuid,
    ) -> Self {
        Self {
            source_instance_id,
            source_slot_id,
            target_instance_id,
            target_slot_id,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children: Vec<ChildRecord>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Animator::is_empty")]
    pub animator: Animator,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Document {
    /// An empty document.
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            children: Vec::new(),
            connections: Vec::new(),
            animator: Animator::new(),
            layers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    pub fn load(json_str: &str) -> Result<Self, LibraryError> {
        let document: Document = serde_json::from_str(json_str)?;
        Ok(document)
    }

    pub fn save(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let json_str = fs::read_to_string(path)?;
        Self::load(&json_str)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        fs::write(path, self.save()?)?;
        Ok(())
    }

    pub fn add_child(&mut self, record: ChildRecord) -> Uuid {
        let id = record.id;
        self.children.push(record);
        id
    }

    pub fn get_child(&self, id: Uuid) -> Option<&ChildRecord> {
        self.children.iter().find(|child| child.id == id)
    }

    pub fn get_child_mut(&mut self, id: Uuid) -> Option<&mut ChildRecord> {
        self.children.iter_mut().find(|child| child.id == id)
    }

    /// Removes a child and its connections. Its animation entries stay in the
    /// animator so that re-adding a child with the same id restores them.
    pub fn remove_child(&mut self, id: Uuid) -> Option<ChildRecord> {
        let pos = self.children.iter().position(|child| child.id == id)?;
        self.connections.retain(|connection| {
            connection.source_instance_id != id && connection.target_instance_id != id
        });
        Some(self.children.remove(pos))
    }

    pub fn add_connection(&mut self, connection: Connection) {
        // An input has at most one upstream.
        self.connections.retain(|existing| {
            existing.target_instance_id != connection.target_instance_id
                || existing.target_slot_id != connection.target_slot_id
        });
        self.connections.push(connection);
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn all_clips(&self) -> impl Iterator<Item = &Clip> {
        self.layers.iter().flat_map(|layer| layer.clips.iter())
    }

    /// Builds the live graph and re-attaches stored animation.
    ///
    /// Unknown operators abort instantiation. Bad input values and dangling
    /// connections are skipped with a warning; binding problems are returned
    /// in the report.
    pub fn instantiate(
        &self,
        registry: &OperatorRegistry,
    ) -> Result<(Instance, RebindReport), LibraryError> {
        let mut root = Instance::composition(self.id);

        for record in &self.children {
            let mut child = registry.instantiate(&record.operator_id, record.id)?;
            child.set_name(record.name.clone());
            for (slot_id, value) in &record.input_values {
                match child.input(*slot_id) {
                    Some(input) => {
                        if let Err(err) = input.set_input_value(value.clone()) {
                            warn!("Ignoring stored value of {}.{}: {}", record.id, slot_id, err);
                        }
                    }
                    None => warn!("Ignoring value for unknown input {}.{}", record.id, slot_id),
                }
            }
            root.add_child(child);
        }

        for connection in &self.connections {
            if let Err(err) = Self::connect(&root, connection) {
                warn!("Skipping connection {:?}: {}", connection, err);
            }
        }

        let report = self.animator.rebind(&root);
        info!(
            "Instantiated document '{}' with {} children",
            self.name,
            root.children().len()
        );
        Ok((root, report))
    }

    fn connect(root: &Instance, connection: &Connection) -> Result<(), LibraryError> {
        let source = root
            .child(connection.source_instance_id)
            .ok_or(LibraryError::UnknownInstance(connection.source_instance_id))?
            .output(connection.source_slot_id)
            .ok_or(LibraryError::UnknownSlot {
                instance_id: connection.source_instance_id,
                slot_id: connection.source_slot_id,
            })?;
        let target = root
            .child(connection.target_instance_id)
            .ok_or(LibraryError::UnknownInstance(connection.target_instance_id))?
            .input(connection.target_slot_id)
            .ok_or(LibraryError::UnknownSlot {
                instance_id: connection.target_instance_id,
                slot_id: connection.target_slot_id,
            })?;
        target.connect(source)
    }

    /// Copies the static input values of a live graph back into the child records.
    ///
    /// Connected inputs are skipped. Animated inputs keep their static value,
    /// which applies again once the animation is removed.
    pub fn store_input_values(&mut self, root: &Instance) {
        for child in root.children() {
            let Some(record) = self.get_child_mut(child.id()) else {
                continue;
            };
            for input in child.inputs() {
                if input.is_connected() {
                    continue;
                }
                record.input_values.insert(input.id(), input.input_value());
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
