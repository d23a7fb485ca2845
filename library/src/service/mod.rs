pub mod handlers;

use std::path::Path;

use log::{info, warn};
use uuid::Uuid;

use crate::animator::RebindReport;
use crate::document::{Document, SharedDocument};
use crate::error::LibraryError;
use crate::graph::{EvaluationContext, Instance, OperatorRegistry, Slot, SlotValue};
use handlers::AnimationHandler;
use handlers::lock_helpers::{with_document_read, with_document_write};

/// Owns a document together with its live graph and the current time.
///
/// The graph is single threaded; the document behind it may be shared with
/// other readers through [`DocumentService::document`].
pub struct DocumentService {
    document: SharedDocument,
    registry: OperatorRegistry,
    root: Instance,
    context: EvaluationContext,
    last_report: RebindReport,
}

impl DocumentService {
    pub fn from_path(
        path: impl AsRef<Path>,
        registry: OperatorRegistry,
    ) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        info!("Loading document {}", path.display());
        let document = Document::load_from_file(path)?;
        Self::from_document(document, registry)
    }

    pub fn from_document(
        document: Document,
        registry: OperatorRegistry,
    ) -> Result<Self, LibraryError> {
        let (root, report) = document.instantiate(&registry)?;
        if !report.is_clean() {
            warn!(
                "Document '{}' has {} corrupt and {} unsupported animation group(s)",
                document.name,
                report.corrupt.len(),
                report.unsupported.len()
            );
        }
        Ok(Self {
            document: document.into_shared(),
            registry,
            root,
            context: EvaluationContext::default(),
            last_report: report,
        })
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn root(&self) -> &Instance {
        &self.root
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Outcome of the most recent rebind.
    pub fn last_report(&self) -> &RebindReport {
        &self.last_report
    }

    /// Moves the evaluation time. Counts as a new frame.
    pub fn seek(&mut self, time: f64) {
        self.context.advance_to(time);
    }

    /// Pulls an output of a child instance at the current time.
    pub fn evaluate(&self, instance_id: Uuid, output_id: Uuid) -> Result<SlotValue, LibraryError> {
        let output = self
            .child(instance_id)?
            .output(output_id)
            .ok_or(LibraryError::UnknownSlot {
                instance_id,
                slot_id: output_id,
            })?;
        Ok(output.get_value(&self.context))
    }

    /// Pulls an input of a child instance at the current time.
    pub fn evaluate_input(
        &self,
        instance_id: Uuid,
        input_id: Uuid,
    ) -> Result<SlotValue, LibraryError> {
        let input = self.input(instance_id, input_id)?;
        Ok(input.get_value(&self.context))
    }

    pub fn set_input_value(
        &self,
        instance_id: Uuid,
        input_id: Uuid,
        value: SlotValue,
    ) -> Result<(), LibraryError> {
        self.input(instance_id, input_id)?.set_input_value(value)
    }

    /// Animates an input starting from its value at the current time.
    pub fn animate_input(&self, instance_id: Uuid, input_id: Uuid) -> Result<(), LibraryError> {
        let input = self.input(instance_id, input_id)?;
        AnimationHandler::create_binding(&self.document, input, &self.context)
    }

    pub fn remove_animation(&self, instance_id: Uuid, input_id: Uuid) -> Result<usize, LibraryError> {
        let input = self.input(instance_id, input_id)?;
        AnimationHandler::remove_binding(&self.document, input)
    }

    /// Rebuilds the live graph from the document, keeping the current time.
    ///
    /// Static input values of the old graph are written back first so that
    /// no edit is lost.
    pub fn reload(&mut self) -> Result<&RebindReport, LibraryError> {
        let current = &self.root;
        let (root, report) = with_document_write(&self.document, |doc| {
            doc.store_input_values(current);
            doc.instantiate(&self.registry)
        })?;
        self.root = root;
        self.last_report = report;
        Ok(&self.last_report)
    }

    pub fn save(&self) -> Result<String, LibraryError> {
        with_document_write(&self.document, |doc| {
            doc.store_input_values(&self.root);
            doc.save()
        })
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let json = self.save()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn document_name(&self) -> Result<String, LibraryError> {
        with_document_read(&self.document, |doc| Ok(doc.name.clone()))
    }

    fn child(&self, instance_id: Uuid) -> Result<&Instance, LibraryError> {
        self.root
            .child(instance_id)
            .ok_or(LibraryError::UnknownInstance(instance_id))
    }

    fn input(&self, instance_id: Uuid, input_id: Uuid) -> Result<&Slot, LibraryError> {
        self.child(instance_id)?
            .input(input_id)
            .map(|slot| slot.as_ref())
            .ok_or(LibraryError::UnknownSlot {
                instance_id,
                slot_id: input_id,
            })
    }
}
