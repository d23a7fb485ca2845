//! Operators and setup shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use curvegraph::document::{ChildRecord, Document};
use curvegraph::graph::{InstanceBuilder, Operator, OperatorRegistry, SlotValue, Vec4};
use uuid::Uuid;

pub const VALUE_INPUT: Uuid = Uuid::from_u128(0x5f1c0a52_8a43_4c27_a1f5_3f9e7e3a0001);
pub const VALUE_OUTPUT: Uuid = Uuid::from_u128(0x5f1c0a52_8a43_4c27_a1f5_3f9e7e3a0002);
pub const COLOR_INPUT: Uuid = Uuid::from_u128(0x5f1c0a52_8a43_4c27_a1f5_3f9e7e3a0003);
pub const COLOR_OUTPUT: Uuid = Uuid::from_u128(0x5f1c0a52_8a43_4c27_a1f5_3f9e7e3a0004);
pub const LABEL_INPUT: Uuid = Uuid::from_u128(0x5f1c0a52_8a43_4c27_a1f5_3f9e7e3a0005);

pub const VALUE_OP: &str = "test.value";
pub const INVERT_OP: &str = "test.invert";
pub const COLOR_OP: &str = "test.color";
pub const LABEL_OP: &str = "test.label";

/// Passes a float through unchanged.
pub struct ValueOperator;

impl Operator for ValueOperator {
    fn id(&self) -> &'static str {
        VALUE_OP
    }

    fn name(&self) -> String {
        "Value".to_string()
    }

    fn build(&self, builder: &mut InstanceBuilder) {
        let input = builder.input(VALUE_INPUT, SlotValue::from(0.0));
        builder.output(VALUE_OUTPUT, SlotValue::from(0.0), move |ctx, value| {
            *value = input.get_value(ctx);
        });
    }
}

/// Negates a float and counts how often it had to recompute.
pub struct InvertOperator {
    pub calls: Arc<AtomicUsize>,
}

impl Operator for InvertOperator {
    fn id(&self) -> &'static str {
        INVERT_OP
    }

    fn name(&self) -> String {
        "Invert".to_string()
    }

    fn build(&self, builder: &mut InstanceBuilder) {
        let input = builder.input(VALUE_INPUT, SlotValue::from(0.0));
        let calls = Arc::clone(&self.calls);
        builder.output(VALUE_OUTPUT, SlotValue::from(0.0), move |ctx, value| {
            calls.fetch_add(1, Ordering::SeqCst);
            let x = input.get_value(ctx).get_as::<f64>().unwrap_or(0.0);
            *value = SlotValue::from(-x);
        });
    }
}

/// Passes a four component color through.
pub struct ColorOperator;

impl Operator for ColorOperator {
    fn id(&self) -> &'static str {
        COLOR_OP
    }

    fn name(&self) -> String {
        "Color".to_string()
    }

    fn build(&self, builder: &mut InstanceBuilder) {
        let input = builder.input(COLOR_INPUT, SlotValue::from(Vec4::new(1.0, 2.0, 3.0, 4.0)));
        builder.output(COLOR_OUTPUT, SlotValue::from(Vec4::default()), move |ctx, value| {
            *value = input.get_value(ctx);
        });
    }
}

/// Has only a string input, which cannot be animated.
pub struct LabelOperator;

impl Operator for LabelOperator {
    fn id(&self) -> &'static str {
        LABEL_OP
    }

    fn name(&self) -> String {
        "Label".to_string()
    }

    fn build(&self, builder: &mut InstanceBuilder) {
        builder.input(LABEL_INPUT, SlotValue::from("title"));
    }
}

/// Helper: registry with every test operator; returns the invert call counter.
pub fn setup_registry() -> (OperatorRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = OperatorRegistry::new();
    registry.register(Arc::new(ValueOperator));
    registry.register(Arc::new(InvertOperator {
        calls: Arc::clone(&calls),
    }));
    registry.register(Arc::new(ColorOperator));
    registry.register(Arc::new(LabelOperator));
    (registry, calls)
}

/// Helper: document with one child of `operator_id`.
pub fn setup_document(operator_id: &str) -> (Document, Uuid) {
    let mut document = Document::new("Test Document");
    let child_id = document.add_child(ChildRecord::new(operator_id));
    (document, child_id)
}
