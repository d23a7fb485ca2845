//! Integration tests for the animation handler and the document service.
//!
//! Verifies the editing flow: open → animate → key → save → reload.

mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use curvegraph::LibraryError;
use curvegraph::animation::Interpolation;
use curvegraph::graph::{EvaluationContext, SlotValue, Vec4};
use curvegraph::service::DocumentService;
use curvegraph::service::handlers::AnimationHandler;

use common::*;

/// Helper: service over a document holding one child of `operator_id`.
fn setup_service(operator_id: &str) -> (DocumentService, uuid::Uuid) {
    let (document, child_id) = setup_document(operator_id);
    let (registry, _) = setup_registry();
    let service = DocumentService::from_document(document, registry).unwrap();
    (service, child_id)
}

#[test]
fn test_add_keyframe_requires_binding() {
    let (service, child_id) = setup_service(VALUE_OP);
    let input = service.root().child(child_id).unwrap().input(VALUE_INPUT).unwrap();

    let err = AnimationHandler::add_keyframe(
        service.document(),
        input,
        1.0,
        &SlotValue::from(3.0),
        Interpolation::Linear,
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::NotAnimated { .. }));
}

#[test]
fn test_keyframes_drive_the_input() {
    let (service, child_id) = setup_service(VALUE_OP);
    let document = service.document();
    let input = service.root().child(child_id).unwrap().input(VALUE_INPUT).unwrap();
    let ctx = EvaluationContext::new(0.0);

    AnimationHandler::create_binding(document, input, &ctx).unwrap();
    assert!(AnimationHandler::is_bound(document, input).unwrap());
    AnimationHandler::add_keyframe(document, input, 0.0, &SlotValue::from(0.0), Interpolation::Linear)
        .unwrap();
    AnimationHandler::add_keyframe(document, input, 2.0, &SlotValue::from(8.0), Interpolation::Linear)
        .unwrap();

    assert_eq!(input.get_value(&EvaluationContext::new(1.0)), SlotValue::from(4.0));

    // Replacing the key at exactly 2.0.
    AnimationHandler::add_keyframe(document, input, 2.0, &SlotValue::from(2.0), Interpolation::Linear)
        .unwrap();
    let curves = AnimationHandler::curves_for(document, input).unwrap();
    assert_eq!(curves[0].read().unwrap().len(), 2);
    assert_eq!(input.get_value(&EvaluationContext::new(1.0)), SlotValue::from(1.0));

    assert_eq!(AnimationHandler::remove_keyframe(document, input, 2.0).unwrap(), 1);
    assert_eq!(AnimationHandler::remove_keyframe(document, input, 2.0).unwrap(), 0);
    assert_eq!(input.get_value(&EvaluationContext::new(1.5)), SlotValue::from(0.0));
}

#[test]
fn test_vector_keyframe_writes_every_component() {
    let (service, child_id) = setup_service(COLOR_OP);
    let document = service.document();
    let input = service.root().child(child_id).unwrap().input(COLOR_INPUT).unwrap();

    AnimationHandler::create_binding(document, input, &EvaluationContext::new(0.0)).unwrap();
    let err = AnimationHandler::add_keyframe(
        document,
        input,
        1.0,
        &SlotValue::from(1.0),
        Interpolation::Constant,
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::InvalidArgument(_)));

    let target = SlotValue::from(Vec4::new(0.0, 0.5, 1.0, 1.5));
    AnimationHandler::add_keyframe(document, input, 1.0, &target, Interpolation::Constant).unwrap();
    assert_eq!(input.get_value(&EvaluationContext::new(3.0)), target);
    assert_eq!(AnimationHandler::remove_keyframe(document, input, 1.0).unwrap(), 4);
}

#[test]
fn test_keyframe_edit_waits_for_document_readers() {
    let (service, child_id) = setup_service(COLOR_OP);
    let document = service.document();
    let input = service.root().child(child_id).unwrap().input(COLOR_INPUT).unwrap();
    AnimationHandler::create_binding(document, input, &EvaluationContext::new(0.0)).unwrap();

    let (locked_tx, locked_rx) = mpsc::channel();
    let shared = Arc::clone(document);
    let reader = thread::spawn(move || {
        let guard = shared.read().unwrap();
        let before = guard.animator.write().unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(100));
        let after = guard.animator.write().unwrap();
        before == after
    });

    locked_rx.recv().unwrap();
    let target = SlotValue::from(Vec4::new(5.0, 6.0, 7.0, 8.0));
    AnimationHandler::add_keyframe(document, input, 2.0, &target, Interpolation::Linear).unwrap();

    assert!(reader.join().unwrap(), "animation changed while the document was read");
    assert_eq!(input.get_value(&EvaluationContext::new(2.0)), target);
}

#[test]
fn test_toggle_binding() {
    let (service, child_id) = setup_service(VALUE_OP);
    let document = service.document();
    let input = service.root().child(child_id).unwrap().input(VALUE_INPUT).unwrap();
    let ctx = EvaluationContext::new(0.0);

    assert!(AnimationHandler::toggle_binding(document, input, &ctx).unwrap());
    assert!(input.is_animated());
    assert!(!AnimationHandler::toggle_binding(document, input, &ctx).unwrap());
    assert!(!input.is_animated());
    assert!(document.read().unwrap().animator.is_empty());
}

#[test]
fn test_service_animate_save_and_reload() {
    let (mut service, child_id) = setup_service(INVERT_OP);
    service
        .set_input_value(child_id, VALUE_INPUT, SlotValue::from(2.0))
        .unwrap();
    service.seek(1.0);
    service.animate_input(child_id, VALUE_INPUT).unwrap();
    assert_eq!(
        service.evaluate(child_id, VALUE_OUTPUT).unwrap(),
        SlotValue::from(-2.0)
    );

    let input = service.root().child(child_id).unwrap().input(VALUE_INPUT).unwrap();
    AnimationHandler::add_keyframe(
        service.document(),
        input,
        3.0,
        &SlotValue::from(6.0),
        Interpolation::Linear,
    )
    .unwrap();

    let json = service.save().unwrap();
    let (registry, _) = setup_registry();
    let document = curvegraph::document::Document::load(&json).unwrap();
    let mut reopened = DocumentService::from_document(document, registry).unwrap();
    assert_eq!(reopened.last_report().bound, vec![(child_id, VALUE_INPUT)]);

    reopened.seek(3.0);
    assert_eq!(
        reopened.evaluate(child_id, VALUE_OUTPUT).unwrap(),
        SlotValue::from(-6.0)
    );
    assert_eq!(
        reopened.evaluate_input(child_id, VALUE_INPUT).unwrap(),
        SlotValue::from(6.0)
    );

    let report = reopened.reload().unwrap().clone();
    assert_eq!(report.bound, vec![(child_id, VALUE_INPUT)]);
    assert_eq!(
        reopened.evaluate(child_id, VALUE_OUTPUT).unwrap(),
        SlotValue::from(-6.0)
    );
}

#[test]
fn test_service_rejects_unknown_ids() {
    let (service, child_id) = setup_service(VALUE_OP);
    let err = service.evaluate(uuid::Uuid::new_v4(), VALUE_OUTPUT).unwrap_err();
    assert!(matches!(err, LibraryError::UnknownInstance(_)));
    let err = service.animate_input(child_id, VALUE_OUTPUT).unwrap_err();
    assert!(matches!(err, LibraryError::UnknownSlot { .. }));
}

#[test]
fn test_remove_animation_through_service() {
    let (service, child_id) = setup_service(COLOR_OP);
    service.animate_input(child_id, COLOR_INPUT).unwrap();
    assert_eq!(service.remove_animation(child_id, COLOR_INPUT).unwrap(), 4);
    assert_eq!(service.remove_animation(child_id, COLOR_INPUT).unwrap(), 0);
}

#[test]
fn test_document_is_readable_from_other_threads() {
    let (service, child_id) = setup_service(COLOR_OP);
    service.animate_input(child_id, COLOR_INPUT).unwrap();

    let document = Arc::clone(service.document());
    let count = thread::spawn(move || {
        let token = AnimationHandler::write_animator(&document).unwrap();
        token.as_array().map(|entries| entries.len()).unwrap_or(0)
    })
    .join()
    .unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_read_animator_merges_entries() {
    let (source, child_id) = setup_service(COLOR_OP);
    source.animate_input(child_id, COLOR_INPUT).unwrap();
    let token = AnimationHandler::write_animator(source.document()).unwrap();

    let (target, _) = setup_document(COLOR_OP);
    let target = target.into_shared();
    assert_eq!(AnimationHandler::read_animator(&target, &token).unwrap(), 4);

    // Ids do not match the target's child, so nothing binds.
    let (registry, _) = setup_registry();
    let (root, _) = target.read().unwrap().instantiate(&registry).unwrap();
    let report = AnimationHandler::rebind(&target, &root).unwrap();
    assert!(report.bound.is_empty());
    assert_eq!(report.unresolved, vec![(child_id, COLOR_INPUT)]);
}
