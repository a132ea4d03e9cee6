/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Edge-drawing gestures translated into hypergraph mutations.

use euclid::default::Point2D;
use hyperboard::view::participant_edge_id;
use hyperboard::{RejectReason, Sketch, SketchAnchor, SketchEdge, SketchNode, SketchOutcome};

use crate::harness::TestHarness;

#[test]
fn drawing_from_interaction_binds_entity_without_new_interactions() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let x = h.add_entity(Point2D::new(50.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(25.0, 25.0), &[a]);
    let interactions_before = h.app.doc.interactions().count();

    let outcome = h.app.complete_sketch(
        &Sketch {
            source: i,
            nodes: vec![],
            edges: vec![SketchEdge {
                from: SketchAnchor::Existing(i),
                to: SketchAnchor::Existing(x),
            }],
        },
        h.now,
    );
    h.settle_fully();

    assert!(matches!(outcome, SketchOutcome::Applied { .. }));
    assert_eq!(h.app.doc.get(i).unwrap().arity(), 2);
    assert!(h.app.doc.get(i).unwrap().has_participant(x));
    assert_eq!(h.app.doc.interactions().count(), interactions_before);
    assert!(h.app.view.has_edge(participant_edge_id(i, x)));
    assert_eq!(h.app.view.node(i).unwrap().arity, 2);
}

#[test]
fn drawing_from_entity_to_blank_creates_arity_one_interaction() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));

    let outcome = h.app.complete_sketch(
        &Sketch {
            source: a,
            nodes: vec![SketchNode {
                position: Point2D::new(60.0, 60.0),
            }],
            edges: vec![SketchEdge {
                from: SketchAnchor::Existing(a),
                to: SketchAnchor::Provisional(0),
            }],
        },
        h.now,
    );
    h.settle_fully();

    let SketchOutcome::Applied {
        new_interactions, ..
    } = outcome
    else {
        panic!("gesture should apply");
    };
    assert_eq!(new_interactions.len(), 1);
    let i = new_interactions[0];
    let intn = h.app.doc.get(i).unwrap();
    assert_eq!(intn.arity(), 1);
    assert!(intn.has_participant(a));
    // the permanent projection came through the normal add pipeline
    assert!(h.app.view.has_node(i));
    assert!(h.app.view.has_edge(participant_edge_id(i, a)));
}

#[test]
fn branching_gesture_yields_one_interaction_with_both_participants() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(100.0, 0.0));

    let outcome = h.app.complete_sketch(
        &Sketch {
            source: a,
            nodes: vec![SketchNode {
                position: Point2D::new(50.0, 30.0),
            }],
            edges: vec![
                SketchEdge {
                    from: SketchAnchor::Existing(a),
                    to: SketchAnchor::Provisional(0),
                },
                SketchEdge {
                    from: SketchAnchor::Provisional(0),
                    to: SketchAnchor::Existing(b),
                },
            ],
        },
        h.now,
    );
    h.settle_fully();

    let SketchOutcome::Applied {
        new_interactions, ..
    } = outcome
    else {
        panic!("gesture should apply");
    };
    assert_eq!(new_interactions.len(), 1);
    let i = new_interactions[0];
    assert_eq!(h.app.doc.get(i).unwrap().arity(), 2);
    assert!(h.app.doc.get(i).unwrap().has_participant(a));
    assert!(h.app.doc.get(i).unwrap().has_participant(b));
    // no leftover provisional elements: exactly a, b and the interaction
    assert_eq!(h.app.view.node_count(), 3);
    assert_eq!(h.app.view.edge_count(), 2);
}

#[test]
fn duplicate_connection_is_rejected_without_any_change() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(20.0, 20.0), &[a]);
    h.settle_fully();
    let edges_before = h.app.view.edge_count();
    let arity_before = h.app.doc.get(i).unwrap().arity();

    let outcome = h.app.complete_sketch(
        &Sketch {
            source: a,
            nodes: vec![],
            edges: vec![SketchEdge {
                from: SketchAnchor::Existing(a),
                to: SketchAnchor::Existing(i),
            }],
        },
        h.now,
    );
    h.settle_fully();

    assert_eq!(
        outcome,
        SketchOutcome::Rejected(RejectReason::DuplicateInteractionLink)
    );
    assert_eq!(h.app.view.edge_count(), edges_before);
    assert_eq!(h.app.doc.get(i).unwrap().arity(), arity_before);
}

#[test]
fn gesture_with_self_loop_is_rejected() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));

    let outcome = h.app.complete_sketch(
        &Sketch {
            source: a,
            nodes: vec![],
            edges: vec![SketchEdge {
                from: SketchAnchor::Existing(a),
                to: SketchAnchor::Existing(a),
            }],
        },
        h.now,
    );

    assert_eq!(outcome, SketchOutcome::Rejected(RejectReason::SelfLoop));
    assert_eq!(h.app.doc.interactions().count(), 0);
}
