/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Position convergence, echo suppression and grabbed precedence.

use euclid::default::Point2D;
use float_cmp::approx_eq;
use hyperboard::RemoteChange;

use crate::harness::TestHarness;

#[test]
fn position_converges_after_one_debounce_interval() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(10.0, 10.0));

    h.drag(a, Point2D::new(200.0, 120.0));

    // burst not yet flushed: the model still holds the original position
    assert!(approx_eq!(f64, h.doc_position(a).x, 10.0, epsilon = 1e-4));

    let debounce = h.app.options().position_debounce_ms;
    h.settle(debounce + 1);

    let doc = h.doc_position(a);
    let view = h.view_position(a);
    assert!(approx_eq!(f64, doc.x, view.x, epsilon = 1e-4));
    assert!(approx_eq!(f64, doc.y, view.y, epsilon = 1e-4));
    assert!(approx_eq!(f64, doc.x, 200.0, epsilon = 1e-4));
}

#[test]
fn drag_write_back_does_not_echo_into_the_view() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));

    h.drag(a, Point2D::new(80.0, 60.0));
    let debounce = h.app.options().position_debounce_ms;
    h.settle(debounce + 1);

    // the local reposition settled into the model; nothing may bounce back
    assert!(!h.app.sync().pending_view_update(a));
    let settled = h.view_position(a);
    h.settle_fully();
    assert_eq!(h.view_position(a), settled);
}

#[test]
fn grabbed_element_ignores_remote_reposition() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(5.0, 5.0));

    h.app.view.grab(a).unwrap();
    h.pump();

    h.app.apply_remote(
        RemoteChange::Reposition {
            id: a,
            position: [300.0, 300.0],
        },
        h.now,
    );
    h.settle_fully();

    assert_eq!(h.view_position(a), Point2D::new(5.0, 5.0));
    // the model accepted the remote write; only the view application was
    // suppressed by the grab
    assert!(approx_eq!(f64, h.doc_position(a).x, 300.0, epsilon = 1e-4));
}

#[test]
fn remote_reposition_glides_when_not_grabbed() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));

    h.app.apply_remote(
        RemoteChange::Reposition {
            id: a,
            position: [100.0, 50.0],
        },
        h.now,
    );
    h.pump();

    let debounce = h.app.options().doc_position_debounce_ms;
    h.settle(debounce + 1);
    // glide underway: somewhere strictly between start and target
    let mid = h.view_position(a);
    let duration = h.app.options().position_animation_duration_ms;
    h.settle(duration / 2);
    h.settle(duration);

    let end = h.view_position(a);
    assert!(approx_eq!(f64, end.x, 100.0, epsilon = 1e-4));
    assert!(approx_eq!(f64, end.y, 50.0, epsilon = 1e-4));
    assert!(mid.x <= end.x);
}

#[test]
fn layout_stop_captures_every_node_through_the_batcher() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(10.0, 0.0));

    // an algorithmic layout moves everything, then announces completion
    h.app.view.node_mut(a).unwrap().position = Point2D::new(-40.0, 25.0);
    h.app.view.node_mut(b).unwrap().position = Point2D::new(90.0, -15.0);
    h.app.view.layout_stopped();
    h.pump();

    let debounce = h.app.options().position_debounce_ms;
    h.settle(debounce + 1);

    assert!(approx_eq!(f64, h.doc_position(a).x, -40.0, epsilon = 1e-4));
    assert!(approx_eq!(f64, h.doc_position(b).y, -15.0, epsilon = 1e-4));
}

#[test]
fn trailing_edge_debounce_resets_on_fresh_drags() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let debounce = h.app.options().position_debounce_ms;

    h.app.view.grab(a).unwrap();
    h.app.view.drag(a, Point2D::new(20.0, 0.0)).unwrap();
    h.pump();
    // half a window later, another frame arrives and resets the deadline
    h.settle(debounce / 2);
    h.app.view.drag(a, Point2D::new(40.0, 0.0)).unwrap();
    h.app.view.release(a).unwrap();
    h.pump();

    // the original deadline passing must not flush
    h.settle(debounce / 2 + 1);
    assert!(approx_eq!(f64, h.doc_position(a).x, 0.0, epsilon = 1e-4));

    // quiescence for a full interval flushes the latest position once
    h.settle(debounce);
    assert!(approx_eq!(f64, h.doc_position(a).x, 40.0, epsilon = 1e-4));
}
