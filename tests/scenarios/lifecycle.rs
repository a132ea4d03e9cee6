/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Element lifecycle: arity cascade, removal animation hand-off,
//! subscription pairing and chrome closure signals.

use euclid::default::Point2D;
use hyperboard::view::participant_edge_id;
use hyperboard::BusSignal;

use crate::harness::TestHarness;

#[test]
fn removing_second_to_last_participant_cascades_the_interaction() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(40.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(20.0, 20.0), &[a, b]);
    h.settle_fully();
    assert_eq!(h.app.view.edge_count(), 2);

    h.app.doc.remove_participant(i, a).unwrap();
    h.settle_fully();

    assert!(!h.app.doc.has(i));
    assert!(!h.app.view.has_node(i));
    assert_eq!(h.app.view.edge_count(), 0, "the remaining edge goes too");
    assert!(h.app.view.has_node(a));
    assert!(h.app.view.has_node(b));
}

#[test]
fn removing_one_of_three_participants_keeps_the_interaction() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(40.0, 0.0));
    let c = h.add_entity(Point2D::new(80.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(40.0, 40.0), &[a, b, c]);
    h.settle_fully();
    assert_eq!(h.app.view.edge_count(), 3);

    h.app.doc.remove_participant(i, a).unwrap();
    h.settle_fully();

    assert!(h.app.doc.has(i));
    assert_eq!(h.app.doc.get(i).unwrap().arity(), 2);
    assert_eq!(h.app.view.node(i).unwrap().arity, 2);
    assert!(!h.app.view.has_edge(participant_edge_id(i, a)));
    assert_eq!(h.app.view.edge_count(), 2, "exactly one edge removed");
}

#[test]
fn removing_an_absent_element_has_no_observable_effect() {
    let mut h = TestHarness::new();
    h.add_entity(Point2D::new(0.0, 0.0));
    h.settle_fully();
    let nodes = h.app.view.node_count();
    let subscriptions = h.app.sync().subscribed_count();

    h.app.remove(TestHarness::unique_id());
    h.settle_fully();

    assert_eq!(h.app.view.node_count(), nodes);
    assert_eq!(h.app.sync().subscribed_count(), subscriptions);
}

#[test]
fn subscriptions_drain_to_zero_across_full_lifecycle() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(30.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(15.0, 15.0), &[a, b]);
    h.settle_fully();
    assert_eq!(h.app.sync().subscribed_count(), 3);

    h.app.remove(a);
    h.settle_fully();
    // unbinding a cascaded the interaction; only b is left
    assert!(!h.app.doc.has(i));
    assert_eq!(h.app.sync().subscribed_count(), 1);

    h.app.remove(b);
    h.settle_fully();
    assert_eq!(h.app.sync().subscribed_count(), 0);
    assert_eq!(h.app.sync().animation_handle_count(), 0);
    assert_eq!(h.app.view.node_count(), 0);
    assert_eq!(h.app.view.edge_count(), 0);
}

#[test]
fn removal_requests_handle_and_tooltip_closure_synchronously() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    h.settle_fully();
    let chrome = h.app.bus();
    chrome.drain_signals();

    h.app.remove(a);
    h.pump();

    let signals = chrome.drain_signals();
    assert!(signals.contains(&BusSignal::RemoveHandle { id: a }));
    assert!(signals.contains(&BusSignal::CloseTip { id: Some(a) }));
    // the fade is still running at this point; the node detaches later
    assert!(h.app.view.has_node(a));
    h.settle_fully();
    assert!(!h.app.view.has_node(a));
}

#[test]
fn remove_selected_treats_edges_as_unbind_requests() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let b = h.add_entity(Point2D::new(40.0, 0.0));
    let c = h.add_entity(Point2D::new(80.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(40.0, 40.0), &[a, b, c]);
    h.settle_fully();

    h.app.view.select(participant_edge_id(i, a)).unwrap();
    h.app.remove_selected();
    h.settle_fully();

    // unbinding a left an arity-2 interaction in place
    assert!(h.app.doc.has(i));
    assert_eq!(h.app.doc.get(i).unwrap().arity(), 2);
    assert!(h.app.doc.has(a));
    assert!(!h.app.view.has_edge(participant_edge_id(i, a)));
    assert!(h.app.view.selected().is_empty());
}

#[test]
fn remote_removal_is_projected_and_cleaned_up() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    h.settle_fully();

    h.app.apply_remote(
        hyperboard::RemoteChange::Remove { id: a },
        h.now,
    );
    h.settle_fully();

    assert!(!h.app.doc.has(a));
    assert!(!h.app.view.has_node(a));
    assert_eq!(h.app.sync().subscribed_count(), 0);
}

#[test]
fn replace_id_rewires_view_and_subscription() {
    let mut h = TestHarness::new();
    let a = h.add_entity(Point2D::new(0.0, 0.0));
    let i = h.add_interaction_with(Point2D::new(20.0, 20.0), &[a]);
    h.settle_fully();

    let confirmed = TestHarness::unique_id();
    h.app.doc.replace_id(a, confirmed).unwrap();
    h.settle_fully();

    assert!(!h.app.view.has_node(a));
    assert!(h.app.view.has_node(confirmed));
    assert!(h.app.view.has_edge(participant_edge_id(i, confirmed)));
    assert!(!h.app.view.has_edge(participant_edge_id(i, a)));
    assert_eq!(h.app.sync().subscribed_count(), 2);
    assert!(h.app.sync().is_subscribed(confirmed));
    assert!(!h.app.sync().is_subscribed(a));
}
