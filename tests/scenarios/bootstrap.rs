/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bootstrap ordering and hydration of an already-populated document.

use std::time::Instant;

use euclid::default::Point2D;
use hyperboard::view::participant_edge_id;
use hyperboard::{
    BoardApp, BoardOptions, ElementSeed, MemoryStore, NewElement, Participant, ParticipantType,
};
use uuid::Uuid;

fn seeded_store() -> (MemoryStore, Uuid, Uuid, Uuid) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let i = Uuid::new_v4();
    let mut intn = ElementSeed::interaction(i, Point2D::new(50.0, 50.0));
    intn.participants = vec![
        Participant {
            entity: a,
            ptype: ParticipantType::Unsigned,
        },
        Participant {
            entity: b,
            ptype: ParticipantType::Positive,
        },
    ];
    let store = MemoryStore::with_seeds(vec![
        ElementSeed::entity(a, "a", Point2D::new(0.0, 0.0)),
        ElementSeed::entity(b, "b", Point2D::new(100.0, 0.0)),
        intn,
    ]);
    (store, a, b, i)
}

#[test]
fn create_runs_before_synch_for_a_missing_document() {
    let mut app = BoardApp::new(BoardOptions::default());
    let mut store = MemoryStore::empty();
    app.bootstrap(&mut store).unwrap();
    assert_eq!(store.calls, vec!["load", "create", "synch"]);
    assert!(app.initted());
}

#[test]
fn hydration_projects_the_whole_document_and_fits() {
    let mut app = BoardApp::new(BoardOptions::default());
    let (mut store, a, b, i) = seeded_store();
    app.bootstrap(&mut store).unwrap();
    assert_eq!(store.calls, vec!["load", "synch"]);

    let default_camera = app.view.camera.clone();
    app.pump(Instant::now());

    assert!(app.view.has_node(a));
    assert!(app.view.has_node(b));
    assert!(app.view.has_node(i));
    assert!(app.view.has_edge(participant_edge_id(i, a)));
    assert!(app.view.has_edge(participant_edge_id(i, b)));
    assert_eq!(app.view.node(i).unwrap().arity, 2);
    // hydration is silent: no creation animations for old elements
    assert_eq!(app.sync().animation_handle_count(), 0);
    // the load finished with a fit-to-view
    assert_ne!(app.view.camera, default_camera);
}

#[test]
fn read_only_documents_lock_the_view() {
    let mut app = BoardApp::new(BoardOptions::default());
    app.doc.set_editable(false);
    let (mut store, a, ..) = seeded_store();
    app.bootstrap(&mut store).unwrap();
    app.pump(Instant::now());

    assert!(app.view.locked());
    assert!(app.add_element(NewElement::default(), Instant::now()).is_none());

    // drags bounce off the locked view
    let before = app.view.node(a).unwrap().position;
    app.view.drag(a, Point2D::new(500.0, 500.0)).unwrap();
    assert_eq!(app.view.node(a).unwrap().position, before);
}

#[test]
fn bus_commands_drive_the_core_once_initted() {
    let mut app = BoardApp::new(BoardOptions::default());
    let mut store = MemoryStore::empty();
    app.bootstrap(&mut store).unwrap();
    let chrome = app.bus();

    chrome.send(hyperboard::BusCommand::AddElement {
        position: Some(Point2D::new(30.0, 30.0)),
    });
    app.pump(Instant::now());

    assert_eq!(app.doc.len(), 1);
    assert_eq!(app.view.node_count(), 1);
}
