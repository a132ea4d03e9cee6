/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::time::{Duration, Instant};

use euclid::default::Point2D;
use hyperboard::{
    BoardApp, BoardOptions, ElementId, MemoryStore, NewElement, ParticipantType,
};
use uuid::Uuid;

/// Bootstrapped app plus a manually advanced clock.
pub struct TestHarness {
    pub app: BoardApp,
    pub now: Instant,
}

impl TestHarness {
    pub fn new() -> Self {
        let mut app = BoardApp::new(BoardOptions::default());
        let mut store = MemoryStore::empty();
        app.bootstrap(&mut store).expect("bootstrap");
        let mut harness = Self {
            app,
            now: Instant::now(),
        };
        harness.pump();
        harness
    }

    pub fn pump(&mut self) {
        self.app.pump(self.now);
    }

    /// Advance the clock and pump once.
    pub fn settle(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
        self.pump();
    }

    /// Settle past every debounce interval and animation duration.
    pub fn settle_fully(&mut self) {
        let opts = self.app.options().clone();
        let quiet = opts
            .position_debounce_ms
            .max(opts.doc_position_debounce_ms)
            .max(opts.add_rm_animation_duration_ms)
            .max(opts.position_animation_duration_ms)
            .max(opts.edit_animation_duration_ms)
            + 1;
        self.settle(quiet);
        self.settle(quiet);
    }

    pub fn add_entity(&mut self, position: Point2D<f64>) -> ElementId {
        let id = self
            .app
            .add_element(
                NewElement {
                    name: "entity".to_string(),
                    position: Some(position),
                },
                self.now,
            )
            .expect("editable");
        self.pump();
        id
    }

    /// An interaction with the given participants, projected into the view.
    pub fn add_interaction_with(
        &mut self,
        position: Point2D<f64>,
        participants: &[ElementId],
    ) -> ElementId {
        let id = self
            .app
            .add_interaction(
                NewElement {
                    name: String::new(),
                    position: Some(position),
                },
                self.now,
            )
            .expect("editable");
        self.pump();
        for entity in participants {
            self.app
                .doc
                .add_participant(id, *entity, UNSIGNED)
                .expect("participant");
            self.pump();
        }
        id
    }

    pub fn doc_position(&self, id: ElementId) -> Point2D<f64> {
        self.app.doc.get(id).expect("element").position
    }

    pub fn view_position(&self, id: ElementId) -> Point2D<f64> {
        self.app.view.node(id).expect("node").position
    }

    /// A local drag sequence: grab, a burst of frames toward `to`, release.
    pub fn drag(&mut self, id: ElementId, to: Point2D<f64>) {
        let view = &mut self.app.view;
        view.grab(id).expect("grab");
        let from = view.node(id).expect("node").position;
        for step in 1..=5 {
            let t = f64::from(step) / 5.0;
            let position = Point2D::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            view.drag(id, position).expect("drag");
        }
        view.release(id).expect("release");
        self.pump();
    }

    pub fn unique_id() -> ElementId {
        Uuid::new_v4()
    }
}

/// Convenience re-export so scenarios can name the default participant type.
pub const UNSIGNED: ParticipantType = ParticipantType::Unsigned;
