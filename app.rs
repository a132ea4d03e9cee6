/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application state for the board editor.
//!
//! `BoardApp` owns the document, the view projection and the reconciler,
//! and exposes the programmatic operations consumed by the presentation
//! layer. Every mutating operation is a no-op while the document is not
//! editable. `pump(now)` is the single cooperative scheduling point: bus
//! commands, document/view events, position flushes and animation ticks all
//! advance there and run to completion.

use std::time::Instant;

use euclid::default::Point2D;
use thiserror::Error;
use uuid::Uuid;

use crate::bus::{Bus, BusCommand, BusSignal};
use crate::config::BoardOptions;
use crate::model::{Document, ElementId, ElementSeed, ModelError, RemoteChange};
use crate::persistence::{DocumentStore, StoreError};
use crate::sync::Reconciler;
use crate::sync::sketch::{self, RejectReason, Sketch, SketchOutcome};
use crate::view::BoardView;

/// Bootstrap failure, after the load→create fallback is exhausted.
#[derive(Debug, Error, PartialEq)]
pub enum BootstrapError {
    #[error("document could not be created: {0}")]
    Create(StoreError),
    #[error("document load failed: {0}")]
    Load(StoreError),
    #[error("synchronization could not be enabled: {0}")]
    Synch(StoreError),
}

/// Caller-supplied fields for a new element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewElement {
    pub name: String,
    /// Rendered (screen) position, e.g. the mouse; converted through the
    /// camera. `None` places at the wrapping offset sequence.
    pub position: Option<Point2D<f64>>,
}

pub struct BoardApp {
    pub doc: Document,
    pub view: BoardView,
    sync: Reconciler,
    bus: Bus,
    options: BoardOptions,
    draw_mode: bool,
    new_element_shift: u32,
    initted: bool,
}

impl BoardApp {
    pub fn new(options: BoardOptions) -> Self {
        Self {
            doc: Document::new(),
            view: BoardView::new(),
            sync: Reconciler::new(options.clone()),
            bus: Bus::new(),
            options,
            draw_mode: false,
            new_element_shift: 0,
            initted: false,
        }
    }

    /// A handle onto the chrome bus; clones share channels.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    pub fn options(&self) -> &BoardOptions {
        &self.options
    }

    pub fn editable(&self) -> bool {
        self.doc.editable()
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    /// Whether bootstrap completed and the editor is usable.
    pub fn initted(&self) -> bool {
        self.initted
    }

    /// Load the document, falling back to creation when it does not exist
    /// yet, then enable live synchronization. Only after both steps does
    /// the editor advertise itself as usable.
    pub fn bootstrap(&mut self, store: &mut dyn DocumentStore) -> Result<(), BootstrapError> {
        match store.load() {
            Ok(seeds) => {
                log::info!("document exists, hydrating {} elements", seeds.len());
                self.doc.hydrate(seeds);
            },
            Err(StoreError::Missing) => {
                log::info!("document does not exist, creating");
                store.create().map_err(BootstrapError::Create)?;
            },
            Err(err) => {
                log::warn!("document load failed: {err}, attempting create");
                store.create().map_err(BootstrapError::Create)?;
            },
        }
        store.synch(true).map_err(BootstrapError::Synch)?;
        log::info!("document synch active");
        self.view.set_locked(!self.doc.editable());
        self.initted = true;
        Ok(())
    }

    /// One cooperative pass: drain chrome commands, then reconcile.
    pub fn pump(&mut self, now: Instant) {
        for command in self.bus.drain_commands() {
            self.apply_command(command, now);
        }
        self.sync.pump(&mut self.doc, &mut self.view, &self.bus, now);
    }

    fn apply_command(&mut self, command: BusCommand, now: Instant) {
        match command {
            BusCommand::AddElement { position } => {
                self.add_element(
                    NewElement {
                        name: String::new(),
                        position,
                    },
                    now,
                );
            },
            BusCommand::AddInteraction { position } => {
                self.add_interaction(
                    NewElement {
                        name: String::new(),
                        position,
                    },
                    now,
                );
            },
            BusCommand::RemoveSelected => self.remove_selected(),
            BusCommand::RenameDebounce { id, name } => {
                // live keystroke preview: view only, the model write lands
                // when the rename commits
                if let Ok(node) = self.view.node_mut(id) {
                    node.name = name;
                } else {
                    log::debug!("rename preview for missing node {id}, skipping");
                }
            },
            BusCommand::Layout => self.layout(),
            BusCommand::Fit => self.fit(),
            BusCommand::DrawToggle => {
                self.toggle_draw_mode();
            },
        }
    }

    /// Board-space placement for a new element: either the converted mouse
    /// position, or the wrapping offset sequence below the base position.
    fn placement(&mut self, requested: Option<Point2D<f64>>) -> Point2D<f64> {
        let rendered = match requested {
            Some(position) => position,
            None => {
                let base = self.options.new_element_position;
                let shift = f64::from(self.new_element_shift) * self.options.new_element_shift;
                self.new_element_shift =
                    (self.new_element_shift + 1) % self.options.new_element_max_shifts;
                Point2D::new(base[0], base[1] + shift)
            },
        };
        self.view.camera.to_board(rendered)
    }

    /// Add a new entity. Returns its id, or `None` when not editable.
    pub fn add_element(&mut self, data: NewElement, now: Instant) -> Option<ElementId> {
        if !self.editable() {
            return None;
        }
        let position = self.placement(data.position);
        let seed = ElementSeed::entity(Uuid::new_v4(), &data.name, position);
        match self.doc.add(seed, now) {
            Ok(id) => Some(id),
            Err(err) => {
                log::error!("element add failed: {err}");
                None
            },
        }
    }

    /// Add a new interaction node. Returns its id, or `None` when not
    /// editable.
    pub fn add_interaction(&mut self, data: NewElement, now: Instant) -> Option<ElementId> {
        if !self.editable() {
            return None;
        }
        let position = self.placement(data.position);
        let seed = ElementSeed::interaction(Uuid::new_v4(), position);
        let seed = ElementSeed {
            name: data.name,
            ..seed
        };
        match self.doc.add(seed, now) {
            Ok(id) => Some(id),
            Err(err) => {
                log::error!("interaction add failed: {err}");
                None
            },
        }
    }

    /// Remove an element: first unbind it from every interaction (which may
    /// cascade those interactions away), then remove the element itself.
    /// Removing an id that is not present has no observable effect.
    pub fn remove(&mut self, id: ElementId) {
        if !self.editable() {
            return;
        }
        for interaction in self.doc.interactions_containing(id) {
            if let Err(err) = self.doc.remove_participant(interaction, id) {
                log::warn!("unbinding {id} from {interaction} failed: {err}");
            }
        }
        self.doc.remove(id);
    }

    /// Remove everything currently selected in the view. Selected edges are
    /// unbind requests; selected nodes are full removals.
    pub fn remove_selected(&mut self) {
        if !self.editable() {
            return;
        }
        for id in self.view.selected() {
            if self.view.has_node(id) {
                self.remove(id);
            } else if let Ok(edge) = self.view.edge(id) {
                let (interaction, entity) = (edge.interaction, edge.entity);
                match self.doc.remove_participant(interaction, entity) {
                    Ok(()) => {},
                    Err(ModelError::UnknownElement(_)) => {},
                    Err(err) => log::warn!("selected edge unbind failed: {err}"),
                }
            }
        }
        self.view.unselect_all();
    }

    /// Ask chrome to run an algorithmic layout over the view.
    pub fn layout(&mut self) {
        if !self.editable() {
            return;
        }
        self.bus.emit(BusSignal::LayoutRequested);
    }

    /// Fit the camera to the current graph and tell chrome.
    pub fn fit(&mut self) {
        self.view.fit(self.options.fit_padding);
        self.bus.emit(BusSignal::FitRequested);
    }

    /// Toggle edge-draw mode. Returns the new state, or `None` when not
    /// editable.
    pub fn toggle_draw_mode(&mut self) -> Option<bool> {
        if !self.editable() {
            return None;
        }
        self.draw_mode = !self.draw_mode;
        self.bus.emit(if self.draw_mode {
            BusSignal::DrawOn
        } else {
            BusSignal::DrawOff
        });
        Some(self.draw_mode)
    }

    /// Translate a completed edge-drawing gesture into document mutations.
    pub fn complete_sketch(&mut self, sketch: &Sketch, now: Instant) -> SketchOutcome {
        if !self.editable() {
            return SketchOutcome::Rejected(RejectReason::NotEditable);
        }
        sketch::translate(&mut self.doc, sketch, now)
    }

    /// Feed one decoded remote mutation into the document. Failures are
    /// logged, never propagated: a stale remote change must not take the
    /// editor down.
    pub fn apply_remote(&mut self, change: RemoteChange, now: Instant) {
        if let Err(err) = self.doc.apply_remote(change, now) {
            log::warn!("remote change dropped: {err}");
        }
    }

    /// Test/diagnostic access to the reconciler.
    pub fn sync(&self) -> &Reconciler {
        &self.sync
    }
}
