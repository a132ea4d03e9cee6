/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Collaborative hypergraph board editor core.
//!
//! The authoritative `model::Document` and the interactive `view::BoardView`
//! are kept consistent by `sync::Reconciler`; `app::BoardApp` wires them
//! together behind the operations the presentation layer calls. Edge-drawing
//! gestures become hypergraph mutations through `sync::sketch`.
//!
//! Single-threaded and cooperative: embeddings call `BoardApp::pump(now)`
//! from their frame loop; debounce and animation timing take time as an
//! explicit parameter, so the whole core is deterministic under test.

pub mod app;
pub mod bus;
pub mod config;
pub mod model;
pub mod persistence;
pub mod sync;
pub mod view;

pub use app::{BoardApp, BootstrapError, NewElement};
pub use bus::{Bus, BusCommand, BusSignal};
pub use config::BoardOptions;
pub use model::{
    ChangeOrigin, DocElement, DocEvent, Document, ElementId, ElementKind, ElementSeed,
    Participant, ParticipantType, RemoteChange,
};
pub use persistence::{DocumentStore, MemoryStore, StoreError};
pub use sync::Reconciler;
pub use sync::sketch::{RejectReason, Sketch, SketchAnchor, SketchEdge, SketchNode, SketchOutcome};
pub use view::{BoardView, ViewError, ViewEvent};
