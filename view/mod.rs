/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! View projection of the document: the interactive node/edge graph.
//!
//! Core structures:
//! - `BoardView`: petgraph-backed visual graph, bidirectional id maps,
//!   selection set and camera
//! - `ViewNode` / `ViewEdge`: purely presentational state keyed by the
//!   same identifiers as their document counterparts
//!
//! Boundary: the view never mutates the document. Structure is projected
//! from the document by the sync layer; the only state owned here is
//! rendering state (positions, transient styling, grabbed/selected flags,
//! camera). Lookups are typed: a missing pairing is a `ViewError`, never a
//! silent default.

use std::collections::{HashMap, HashSet};

use euclid::default::{Point2D, Size2D, Vector2D};
use petgraph::Directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{ElementId, ElementKind, ParticipantType};

/// Stable node handle (petgraph NodeIndex — survives other deletions)
pub type NodeKey = NodeIndex;

/// Stable edge handle (petgraph EdgeIndex)
pub type EdgeKey = EdgeIndex;

/// Namespace for deterministic participant-edge identifiers.
const PARTICIPANT_EDGE_NS: Uuid = Uuid::from_u128(0x8f3d_64a1_52cc_4c0e_9b1f_02e7_51b6_d4aa);

/// Derive the identifier of the visual edge binding `entity` into
/// `interaction`. v5 over the concatenated pair, so every client derives
/// the same edge id for the same binding.
pub fn participant_edge_id(interaction: ElementId, entity: ElementId) -> Uuid {
    let mut name = [0u8; 32];
    name[..16].copy_from_slice(interaction.as_bytes());
    name[16..].copy_from_slice(entity.as_bytes());
    Uuid::new_v5(&PARTICIPANT_EDGE_NS, &name)
}

/// Transient overlay styling layered on an element by the edit-highlight
/// animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub color: String,
    pub opacity: f64,
}

/// A visual node: an entity or interaction projected into the view.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    /// Rendered position; written by drags, glide animations and hydration.
    pub position: Point2D<f64>,
    /// The local user is actively manipulating this node.
    pub grabbed: bool,
    /// Participant count, maintained for interaction nodes.
    pub arity: usize,
    pub associated: bool,
    pub modification: Option<String>,
    /// Transient opacity override; `None` means stylesheet default.
    pub opacity: Option<f64>,
    pub overlay: Option<Overlay>,
}

/// A visual edge: one participant binding.
#[derive(Debug, Clone)]
pub struct ViewEdge {
    pub id: Uuid,
    pub interaction: ElementId,
    pub entity: ElementId,
    pub ptype: ParticipantType,
    pub opacity: Option<f64>,
    pub overlay: Option<Overlay>,
}

/// View-originated events, drained by the sync layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Grab { id: ElementId },
    Drag { id: ElementId },
    Automove { id: ElementId },
    Free { id: ElementId },
    LayoutStop,
}

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("no view node for element {0}")]
    MissingNode(ElementId),
    #[error("no view edge {0}")]
    MissingEdge(Uuid),
    #[error("view node {0} already exists")]
    DuplicateNode(ElementId),
    #[error("view edge {0} already exists")]
    DuplicateEdge(Uuid),
}

/// Camera state: pan/zoom plus the viewport it projects into.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub pan: Vector2D<f64>,
    pub zoom: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub viewport: Size2D<f64>,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            pan: Vector2D::zero(),
            zoom: 1.0,
            zoom_min: 0.1,
            zoom_max: 10.0,
            viewport: Size2D::new(800.0, 600.0),
        }
    }

    /// Clamp a zoom value to the allowed range
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.zoom_min, self.zoom_max)
    }

    /// Convert a rendered (screen) position into board space.
    pub fn to_board(&self, rendered: Point2D<f64>) -> Point2D<f64> {
        Point2D::new(
            (rendered.x - self.pan.x) / self.zoom,
            (rendered.y - self.pan.y) / self.zoom,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// The visual graph and its presentational state.
pub struct BoardView {
    inner: StableGraph<ViewNode, ViewEdge, Directed>,
    node_keys: HashMap<ElementId, NodeKey>,
    edge_keys: HashMap<Uuid, EdgeKey>,
    selection: HashSet<Uuid>,
    events: Vec<ViewEvent>,
    pub camera: Camera,
    /// Set when the document is not editable; drags are ignored.
    locked: bool,
}

impl BoardView {
    pub fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            node_keys: HashMap::new(),
            edge_keys: HashMap::new(),
            selection: HashSet::new(),
            events: Vec::new(),
            camera: Camera::new(),
            locked: false,
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn has_node(&self, id: ElementId) -> bool {
        self.node_keys.contains_key(&id)
    }

    pub fn has_edge(&self, id: Uuid) -> bool {
        self.edge_keys.contains_key(&id)
    }

    pub fn node(&self, id: ElementId) -> Result<&ViewNode, ViewError> {
        let key = self.node_key(id)?;
        self.inner
            .node_weight(key)
            .ok_or(ViewError::MissingNode(id))
    }

    pub fn node_mut(&mut self, id: ElementId) -> Result<&mut ViewNode, ViewError> {
        let key = self.node_key(id)?;
        self.inner
            .node_weight_mut(key)
            .ok_or(ViewError::MissingNode(id))
    }

    pub fn edge(&self, id: Uuid) -> Result<&ViewEdge, ViewError> {
        let key = self.edge_key(id)?;
        self.inner
            .edge_weight(key)
            .ok_or(ViewError::MissingEdge(id))
    }

    pub fn edge_mut(&mut self, id: Uuid) -> Result<&mut ViewEdge, ViewError> {
        let key = self.edge_key(id)?;
        self.inner
            .edge_weight_mut(key)
            .ok_or(ViewError::MissingEdge(id))
    }

    pub fn node_key(&self, id: ElementId) -> Result<NodeKey, ViewError> {
        self.node_keys
            .get(&id)
            .copied()
            .ok_or(ViewError::MissingNode(id))
    }

    pub fn edge_key(&self, id: Uuid) -> Result<EdgeKey, ViewError> {
        self.edge_keys
            .get(&id)
            .copied()
            .ok_or(ViewError::MissingEdge(id))
    }

    pub fn node_ids(&self) -> Vec<ElementId> {
        self.node_keys.keys().copied().collect()
    }

    /// Materialize a visual node for a document element.
    pub fn add_node(
        &mut self,
        id: ElementId,
        kind: ElementKind,
        name: &str,
        position: Point2D<f64>,
    ) -> Result<NodeKey, ViewError> {
        if self.node_keys.contains_key(&id) {
            return Err(ViewError::DuplicateNode(id));
        }
        let key = self.inner.add_node(ViewNode {
            id,
            kind,
            name: name.to_string(),
            position,
            grabbed: false,
            arity: 0,
            associated: false,
            modification: None,
            opacity: None,
            overlay: None,
        });
        self.node_keys.insert(id, key);
        Ok(key)
    }

    /// Materialize the visual edge for one participant binding. Direction
    /// is interaction → entity.
    pub fn add_participant_edge(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
    ) -> Result<Uuid, ViewError> {
        let id = participant_edge_id(interaction, entity);
        if self.edge_keys.contains_key(&id) {
            return Err(ViewError::DuplicateEdge(id));
        }
        let from = self.node_key(interaction)?;
        let to = self.node_key(entity)?;
        let key = self.inner.add_edge(
            from,
            to,
            ViewEdge {
                id,
                interaction,
                entity,
                ptype,
                opacity: None,
                overlay: None,
            },
        );
        self.edge_keys.insert(id, key);
        Ok(id)
    }

    /// Identifiers of all edges connected to a node.
    pub fn connected_edge_ids(&self, id: ElementId) -> Vec<Uuid> {
        let Ok(key) = self.node_key(id) else {
            return Vec::new();
        };
        self.inner
            .edges(key)
            .map(|e| e.weight().id)
            .chain(
                self.inner
                    .edges_directed(key, petgraph::Direction::Incoming)
                    .map(|e| e.weight().id),
            )
            .collect()
    }

    /// The visual edge between two nodes, in either direction.
    pub fn edge_between(&self, a: ElementId, b: ElementId) -> Option<Uuid> {
        let id = participant_edge_id(a, b);
        if self.edge_keys.contains_key(&id) {
            return Some(id);
        }
        let id = participant_edge_id(b, a);
        self.edge_keys.contains_key(&id).then_some(id)
    }

    /// Physically remove an element (node or edge) from the view. Removing
    /// a node also removes its connected edges. Returns the ids actually
    /// detached; detaching an absent id is a no-op.
    pub fn detach(&mut self, id: Uuid) -> Vec<Uuid> {
        let mut removed = Vec::new();
        if let Some(key) = self.node_keys.remove(&id) {
            for edge_id in self
                .inner
                .edges(key)
                .map(|e| e.weight().id)
                .chain(
                    self.inner
                        .edges_directed(key, petgraph::Direction::Incoming)
                        .map(|e| e.weight().id),
                )
                .collect::<Vec<_>>()
            {
                if let Some(edge_key) = self.edge_keys.remove(&edge_id) {
                    self.inner.remove_edge(edge_key);
                    self.selection.remove(&edge_id);
                    removed.push(edge_id);
                }
            }
            self.inner.remove_node(key);
            self.selection.remove(&id);
            removed.push(id);
        } else if let Some(key) = self.edge_keys.remove(&id) {
            self.inner.remove_edge(key);
            self.selection.remove(&id);
            removed.push(id);
        }
        removed
    }

    /// Re-key a node after a document identity swap. Edge endpoints and
    /// derived edge ids are rebuilt by the sync layer.
    pub fn rekey_node(&mut self, old_id: ElementId, new_id: ElementId) -> Result<(), ViewError> {
        let key = self
            .node_keys
            .remove(&old_id)
            .ok_or(ViewError::MissingNode(old_id))?;
        if self.node_keys.contains_key(&new_id) {
            self.node_keys.insert(old_id, key);
            return Err(ViewError::DuplicateNode(new_id));
        }
        self.node_keys.insert(new_id, key);
        if let Some(node) = self.inner.node_weight_mut(key) {
            node.id = new_id;
        }
        if self.selection.remove(&old_id) {
            self.selection.insert(new_id);
        }
        Ok(())
    }

    // -- interaction surface driven by the embedding --

    /// The local user started manipulating a node.
    pub fn grab(&mut self, id: ElementId) -> Result<(), ViewError> {
        self.node_mut(id)?.grabbed = true;
        self.events.push(ViewEvent::Grab { id });
        Ok(())
    }

    /// A drag frame: write the rendered position and queue the event.
    /// Ignored while the view is locked.
    pub fn drag(&mut self, id: ElementId, position: Point2D<f64>) -> Result<(), ViewError> {
        if self.locked {
            return Ok(());
        }
        self.node_mut(id)?.position = position;
        self.events.push(ViewEvent::Drag { id });
        Ok(())
    }

    /// A programmatic move of a node (layout step, constraint solver).
    pub fn automove(&mut self, id: ElementId, position: Point2D<f64>) -> Result<(), ViewError> {
        self.node_mut(id)?.position = position;
        self.events.push(ViewEvent::Automove { id });
        Ok(())
    }

    /// The local user released a node.
    pub fn release(&mut self, id: ElementId) -> Result<(), ViewError> {
        self.node_mut(id)?.grabbed = false;
        self.events.push(ViewEvent::Free { id });
        Ok(())
    }

    /// An algorithmic layout finished moving nodes.
    pub fn layout_stopped(&mut self) {
        self.events.push(ViewEvent::LayoutStop);
    }

    /// Drain all pending view events, oldest first.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Write or clear the transient overlay on a node or edge.
    pub fn set_overlay(&mut self, id: Uuid, overlay: Option<Overlay>) -> Result<(), ViewError> {
        if self.has_node(id) {
            self.node_mut(id)?.overlay = overlay;
            Ok(())
        } else {
            self.edge_mut(id)?.overlay = overlay;
            Ok(())
        }
    }

    /// Write or clear the transient opacity override on a node or edge.
    pub fn set_opacity(&mut self, id: Uuid, opacity: Option<f64>) -> Result<(), ViewError> {
        if self.has_node(id) {
            self.node_mut(id)?.opacity = opacity;
            Ok(())
        } else {
            self.edge_mut(id)?.opacity = opacity;
            Ok(())
        }
    }

    /// Whether any element (node or edge) with this id is present.
    pub fn has_element(&self, id: Uuid) -> bool {
        self.has_node(id) || self.has_edge(id)
    }

    // -- selection --

    pub fn select(&mut self, id: Uuid) -> Result<(), ViewError> {
        if !self.node_keys.contains_key(&id) && !self.edge_keys.contains_key(&id) {
            return Err(ViewError::MissingNode(id));
        }
        self.selection.insert(id);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection.extend(self.node_keys.keys().copied());
        self.selection.extend(self.edge_keys.keys().copied());
    }

    pub fn unselect_all(&mut self) {
        self.selection.clear();
    }

    pub fn selected(&self) -> Vec<Uuid> {
        self.selection.iter().copied().collect()
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selection.contains(&id)
    }

    // -- camera --

    /// Fit the camera to the node bounding box plus padding. No-op on an
    /// empty view.
    pub fn fit(&mut self, padding: f64) {
        let mut nodes = self.inner.node_weights();
        let Some(first) = nodes.next() else {
            return;
        };
        let mut min = first.position;
        let mut max = first.position;
        for node in nodes {
            min.x = min.x.min(node.position.x);
            min.y = min.y.min(node.position.y);
            max.x = max.x.max(node.position.x);
            max.y = max.y.max(node.position.y);
        }
        let width = (max.x - min.x) + 2.0 * padding;
        let height = (max.y - min.y) + 2.0 * padding;
        let zoom_x = self.camera.viewport.width / width.max(1.0);
        let zoom_y = self.camera.viewport.height / height.max(1.0);
        let zoom = self.camera.clamp(zoom_x.min(zoom_y));
        let center_x = (min.x + max.x) / 2.0;
        let center_y = (min.y + max.y) / 2.0;
        self.camera.zoom = zoom;
        self.camera.pan = Vector2D::new(
            self.camera.viewport.width / 2.0 - center_x * zoom,
            self.camera.viewport.height / 2.0 - center_y * zoom,
        );
    }
}

impl Default for BoardView {
    fn default() -> Self {
        Self::new()
    }
}
