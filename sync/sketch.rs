/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Translation of a completed edge-drawing gesture into document mutations.
//!
//! The gesture layer hands over the source node plus the provisional nodes
//! and edges sketched before release. Everything provisional is discarded
//! here; accepted gestures are expressed purely as document mutations, and
//! the regular add pipeline regenerates the permanent visual elements.
//!
//! A single binary edge-drawing primitive expresses two intents:
//! - source is an interaction → each sketched edge binds one more entity
//!   into that existing interaction
//! - source is an entity → each provisional node becomes a brand-new
//!   interaction; sketched edges bind entities (including the source) into
//!   the interaction owned by the provisional node they touch, and any
//!   leftover edge connects the source entity to an existing interaction

use std::collections::HashSet;
use std::time::Instant;

use euclid::default::Point2D;
use uuid::Uuid;

use crate::model::{Document, ElementId, ElementSeed, ParticipantType};

/// An endpoint of a sketched edge: either a live element or one of the
/// gesture's own provisional nodes, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchAnchor {
    Existing(ElementId),
    Provisional(usize),
}

/// A provisional node sketched during the gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchNode {
    pub position: Point2D<f64>,
}

/// A provisional edge sketched during the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchEdge {
    pub from: SketchAnchor,
    pub to: SketchAnchor,
}

impl SketchEdge {
    /// The endpoint that is not `anchor`, if `anchor` is one of the two.
    fn other(&self, anchor: SketchAnchor) -> Option<SketchAnchor> {
        if self.from == anchor {
            Some(self.to)
        } else if self.to == anchor {
            Some(self.from)
        } else {
            None
        }
    }

    fn touches_provisional(&self) -> Option<usize> {
        match (self.from, self.to) {
            (SketchAnchor::Provisional(i), _) => Some(i),
            (_, SketchAnchor::Provisional(i)) => Some(i),
            _ => None,
        }
    }
}

/// A completed edge-drawing gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub source: ElementId,
    pub nodes: Vec<SketchNode>,
    pub edges: Vec<SketchEdge>,
}

/// Why a gesture produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The two endpoints are already linked through an interaction.
    DuplicateInteractionLink,
    SelfLoop,
    /// The source element is not in the document.
    UnknownSource,
    /// An endpoint could not be resolved to the kind the gesture needs.
    UnresolvableEndpoint,
    /// The document is read-only for this client.
    NotEditable,
}

/// Result of translating a gesture. `Rejected` means the gesture layer
/// should render no edge; it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchOutcome {
    Rejected(RejectReason),
    Applied {
        new_interactions: Vec<ElementId>,
        /// (interaction, entity) pairs bound by this gesture.
        bindings: Vec<(ElementId, ElementId)>,
    },
}

/// Translate a completed sketch into document mutations.
///
/// Validation happens up front: a gesture containing any disallowed edge is
/// rejected atomically, before any mutation is issued.
pub fn translate(doc: &mut Document, sketch: &Sketch, now: Instant) -> SketchOutcome {
    let Some(source) = doc.get(sketch.source) else {
        log::debug!("sketch source {} not in document", sketch.source);
        return SketchOutcome::Rejected(RejectReason::UnknownSource);
    };
    let source_is_interaction = source.is_interaction();

    if let Some(reason) = validate(doc, sketch, source_is_interaction) {
        return SketchOutcome::Rejected(reason);
    }

    if source_is_interaction {
        bind_into_existing(doc, sketch)
    } else {
        build_new_interactions(doc, sketch, now)
    }
}

/// Reject-before-mutate pass over every sketched edge.
fn validate(doc: &Document, sketch: &Sketch, source_is_interaction: bool) -> Option<RejectReason> {
    for edge in &sketch.edges {
        match (edge.from, edge.to) {
            (SketchAnchor::Existing(a), SketchAnchor::Existing(b)) => {
                if a == b {
                    return Some(RejectReason::SelfLoop);
                }
                let (Some(el_a), Some(el_b)) = (doc.get(a), doc.get(b)) else {
                    return Some(RejectReason::UnresolvableEndpoint);
                };
                // an interaction endpoint that already binds the other end
                // means this edge would duplicate a relationship
                let duplicate = (el_a.is_interaction() && el_a.has_participant(b))
                    || (el_b.is_interaction() && el_b.has_participant(a));
                if duplicate {
                    return Some(RejectReason::DuplicateInteractionLink);
                }
                if source_is_interaction {
                    // the non-source endpoint must resolve to an entity
                    match edge.other(SketchAnchor::Existing(sketch.source)) {
                        Some(SketchAnchor::Existing(id))
                            if doc.get(id).is_some_and(|el| el.is_interaction()) =>
                        {
                            return Some(RejectReason::UnresolvableEndpoint);
                        },
                        Some(_) => {},
                        None => return Some(RejectReason::UnresolvableEndpoint),
                    }
                } else if !el_a.is_interaction() && !el_b.is_interaction() {
                    // entity source: an edge between two existing entities
                    // can only be the leftover "source → new interaction"
                    // shape, which these are not
                    return Some(RejectReason::UnresolvableEndpoint);
                }
            },
            (SketchAnchor::Provisional(_), SketchAnchor::Provisional(_)) => {
                return Some(RejectReason::UnresolvableEndpoint);
            },
            (SketchAnchor::Provisional(i), SketchAnchor::Existing(other))
            | (SketchAnchor::Existing(other), SketchAnchor::Provisional(i)) => {
                if source_is_interaction || i >= sketch.nodes.len() {
                    return Some(RejectReason::UnresolvableEndpoint);
                }
                let Some(el) = doc.get(other) else {
                    return Some(RejectReason::UnresolvableEndpoint);
                };
                if el.is_interaction() {
                    return Some(RejectReason::UnresolvableEndpoint);
                }
            },
        }
    }
    None
}

/// Source is an interaction: every sketched edge binds one more entity.
fn bind_into_existing(doc: &mut Document, sketch: &Sketch) -> SketchOutcome {
    let mut bindings = Vec::new();
    for edge in &sketch.edges {
        let Some(SketchAnchor::Existing(entity)) =
            edge.other(SketchAnchor::Existing(sketch.source))
        else {
            continue;
        };
        match doc.add_participant(sketch.source, entity, ParticipantType::default()) {
            Ok(()) => bindings.push((sketch.source, entity)),
            Err(err) => {
                log::warn!("sketch binding {entity} into {} failed: {err}", sketch.source);
            },
        }
    }
    SketchOutcome::Applied {
        new_interactions: Vec::new(),
        bindings,
    }
}

/// Source is an entity: provisional nodes become new interactions; edges
/// bind participants.
fn build_new_interactions(doc: &mut Document, sketch: &Sketch, now: Instant) -> SketchOutcome {
    let mut new_interactions = Vec::with_capacity(sketch.nodes.len());
    let mut bindings = Vec::new();

    // (a) one new interaction per provisional node, at that node's position
    for node in &sketch.nodes {
        let seed = ElementSeed::interaction(Uuid::new_v4(), node.position);
        match doc.add(seed, now) {
            Ok(id) => new_interactions.push(id),
            Err(err) => {
                log::warn!("sketch interaction creation failed: {err}");
                return SketchOutcome::Rejected(RejectReason::UnresolvableEndpoint);
            },
        }
    }

    // (b) every edge touching a provisional node binds its other endpoint
    // into that node's interaction
    let mut handled: HashSet<usize> = HashSet::new();
    for (edge_idx, edge) in sketch.edges.iter().enumerate() {
        let Some(node_idx) = edge.touches_provisional() else {
            continue;
        };
        let interaction = new_interactions[node_idx];
        let Some(SketchAnchor::Existing(entity)) = edge.other(SketchAnchor::Provisional(node_idx))
        else {
            continue;
        };
        match doc.add_participant(interaction, entity, ParticipantType::default()) {
            Ok(()) => bindings.push((interaction, entity)),
            Err(err) => log::warn!("sketch binding {entity} into {interaction} failed: {err}"),
        }
        handled.insert(edge_idx);
    }

    // (c) leftover edges connect the source entity to an existing
    // interaction node
    for (edge_idx, edge) in sketch.edges.iter().enumerate() {
        if handled.contains(&edge_idx) {
            continue;
        }
        let Some(SketchAnchor::Existing(other)) = edge.other(SketchAnchor::Existing(sketch.source))
        else {
            continue;
        };
        match doc.add_participant(other, sketch.source, ParticipantType::default()) {
            Ok(()) => bindings.push((other, sketch.source)),
            Err(err) => {
                log::warn!("sketch binding {} into {other} failed: {err}", sketch.source);
            },
        }
    }

    SketchOutcome::Applied {
        new_interactions,
        bindings,
    }
}
