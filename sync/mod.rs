/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bidirectional synchronization between the document and the view.
//!
//! The `Reconciler` is the single place that decides whether a change
//! originated here or remotely. Remote-origin events are re-applied to the
//! view (wrapped in the edit highlight); local events caused by the view's
//! own writes back into the model are never re-projected, which is what
//! breaks the echo loop. It owns the per-element subscription table, the
//! two-directional position batcher, and the animation sequencer, and it is
//! the only mutator of the document↔view pairing.
//!
//! Everything advances inside `pump(now)`: drain document events, drain
//! view events, flush due position batches, tick animations, detach
//! completed removals.

pub mod animator;
pub mod position_batcher;
pub mod sketch;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use euclid::default::Point2D;
use uuid::Uuid;

use crate::bus::{Bus, BusSignal};
use crate::config::BoardOptions;
use crate::model::{ChangeOrigin, DocElement, DocEvent, Document, ElementId};
use crate::view::{BoardView, ViewEvent, participant_edge_id};
use animator::{AnimationKind, Completion, EditAnimator};
use position_batcher::PositionBatcher;

/// Positions closer than the configured epsilon are the same position.
fn same_pos(a: Point2D<f64>, b: Point2D<f64>, epsilon: f64) -> bool {
    (a.x - b.x).abs() < epsilon && (a.y - b.y).abs() < epsilon
}

/// Per-element subscription entry. Attach and detach must pair exactly
/// once per element lifecycle; the table is how dangling-listener leaks
/// are made structurally impossible.
#[derive(Debug, Clone, Copy)]
struct Subscription {
    attached_at: Instant,
}

pub struct Reconciler {
    options: BoardOptions,
    subscriptions: HashMap<ElementId, Subscription>,
    batcher: PositionBatcher,
    animator: EditAnimator,
}

impl Reconciler {
    pub fn new(options: BoardOptions) -> Self {
        let batcher = PositionBatcher::new(
            Duration::from_millis(options.position_debounce_ms),
            Duration::from_millis(options.doc_position_debounce_ms),
        );
        Self {
            options,
            subscriptions: HashMap::new(),
            batcher,
            animator: EditAnimator::new(),
        }
    }

    /// Live subscription count; attach/detach pairing means this always
    /// equals the number of projected elements.
    pub fn subscribed_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_subscribed(&self, id: ElementId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    /// When the element's listeners were attached, for diagnostics.
    pub fn subscribed_since(&self, id: ElementId) -> Option<Instant> {
        self.subscriptions.get(&id).map(|sub| sub.attached_at)
    }

    /// Live animation handle count, exposed for leak tests.
    pub fn animation_handle_count(&self) -> usize {
        self.animator.handle_count()
    }

    /// Whether a view→model write for this element is still pending.
    pub fn pending_view_write(&self, id: ElementId) -> bool {
        self.batcher.view_to_doc.contains(id)
    }

    /// Whether a model→view update for this element is still pending.
    pub fn pending_view_update(&self, id: ElementId) -> bool {
        self.batcher.doc_to_view.contains(id)
    }

    /// One cooperative scheduling pass.
    pub fn pump(&mut self, doc: &mut Document, view: &mut BoardView, bus: &Bus, now: Instant) {
        for event in doc.take_events() {
            self.handle_doc_event(doc, view, bus, event, now);
        }
        for event in view.take_events() {
            self.handle_view_event(view, event, now);
        }
        self.flush_view_to_doc(doc, view, now);
        self.flush_doc_to_view(doc, view, now);
        for completion in self.animator.tick(view, now) {
            match completion {
                Completion::RemovalFinished(id) => {
                    for removed in view.detach(id) {
                        self.animator.drop_element(removed);
                    }
                },
            }
        }
    }

    fn attach(&mut self, id: ElementId, now: Instant) {
        if self
            .subscriptions
            .insert(id, Subscription { attached_at: now })
            .is_some()
        {
            log::warn!("duplicate subscription attach for {id}");
        }
    }

    fn detach(&mut self, id: ElementId) {
        if self.subscriptions.remove(&id).is_none() {
            log::warn!("subscription detach without attach for {id}");
        }
    }

    fn is_fresh(&self, el: &DocElement, now: Instant) -> bool {
        let window = Duration::from_millis(self.options.fresh_element_window_ms);
        el.created_at
            .is_some_and(|created| now.saturating_duration_since(created) <= window)
    }

    fn edit_highlight(&mut self, view: &mut BoardView, id: Uuid, now: Instant) {
        self.animator.start_edit_highlight(
            view,
            id,
            &self.options.edit_animation_color,
            self.options.edit_animation_opacity,
            Duration::from_millis(self.options.edit_animation_duration_ms),
            self.options.edit_animation_easing,
            now,
        );
    }

    // -- document → view --

    fn handle_doc_event(
        &mut self,
        doc: &mut Document,
        view: &mut BoardView,
        bus: &Bus,
        event: DocEvent,
        now: Instant,
    ) {
        match event {
            DocEvent::Added { id, origin } => self.on_added(doc, view, id, origin, now),
            DocEvent::Removed { id, origin } => self.on_removed(view, bus, id, origin, now),
            DocEvent::Renamed { id, origin } => {
                self.with_projected(doc, view, id, |el, view| {
                    if let Ok(node) = view.node_mut(el.id) {
                        node.name = el.name.clone();
                    }
                });
                if origin == ChangeOrigin::Remote {
                    self.edit_highlight(view, id, now);
                }
            },
            DocEvent::Repositioned { id, origin } => {
                // local repositions are the settled form of this view's own
                // drags; re-projecting them would close the echo loop
                if origin == ChangeOrigin::Remote {
                    self.on_remote_reposition(doc, view, id, now);
                }
            },
            DocEvent::Described { id, origin } => {
                // descriptions have no view counterpart; remote edits still
                // flash the element so collaborators see activity
                if origin == ChangeOrigin::Remote && self.is_subscribed(id) {
                    self.edit_highlight(view, id, now);
                }
            },
            DocEvent::Associated { id, origin } | DocEvent::Unassociated { id, origin } => {
                self.with_projected(doc, view, id, |el, view| {
                    if let Ok(node) = view.node_mut(el.id) {
                        node.associated = el.association.is_some();
                        node.name = el.name.clone();
                    }
                });
                if origin == ChangeOrigin::Remote {
                    self.edit_highlight(view, id, now);
                }
            },
            DocEvent::Modified { id, origin } => {
                self.with_projected(doc, view, id, |el, view| {
                    if let Ok(node) = view.node_mut(el.id) {
                        node.modification = el.modification.clone();
                    }
                });
                if origin == ChangeOrigin::Remote {
                    self.edit_highlight(view, id, now);
                }
            },
            DocEvent::ParticipantAdded {
                interaction,
                entity,
                origin,
            } => self.on_participant_added(doc, view, interaction, entity, origin, now),
            DocEvent::ParticipantRemoved {
                interaction,
                entity,
                ..
            } => self.on_participant_removed(doc, view, interaction, entity, now),
            DocEvent::ParticipantRetyped {
                interaction,
                entity,
                ptype,
                origin,
            } => {
                let edge_id = participant_edge_id(interaction, entity);
                if let Ok(edge) = view.edge_mut(edge_id) {
                    edge.ptype = ptype;
                } else {
                    log::debug!("retype for unprojected binding {interaction}→{entity}");
                    return;
                }
                if origin == ChangeOrigin::Remote {
                    self.edit_highlight(view, edge_id, now);
                }
            },
            DocEvent::Replaced { old_id, new_id } => {
                self.on_replaced(doc, view, old_id, new_id, now);
            },
            DocEvent::Loaded => self.on_load(doc, view, now),
        }
    }

    /// Run a view update for a projected element; stale references are
    /// skipped silently.
    fn with_projected(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        id: ElementId,
        apply: impl FnOnce(&DocElement, &mut BoardView),
    ) {
        if !self.is_subscribed(id) {
            log::debug!("event for unsubscribed element {id}, skipping");
            return;
        }
        let Some(el) = doc.get(id) else {
            log::debug!("event for element {id} gone from document, skipping");
            return;
        };
        apply(el, view);
    }

    fn on_added(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        id: ElementId,
        origin: ChangeOrigin,
        now: Instant,
    ) {
        let Some(el) = doc.get(id) else {
            log::debug!("added element {id} gone before projection, skipping");
            return;
        };
        if let Err(err) = view.add_node(el.id, el.kind, &el.name, el.position) {
            log::warn!("projection of {id} failed: {err}");
            return;
        }
        self.attach(id, now);
        let fresh = self.is_fresh(el, now);
        if let Ok(node) = view.node_mut(id) {
            node.arity = el.arity();
            node.associated = el.association.is_some();
            node.modification = el.modification.clone();
        }
        for participant in el.participants.clone() {
            match view.add_participant_edge(el.id, participant.entity, participant.ptype) {
                Ok(edge_id) if fresh => {
                    self.animator.start_creation(
                        view,
                        edge_id,
                        false,
                        Duration::from_millis(self.options.add_rm_animation_duration_ms),
                        self.options.add_rm_animation_easing,
                        now,
                    );
                },
                Ok(_) => {},
                Err(err) => log::debug!("edge projection for {id} deferred: {err}"),
            }
        }
        if fresh {
            self.animator.start_creation(
                view,
                id,
                el.is_interaction(),
                Duration::from_millis(self.options.add_rm_animation_duration_ms),
                self.options.add_rm_animation_easing,
                now,
            );
        }
        if origin == ChangeOrigin::Remote {
            self.edit_highlight(view, id, now);
        }
    }

    fn on_removed(
        &mut self,
        view: &mut BoardView,
        bus: &Bus,
        id: ElementId,
        origin: ChangeOrigin,
        now: Instant,
    ) {
        if !view.has_node(id) {
            log::debug!("removal of unprojected element {id}, skipping");
            return;
        }
        // closure requests go out synchronously, before any fade starts
        bus.emit(BusSignal::RemoveHandle { id });
        bus.emit(BusSignal::CloseTip { id: Some(id) });
        self.batcher.forget(id);
        self.detach(id);

        let interaction_node = view
            .node(id)
            .map(|node| node.kind == crate::model::ElementKind::Interaction)
            .unwrap_or(false);
        let duration = Duration::from_millis(self.options.add_rm_animation_duration_ms);
        let easing = self.options.add_rm_animation_easing;
        // connected edges leave in the same animated batch
        for edge_id in view.connected_edge_ids(id) {
            self.animator
                .start_removal(view, edge_id, false, duration, easing, now);
        }
        if origin == ChangeOrigin::Remote {
            self.edit_highlight(view, id, now);
        }
        self.animator
            .start_removal(view, id, interaction_node, duration, easing, now);
    }

    fn on_remote_reposition(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        id: ElementId,
        now: Instant,
    ) {
        if !self.is_subscribed(id) {
            log::debug!("remote reposition for unsubscribed element {id}, skipping");
            return;
        }
        let Some(el) = doc.get(id) else {
            return;
        };
        let Ok(node) = view.node(id) else {
            return;
        };
        // local manual control wins over simultaneous remote movement
        if node.grabbed {
            return;
        }
        if same_pos(el.position, node.position, self.options.position_epsilon) {
            return;
        }
        self.batcher.doc_to_view.enqueue(id, now);
    }

    fn on_participant_added(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        interaction: ElementId,
        entity: ElementId,
        origin: ChangeOrigin,
        now: Instant,
    ) {
        let Some(intn) = doc.get(interaction) else {
            log::debug!("participant add on vanished interaction {interaction}, skipping");
            return;
        };
        let Some(participant) = intn.participants.iter().find(|p| p.entity == entity) else {
            return;
        };
        match view.add_participant_edge(interaction, entity, participant.ptype) {
            Ok(edge_id) => {
                if self.is_fresh(intn, now) {
                    self.animator.start_creation(
                        view,
                        edge_id,
                        false,
                        Duration::from_millis(self.options.add_rm_animation_duration_ms),
                        self.options.add_rm_animation_easing,
                        now,
                    );
                }
                if origin == ChangeOrigin::Remote {
                    self.edit_highlight(view, edge_id, now);
                }
            },
            Err(err) => log::debug!("binding projection {interaction}→{entity} skipped: {err}"),
        }
        self.update_arity(doc, view, interaction);
    }

    fn on_participant_removed(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        interaction: ElementId,
        entity: ElementId,
        now: Instant,
    ) {
        let edge_id = participant_edge_id(interaction, entity);
        if view.has_edge(edge_id) {
            self.animator.start_removal(
                view,
                edge_id,
                false,
                Duration::from_millis(self.options.add_rm_animation_duration_ms),
                self.options.add_rm_animation_easing,
                now,
            );
        }
        self.update_arity(doc, view, interaction);
    }

    /// Recompute the arity view attribute from the document. A cascaded
    /// interaction is already gone from the document; its own removal event
    /// takes care of the node.
    fn update_arity(&mut self, doc: &Document, view: &mut BoardView, interaction: ElementId) {
        let Some(intn) = doc.get(interaction) else {
            return;
        };
        if let Ok(node) = view.node_mut(interaction) {
            node.arity = intn.arity();
        }
    }

    fn on_replaced(
        &mut self,
        doc: &Document,
        view: &mut BoardView,
        old_id: ElementId,
        new_id: ElementId,
        now: Instant,
    ) {
        if !self.is_subscribed(old_id) {
            log::debug!("replace of unsubscribed element {old_id}, skipping");
            return;
        }
        // atomic listener swap: the old identity must never linger
        self.detach(old_id);
        self.attach(new_id, now);
        self.batcher.forget(old_id);
        self.animator.drop_element(old_id);

        if let Err(err) = view.rekey_node(old_id, new_id) {
            log::warn!("view rekey {old_id}→{new_id} failed: {err}");
            return;
        }
        // participant-edge ids derive from endpoint ids; rebuild every edge
        // touching the rekeyed node
        for edge_id in view.connected_edge_ids(new_id) {
            view.detach(edge_id);
        }
        if let Some(el) = doc.get(new_id) {
            for participant in el.participants.clone() {
                if let Err(err) =
                    view.add_participant_edge(el.id, participant.entity, participant.ptype)
                {
                    log::debug!("edge rebuild for {new_id} skipped: {err}");
                }
            }
        }
        for intn_id in doc.interactions_containing(new_id) {
            if let Some(intn) = doc.get(intn_id) {
                for participant in intn.participants.clone() {
                    if participant.entity == new_id
                        && let Err(err) =
                            view.add_participant_edge(intn_id, new_id, participant.ptype)
                    {
                        log::debug!("edge rebuild for {new_id} skipped: {err}");
                    }
                }
            }
        }
    }

    /// Full hydration of an already-populated document: nodes first, then
    /// every participant edge, then fit. Hydrated elements carry no recent
    /// creation timestamp, so nothing animates.
    fn on_load(&mut self, doc: &Document, view: &mut BoardView, now: Instant) {
        let elements: Vec<DocElement> = doc.elements().cloned().collect();
        for el in &elements {
            if view.has_node(el.id) {
                continue;
            }
            if let Err(err) = view.add_node(el.id, el.kind, &el.name, el.position) {
                log::warn!("hydration of {} failed: {err}", el.id);
                continue;
            }
            self.attach(el.id, now);
            if let Ok(node) = view.node_mut(el.id) {
                node.arity = el.arity();
                node.associated = el.association.is_some();
                node.modification = el.modification.clone();
            }
        }
        for el in &elements {
            for participant in &el.participants {
                if let Err(err) = view.add_participant_edge(el.id, participant.entity, participant.ptype)
                {
                    log::debug!("hydration edge {}→{} skipped: {err}", el.id, participant.entity);
                }
            }
        }
        view.fit(self.options.fit_padding);
    }

    // -- view → document --

    fn handle_view_event(&mut self, view: &BoardView, event: ViewEvent, now: Instant) {
        match event {
            ViewEvent::Drag { id } | ViewEvent::Automove { id } => {
                self.batcher.view_to_doc.enqueue(id, now);
            },
            ViewEvent::Grab { .. } | ViewEvent::Free { .. } => {},
            ViewEvent::LayoutStop => {
                // algorithmic layouts move many nodes at once; capture them
                // all through the same coalesced path
                for id in view.node_ids() {
                    self.batcher.view_to_doc.enqueue(id, now);
                }
            },
        }
    }

    fn flush_view_to_doc(&mut self, doc: &mut Document, view: &BoardView, now: Instant) {
        for id in self.batcher.view_to_doc.take_due(now) {
            let Ok(node) = view.node(id) else {
                log::debug!("queued position for detached node {id}, skipping");
                continue;
            };
            let Some(el) = doc.get(id) else {
                log::debug!("queued position for removed element {id}, skipping");
                continue;
            };
            if same_pos(el.position, node.position, self.options.position_epsilon) {
                continue;
            }
            if let Err(err) = doc.reposition(id, node.position) {
                log::warn!("position write-back for {id} failed: {err}");
            }
        }
    }

    fn flush_doc_to_view(&mut self, doc: &Document, view: &mut BoardView, now: Instant) {
        for id in self.batcher.doc_to_view.take_due(now) {
            let Some(el) = doc.get(id) else {
                log::debug!("queued remote position for removed element {id}, skipping");
                continue;
            };
            let Ok(node) = view.node(id) else {
                continue;
            };
            if node.grabbed {
                continue;
            }
            if same_pos(el.position, node.position, self.options.position_epsilon) {
                continue;
            }
            self.animator.start_glide(
                view,
                id,
                el.position,
                Duration::from_millis(self.options.position_animation_duration_ms),
                self.options.position_animation_easing,
                now,
            );
            self.edit_highlight(view, id, now);
        }
    }
}
