/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Authoritative hypergraph document model.
//!
//! Core structures:
//! - `Document`: owns the element table and the pending change-event queue
//! - `DocElement`: entity or interaction, with logical position and metadata
//! - `DocEvent`: typed change event, tagged with its `ChangeOrigin`
//!
//! Boundary: every mutation funnels through one origin-tagged core per
//! operation. Remote wire messages enter through `apply_remote` only; the
//! sync layer is the single consumer that branches on origin.

use std::collections::HashMap;
use std::time::Instant;

use euclid::default::Point2D;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable element identity, shared between document and view.
pub type ElementId = Uuid;

/// Whether an element is a primary item or a relationship node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Entity,
    Interaction,
}

/// Sign of a participant binding within an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantType {
    #[default]
    Unsigned,
    Positive,
    Negative,
}

/// A binding of one entity into one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub entity: ElementId,
    pub ptype: ParticipantType,
}

/// Ground-truth association attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub external_id: String,
}

/// Who caused a document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// This client: a view write-back or a programmatic operation.
    Local,
    /// Another client, delivered over the transport.
    Remote,
}

/// An element of the document: entity or interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DocElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    pub description: String,
    pub position: Point2D<f64>,
    pub association: Option<Association>,
    pub modification: Option<String>,
    /// Participant bindings; always empty for entities.
    pub participants: Vec<Participant>,
    /// When this element entered the document on this client. `None` for
    /// hydrated elements, which must not replay creation animations.
    pub created_at: Option<Instant>,
}

impl DocElement {
    pub fn is_interaction(&self) -> bool {
        self.kind == ElementKind::Interaction
    }

    /// Participant count.
    pub fn arity(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, entity: ElementId) -> bool {
        self.participants.iter().any(|p| p.entity == entity)
    }
}

/// Serializable element shape used for hydration and the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSeed {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub position: [f64; 2],
    #[serde(default)]
    pub association: Option<Association>,
    #[serde(default)]
    pub modification: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl ElementSeed {
    pub fn entity(id: ElementId, name: &str, position: Point2D<f64>) -> Self {
        Self {
            id,
            kind: ElementKind::Entity,
            name: name.to_string(),
            description: String::new(),
            position: [position.x, position.y],
            association: None,
            modification: None,
            participants: Vec::new(),
        }
    }

    pub fn interaction(id: ElementId, position: Point2D<f64>) -> Self {
        Self {
            kind: ElementKind::Interaction,
            ..Self::entity(id, "", position)
        }
    }

    fn into_element(self, created_at: Option<Instant>) -> DocElement {
        DocElement {
            id: self.id,
            kind: self.kind,
            name: self.name,
            description: self.description,
            position: Point2D::new(self.position[0], self.position[1]),
            association: self.association,
            modification: self.modification,
            participants: if self.kind == ElementKind::Interaction {
                self.participants
            } else {
                Vec::new()
            },
            created_at,
        }
    }
}

/// A document mutation received over the transport, already decoded by the
/// embedding. Applied via [`Document::apply_remote`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteChange {
    Add { seed: ElementSeed },
    Remove { id: ElementId },
    Rename { id: ElementId, name: String },
    Reposition { id: ElementId, position: [f64; 2] },
    Describe { id: ElementId, description: String },
    Associate { id: ElementId, association: Association },
    Unassociate { id: ElementId },
    Modify { id: ElementId, modification: Option<String> },
    AddParticipant {
        interaction: ElementId,
        entity: ElementId,
        #[serde(default)]
        ptype: ParticipantType,
    },
    RemoveParticipant {
        interaction: ElementId,
        entity: ElementId,
    },
    RetypeParticipant {
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
    },
}

/// Typed change event emitted by the document.
///
/// One event per mutation, tagged with origin. A remote mutation emits the
/// same event kind as the local one would, with `origin: Remote`; there is
/// no parallel event vocabulary to keep in sync.
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    Added { id: ElementId, origin: ChangeOrigin },
    Removed { id: ElementId, origin: ChangeOrigin },
    Renamed { id: ElementId, origin: ChangeOrigin },
    Repositioned { id: ElementId, origin: ChangeOrigin },
    Described { id: ElementId, origin: ChangeOrigin },
    Associated { id: ElementId, origin: ChangeOrigin },
    Unassociated { id: ElementId, origin: ChangeOrigin },
    Modified { id: ElementId, origin: ChangeOrigin },
    ParticipantAdded {
        interaction: ElementId,
        entity: ElementId,
        origin: ChangeOrigin,
    },
    ParticipantRemoved {
        interaction: ElementId,
        entity: ElementId,
        origin: ChangeOrigin,
    },
    ParticipantRetyped {
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
        origin: ChangeOrigin,
    },
    /// Local identity swap after a creation round-trip confirms a
    /// server-assigned id.
    Replaced {
        old_id: ElementId,
        new_id: ElementId,
    },
    /// The document finished hydrating from its store.
    Loaded,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no element {0} in document")]
    UnknownElement(ElementId),
    #[error("element {0} already present")]
    DuplicateElement(ElementId),
    #[error("element {0} is not an interaction")]
    NotAnInteraction(ElementId),
    #[error("element {0} is not an entity")]
    NotAnEntity(ElementId),
    #[error("entity {entity} is already a participant of interaction {interaction}")]
    DuplicateParticipant {
        interaction: ElementId,
        entity: ElementId,
    },
    #[error("entity {entity} is not a participant of interaction {interaction}")]
    UnknownParticipant {
        interaction: ElementId,
        entity: ElementId,
    },
}

/// The authoritative document: single source of truth for structure and
/// logical position.
#[derive(Debug)]
pub struct Document {
    elements: HashMap<ElementId, DocElement>,
    events: Vec<DocEvent>,
    filled: bool,
    editable: bool,
}

impl Document {
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            events: Vec::new(),
            filled: false,
            editable: true,
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&DocElement> {
        self.elements.get(&id)
    }

    pub fn has(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &DocElement> {
        self.elements.values()
    }

    pub fn interactions(&self) -> impl Iterator<Item = &DocElement> {
        self.elements.values().filter(|el| el.is_interaction())
    }

    /// Interactions that currently bind `entity`.
    pub fn interactions_containing(&self, entity: ElementId) -> Vec<ElementId> {
        self.interactions()
            .filter(|intn| intn.has_participant(entity))
            .map(|intn| intn.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the document has been populated (hydrated or non-empty).
    pub fn filled(&self) -> bool {
        self.filled || !self.elements.is_empty()
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Drain all pending change events, oldest first.
    pub fn take_events(&mut self) -> Vec<DocEvent> {
        std::mem::take(&mut self.events)
    }

    /// Populate the document wholesale from its store. Emits a single
    /// `Loaded` event; hydrated elements carry no creation timestamp, so
    /// projection will not replay creation animations for them.
    pub fn hydrate(&mut self, seeds: Vec<ElementSeed>) {
        for seed in seeds {
            let element = seed.into_element(None);
            self.elements.insert(element.id, element);
        }
        self.filled = true;
        self.events.push(DocEvent::Loaded);
    }

    /// Add an element. `now` stamps the creation time used by the
    /// projection's recency window.
    pub fn add(&mut self, seed: ElementSeed, now: Instant) -> Result<ElementId, ModelError> {
        self.add_with_origin(seed, now, ChangeOrigin::Local)
    }

    fn add_with_origin(
        &mut self,
        seed: ElementSeed,
        now: Instant,
        origin: ChangeOrigin,
    ) -> Result<ElementId, ModelError> {
        let id = seed.id;
        if self.elements.contains_key(&id) {
            return Err(ModelError::DuplicateElement(id));
        }
        self.elements.insert(id, seed.into_element(Some(now)));
        self.events.push(DocEvent::Added { id, origin });
        Ok(id)
    }

    /// Remove an element. Idempotent: removing an absent element has no
    /// observable effect and reports `false`.
    pub fn remove(&mut self, id: ElementId) -> bool {
        self.remove_with_origin(id, ChangeOrigin::Local)
    }

    fn remove_with_origin(&mut self, id: ElementId, origin: ChangeOrigin) -> bool {
        if self.elements.remove(&id).is_none() {
            return false;
        }
        self.events.push(DocEvent::Removed { id, origin });
        true
    }

    pub fn rename(&mut self, id: ElementId, name: &str) -> Result<(), ModelError> {
        self.rename_with_origin(id, name, ChangeOrigin::Local)
    }

    fn rename_with_origin(
        &mut self,
        id: ElementId,
        name: &str,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.name = name.to_string();
        self.events.push(DocEvent::Renamed { id, origin });
        Ok(())
    }

    pub fn reposition(&mut self, id: ElementId, position: Point2D<f64>) -> Result<(), ModelError> {
        self.reposition_with_origin(id, position, ChangeOrigin::Local)
    }

    fn reposition_with_origin(
        &mut self,
        id: ElementId,
        position: Point2D<f64>,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.position = position;
        self.events.push(DocEvent::Repositioned { id, origin });
        Ok(())
    }

    pub fn describe(&mut self, id: ElementId, description: &str) -> Result<(), ModelError> {
        self.describe_with_origin(id, description, ChangeOrigin::Local)
    }

    fn describe_with_origin(
        &mut self,
        id: ElementId,
        description: &str,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.description = description.to_string();
        self.events.push(DocEvent::Described { id, origin });
        Ok(())
    }

    pub fn associate(
        &mut self,
        id: ElementId,
        association: Association,
    ) -> Result<(), ModelError> {
        self.associate_with_origin(id, association, ChangeOrigin::Local)
    }

    fn associate_with_origin(
        &mut self,
        id: ElementId,
        association: Association,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.association = Some(association);
        self.events.push(DocEvent::Associated { id, origin });
        Ok(())
    }

    pub fn unassociate(&mut self, id: ElementId) -> Result<(), ModelError> {
        self.unassociate_with_origin(id, ChangeOrigin::Local)
    }

    fn unassociate_with_origin(
        &mut self,
        id: ElementId,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.association = None;
        self.events.push(DocEvent::Unassociated { id, origin });
        Ok(())
    }

    pub fn modify(
        &mut self,
        id: ElementId,
        modification: Option<String>,
    ) -> Result<(), ModelError> {
        self.modify_with_origin(id, modification, ChangeOrigin::Local)
    }

    fn modify_with_origin(
        &mut self,
        id: ElementId,
        modification: Option<String>,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let el = self.element_mut(id)?;
        el.modification = modification;
        self.events.push(DocEvent::Modified { id, origin });
        Ok(())
    }

    /// Bind an entity into an interaction. Duplicate bindings between the
    /// same pair are forbidden.
    pub fn add_participant(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
    ) -> Result<(), ModelError> {
        self.add_participant_with_origin(interaction, entity, ptype, ChangeOrigin::Local)
    }

    fn add_participant_with_origin(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        match self.elements.get(&entity) {
            None => return Err(ModelError::UnknownElement(entity)),
            Some(el) if el.is_interaction() => return Err(ModelError::NotAnEntity(entity)),
            Some(_) => {},
        }
        let intn = self.interaction_mut(interaction)?;
        if intn.has_participant(entity) {
            return Err(ModelError::DuplicateParticipant {
                interaction,
                entity,
            });
        }
        intn.participants.push(Participant { entity, ptype });
        self.events.push(DocEvent::ParticipantAdded {
            interaction,
            entity,
            origin,
        });
        Ok(())
    }

    /// Unbind an entity from an interaction. An interaction whose arity
    /// drops to one or zero is not meaningful and is removed synchronously
    /// before this returns.
    pub fn remove_participant(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
    ) -> Result<(), ModelError> {
        self.remove_participant_with_origin(interaction, entity, ChangeOrigin::Local)
    }

    fn remove_participant_with_origin(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let intn = self.interaction_mut(interaction)?;
        let before = intn.participants.len();
        intn.participants.retain(|p| p.entity != entity);
        if intn.participants.len() == before {
            return Err(ModelError::UnknownParticipant {
                interaction,
                entity,
            });
        }
        let arity = intn.participants.len();
        self.events.push(DocEvent::ParticipantRemoved {
            interaction,
            entity,
            origin,
        });
        if arity <= 1 {
            self.remove_with_origin(interaction, origin);
        }
        Ok(())
    }

    pub fn retype_participant(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
    ) -> Result<(), ModelError> {
        self.retype_participant_with_origin(interaction, entity, ptype, ChangeOrigin::Local)
    }

    fn retype_participant_with_origin(
        &mut self,
        interaction: ElementId,
        entity: ElementId,
        ptype: ParticipantType,
        origin: ChangeOrigin,
    ) -> Result<(), ModelError> {
        let intn = self.interaction_mut(interaction)?;
        let Some(participant) = intn.participants.iter_mut().find(|p| p.entity == entity) else {
            return Err(ModelError::UnknownParticipant {
                interaction,
                entity,
            });
        };
        participant.ptype = ptype;
        self.events.push(DocEvent::ParticipantRetyped {
            interaction,
            entity,
            ptype,
            origin,
        });
        Ok(())
    }

    /// Swap an element's identity in place, e.g. after the creation
    /// round-trip assigns a confirmed id. Participant references held by
    /// interactions are rewritten to the new id.
    pub fn replace_id(
        &mut self,
        old_id: ElementId,
        new_id: ElementId,
    ) -> Result<(), ModelError> {
        if self.elements.contains_key(&new_id) {
            return Err(ModelError::DuplicateElement(new_id));
        }
        let Some(mut element) = self.elements.remove(&old_id) else {
            return Err(ModelError::UnknownElement(old_id));
        };
        element.id = new_id;
        self.elements.insert(new_id, element);
        for el in self.elements.values_mut() {
            for participant in el.participants.iter_mut() {
                if participant.entity == old_id {
                    participant.entity = new_id;
                }
            }
        }
        self.events.push(DocEvent::Replaced { old_id, new_id });
        Ok(())
    }

    /// Apply a mutation received over the transport. Routes to the same
    /// mutation core as the local operations, tagged `Remote`.
    pub fn apply_remote(&mut self, change: RemoteChange, now: Instant) -> Result<(), ModelError> {
        let origin = ChangeOrigin::Remote;
        match change {
            RemoteChange::Add { seed } => {
                self.add_with_origin(seed, now, origin)?;
                Ok(())
            },
            RemoteChange::Remove { id } => {
                self.remove_with_origin(id, origin);
                Ok(())
            },
            RemoteChange::Rename { id, name } => self.rename_with_origin(id, &name, origin),
            RemoteChange::Reposition { id, position } => {
                self.reposition_with_origin(id, Point2D::new(position[0], position[1]), origin)
            },
            RemoteChange::Describe { id, description } => {
                self.describe_with_origin(id, &description, origin)
            },
            RemoteChange::Associate { id, association } => {
                self.associate_with_origin(id, association, origin)
            },
            RemoteChange::Unassociate { id } => self.unassociate_with_origin(id, origin),
            RemoteChange::Modify { id, modification } => {
                self.modify_with_origin(id, modification, origin)
            },
            RemoteChange::AddParticipant {
                interaction,
                entity,
                ptype,
            } => self.add_participant_with_origin(interaction, entity, ptype, origin),
            RemoteChange::RemoveParticipant {
                interaction,
                entity,
            } => self.remove_participant_with_origin(interaction, entity, origin),
            RemoteChange::RetypeParticipant {
                interaction,
                entity,
                ptype,
            } => self.retype_participant_with_origin(interaction, entity, ptype, origin),
        }
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut DocElement, ModelError> {
        self.elements
            .get_mut(&id)
            .ok_or(ModelError::UnknownElement(id))
    }

    fn interaction_mut(&mut self, id: ElementId) -> Result<&mut DocElement, ModelError> {
        let el = self.element_mut(id)?;
        if !el.is_interaction() {
            return Err(ModelError::NotAnInteraction(id));
        }
        Ok(el)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
