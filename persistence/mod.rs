/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Document store collaborator: load/create/synchronize a document.
//!
//! The core never talks to the wire or a database directly. It drives this
//! trait during bootstrap and reacts to the events the document emits. The
//! bundled `MemoryStore` backs tests and demos; real embeddings provide
//! their own implementation over their transport.

use thiserror::Error;

use crate::model::ElementSeed;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// The document does not exist yet; bootstrap falls back to `create`.
    #[error("document does not exist")]
    Missing,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence/transport collaborator consumed by the bootstrap sequence.
///
/// Ordering contract: `load` or `create` completes before `synch(true)`,
/// which completes before the editor advertises itself as usable.
pub trait DocumentStore {
    /// Fetch the stored document. `StoreError::Missing` when it has never
    /// been created.
    fn load(&mut self) -> Result<Vec<ElementSeed>, StoreError>;

    /// Create an empty document.
    fn create(&mut self) -> Result<(), StoreError>;

    /// Enable or disable the live synchronization stream.
    fn synch(&mut self, enable: bool) -> Result<(), StoreError>;
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub seeds: Option<Vec<ElementSeed>>,
    pub created: bool,
    pub synched: bool,
    pub fail_create: bool,
    /// Call order, recorded for bootstrap-sequence assertions.
    pub calls: Vec<&'static str>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_seeds(seeds: Vec<ElementSeed>) -> Self {
        Self {
            seeds: Some(seeds),
            ..Self::default()
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<ElementSeed>, StoreError> {
        self.calls.push("load");
        self.seeds.clone().ok_or(StoreError::Missing)
    }

    fn create(&mut self) -> Result<(), StoreError> {
        self.calls.push("create");
        if self.fail_create {
            return Err(StoreError::Unavailable("create refused".to_string()));
        }
        self.created = true;
        self.seeds = Some(Vec::new());
        Ok(())
    }

    fn synch(&mut self, enable: bool) -> Result<(), StoreError> {
        self.calls.push("synch");
        self.synched = enable;
        Ok(())
    }
}
