/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debounced coalescing of high-frequency position events into
//! low-frequency writes.
//!
//! Two independent one-directional queues: view→model (drag frames,
//! automove) and model→view (remote repositions). Each queue is a set keyed
//! by element identity, so only the latest pending position per element
//! survives a flush, and each carries trailing-edge debounce state: every
//! enqueue resets the deadline, and the queue drains once the deadline
//! passes. Time is an explicit parameter throughout, never an ambient timer.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::model::ElementId;

/// One trailing-edge debounce queue.
#[derive(Debug)]
pub struct DebounceQueue {
    pending: HashSet<ElementId>,
    deadline: Option<Instant>,
    interval: Duration,
}

impl DebounceQueue {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: HashSet::new(),
            deadline: None,
            interval,
        }
    }

    /// Queue an element. Resets (never stacks) the flush deadline; a zero
    /// interval makes the queue due immediately.
    pub fn enqueue(&mut self, id: ElementId, now: Instant) {
        self.pending.insert(id);
        self.deadline = Some(now + self.interval);
    }

    /// Remove a queued element, e.g. when it leaves the document before the
    /// flush fires.
    pub fn forget(&mut self, id: ElementId) {
        self.pending.remove(&id);
    }

    /// Drain the queue if its deadline has passed. Each drained element
    /// appears exactly once.
    pub fn take_due(&mut self, now: Instant) -> Vec<ElementId> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.drain().collect()
            },
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.pending.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// The two-directional position batcher.
#[derive(Debug)]
pub struct PositionBatcher {
    /// Drag/automove frames waiting to be written into the model.
    pub view_to_doc: DebounceQueue,
    /// Remote repositions waiting to be applied to the view.
    pub doc_to_view: DebounceQueue,
}

impl PositionBatcher {
    pub fn new(view_to_doc_interval: Duration, doc_to_view_interval: Duration) -> Self {
        Self {
            view_to_doc: DebounceQueue::new(view_to_doc_interval),
            doc_to_view: DebounceQueue::new(doc_to_view_interval),
        }
    }

    /// Drop any queued work for an element, both directions.
    pub fn forget(&mut self, id: ElementId) {
        self.view_to_doc.forget(id);
        self.doc_to_view.forget(id);
    }
}
