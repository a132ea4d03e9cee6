/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command/signal bus between the editor core and chrome components.
//!
//! Chrome (toolbars, tooltips, keyboard handlers) talks to the core with
//! `BusCommand`s, drained at the top of each pump; the core talks back with
//! `BusSignal`s, consumed whenever the chrome polls. Both sides are plain
//! unbounded channels, so the bus never blocks the single-threaded pump.

use crossbeam_channel::{Receiver, Sender, unbounded};
use euclid::default::Point2D;
use uuid::Uuid;

use crate::model::ElementId;

/// Requests from chrome into the core.
#[derive(Debug, Clone, PartialEq)]
pub enum BusCommand {
    /// Add an entity, optionally at a rendered (screen) position (the
    /// add-at-mouse path).
    AddElement { position: Option<Point2D<f64>> },
    /// Add a bare interaction node.
    AddInteraction { position: Option<Point2D<f64>> },
    RemoveSelected,
    /// Live rename keystrokes, already debounced by the input widget.
    RenameDebounce { id: ElementId, name: String },
    Layout,
    Fit,
    DrawToggle,
}

/// Notifications from the core out to chrome.
#[derive(Debug, Clone, PartialEq)]
pub enum BusSignal {
    DrawOn,
    DrawOff,
    /// Any draw-handle widget attached to this element must be dropped.
    RemoveHandle { id: Uuid },
    /// Any tooltip referencing this element must close; `None` closes all.
    CloseTip { id: Option<Uuid> },
    /// Chrome should run its layout over the view.
    LayoutRequested,
    FitRequested,
}

/// The two-way bus. Cheap to clone; clones share the same channels.
#[derive(Clone)]
pub struct Bus {
    command_tx: Sender<BusCommand>,
    command_rx: Receiver<BusCommand>,
    signal_tx: Sender<BusSignal>,
    signal_rx: Receiver<BusSignal>,
}

impl Bus {
    pub fn new() -> Self {
        let (command_tx, command_rx) = unbounded();
        let (signal_tx, signal_rx) = unbounded();
        Self {
            command_tx,
            command_rx,
            signal_tx,
            signal_rx,
        }
    }

    /// Chrome side: request an operation.
    pub fn send(&self, command: BusCommand) {
        let _ = self.command_tx.send(command);
    }

    /// Core side: drain all pending commands.
    pub fn drain_commands(&self) -> Vec<BusCommand> {
        self.command_rx.try_iter().collect()
    }

    /// Core side: emit a signal to chrome.
    pub fn emit(&self, signal: BusSignal) {
        let _ = self.signal_tx.send(signal);
    }

    /// Chrome side: drain all pending signals.
    pub fn drain_signals(&self) -> Vec<BusSignal> {
        self.signal_rx.try_iter().collect()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
