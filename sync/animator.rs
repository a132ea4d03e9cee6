/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-element transient animation sequencing.
//!
//! Each element owns one handle slot per animation kind (edit highlight,
//! create/remove fade, position glide). Starting a kind cancels any running
//! handle in the same slot and restores the element's persistent styling
//! before the replacement begins, so overlapping triggers can never leave an
//! element stuck mid-animation. `tick(now)` advances every handle, writes
//! interpolated style/position into the view, and reports completions that
//! require structural follow-up (a finished removal fade must physically
//! detach the element).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use euclid::default::Point2D;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::view::{BoardView, Overlay};

/// Interpolation curve. `Ease` and `EaseInOut` are analytic approximations
/// of the CSS easings of the same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    Ease,
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in [0, 1] onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Ease => t * t * (3.0 - 2.0 * t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            },
        }
    }
}

/// Independent handle slots per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    EditHighlight,
    Fade,
    Glide,
}

/// What a running handle is doing.
#[derive(Debug, Clone)]
enum Drive {
    /// Overlay opacity ramps 0 → peak → 0 over the full duration.
    EditHighlight {
        color: String,
        peak_opacity: f64,
        easing: Easing,
    },
    /// Opacity 0 → 1, then the override is cleared.
    FadeIn { easing: Easing },
    /// Opacity pinned at 0 for the duration, then the override is cleared.
    /// Used for interaction nodes, which skip the creation ramp.
    Reveal,
    /// Opacity → 0, then the element must be detached.
    FadeOut { easing: Easing },
    /// Opacity pinned at 0, detach after the duration. Used for
    /// interaction nodes on removal.
    RemoveAfter,
    /// Rendered position glides from → to.
    Glide {
        from: Point2D<f64>,
        to: Point2D<f64>,
        easing: Easing,
    },
}

#[derive(Debug, Clone)]
struct Handle {
    drive: Drive,
    started_at: Instant,
    duration: Duration,
}

impl Handle {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Structural follow-up owed after `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A removal fade finished; the element must be physically detached.
    RemovalFinished(Uuid),
}

/// The animation sequencer. One instance serves the whole board.
#[derive(Debug, Default)]
pub struct EditAnimator {
    handles: HashMap<(Uuid, AnimationKind), Handle>,
}

impl EditAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self, id: Uuid, kind: AnimationKind) -> bool {
        self.handles.contains_key(&(id, kind))
    }

    /// Number of live handles, all slots. Exposed for leak tests.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Ramp an overlay up and back down on a node or edge.
    pub fn start_edit_highlight(
        &mut self,
        view: &mut BoardView,
        id: Uuid,
        color: &str,
        peak_opacity: f64,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) {
        if !view.has_element(id) {
            log::debug!("edit highlight for stale element {id}, skipping");
            return;
        }
        self.cancel(view, id, AnimationKind::EditHighlight);
        let _ = view.set_overlay(
            id,
            Some(Overlay {
                color: color.to_string(),
                opacity: 0.0,
            }),
        );
        self.handles.insert(
            (id, AnimationKind::EditHighlight),
            Handle {
                drive: Drive::EditHighlight {
                    color: color.to_string(),
                    peak_opacity,
                    easing,
                },
                started_at: now,
                duration,
            },
        );
    }

    /// Fade a freshly created element in. Interaction nodes skip the ramp
    /// and are revealed after the duration instead.
    pub fn start_creation(
        &mut self,
        view: &mut BoardView,
        id: Uuid,
        interaction_node: bool,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) {
        if !view.has_element(id) {
            log::debug!("creation animation for stale element {id}, skipping");
            return;
        }
        self.cancel(view, id, AnimationKind::Fade);
        let _ = view.set_opacity(id, Some(0.0));
        let drive = if interaction_node {
            Drive::Reveal
        } else {
            Drive::FadeIn { easing }
        };
        self.handles.insert(
            (id, AnimationKind::Fade),
            Handle {
                drive,
                started_at: now,
                duration,
            },
        );
    }

    /// Fade an element out ahead of detachment. Interaction nodes are
    /// hidden immediately and held until the duration passes.
    pub fn start_removal(
        &mut self,
        view: &mut BoardView,
        id: Uuid,
        interaction_node: bool,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) {
        if !view.has_element(id) {
            log::debug!("removal animation for stale element {id}, skipping");
            return;
        }
        self.cancel(view, id, AnimationKind::Fade);
        let drive = if interaction_node {
            let _ = view.set_opacity(id, Some(0.0));
            Drive::RemoveAfter
        } else {
            Drive::FadeOut { easing }
        };
        self.handles.insert(
            (id, AnimationKind::Fade),
            Handle {
                drive,
                started_at: now,
                duration,
            },
        );
    }

    /// Glide a node's rendered position toward a target.
    pub fn start_glide(
        &mut self,
        view: &mut BoardView,
        id: Uuid,
        to: Point2D<f64>,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) {
        let Ok(node) = view.node(id) else {
            log::debug!("position glide for stale node {id}, skipping");
            return;
        };
        let from = node.position;
        self.cancel(view, id, AnimationKind::Glide);
        self.handles.insert(
            (id, AnimationKind::Glide),
            Handle {
                drive: Drive::Glide { from, to, easing },
                started_at: now,
                duration,
            },
        );
    }

    /// Stop a slot and restore clean persistent styling. Safe to call for
    /// idle slots.
    pub fn cancel(&mut self, view: &mut BoardView, id: Uuid, kind: AnimationKind) {
        let Some(handle) = self.handles.remove(&(id, kind)) else {
            return;
        };
        match handle.drive {
            Drive::EditHighlight { .. } => {
                let _ = view.set_overlay(id, None);
            },
            Drive::FadeIn { .. } | Drive::Reveal => {
                let _ = view.set_opacity(id, None);
            },
            // a cancelled removal leaves the element hidden; the
            // replacement removal (the only legal follow-up) re-hides it
            Drive::FadeOut { .. } | Drive::RemoveAfter => {},
            Drive::Glide { .. } => {},
        }
    }

    /// Drop every slot for an element without style restoration. Used when
    /// the element has already been detached from the view.
    pub fn drop_element(&mut self, id: Uuid) {
        self.handles.retain(|(handle_id, _), _| *handle_id != id);
    }

    /// Advance all animations to `now`, writing styles/positions into the
    /// view. Handles whose element vanished are dropped silently.
    pub fn tick(&mut self, view: &mut BoardView, now: Instant) -> Vec<Completion> {
        let mut completions = Vec::new();
        let keys: Vec<(Uuid, AnimationKind)> = self.handles.keys().copied().collect();
        for key in keys {
            let (id, _) = key;
            if !view.has_element(id) {
                log::debug!("animation target {id} vanished, dropping handle");
                self.handles.remove(&key);
                continue;
            }
            let Some(handle) = self.handles.get(&key) else {
                continue;
            };
            let t = handle.progress(now);
            let drive = handle.drive.clone();
            match drive {
                Drive::EditHighlight {
                    color,
                    peak_opacity,
                    easing,
                } => {
                    // up over the first half, back down over the second
                    let opacity = if t < 0.5 {
                        easing.apply(t * 2.0) * peak_opacity
                    } else {
                        (1.0 - easing.apply((t - 0.5) * 2.0)) * peak_opacity
                    };
                    if t >= 1.0 {
                        let _ = view.set_overlay(id, None);
                        self.handles.remove(&key);
                    } else {
                        let _ = view.set_overlay(id, Some(Overlay { color, opacity }));
                    }
                },
                Drive::FadeIn { easing } => {
                    if t >= 1.0 {
                        let _ = view.set_opacity(id, None);
                        self.handles.remove(&key);
                    } else {
                        let _ = view.set_opacity(id, Some(easing.apply(t)));
                    }
                },
                Drive::Reveal => {
                    if t >= 1.0 {
                        let _ = view.set_opacity(id, None);
                        self.handles.remove(&key);
                    }
                },
                Drive::FadeOut { easing } => {
                    if t >= 1.0 {
                        self.handles.remove(&key);
                        completions.push(Completion::RemovalFinished(id));
                    } else {
                        let _ = view.set_opacity(id, Some(1.0 - easing.apply(t)));
                    }
                },
                Drive::RemoveAfter => {
                    if t >= 1.0 {
                        self.handles.remove(&key);
                        completions.push(Completion::RemovalFinished(id));
                    }
                },
                Drive::Glide { from, to, easing } => {
                    let eased = easing.apply(t);
                    let position = Point2D::new(
                        from.x + (to.x - from.x) * eased,
                        from.y + (to.y - from.y) * eased,
                    );
                    if let Ok(node) = view.node_mut(id) {
                        node.position = position;
                    }
                    if t >= 1.0 {
                        self.handles.remove(&key);
                    }
                },
            }
        }
        completions
    }
}
