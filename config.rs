/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Recognized options for the board editor core.
//!
//! All durations are milliseconds. A debounce interval of zero disables
//! debouncing for that direction and applies queued positions on the next
//! pump. Defaults mirror the shipped editor behaviour; overrides come from
//! an embedding-provided TOML fragment.

use serde::{Deserialize, Serialize};

use crate::sync::animator::Easing;

/// Tunable options consumed across the sync core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardOptions {
    /// Overlay colour applied during the edit-highlight animation (CSS hex).
    pub edit_animation_color: String,

    /// Peak overlay opacity of the edit-highlight animation.
    pub edit_animation_opacity: f64,

    /// Total duration of the edit-highlight ramp (up then down), ms.
    pub edit_animation_duration_ms: u64,

    /// Easing for the edit-highlight ramp.
    pub edit_animation_easing: Easing,

    /// Duration of the animated transition applied to remote repositions, ms.
    pub position_animation_duration_ms: u64,

    /// Easing for remote reposition transitions.
    pub position_animation_easing: Easing,

    /// Duration of creation/removal fades, ms. Interaction nodes are held
    /// for this long instead of fading.
    pub add_rm_animation_duration_ms: u64,

    /// Easing for creation/removal fades.
    pub add_rm_animation_easing: Easing,

    /// View→model position debounce interval, ms. Zero applies immediately.
    pub position_debounce_ms: u64,

    /// Model→view position debounce interval, ms. Zero applies immediately.
    pub doc_position_debounce_ms: u64,

    /// Elements created within this window of their projection are animated
    /// in; older elements are hydrated silently, ms.
    pub fresh_element_window_ms: u64,

    /// Padding around the graph bounding box for fit-to-view, board units.
    pub fit_padding: f64,

    /// Render-space position where new elements are placed.
    pub new_element_position: [f64; 2],

    /// Vertical offset applied per successive new element.
    pub new_element_shift: f64,

    /// Number of shifts before placement wraps back to the base position.
    pub new_element_max_shifts: u32,

    /// Positions closer than this are treated as equal.
    pub position_epsilon: f64,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            edit_animation_color: "#ffc65d".to_string(),
            edit_animation_opacity: 0.25,
            edit_animation_duration_ms: 1000,
            edit_animation_easing: Easing::Ease,
            position_animation_duration_ms: 500,
            position_animation_easing: Easing::Ease,
            add_rm_animation_duration_ms: 550,
            add_rm_animation_easing: Easing::Ease,
            position_debounce_ms: 250,
            doc_position_debounce_ms: 1000,
            fresh_element_window_ms: 5000,
            fit_padding: 50.0,
            new_element_position: [75.0, 75.0],
            new_element_shift: 45.0,
            new_element_max_shifts: 8,
            position_epsilon: 1e-4,
        }
    }
}

impl BoardOptions {
    /// Parse options from a TOML fragment, falling back to defaults for
    /// absent keys.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
