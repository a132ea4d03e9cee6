/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios for the board editor core, driven through
//! `BoardApp::pump` with explicit time.

mod harness;

mod bootstrap;
mod gestures;
mod lifecycle;
mod position_sync;
