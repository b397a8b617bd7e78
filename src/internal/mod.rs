/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

pub mod cache;
pub mod communications;
pub mod config;
pub mod keys;
pub mod platform;
pub mod push_manager;
pub mod relay;

pub use config::{CacheConfiguration, PushConfiguration};
pub use push_manager::PushManager;
