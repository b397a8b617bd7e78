/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Seams for the browser-owned capabilities this crate delegates to.
//!
//! Everything in this module is ultimately implemented by the host
//! environment: Cache Storage, the Push API, the Notifications API, the
//! window client registry and the fetch stack. The traits are synchronous
//! facades over the host's own async plumbing; a host shim resolves the
//! underlying promise before returning. Each trait is auto-mocked so the
//! managers layered on top can be tested without a browser.

use crate::error::Result;
use crate::SubscriptionInfo;

/// A response as handed back by the platform fetch stack or replayed from
/// the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The options handed to a platform subscribe call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub user_visible_only: bool,

    /// Raw bytes of the application server (VAPID) public key.
    pub application_server_key: Vec<u8>,
}

/// An active platform push subscription, together with the options it was
/// created from. The options are kept because subscription expiry requires
/// re-subscribing with the exact same options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushSubscription {
    pub info: SubscriptionInfo,
    pub options: SubscribeOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationPermission {
    Default,
    Granted,
    Denied,
}

/// The platform network stack.
#[cfg_attr(test, mockall::automock)]
pub trait FetchClient {
    /// Issue a GET through the platform fetch path.
    fn get(&self, url: &str) -> Result<Response>;

    /// POST a JSON body with a `Content-type: application/json` header.
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response>;
}

/// The platform's persistent request/response store.
#[cfg_attr(test, mockall::automock)]
pub trait CacheStorage {
    /// Store a response in the named cache, creating the cache if absent.
    fn put(&mut self, cache_name: &str, url: &str, response: Response) -> Result<()>;

    /// Look up a cached response for the given URL.
    fn match_url(&self, cache_name: &str, url: &str) -> Result<Option<Response>>;
}

/// The platform push manager owning the actual subscription state.
#[cfg_attr(test, mockall::automock)]
pub trait PushPlatform {
    /// The currently active subscription, if any.
    fn get_subscription(&self) -> Result<Option<PushSubscription>>;

    fn subscribe(&mut self, options: &SubscribeOptions) -> Result<PushSubscription>;

    /// Returns whether a subscription was actually dropped.
    fn unsubscribe(&mut self, subscription: &PushSubscription) -> Result<bool>;
}

/// The worker-global registry of window clients.
#[cfg_attr(test, mockall::automock)]
pub trait ClientRegistry {
    /// Whether any window-type client currently has input focus. Must
    /// consider clients not yet controlled by this worker version.
    fn has_focused_client(&self) -> Result<bool>;
}

/// The platform notification surface.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn show_notification(&self, title: &str, body: &str) -> Result<()>;

    fn permission(&self) -> NotificationPermission;

    /// Prompt the user for display permission. Resolves to the resulting
    /// permission state; a refusal is a state, not an error.
    fn request_permission(&mut self) -> Result<NotificationPermission>;
}
