/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

#![allow(unknown_lints)]
#![warn(rust_2018_idioms)]
//! # PWA support component
//!
//! This component backs the offline and [WebPush](https://developer.mozilla.org/en-US/docs/Web/API/Push_API)
//! plumbing of a Progressive Web App: a service-worker side that caches the
//! app's static assets and relays push messages into visible notifications,
//! and a page side that manages the push-subscription lifecycle against the
//! companion application server.
//!
//! ## Background Concepts
//!
//! ### Push subscriptions
//!
//! A push subscription is a platform-issued credential (an endpoint URL
//! plus the `auth`/`p256dh` key pair) identifying where a server may
//! deliver push messages for this client installation. The platform push
//! manager owns the subscription; this component holds only a cached
//! reference, which the platform can invalidate asynchronously by firing a
//! subscription-change event. At most one subscription is active per
//! installation, and every re-subscribe tears down the existing one first
//! so the server never holds two live registrations for the same client.
//!
//! The companion server exposes three endpoints (see
//! [`Connection`]): `GET /vapid_public_key` returning the base64url
//! [VAPID](https://datatracker.ietf.org/doc/html/rfc8292) public key, and
//! `POST /notification/register` / `POST /notification/unregister` taking
//! the subscription's native JSON shape
//! (`{"endpoint": ..., "keys": {"auth": ..., "p256dh": ...}}`).
//!
//! ### Offline assets
//!
//! At install time the worker pre-populates a named platform cache with a
//! fixed manifest of asset paths, all-or-nothing. Requests are then served
//! cache-first; entries are immutable until the cache name changes on the
//! next deploy.
//!
//! ## API
//!
//! The host environment's capabilities (Cache Storage, Push API,
//! Notifications, window clients, fetch) are injected through the traits
//! in [`platform`]; a thin host shim implements them over the actual
//! browser bindings.
//!
//! Page side:
//!
//! ```ignore
//! let connection = ConnectHttp::new(config, fetch);
//! let bridge = PushBridge::new(connection, push_platform, notifier)?;
//! if bridge.ensure_permission()? == NotificationPermission::Granted {
//!     match bridge.resubscribe() {
//!         Ok(info) => log::info!("subscribed at {}", info.endpoint),
//!         Err(e) => log::warn!("subscription failed: {}", e),
//!     }
//! }
//! ```
//!
//! Worker side, with each platform event routed to the matching handler:
//!
//! ```ignore
//! let worker = ServiceWorker::new(offline_cache, push_relay);
//! // install event:
//! worker.handle_install()?;
//! // fetch event:
//! let response = worker.handle_fetch(&request_url)?;
//! // push event:
//! worker.handle_push(&payload_bytes)?;
//! // pushsubscriptionchange event:
//! worker.handle_subscription_change(&old_subscription)?;
//! ```

mod error;
// All implementation detail lives in the `internal` module
mod internal;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub use error::{PushError, Result};
pub use internal::cache::OfflineCache;
pub use internal::communications::{ConnectHttp, Connection};
pub use internal::config::{CacheConfiguration, Protocol, PushConfiguration};
pub use internal::keys::decode_application_server_key;
pub use internal::platform;
pub use internal::platform::{
    CacheStorage, ClientRegistry, FetchClient, NotificationPermission, Notifier, PushPlatform,
    PushSubscription, Response, SubscribeOptions,
};
pub use internal::relay::{PushPayload, PushRelay};

/// Key information of a subscription. Encoded as base64url, the way the
/// platform reports it and the server expects it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyInfo {
    pub auth: String,
    pub p256dh: String,
}

/// Subscription information: the endpoint senders deliver push messages to
/// and the key information used to encrypt payloads for it. Serializes to
/// the subscription's native JSON shape.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub endpoint: String,
    pub keys: KeyInfo,
}

/// Object representing the page-side subscription bridge
///
/// The `PushBridge` object is the main page-facing interface of this
/// crate. It owns the last-known subscription state and keeps the
/// companion server in sync with the platform push manager.
pub struct PushBridge<Co, P, N> {
    // We serialize all access on a mutex for thread safety
    internal: Mutex<internal::PushManager<Co, P, N>>,
}

impl<Co: Connection, P: PushPlatform, N: Notifier> PushBridge<Co, P, N> {
    /// Creates a new [`PushBridge`], capturing any existing subscription
    /// from the platform.
    ///
    /// # Errors
    /// Returns an error if the platform query for the existing
    /// subscription fails.
    pub fn new(connection: Co, platform: P, notifier: N) -> Result<Self> {
        Ok(Self {
            internal: Mutex::new(internal::PushManager::new(connection, platform, notifier)?),
        })
    }

    /// Whether a subscription is believed to be active.
    ///
    /// Pure query: reflects only the state captured at construction or by
    /// the last [`PushBridge::resubscribe`], never the platform's live
    /// state.
    pub fn get_subscription(&self) -> bool {
        self.internal.lock().unwrap().get_subscription()
    }

    /// The wire data of the cached subscription, if any.
    pub fn subscription_info(&self) -> Option<SubscriptionInfo> {
        self.internal.lock().unwrap().subscription_info().cloned()
    }

    /// Ask for notification display permission if not already granted.
    ///
    /// # Returns
    /// The resulting permission state; `Denied` is a state, not an error.
    ///
    /// # Errors
    /// Returns an error only if the platform prompt itself fails.
    pub fn ensure_permission(&self) -> Result<NotificationPermission> {
        self.internal.lock().unwrap().ensure_permission()
    }

    /// Tear down any existing subscription, create a fresh one and
    /// register its endpoint with the companion server.
    ///
    /// # Returns
    /// The new subscription's wire data.
    ///
    /// # Errors
    /// Each step maps its failure to a dedicated [`PushError`] kind:
    /// [`PushError::KeyFetchFailed`], [`PushError::KeyDecodeFailed`],
    /// [`PushError::UnsubscribeFailed`],
    /// [`PushError::ServerUnregisterFailed`],
    /// [`PushError::SubscribeFailed`] and
    /// [`PushError::ServerRegisterFailed`].
    pub fn resubscribe(&self) -> Result<SubscriptionInfo> {
        self.internal.lock().unwrap().resubscribe()
    }
}

/// Object representing the worker side of the component
///
/// Routes the platform's `install`, `fetch`, `push` and
/// `pushsubscriptionchange` events to the offline cache and the push
/// relay. The host shim is expected to construct one of these when the
/// worker starts and call the matching handler from each event listener.
pub struct ServiceWorker<C, F, P, Cl, N, Co> {
    cache: Mutex<OfflineCache<C, F>>,
    relay: Mutex<PushRelay<P, Cl, N, Co>>,
}

impl<C, F, P, Cl, N, Co> ServiceWorker<C, F, P, Cl, N, Co>
where
    C: CacheStorage,
    F: FetchClient,
    P: PushPlatform,
    Cl: ClientRegistry,
    N: Notifier,
    Co: Connection,
{
    pub fn new(cache: OfflineCache<C, F>, relay: PushRelay<P, Cl, N, Co>) -> Self {
        Self {
            cache: Mutex::new(cache),
            relay: Mutex::new(relay),
        }
    }

    /// Pre-populate the asset cache. All-or-nothing: on error the install
    /// must be treated as failed so the worker does not activate with a
    /// partially populated cache.
    pub fn handle_install(&self) -> Result<()> {
        self.cache.lock().unwrap().install()
    }

    /// Serve a request cache-first, falling through to the network on a
    /// miss.
    pub fn handle_fetch(&self, url: &str) -> Result<Response> {
        self.cache.lock().unwrap().handle_fetch(url)
    }

    /// Relay one push message.
    ///
    /// # Returns
    /// Whether a notification was shown (`false` means it was suppressed
    /// because a client window is focused and the payload did not set
    /// `always_show`).
    pub fn handle_push(&self, raw: &[u8]) -> Result<bool> {
        self.relay.lock().unwrap().handle_push(raw)
    }

    /// Handle subscription expiry: re-subscribe with the old
    /// subscription's options and bring the server up to date. On failure
    /// the user gets a single error notification before the error is
    /// returned.
    pub fn handle_subscription_change(&self, old: &PushSubscription) -> Result<PushSubscription> {
        self.relay.lock().unwrap().handle_subscription_change(old)
    }
}
