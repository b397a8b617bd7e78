/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Subscription bridge, the page-side entrypoint of the component.
//!
//! Exposes a struct [`PushManager`] that owns the last-known subscription
//! state for this installation and keeps the companion server in sync
//! with the platform push manager.
//!
//! The [`PushManager`] allows users to:
//! - Query whether a subscription is currently believed to be active
//! - Tear down and recreate the subscription, registering the new
//!   endpoint with the server
//! - Make sure the user has granted notification display permission
//!
//! Construction requires the ready platform handle and captures any
//! existing subscription right away, so callers never observe a
//! half-initialized bridge.

use crate::error::{PushError, Result};
use crate::internal::communications::Connection;
use crate::internal::keys;
use crate::internal::platform::{
    NotificationPermission, Notifier, PushPlatform, PushSubscription, SubscribeOptions,
};
use crate::SubscriptionInfo;

pub struct PushManager<Co, P, N> {
    connection: Co,
    platform: P,
    notifier: N,
    // Last-known subscription. A cached pointer, not the source of truth:
    // the platform can invalidate it asynchronously via expiry.
    subscription: Option<PushSubscription>,
}

impl<Co: Connection, P: PushPlatform, N: Notifier> PushManager<Co, P, N> {
    pub fn new(connection: Co, platform: P, notifier: N) -> Result<Self> {
        let subscription = platform.get_subscription()?;
        log::debug!(
            "bridge initialized, existing subscription: {}",
            subscription.is_some()
        );
        Ok(Self {
            connection,
            platform,
            notifier,
            subscription,
        })
    }

    /// Whether a subscription is believed to be active. Pure query: this
    /// reflects the state captured at construction or after the last
    /// [`PushManager::resubscribe`], never the platform's live state.
    pub fn get_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// The wire data of the cached subscription, if any.
    pub fn subscription_info(&self) -> Option<&SubscriptionInfo> {
        self.subscription.as_ref().map(|s| &s.info)
    }

    /// Ask for notification display permission if not already granted.
    /// `Denied` is a valid answer, not an error.
    pub fn ensure_permission(&mut self) -> Result<NotificationPermission> {
        match self.notifier.permission() {
            NotificationPermission::Granted => Ok(NotificationPermission::Granted),
            _ => self.notifier.request_permission(),
        }
    }

    /// Create a fresh subscription, tearing down any existing one first so
    /// the server never holds two live registrations for this client.
    ///
    /// Sequencing within one call is strict: unsubscribe, unregister the
    /// old endpoint, subscribe, register the new endpoint. Each step maps
    /// its failure to a dedicated error kind so callers can tell what
    /// broke.
    pub fn resubscribe(&mut self) -> Result<SubscriptionInfo> {
        let encoded = self
            .connection
            .vapid_public_key()
            .map_err(|e| PushError::KeyFetchFailed(e.to_string()))?;
        let server_key = keys::decode_application_server_key(&encoded)?;

        // The platform, not our cache, decides whether something needs
        // tearing down first.
        if let Some(current) = self.platform.get_subscription()? {
            self.platform
                .unsubscribe(&current)
                .map_err(|e| PushError::UnsubscribeFailed(e.to_string()))?;
            // The platform-side teardown succeeded, so the cached
            // reference is stale no matter what the server says next.
            self.subscription = None;
            log::debug!("unsubscribed '{}'", current.info.endpoint);
            self.connection
                .unregister(&current.info)
                .map_err(|e| PushError::ServerUnregisterFailed(e.to_string()))?;
        }

        let options = SubscribeOptions {
            user_visible_only: true,
            application_server_key: server_key,
        };
        let subscription = self
            .platform
            .subscribe(&options)
            .map_err(|e| PushError::SubscribeFailed(e.to_string()))?;
        log::info!("subscribed '{}'", subscription.info.endpoint);
        self.connection
            .register(&subscription.info)
            .map_err(|e| PushError::ServerRegisterFailed(e.to_string()))?;

        let info = subscription.info.clone();
        self.subscription = Some(subscription);
        Ok(info)
    }
}
