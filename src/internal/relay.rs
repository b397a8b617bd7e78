/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Push relay.
//!
//! Turns incoming push messages into visible notifications, suppressing
//! them while a client window is focused unless the sender insists, and
//! renews the subscription when the platform reports it expired.

use serde::Deserialize;

use crate::error::{PushError, Result};
use crate::internal::communications::Connection;
use crate::internal::platform::{ClientRegistry, Notifier, PushPlatform, PushSubscription};

/// The payload carried by a push message.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PushPayload {
    pub title: String,
    pub body: String,

    /// Show the notification even when a client window is focused.
    #[serde(default)]
    pub always_show: bool,
}

const RENEWAL_FAILED_TITLE: &str = "Push notifications interrupted";
const RENEWAL_FAILED_BODY: &str =
    "Your push subscription could not be renewed. Notifications may not arrive until you open the app again.";

pub struct PushRelay<P, Cl, N, Co> {
    platform: P,
    clients: Cl,
    notifier: N,
    connection: Co,
}

impl<P: PushPlatform, Cl: ClientRegistry, N: Notifier, Co: Connection> PushRelay<P, Cl, N, Co> {
    pub fn new(platform: P, clients: Cl, notifier: N, connection: Co) -> Self {
        PushRelay {
            platform,
            clients,
            notifier,
            connection,
        }
    }

    /// Handle one push message. Returns whether a notification was shown.
    pub fn handle_push(&self, raw: &[u8]) -> Result<bool> {
        let payload: PushPayload = serde_json::from_slice(raw)?;
        self.dispatch(&payload)
    }

    /// Show a payload, unless a focused window makes it redundant. The
    /// title and body go to the platform verbatim.
    pub fn dispatch(&self, payload: &PushPayload) -> Result<bool> {
        // A failed focus query can't prove a window is visible, and a
        // redundant notification beats a dropped one.
        let focused = match self.clients.has_focused_client() {
            Ok(focused) => focused,
            Err(e) => {
                log::warn!("focused-client query failed: {}", e);
                false
            }
        };
        if focused && !payload.always_show {
            log::debug!("suppressing '{}': a client window is focused", payload.title);
            return Ok(false);
        }
        self.notifier
            .show_notification(&payload.title, &payload.body)
            .map_err(|e| PushError::NotificationError(e.to_string()))?;
        Ok(true)
    }

    /// Handle platform-initiated subscription expiry: re-subscribe with
    /// the old subscription's options and bring the server up to date. If
    /// the chain fails the user gets a single error notification, since
    /// silently losing push delivery is worse than a spurious alert.
    pub fn handle_subscription_change(&mut self, old: &PushSubscription) -> Result<PushSubscription> {
        match self.renew_subscription(old) {
            Ok(renewed) => Ok(renewed),
            Err(e) => {
                log::warn!("subscription renewal failed: {}", e);
                if let Err(notify_err) = self
                    .notifier
                    .show_notification(RENEWAL_FAILED_TITLE, RENEWAL_FAILED_BODY)
                {
                    log::warn!("could not show renewal failure notice: {}", notify_err);
                }
                Err(e)
            }
        }
    }

    fn renew_subscription(&mut self, old: &PushSubscription) -> Result<PushSubscription> {
        let renewed = self
            .platform
            .subscribe(&old.options)
            .map_err(|e| PushError::SubscribeFailed(e.to_string()))?;
        log::info!("renewed expired subscription: {}", renewed.info.endpoint);
        // The server keys removal by endpoint, so unregistering the fresh
        // endpoint first only clears any stale entry for it.
        self.connection
            .unregister(&renewed.info)
            .map_err(|e| PushError::ServerUnregisterFailed(e.to_string()))?;
        self.connection
            .register(&renewed.info)
            .map_err(|e| PushError::ServerRegisterFailed(e.to_string()))?;
        Ok(renewed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::internal::communications::MockConnection;
    use crate::internal::platform::{
        MockClientRegistry, MockNotifier, MockPushPlatform, SubscribeOptions,
    };
    use crate::{KeyInfo, SubscriptionInfo};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn payload(always_show: bool) -> PushPayload {
        PushPayload {
            title: "New message".to_string(),
            body: "hello there".to_string(),
            always_show,
        }
    }

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            info: SubscriptionInfo {
                endpoint: endpoint.to_string(),
                keys: KeyInfo {
                    auth: "auth".to_string(),
                    p256dh: "p256dh".to_string(),
                },
            },
            options: SubscribeOptions {
                user_visible_only: true,
                application_server_key: vec![4, 2],
            },
        }
    }

    fn relay_with(
        clients: MockClientRegistry,
        notifier: MockNotifier,
    ) -> PushRelay<MockPushPlatform, MockClientRegistry, MockNotifier, MockConnection> {
        PushRelay::new(
            MockPushPlatform::new(),
            clients,
            notifier,
            MockConnection::new(),
        )
    }

    fn focused(result: bool) -> MockClientRegistry {
        let mut clients = MockClientRegistry::new();
        clients
            .expect_has_focused_client()
            .returning(move || Ok(result));
        clients
    }

    #[test]
    fn focused_window_suppresses_notification() {
        // The notifier has no expectations, so showing anything panics.
        let relay = relay_with(focused(true), MockNotifier::new());
        assert!(!relay.dispatch(&payload(false)).unwrap());
    }

    #[test]
    fn always_show_overrides_focused_window() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_notification()
            .with(eq("New message"), eq("hello there"))
            .times(1)
            .returning(|_, _| Ok(()));
        let relay = relay_with(focused(true), notifier);
        assert!(relay.dispatch(&payload(true)).unwrap());
    }

    #[test]
    fn unfocused_always_shows() {
        for always_show in [false, true] {
            let mut notifier = MockNotifier::new();
            notifier
                .expect_show_notification()
                .times(1)
                .returning(|_, _| Ok(()));
            let relay = relay_with(focused(false), notifier);
            assert!(relay.dispatch(&payload(always_show)).unwrap());
        }
    }

    #[test]
    fn failed_focus_query_still_shows() {
        let mut clients = MockClientRegistry::new();
        clients
            .expect_has_focused_client()
            .returning(|| Err(PushError::GeneralError("no client registry".to_string())));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_notification()
            .times(1)
            .returning(|_, _| Ok(()));
        let relay = relay_with(clients, notifier);
        assert!(relay.dispatch(&payload(false)).unwrap());
    }

    #[test]
    fn handle_push_parses_wire_payload() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_notification()
            .with(eq("hi"), eq("there"))
            .times(1)
            .returning(|_, _| Ok(()));
        let relay = relay_with(focused(false), notifier);
        let shown = relay
            .handle_push(br#"{"title": "hi", "body": "there"}"#)
            .unwrap();
        assert!(shown);
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        let relay = relay_with(MockClientRegistry::new(), MockNotifier::new());
        let err = relay.handle_push(b"{\"title\": 3}").unwrap_err();
        assert!(matches!(err, PushError::JsonError(_)));
    }

    #[test]
    fn display_failure_propagates() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_notification()
            .times(1)
            .returning(|_, _| Err(PushError::GeneralError("denied".to_string())));
        let relay = relay_with(focused(false), notifier);
        let err = relay.dispatch(&payload(false)).unwrap_err();
        assert!(matches!(err, PushError::NotificationError(_)));
    }

    #[test]
    fn subscription_change_renews_then_syncs_server() {
        let old = subscription("https://push.example.org/old");
        let renewed = subscription("https://push.example.org/new");

        let mut seq = Sequence::new();
        let mut platform = MockPushPlatform::new();
        let renewed_clone = renewed.clone();
        platform
            .expect_subscribe()
            .withf(move |options| *options == old.options)
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(renewed_clone.clone()));
        let mut connection = MockConnection::new();
        connection
            .expect_unregister()
            .withf(|info| info.endpoint == "https://push.example.org/new")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        connection
            .expect_register()
            .withf(|info| info.endpoint == "https://push.example.org/new")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut relay = PushRelay::new(
            platform,
            MockClientRegistry::new(),
            MockNotifier::new(),
            connection,
        );
        let old = subscription("https://push.example.org/old");
        let result = relay.handle_subscription_change(&old).unwrap();
        assert_eq!(result.info.endpoint, "https://push.example.org/new");
    }

    #[test]
    fn failed_renewal_chain_shows_exactly_one_error_notification() {
        // Fail at each step of the chain in turn; every variant must
        // produce exactly one user-visible error notification.
        for failing_step in ["subscribe", "unregister", "register"] {
            let mut platform = MockPushPlatform::new();
            let mut connection = MockConnection::new();
            if failing_step == "subscribe" {
                platform
                    .expect_subscribe()
                    .times(1)
                    .returning(|_| Err(PushError::GeneralError("no push service".to_string())));
            } else {
                platform
                    .expect_subscribe()
                    .times(1)
                    .returning(|_| Ok(subscription("https://push.example.org/new")));
                if failing_step == "unregister" {
                    connection.expect_unregister().times(1).returning(|_| {
                        Err(PushError::CommunicationError("offline".to_string()))
                    });
                } else {
                    connection.expect_unregister().times(1).returning(|_| Ok(()));
                    connection.expect_register().times(1).returning(|_| {
                        Err(PushError::CommunicationError("offline".to_string()))
                    });
                }
            }
            let mut notifier = MockNotifier::new();
            notifier
                .expect_show_notification()
                .with(eq(RENEWAL_FAILED_TITLE), eq(RENEWAL_FAILED_BODY))
                .times(1)
                .returning(|_, _| Ok(()));

            let mut relay =
                PushRelay::new(platform, MockClientRegistry::new(), notifier, connection);
            let err = relay
                .handle_subscription_change(&subscription("https://push.example.org/old"))
                .unwrap_err();
            match failing_step {
                "subscribe" => assert!(matches!(err, PushError::SubscribeFailed(_))),
                "unregister" => assert!(matches!(err, PushError::ServerUnregisterFailed(_))),
                _ => assert!(matches!(err, PushError::ServerRegisterFailed(_))),
            }
        }
    }

    #[test]
    fn error_notification_failure_is_swallowed() {
        let mut platform = MockPushPlatform::new();
        platform
            .expect_subscribe()
            .times(1)
            .returning(|_| Err(PushError::GeneralError("no push service".to_string())));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_show_notification()
            .times(1)
            .returning(|_, _| Err(PushError::GeneralError("denied".to_string())));
        let mut relay = PushRelay::new(
            platform,
            MockClientRegistry::new(),
            notifier,
            MockConnection::new(),
        );
        // The original chain error wins over the notification failure.
        let err = relay
            .handle_subscription_change(&subscription("https://push.example.org/old"))
            .unwrap_err();
        assert!(matches!(err, PushError::SubscribeFailed(_)));
    }
}
