/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Server communications.
//!
//! Handles talking to the companion application server, which hands out
//! the application server key and records which push endpoints exist for
//! this installation. All traffic goes through the platform fetch seam,
//! since in the host environment that is the only network stack there is.

use url::Url;

use crate::error::{
    self,
    PushError::{CommunicationError, CommunicationServerError},
};
use crate::internal::config::PushConfiguration;
use crate::internal::platform::{FetchClient, Response};
use crate::SubscriptionInfo;

/// A communication link to the companion application server.
#[cfg_attr(test, mockall::automock)]
pub trait Connection {
    /// Fetch the server's base64url-encoded VAPID public key.
    fn vapid_public_key(&self) -> error::Result<String>;

    /// Record a subscription endpoint with the server.
    fn register(&self, subscription: &SubscriptionInfo) -> error::Result<()>;

    /// Remove a subscription endpoint. The server keys removal by
    /// endpoint identity.
    fn unregister(&self, subscription: &SubscriptionInfo) -> error::Result<()>;
}

/// Connect to the application server via the platform fetch stack.
pub struct ConnectHttp<F> {
    options: PushConfiguration,
    fetch: F,
}

impl<F: FetchClient> ConnectHttp<F> {
    pub fn new(options: PushConfiguration, fetch: F) -> Self {
        ConnectHttp { options, fetch }
    }

    fn endpoint_url(&self, path: &str) -> error::Result<Url> {
        let url = format!(
            "{}://{}{}",
            &self.options.http_protocol, &self.options.server_host, path
        );
        Ok(Url::parse(&url)?)
    }

    fn check_response_error(&self, response: &Response) -> error::Result<()> {
        if (500..600).contains(&response.status) {
            return Err(CommunicationServerError(format!(
                "General Server Error {}: {}",
                response.status,
                response.text()
            )));
        }
        if !response.is_success() {
            return Err(CommunicationError(format!(
                "Unhandled client error {}: {}",
                response.status,
                response.text()
            )));
        }
        Ok(())
    }

    fn post_subscription(&self, path: &str, subscription: &SubscriptionInfo) -> error::Result<()> {
        let url = self.endpoint_url(path)?;
        let body = serde_json::to_value(subscription)?;
        let response = self.fetch.post_json(url.as_str(), &body)?;
        log::info!("posted subscription via {} - {}", url, response.status);
        self.check_response_error(&response)
    }
}

impl<F: FetchClient> Connection for ConnectHttp<F> {
    fn vapid_public_key(&self) -> error::Result<String> {
        let url = self.endpoint_url("/vapid_public_key")?;
        let response = self.fetch.get(url.as_str())?;
        self.check_response_error(&response)?;
        let key = response.text().trim().to_string();
        log::debug!("fetched application server key ({} chars)", key.len());
        Ok(key)
    }

    fn register(&self, subscription: &SubscriptionInfo) -> error::Result<()> {
        self.post_subscription("/notification/register", subscription)
    }

    fn unregister(&self, subscription: &SubscriptionInfo) -> error::Result<()> {
        self.post_subscription("/notification/unregister", subscription)
    }
}
