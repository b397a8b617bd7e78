/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

pub type Result<T, E = PushError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// An unspecified general error has occured
    #[error("General Error: {0:?}")]
    GeneralError(String),

    /// A client communication error
    #[error("Communication Error: {0:?}")]
    CommunicationError(String),

    /// An error returned from the companion application server
    #[error("Communication Server Error: {0:?}")]
    CommunicationServerError(String),

    /// The application server key could not be fetched
    #[error("Key fetch failed: {0}")]
    KeyFetchFailed(String),

    /// The application server key was not valid base64url
    #[error("Key decode failed: {0}")]
    KeyDecodeFailed(String),

    /// The platform subscribe call failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// The platform unsubscribe call failed
    #[error("Unsubscribe failed: {0}")]
    UnsubscribeFailed(String),

    /// The server did not accept a subscription registration
    #[error("Server register failed: {0}")]
    ServerRegisterFailed(String),

    /// The server did not accept a subscription removal
    #[error("Server unregister failed: {0}")]
    ServerUnregisterFailed(String),

    /// An error populating or reading the asset cache
    #[error("Cache storage error: {0}")]
    CacheError(String),

    /// An error from the platform notification surface
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// A failure to encode or decode wire data
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A failure to parse a URL.
    #[error("URL parse error: {0:?}")]
    UrlParseError(#[from] url::ParseError),
}
