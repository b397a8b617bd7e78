/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Transcoding of the application server (VAPID) public key.
//!
//! The server publishes the key as base64url text, while the platform
//! subscribe call wants the raw bytes. Some servers emit padded keys and
//! some don't, so padding is normalized away before decoding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{PushError, Result};

/// Decode a base64url-encoded application server key into the raw byte
/// form required by the platform subscribe call.
pub fn decode_application_server_key(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(PushError::KeyDecodeFailed(
            "application server key is empty".to_string(),
        ));
    }
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| PushError::KeyDecodeFailed(e.to_string()))
}
