/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Provides configuration for the [PushBridge](`crate::PushBridge`) and
//! [ServiceWorker](`crate::ServiceWorker`)

use std::{fmt::Display, str::FromStr};

use crate::PushError;

#[derive(Clone, Debug)]
pub struct PushConfiguration {
    /// host name:port of the companion application server
    pub server_host: String,

    /// http protocol ("https" outside local development)
    pub http_protocol: Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Protocol {
    Https,
    Http,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Protocol::Http => "http",
                Protocol::Https => "https",
            }
        )
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Https
    }
}

impl FromStr for Protocol {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            _ => return Err(PushError::GeneralError("Invalid protocol".to_string())),
        })
    }
}

/// Describes the named platform cache the worker pre-populates at install
/// time.
#[derive(Clone, Debug)]
pub struct CacheConfiguration {
    /// Name of the cache holding the static assets. Versioned manually: a
    /// deploy that changes any asset should also change this name.
    pub cache_name: String,

    /// Relative paths of every asset to cache. Must match the files
    /// actually deployed.
    pub manifest: Vec<String>,
}

#[cfg(test)]
// To avoid a future footgun, the default implementation is only for tests
impl Default for PushConfiguration {
    fn default() -> PushConfiguration {
        PushConfiguration {
            server_host: String::from("app.example.com"),
            http_protocol: Protocol::Https,
        }
    }
}

#[cfg(test)]
impl Default for CacheConfiguration {
    fn default() -> CacheConfiguration {
        CacheConfiguration {
            cache_name: String::from("app-assets-v1"),
            manifest: vec![
                String::from("./"),
                String::from("./index.html"),
                String::from("./app.js"),
                String::from("./app_bg.wasm"),
                String::from("./manifest.json"),
            ],
        }
    }
}
