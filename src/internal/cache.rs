/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Offline asset cache.
//!
//! Pre-populates a named platform cache with a fixed manifest of static
//! assets at worker install time, then serves requests cache-first. Cached
//! entries are immutable; freshness is handled by renaming the cache on
//! deploy, never by revalidation.

use crate::error::{PushError, Result};
use crate::internal::config::CacheConfiguration;
use crate::internal::platform::{CacheStorage, FetchClient, Response};

pub struct OfflineCache<C, F> {
    config: CacheConfiguration,
    cache: C,
    fetch: F,
}

impl<C: CacheStorage, F: FetchClient> OfflineCache<C, F> {
    pub fn new(config: CacheConfiguration, cache: C, fetch: F) -> Self {
        OfflineCache {
            config,
            cache,
            fetch,
        }
    }

    /// Populate the named cache with every manifest path. All or nothing:
    /// the first failure aborts the install, so the worker never activates
    /// with a partially populated cache.
    pub fn install(&mut self) -> Result<()> {
        for path in &self.config.manifest {
            let response = self
                .fetch
                .get(path)
                .map_err(|e| PushError::CacheError(format!("fetching '{}': {}", path, e)))?;
            if !response.is_success() {
                return Err(PushError::CacheError(format!(
                    "fetching '{}': status {}",
                    path, response.status
                )));
            }
            self.cache.put(&self.config.cache_name, path, response)?;
        }
        log::info!(
            "cached {} assets into '{}'",
            self.config.manifest.len(),
            self.config.cache_name
        );
        Ok(())
    }

    /// Serve a request cache-first. A hit is returned verbatim with no
    /// network round-trip; a miss falls through to the network, and a
    /// network failure there propagates to the caller unchanged.
    pub fn handle_fetch(&self, url: &str) -> Result<Response> {
        if let Some(response) = self.cache.match_url(&self.config.cache_name, url)? {
            log::debug!("cache hit for '{}'", url);
            return Ok(response);
        }
        self.fetch.get(url)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::internal::platform::{MockCacheStorage, MockFetchClient};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn ok_response(body: &[u8]) -> Response {
        Response {
            status: 200,
            body: body.to_vec(),
        }
    }

    fn two_path_config() -> CacheConfiguration {
        CacheConfiguration {
            cache_name: "app-assets-v1".to_string(),
            manifest: vec!["./index.html".to_string(), "./app.js".to_string()],
        }
    }

    #[test]
    fn install_caches_every_manifest_path_in_order() {
        let mut seq = Sequence::new();
        let mut fetch = MockFetchClient::new();
        let mut cache = MockCacheStorage::new();
        for path in ["./index.html", "./app.js"] {
            fetch
                .expect_get()
                .with(eq(path))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(ok_response(b"asset")));
            cache
                .expect_put()
                .withf(move |name, url, _| name == "app-assets-v1" && url == path)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _| Ok(()));
        }
        let mut offline = OfflineCache::new(two_path_config(), cache, fetch);
        offline.install().unwrap();
    }

    #[test]
    fn install_aborts_on_the_first_failed_fetch() {
        let mut fetch = MockFetchClient::new();
        fetch
            .expect_get()
            .with(eq("./index.html"))
            .times(1)
            .returning(|_| Err(PushError::CommunicationError("offline".to_string())));
        // No put and no further fetch may happen once a fetch failed.
        let cache = MockCacheStorage::new();
        let mut offline = OfflineCache::new(two_path_config(), cache, fetch);
        let err = offline.install().unwrap_err();
        assert!(matches!(err, PushError::CacheError(_)));
    }

    #[test]
    fn install_treats_error_status_as_failure() {
        let mut fetch = MockFetchClient::new();
        fetch.expect_get().times(1).returning(|_| {
            Ok(Response {
                status: 404,
                body: vec![],
            })
        });
        let cache = MockCacheStorage::new();
        let mut offline = OfflineCache::new(two_path_config(), cache, fetch);
        assert!(offline.install().is_err());
    }

    #[test]
    fn cached_requests_never_touch_the_network() {
        let mut cache = MockCacheStorage::new();
        cache
            .expect_match_url()
            .with(eq("app-assets-v1"), eq("./index.html"))
            .times(1)
            .returning(|_, _| Ok(Some(ok_response(b"cached"))));
        // The fetch mock has no expectations and panics if called.
        let fetch = MockFetchClient::new();
        let offline = OfflineCache::new(two_path_config(), cache, fetch);
        let response = offline.handle_fetch("./index.html").unwrap();
        assert_eq!(response.body, b"cached");
    }

    #[test]
    fn cache_miss_falls_through_to_the_network() {
        let mut cache = MockCacheStorage::new();
        cache.expect_match_url().times(1).returning(|_, _| Ok(None));
        let mut fetch = MockFetchClient::new();
        fetch
            .expect_get()
            .with(eq("/api/messages"))
            .times(1)
            .returning(|_| Ok(ok_response(b"fresh")));
        let offline = OfflineCache::new(two_path_config(), cache, fetch);
        let response = offline.handle_fetch("/api/messages").unwrap();
        assert_eq!(response.body, b"fresh");
    }

    #[test]
    fn network_failure_on_miss_propagates_unchanged() {
        let mut cache = MockCacheStorage::new();
        cache.expect_match_url().times(1).returning(|_, _| Ok(None));
        let mut fetch = MockFetchClient::new();
        fetch
            .expect_get()
            .times(1)
            .returning(|_| Err(PushError::CommunicationError("offline".to_string())));
        let offline = OfflineCache::new(two_path_config(), cache, fetch);
        let err = offline.handle_fetch("/api/messages").unwrap_err();
        assert!(matches!(err, PushError::CommunicationError(_)));
    }
}
