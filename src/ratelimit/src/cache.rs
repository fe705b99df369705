// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{RateLimiter, Result};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// A named collection of rate limiters.
///
/// Callers sharing a key share the limiter, and therefore the rate. Most
/// applications use the process-wide cache through [cache_new], tests and
/// libraries that need isolation can create their own instances.
#[derive(Debug, Default)]
pub struct RateLimiterCache {
    limiters: Mutex<HashMap<String, Arc<RateLimiter>>>,
}

impl RateLimiterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limiter for `key`, creating it with `rate` if needed.
    ///
    /// The rate is ignored if the key already has a limiter.
    ///
    /// # Example
    /// ```
    /// # use stratus_ratelimit::RateLimiterCache;
    /// # use std::sync::Arc;
    /// let cache = RateLimiterCache::new();
    /// let a = cache.get_or_create("k", 100.0)?;
    /// let b = cache.get_or_create("k", 999.0)?;
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert_eq!(b.rate(), 100.0);
    /// # Ok::<(), stratus_ratelimit::Error>(())
    /// ```
    pub fn get_or_create(&self, key: &str, rate: f64) -> Result<Arc<RateLimiter>> {
        let mut limiters = self.lock();
        if let Some(l) = limiters.get(key) {
            return Ok(l.clone());
        }
        let limiter = Arc::new(RateLimiter::new(key, rate)?);
        limiters.insert(key.to_string(), limiter.clone());
        Ok(limiter)
    }

    pub fn get(&self, key: &str) -> Option<Arc<RateLimiter>> {
        self.lock().get(key).cloned()
    }

    /// Removes the limiter for `key`.
    ///
    /// Callers holding the removed limiter may keep using it, but it is no
    /// longer shared with new callers.
    pub fn remove(&self, key: &str) -> Option<Arc<RateLimiter>> {
        self.lock().remove(key)
    }

    pub fn remove_all(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<RateLimiter>>> {
        self.limiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static GLOBAL: LazyLock<RateLimiterCache> = LazyLock::new(RateLimiterCache::new);

/// The process-wide cache used by [cache_new] and friends.
pub fn global_cache() -> &'static RateLimiterCache {
    &GLOBAL
}

/// Returns the process-wide limiter for `key`, creating it if needed.
pub fn cache_new(key: &str, rate: f64) -> Result<Arc<RateLimiter>> {
    GLOBAL.get_or_create(key, rate)
}

/// Removes `key` from the process-wide cache.
pub fn cache_remove(key: &str) {
    GLOBAL.remove(key);
}

/// Empties the process-wide cache.
pub fn cache_remove_all() {
    GLOBAL.remove_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serial_test::serial;

    #[test]
    fn identity() -> anyhow::Result<()> {
        let cache = RateLimiterCache::new();
        assert!(cache.is_empty());
        let a = cache.get_or_create("k", 100.0)?;
        let b = cache.get_or_create("k", 999.0)?;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.rate(), 100.0);
        assert_eq!(b.key(), "k");
        assert_eq!(cache.len(), 1);

        let c = cache.get_or_create("other", 5.0)?;
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn remove() -> anyhow::Result<()> {
        let cache = RateLimiterCache::new();
        let a = cache.get_or_create("k", 100.0)?;
        let removed = cache.remove("k");
        assert!(removed.is_some_and(|r| Arc::ptr_eq(&a, &r)));
        assert!(cache.get("k").is_none());

        let b = cache.get_or_create("k", 999.0)?;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.rate(), 999.0);
        assert!(cache.remove("missing").is_none());
        Ok(())
    }

    #[test]
    fn remove_all() -> anyhow::Result<()> {
        let cache = RateLimiterCache::new();
        let _ = cache.get_or_create("a", 1.0)?;
        let _ = cache.get_or_create("b", 1.0)?;
        cache.remove_all();
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_rate_is_not_cached() {
        let cache = RateLimiterCache::new();
        let got = cache.get_or_create("k", 0.0);
        assert!(matches!(got, Err(Error::InvalidRate(_))), "{got:?}");
        assert!(cache.is_empty());
    }

    #[test]
    #[serial]
    fn global() -> anyhow::Result<()> {
        cache_remove_all();
        let a = cache_new("k", 100.0)?;
        let b = cache_new("k", 999.0)?;
        assert!(Arc::ptr_eq(&a, &b));

        cache_remove("k");
        let c = cache_new("k", 999.0)?;
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.rate(), 999.0);
        assert!(global_cache().get("k").is_some_and(|g| Arc::ptr_eq(&g, &c)));

        cache_remove_all();
        assert!(global_cache().is_empty());
        Ok(())
    }
}
