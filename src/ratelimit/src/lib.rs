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

//! Token bucket rate limiters.
//!
//! The transport never throttles requests by itself. Applications that need
//! to cap their request rate acquire permits from a [RateLimiter] before each
//! call. Limiters shared by several tasks are usually obtained from a
//! [RateLimiterCache], keyed by name.
//!
//! # Example
//! ```
//! # async fn sample() -> stratus_ratelimit::Result<()> {
//! use stratus_ratelimit::cache_new;
//! let limiter = cache_new("queue-sends", 100.0)?;
//! limiter.acquire(1.0).await;
//! # Ok(()) }
//! ```

mod cache;
mod limiter;

pub use cache::{RateLimiterCache, cache_new, cache_remove, cache_remove_all, global_cache};
pub use limiter::RateLimiter;

/// Errors reported by the rate limiters.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The rate must be a positive, finite number of permits per second.
    #[error("the rate ({0}) must be a positive, finite number of permits per second")]
    InvalidRate(f64),
    /// The permit count must be a non-negative, finite number.
    #[error("the permit count ({0}) must be a non-negative, finite number")]
    InvalidPermits(f64),
    /// The acquisition was cancelled before the permits were granted.
    #[error("the acquisition was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
