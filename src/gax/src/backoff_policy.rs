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

//! How long the transport waits before resending a request.
//!
//! After an attempt fails with an error the
//! [retry policy][crate::retry_policy::RetryPolicy] allows to continue, the
//! transport asks the backoff policy for a delay and sleeps for it. The
//! sleep ends early if the request's cancellation token fires. The default
//! is [ExponentialBackoff][crate::exponential_backoff::ExponentialBackoff],
//! waiting 100ms, 200ms, 400ms, and so on.
//!
//! # Example
//! ```
//! # use stratus_gax::*;
//! use exponential_backoff::ExponentialBackoffBuilder;
//! use std::time::Duration;
//!
//! // A slower schedule for a service with strict throttling.
//! let policy = ExponentialBackoffBuilder::new()
//!     .with_initial_delay(Duration::from_millis(500))
//!     .with_maximum_delay(Duration::from_secs(30))
//!     .build()?;
//! let mut options = options::RequestOptions::default();
//! options.set_backoff_policy(policy);
//! # Ok::<(), exponential_backoff::Error>(())
//! ```

use std::sync::Arc;

/// Chooses the delay before the next attempt.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// The delay after `attempt_count` failed attempts.
    ///
    /// `attempt_count` starts at 1, it includes the initial attempt.
    /// `loop_start` is the time the first attempt started.
    fn on_failure(&self, loop_start: std::time::Instant, attempt_count: u32)
    -> std::time::Duration;
}

/// Any [BackoffPolicy], boxed for [RequestOptions][crate::options::RequestOptions].
#[derive(Clone)]
pub struct BackoffPolicyArg(pub(crate) Arc<dyn BackoffPolicy>);

impl<T: BackoffPolicy + 'static> std::convert::From<T> for BackoffPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn BackoffPolicy>> for BackoffPolicyArg {
    fn from(value: Arc<dyn BackoffPolicy>) -> Self {
        Self(value)
    }
}

impl From<BackoffPolicyArg> for Arc<dyn BackoffPolicy> {
    fn from(value: BackoffPolicyArg) -> Self {
        value.0
    }
}
