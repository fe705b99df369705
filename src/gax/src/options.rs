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

//! Runtime configuration and per request options.
//!
//! The library defaults are intended to work for most applications.
//! [Configuration] holds the settings shared by every request made through a
//! runtime: the connection pool size, the response header timeout, the retry
//! budget, and the debug flag. [RequestOptions] customizes a single call, for
//! example to cancel it, or to use a different retry policy.
//!
//! # Example
//! ```
//! # use stratus_gax::options::*;
//! use std::time::Duration;
//! let config = Configuration::default()
//!     .set_retry_attempts(5)
//!     .set_response_header_timeout(Duration::from_secs(10));
//! assert_eq!(config.retry_attempts(), 5);
//! assert_eq!(config.max_idle_per_host(), 10);
//! ```

use crate::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use crate::retry_policy::{RetryPolicy, RetryPolicyArg};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_MAX_IDLE_PER_HOST: usize = 10;
const DEFAULT_RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Settings shared by all the requests made through a runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    max_idle_per_host: usize,
    response_header_timeout: Duration,
    retry_attempts: u32,
    debug: bool,
    retry_transport_errors: bool,
}

impl Configuration {
    /// The maximum number of idle connections kept per host.
    pub fn max_idle_per_host(&self) -> usize {
        self.max_idle_per_host
    }

    /// Changes the maximum number of idle connections kept per host.
    pub fn set_max_idle_per_host(mut self, v: usize) -> Self {
        self.max_idle_per_host = v;
        self
    }

    /// How long to wait for the response headers.
    pub fn response_header_timeout(&self) -> Duration {
        self.response_header_timeout
    }

    /// Changes how long to wait for the response headers.
    pub fn set_response_header_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.response_header_timeout = v.into();
        self
    }

    /// The maximum number of retries after the initial attempt.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Changes the maximum number of retries. Zero disables retries.
    pub fn set_retry_attempts(mut self, v: u32) -> Self {
        self.retry_attempts = v;
        self
    }

    /// If set, requests and responses are logged at the `TRACE` level.
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(mut self, v: bool) -> Self {
        self.debug = v;
        self
    }

    /// If set, transport errors are retried like retriable service errors.
    pub fn retry_transport_errors(&self) -> bool {
        self.retry_transport_errors
    }

    pub fn set_retry_transport_errors(mut self, v: bool) -> Self {
        self.retry_transport_errors = v;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            response_header_timeout: DEFAULT_RESPONSE_HEADER_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            debug: false,
            retry_transport_errors: false,
        }
    }
}

/// A set of options configuring a single request.
///
/// Any option not set here uses the runtime [Configuration].
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    user_agent: Option<String>,
    cancellation: Option<CancellationToken>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    backoff_policy: Option<Arc<dyn BackoffPolicy>>,
}

impl RequestOptions {
    /// Prepends this prefix to the user agent header value.
    pub fn set_user_agent<T: Into<String>>(&mut self, v: T) {
        self.user_agent = Some(v.into());
    }

    /// Gets the current user-agent prefix
    pub fn user_agent(&self) -> &Option<String> {
        &self.user_agent
    }

    /// Cancels the request when `token` is cancelled.
    ///
    /// Cancelling the token aborts the request in flight, or the wait between
    /// two attempts. The request fails with an error where
    /// [is_cancelled][crate::error::Error::is_cancelled] is `true`.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Get the current retry policy override, if any.
    pub fn retry_policy(&self) -> &Option<Arc<dyn RetryPolicy>> {
        &self.retry_policy
    }

    /// Sets the retry policy configuration.
    ///
    /// The policy replaces the runtime retry budget for this request.
    pub fn set_retry_policy<V: Into<RetryPolicyArg>>(&mut self, v: V) {
        self.retry_policy = Some(v.into().into());
    }

    /// Get the current backoff policy override, if any.
    pub fn backoff_policy(&self) -> &Option<Arc<dyn BackoffPolicy>> {
        &self.backoff_policy
    }

    /// Sets the backoff policy configuration.
    pub fn set_backoff_policy<V: Into<BackoffPolicyArg>>(&mut self, v: V) {
        self.backoff_policy = Some(v.into().into());
    }
}
