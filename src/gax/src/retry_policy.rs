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

//! Defines traits for retry policies and some common implementations.
//!
//! The clients automatically retry requests when the service classifies the
//! error as retriable, for example when the request was throttled. The
//! classification happens when the response is decoded, and is reported by
//! [Error::is_retry]. Retry policies decide if the loop continues given that
//! classification and the number of attempts so far.
//!
//! # Example
//! ```
//! # use stratus_gax::retry_policy::*;
//! // Retry service errors classified as retriable, and transport errors, at
//! // most 5 times.
//! let policy = ClassifiedErrors::default()
//!     .with_transport_errors(true)
//!     .with_attempt_limit(5);
//! ```

use crate::error::Error;
use crate::retry_result::RetryResult;
use std::sync::Arc;

/// Determines how errors are handled in the retry loop.
///
/// Implementations of this trait determine if errors are retryable, and for
/// how long the retry loop may continue.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Query the retry policy after an error.
    ///
    /// # Parameters
    /// * `loop_start` - when the retry loop started.
    /// * `attempt_count` - the number of attempts. This includes the initial
    ///   attempt. This method called after the first attempt, so the
    ///   value is always non-zero.
    /// * `error` - the last error when attempting the request.
    fn on_error(
        &self,
        loop_start: std::time::Instant,
        attempt_count: u32,
        error: Error,
    ) -> RetryResult;
}

/// A helper type to use [RetryPolicy] in request options.
#[derive(Clone)]
pub struct RetryPolicyArg(Arc<dyn RetryPolicy>);

impl<T: RetryPolicy + 'static> From<T> for RetryPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<dyn RetryPolicy>> for RetryPolicyArg {
    fn from(value: Arc<dyn RetryPolicy>) -> Self {
        Self(value)
    }
}

impl From<RetryPolicyArg> for Arc<dyn RetryPolicy> {
    fn from(value: RetryPolicyArg) -> Self {
        value.0
    }
}

/// Extension trait for [RetryPolicy]
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Decorate a [RetryPolicy] to limit the number of retries.
    ///
    /// The initial attempt is not a retry, so a limit of 3 allows up to 4
    /// attempts in total.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::retry_policy::*;
    /// let policy = ClassifiedErrors::default().with_attempt_limit(3);
    /// ```
    fn with_attempt_limit(self, maximum_retries: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_retries)
    }
}

impl<T: RetryPolicy> RetryPolicyExt for T {}

/// Retries the errors classified as retriable when the response was decoded.
///
/// Service errors are retried if [Error::is_retry] is set. Transport errors,
/// where no response was received, are only retried if configured with
/// [with_transport_errors][ClassifiedErrors::with_transport_errors]. Decode
/// errors on successful responses, cancellations, and errors detected before
/// the request is sent are never retried.
///
/// This policy should be decorated to limit the number of retry attempts.
#[derive(Clone, Debug, Default)]
pub struct ClassifiedErrors {
    transport_errors: bool,
}

impl ClassifiedErrors {
    /// Also retry transport errors.
    ///
    /// Only enable this if the request is safe to repeat, a transport error
    /// may occur after the service received the request.
    pub fn with_transport_errors(mut self, v: bool) -> Self {
        self.transport_errors = v;
        self
    }
}

impl RetryPolicy for ClassifiedErrors {
    fn on_error(
        &self,
        _loop_start: std::time::Instant,
        _attempt_count: u32,
        error: Error,
    ) -> RetryResult {
        if error.is_retry() || (self.transport_errors && error.is_io()) {
            RetryResult::Continue(error)
        } else {
            RetryResult::Permanent(error)
        }
    }
}

/// A retry policy decorator that limits the number of retries.
///
/// This policy decorates an inner policy and limits the total number of
/// retries. Once the maximum is reached this policy returns
/// [Exhausted][RetryResult::Exhausted] for errors the inner policy would
/// retry. When exhausted the retry loop returns the last error unchanged.
///
/// # Parameters
/// * `P` - the inner retry policy, defaults to [ClassifiedErrors].
#[derive(Debug)]
pub struct LimitedAttemptCount<P = ClassifiedErrors>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_retries: u32,
}

impl LimitedAttemptCount {
    /// Creates a new instance, with the default inner policy.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::retry_policy::*;
    /// let policy = LimitedAttemptCount::new(3);
    /// ```
    pub fn new(maximum_retries: u32) -> Self {
        Self {
            inner: ClassifiedErrors::default(),
            maximum_retries,
        }
    }
}

impl<P> LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_retries: u32) -> Self {
        Self {
            inner,
            maximum_retries,
        }
    }

    /// The maximum number of retries.
    pub fn maximum_retries(&self) -> u32 {
        self.maximum_retries
    }
}

impl<P> RetryPolicy for LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    fn on_error(
        &self,
        loop_start: std::time::Instant,
        attempt_count: u32,
        error: Error,
    ) -> RetryResult {
        match self.inner.on_error(loop_start, attempt_count, error) {
            RetryResult::Continue(e) if attempt_count > self.maximum_retries => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }
}
