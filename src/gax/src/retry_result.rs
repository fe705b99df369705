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

//! The decision a [RetryPolicy][crate::retry_policy::RetryPolicy] reports
//! after a failed attempt.

use crate::error::Error;

/// What the transport does after a failed attempt.
///
/// The transport returns the error to the caller unless the policy answers
/// [Continue][RetryResult::Continue]. In that case it waits for the delay
/// chosen by the backoff policy, signs the request again, and resends it.
///
/// # Example
///
/// ```
/// # use stratus_gax::{error::Error, retry_policy::RetryPolicy};
/// # use stratus_gax::retry_result::RetryResult;
/// // Only retry throttled requests, and only twice.
/// #[derive(Debug)]
/// struct ThrottledOnly;
/// impl RetryPolicy for ThrottledOnly {
///     fn on_error(
///         &self,
///         _loop_start: std::time::Instant,
///         attempt_count: u32,
///         error: Error,
///     ) -> RetryResult {
///         if !error.kind().contains("Throttl") {
///             return RetryResult::Permanent(error);
///         }
///         if attempt_count > 2 {
///             return RetryResult::Exhausted(error);
///         }
///         RetryResult::Continue(error)
///     }
/// }
/// ```
#[derive(Debug)]
pub enum RetryResult {
    /// Resending the request cannot succeed, for example, the service
    /// rejected its parameters.
    Permanent(Error),

    /// Resending might succeed, but the policy has no attempts left. The
    /// caller receives this, the last error.
    Exhausted(Error),

    /// Back off and resend the request.
    Continue(Error),
}
