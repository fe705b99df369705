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

//! Stratus SDK helpers.
//!
//! This crate contains the types shared by all the Stratus service clients:
//! the error model, the conversion of request records to query strings and
//! headers, the retry and backoff policies, and the request, response, and
//! signer contracts used by the transport.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions making requests.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types used by the clients.
pub mod error;

pub mod tag;

pub mod params;

pub mod options;
pub mod request;
pub mod response;

pub mod credentials;
pub mod signer;

pub mod backoff_policy;
pub mod exponential_backoff;
pub mod retry_policy;
pub mod retry_result;

/// The retry loop shared by all transports.
#[doc(hidden)]
pub mod retry_loop_internal;
