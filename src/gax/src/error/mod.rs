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

//! The error types returned by the Stratus clients.
//!
//! The clients distinguish between errors detected while trying to send a
//! request (e.g. cannot open a connection), errors decoding a successful
//! response, problems detected locally before the request is sent, and errors
//! returned by the service itself.
//!
//! # Examples
//!
//! ```
//! use stratus_gax::error::Error;
//! fn handle_error(e: Error) {
//!     if e.kind() == "ResourceNotFoundException" {
//!         println!("the item does not exist");
//!     } else if e.is_retry() {
//!         println!("the service suggests trying again later: {e}");
//!     }
//! }
//! ```

mod core_error;
mod service_error;
pub use core_error::*;
pub use service_error::*;
