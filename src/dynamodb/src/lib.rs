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

//! Stratus SDK for Rust - Document Store
//!
//! This crate contains a client for the item operations of the document
//! store service, and an object mapper that persists application records.
//!
//! * [client::Client] sends `PutItem`, `GetItem`, `UpdateItem`, and
//!   `DeleteItem` requests using the JSON protocol.
//! * [mapper::DocumentMapper] converts records declared with [document!] to
//!   and from the store's attribute values.

pub mod client;
pub mod mapper;
pub mod model;

pub use gax::Result;
pub use gax::error::Error;
