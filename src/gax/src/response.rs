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

//! Response types.
//!
//! A response consists of the decoded body and the metadata returned by the
//! service: the HTTP status and the response headers. The body stream is
//! always consumed before the response is returned, so a response holds no
//! connection resources.
//!
//! # Example
//!
//! Creating a response for mocks
//!
//! ```
//! # use stratus_gax::Result;
//! # use stratus_gax::response::Response;
//! struct Item {
//!   // ...
//! }
//!
//! fn make_mock_response(body: Item) -> Result<Response<Item>> {
//!     Ok(Response::from(body))
//! }
//! ```

/// Represents a service response.
#[derive(Clone, Debug)]
pub struct Response<T> {
    parts: Parts,
    body: T,
}

impl<T> Response<T> {
    /// Creates a response from the body, with a `200 OK` status and no
    /// headers.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::response::Response;
    /// let response = Response::from("test".to_string());
    /// assert_eq!(response.status(), http::StatusCode::OK);
    /// ```
    pub fn from(body: T) -> Self {
        Self {
            body,
            parts: Parts::default(),
        }
    }

    /// Creates a response from the given parts.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::response::{Parts, Response};
    /// let mut headers = http::HeaderMap::new();
    /// headers.insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static("text/xml"));
    /// let parts = Parts::new()
    ///     .set_status(http::StatusCode::NO_CONTENT)
    ///     .set_headers(headers);
    /// let response = Response::from_parts(parts, ());
    /// assert!(response.headers().get(http::header::CONTENT_TYPE).is_some());
    /// ```
    pub fn from_parts(parts: Parts, body: T) -> Self {
        Self { parts, body }
    }

    /// Returns the HTTP status of this response.
    pub fn status(&self) -> http::StatusCode {
        self.parts.status
    }

    /// Returns the headers associated with this response.
    pub fn headers(&self) -> &http::HeaderMap<http::HeaderValue> {
        &self.parts.headers
    }

    /// Returns the body associated with this response.
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Consumes the response returning the metadata, and body.
    pub fn into_parts(self) -> (Parts, T) {
        (self.parts, self.body)
    }

    /// Consumes the response returning only its body.
    pub fn into_body(self) -> T {
        self.body
    }
}

/// Component parts of a response.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Parts {
    /// The HTTP status.
    pub status: http::StatusCode,
    /// The HTTP headers.
    pub headers: http::HeaderMap<http::HeaderValue>,
}

impl Parts {
    /// Create a new instance.
    pub fn new() -> Self {
        Parts::default()
    }

    /// Set the status.
    pub fn set_status<V>(mut self, v: V) -> Self
    where
        V: Into<http::StatusCode>,
    {
        self.status = v.into();
        self
    }

    /// Set the headers.
    pub fn set_headers<V>(mut self, v: V) -> Self
    where
        V: Into<http::HeaderMap>,
    {
        self.headers = v.into();
        self
    }
}
