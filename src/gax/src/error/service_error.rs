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

use http::HeaderMap;

/// An error returned by a cloud service.
///
/// Services report failures with a non-2xx HTTP status and a body describing
/// the problem. The transport fills in the status code and status line, the
/// decoder for the service's wire format extracts the provider-defined kind
/// (e.g. `Throttling`, `ResourceNotFoundException`) and the message, and the
/// retry classification sets the retry flag.
///
/// # Example
/// ```
/// # use stratus_gax::error::ServiceError;
/// let error = ServiceError::default()
///     .set_code(400_u16)
///     .set_status("400 Bad Request")
///     .set_kind("ValidationException")
///     .set_message("the table name is invalid");
/// assert_eq!(error.kind(), "ValidationException");
/// assert!(!error.retry());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ServiceError {
    code: u16,
    status: String,
    kind: String,
    message: String,
    retry: bool,
    headers: HeaderMap,
}

impl ServiceError {
    /// Creates an error pre-populated from an HTTP status and its headers.
    ///
    /// The status line uses the canonical reason phrase when one is known,
    /// for example `"503 Service Unavailable"`.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::error::ServiceError;
    /// let error = ServiceError::from_http(http::StatusCode::NOT_FOUND, http::HeaderMap::new());
    /// assert_eq!(error.code(), 404);
    /// assert_eq!(error.status(), "404 Not Found");
    /// ```
    pub fn from_http(status: http::StatusCode, headers: HeaderMap) -> Self {
        let line = match status.canonical_reason() {
            Some(reason) => format!("{} {reason}", status.as_u16()),
            None => status.as_u16().to_string(),
        };
        Self {
            code: status.as_u16(),
            status: line,
            headers,
            ..Default::default()
        }
    }

    /// The numeric classification, typically the HTTP status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Sets the numeric classification.
    pub fn set_code<T: Into<u16>>(mut self, v: T) -> Self {
        self.code = v.into();
        self
    }

    /// A short human readable status, typically the HTTP status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Sets the status line.
    pub fn set_status<T: Into<String>>(mut self, v: T) -> Self {
        self.status = v.into();
        self
    }

    /// The provider-defined machine token describing the error.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Sets the provider-defined kind.
    pub fn set_kind<T: Into<String>>(mut self, v: T) -> Self {
        self.kind = v.into();
        self
    }

    /// The human readable description returned by the service.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sets the message.
    pub fn set_message<T: Into<String>>(mut self, v: T) -> Self {
        self.message = v.into();
        self
    }

    /// If true, the error was classified as safe to retry.
    pub fn retry(&self) -> bool {
        self.retry
    }

    /// Sets the retry flag.
    pub fn set_retry(mut self, v: bool) -> Self {
        self.retry = v;
        self
    }

    /// The response headers received with the error.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets the response headers.
    pub fn set_headers<T: Into<HeaderMap>>(mut self, v: T) -> Self {
        self.headers = v.into();
        self
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.kind, self.message)
    }
}
