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

use super::ServiceError;
use http::HeaderMap;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The synthetic code reported for transport failures.
///
/// The request did not receive a response: the connection could not be
/// established, DNS failed, the TLS handshake failed, or the response headers
/// did not arrive in time.
pub const TRANSPORT_ERROR_CODE: u16 = 100;

/// The synthetic code reported when a successful response cannot be decoded.
pub const DECODE_ERROR_CODE: u16 = 101;

/// The synthetic code reported for problems detected before the request is
/// sent, such as serialization or signing failures, and for cancellations.
pub const CLIENT_ERROR_CODE: u16 = 0;

/// The core error returned by all Stratus clients.
///
/// The clients report errors from multiple sources. For example, the service
/// may return an error, the transport may be unable to create the necessary
/// connection to make a request, the response may not match the expected
/// format, or the client may be unable to format or sign the request.
///
/// Most applications will just return the error or log it, without any further
/// action. Applications that need to branch on the failure can use the
/// predicates, or the `code()`, `kind()`, and `message()` accessors. The
/// latter present every error with the same four fields services use, so
/// transport failures appear as code `100` and decode failures as code `101`.
///
/// # Example
/// ```
/// use stratus_gax::error::Error;
/// match example_function() {
///     Err(e) if e.kind() == "ResourceNotFoundException" => {
///         println!("missing item: {}", e.message());
///     },
///     Err(e) if e.is_io() => { println!("cannot reach the service {e}"); },
///     Err(e) => { println!("some other error {e}"); },
///     Ok(_) => { println!("success, how boring"); },
/// }
///
/// fn example_function() -> Result<String, Error> {
///     // ... details omitted ...
///     # use stratus_gax::error::ServiceError;
///     # let e = ServiceError::default().set_code(400_u16).set_kind("ResourceNotFoundException");
///     # Err(Error::service(e))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error with the information returned by a service.
    ///
    /// # Example
    /// ```
    /// use stratus_gax::error::{Error, ServiceError};
    /// let details = ServiceError::default().set_code(400_u16).set_kind("Throttling");
    /// let error = Error::service(details.clone());
    /// assert_eq!(error.as_service(), Some(&details));
    /// ```
    pub fn service(details: ServiceError) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(details)),
            source: None,
        }
    }

    /// The details of an error returned by the service, if any.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match &self.kind {
            ErrorKind::Service(d) => Some(d.as_ref()),
            _ => None,
        }
    }

    /// Creates an error representing a transport failure.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use stratus_gax::error::Error;
    /// let error = Error::io("connection refused");
    /// assert!(error.is_io());
    /// assert_eq!(error.code(), 100);
    /// assert!(error.source().is_some());
    /// ```
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Io,
            source: Some(source.into()),
        }
    }

    /// A problem in the transport layer without a full HTTP response.
    ///
    /// Examples include DNS failures, refused connections, TLS handshake
    /// errors, and response header timeouts.
    ///
    /// # Troubleshooting
    ///
    /// This indicates the request may or may not have reached the service.
    /// These errors are not retried unless the runtime is configured to retry
    /// transport errors. Only enable that if the operation is safe to repeat.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing a deserialization problem.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use stratus_gax::error::Error;
    /// let error = Error::deser("simulated problem");
    /// assert!(error.is_deserialization());
    /// assert_eq!(error.code(), 101);
    /// ```
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The response could not be deserialized.
    ///
    /// The service reported success, but the body does not match the expected
    /// format. These errors are never retried.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// Creates an error representing a serialization problem.
    ///
    /// # Example
    /// ```
    /// use stratus_gax::error::Error;
    /// let error = Error::ser("simulated problem");
    /// assert!(error.is_serialization());
    /// assert_eq!(error.code(), 0);
    /// ```
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The request could not be serialized.
    ///
    /// This is always a client-side generated error, generated before the
    /// request is made. It is never transient.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing a signing failure.
    pub fn signing<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Signing,
            source: Some(source.into()),
        }
    }

    /// The signer could not add the authentication headers to the request.
    ///
    /// # Troubleshooting
    ///
    /// Typically this indicates missing or malformed credentials.
    pub fn is_signing(&self) -> bool {
        matches!(self.kind, ErrorKind::Signing)
    }

    /// Creates an error representing a cancelled request.
    ///
    /// # Example
    /// ```
    /// use stratus_gax::error::Error;
    /// let error = Error::cancelled();
    /// assert!(error.is_cancelled());
    /// ```
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The request was cancelled by the application.
    ///
    /// Cancellation interrupts the in-flight request or the backoff between
    /// attempts. The request may or may not have reached the service.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// The numeric classification of this error.
    ///
    /// Service errors return their HTTP status code. Transport failures
    /// return [TRANSPORT_ERROR_CODE], decode failures return
    /// [DECODE_ERROR_CODE], and problems detected locally return
    /// [CLIENT_ERROR_CODE].
    pub fn code(&self) -> u16 {
        match &self.kind {
            ErrorKind::Service(d) => d.code(),
            ErrorKind::Io => TRANSPORT_ERROR_CODE,
            ErrorKind::Deserialization => DECODE_ERROR_CODE,
            ErrorKind::Serialization | ErrorKind::Signing | ErrorKind::Cancelled => {
                CLIENT_ERROR_CODE
            }
        }
    }

    /// A short human readable status.
    ///
    /// # Example
    /// ```
    /// use stratus_gax::error::Error;
    /// assert_eq!(Error::io("connection reset").status(), "100 HTTP Error");
    /// assert_eq!(Error::deser("bad XML").status(), "101 Decode Error");
    /// ```
    pub fn status(&self) -> &str {
        match &self.kind {
            ErrorKind::Service(d) => d.status(),
            ErrorKind::Io => "100 HTTP Error",
            ErrorKind::Deserialization => "101 Decode Error",
            ErrorKind::Serialization | ErrorKind::Signing | ErrorKind::Cancelled => {
                "0 Client Error"
            }
        }
    }

    /// The provider-defined kind, empty for errors not returned by a service.
    pub fn kind(&self) -> &str {
        match &self.kind {
            ErrorKind::Service(d) => d.kind(),
            _ => "",
        }
    }

    /// A human readable description of the error.
    ///
    /// For service errors this is the message in the response body. For all
    /// other errors this is the text of the underlying error.
    pub fn message(&self) -> String {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(d), _) => d.message().to_string(),
            (ErrorKind::Cancelled, _) => "the request was cancelled".to_string(),
            (_, Some(e)) => e.to_string(),
            (_, None) => String::new(),
        }
    }

    /// If true, the error was classified as safe to retry.
    ///
    /// Only service errors carry a retry classification, the decision for
    /// transport failures is made by the retry policy.
    pub fn is_retry(&self) -> bool {
        self.as_service().is_some_and(|d| d.retry())
    }

    /// The headers, if any, associated with this error.
    ///
    /// # Example
    /// ```
    /// use stratus_gax::error::Error;
    /// let e = search_for_thing("the thing");
    /// if let Some(headers) = e.http_headers() {
    ///     if let Some(id) = headers.get("x-amzn-requestid") {
    ///         println!("include this in any support request {id:?}");
    ///     }
    /// }
    ///
    /// fn search_for_thing(name: &str) -> Error {
    ///     # use stratus_gax::error::ServiceError;
    ///     # Error::service(ServiceError::default())
    /// }
    /// ```
    pub fn http_headers(&self) -> Option<&HeaderMap> {
        self.as_service().map(|d| d.headers())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(d), _) => {
                write!(f, "the service reports an error {d}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "the transport reports an error: {e}"),
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "cannot deserialize the response {e}")
            }
            (ErrorKind::Serialization, Some(e)) => write!(f, "cannot serialize the request {e}"),
            (ErrorKind::Signing, Some(e)) => write!(f, "cannot sign the request {e}"),
            (ErrorKind::Cancelled, _) => write!(f, "the request was cancelled"),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error))
    }
}

/// The type of error held by an [Error] instance.
#[derive(Debug)]
enum ErrorKind {
    Service(Box<ServiceError>),
    Io,
    Deserialization,
    Serialization,
    Signing,
    Cancelled,
}
