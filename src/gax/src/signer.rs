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

//! The contract between the transport and request signers.
//!
//! The transport hands each attempt's fully built [Request] to the signer
//! before it is sent. Signers install authentication headers, or query
//! parameters, and the transport sends the request without further changes.
//! The signing algorithms themselves live outside this crate.
//!
//! # Example
//! ```
//! # use stratus_gax::request::Request;
//! # use stratus_gax::signer::{Signer, SigningError, SigningProvider};
//! #[derive(Debug)]
//! struct BearerSigner(String);
//!
//! #[async_trait::async_trait]
//! impl SigningProvider for BearerSigner {
//!     async fn sign(&self, request: &mut Request) -> Result<(), SigningError> {
//!         let value = http::HeaderValue::try_from(format!("Bearer {}", self.0))
//!             .map_err(SigningError::signature)?;
//!         request.insert_header(http::header::AUTHORIZATION, value);
//!         Ok(())
//!     }
//! }
//!
//! let signer = Signer::from(BearerSigner("token".into()));
//! ```

use crate::request::Request;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Implemented by request signers.
#[async_trait::async_trait]
pub trait SigningProvider: Send + Sync + std::fmt::Debug {
    /// Adds authentication information to `request`.
    async fn sign(&self, request: &mut Request) -> Result<(), SigningError>;
}

/// A cheap to clone handle to a [SigningProvider].
#[derive(Clone, Debug)]
pub struct Signer {
    inner: Arc<dyn SigningProvider>,
}

impl<T> std::convert::From<T> for Signer
where
    T: SigningProvider + 'static,
{
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl Signer {
    /// A signer that leaves requests unchanged.
    ///
    /// Useful for public resources, and for tests against local servers.
    pub fn anonymous() -> Self {
        Self::from(Anonymous)
    }

    pub async fn sign(&self, request: &mut Request) -> Result<(), SigningError> {
        self.inner.sign(request).await
    }
}

#[derive(Debug)]
struct Anonymous;

#[async_trait::async_trait]
impl SigningProvider for Anonymous {
    async fn sign(&self, _request: &mut Request) -> Result<(), SigningError> {
        Ok(())
    }
}

/// Represents an error signing a request.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct SigningError(SigningErrorKind);

impl SigningError {
    /// The credentials needed to sign the request were not available.
    pub fn is_credentials(&self) -> bool {
        matches!(self.0, SigningErrorKind::Credentials(_))
    }

    /// The signature could not be computed or installed.
    pub fn is_signature(&self) -> bool {
        matches!(self.0, SigningErrorKind::Signature(_))
    }

    pub fn credentials<T>(source: T) -> SigningError
    where
        T: Into<BoxError>,
    {
        SigningError(SigningErrorKind::Credentials(source.into()))
    }

    pub fn signature<T>(source: T) -> SigningError
    where
        T: Into<BoxError>,
    {
        SigningError(SigningErrorKind::Signature(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum SigningErrorKind {
    #[error("cannot obtain credentials to sign the request: {0}")]
    Credentials(#[source] BoxError),
    #[error("cannot sign the request: {0}")]
    Signature(#[source] BoxError),
}
