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

//! Access key credentials.
//!
//! The library does not acquire credentials. Applications obtain them from
//! their own configuration, and pass them to the signer and to the helpers
//! that add the access key to query-style requests.

/// An access key, its secret, and an optional session token.
///
/// The [Debug] representation never includes the secret or the session token.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Creates long-lived credentials.
    ///
    /// # Example
    /// ```
    /// # use stratus_gax::credentials::Credentials;
    /// let creds = Credentials::new("AKID", "secret").set_session_token("token");
    /// assert_eq!(creds.access_key_id(), "AKID");
    /// assert_eq!(creds.session_token(), Some("token"));
    /// assert!(!format!("{creds:?}").contains("secret"));
    /// ```
    pub fn new<K, S>(access_key_id: K, secret_access_key: S) -> Self
    where
        K: Into<String>,
        S: Into<String>,
    {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attaches a session token, used by temporary credentials.
    pub fn set_session_token<T: Into<String>>(mut self, v: T) -> Self {
        self.session_token = Some(v.into());
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[censored]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[censored]"),
            )
            .finish()
    }
}
