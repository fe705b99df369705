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

//! Helpers for query-style services.
//!
//! Query-style services receive the operation name, the API version, the
//! caller's access key, and a timestamp as parameters, next to the
//! parameters of the operation itself.

use chrono::{DateTime, SecondsFormat, Utc};
use gax::credentials::Credentials;
use gax::params::{self, ParamMap, Params};
use gax::request::Request;
use http::Method;
use url::Url;

/// An operation of a query-style service.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryAction {
    action: String,
    version: String,
}

impl QueryAction {
    /// Creates an action, `version` is the service API version, for example
    /// `2012-11-05`.
    pub fn new<A, V>(action: A, version: V) -> Self
    where
        A: Into<String>,
        V: Into<String>,
    {
        Self {
            action: action.into(),
            version: version.into(),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Marshals `input` and adds the common parameters, using the current
    /// time as the timestamp.
    pub fn params<T: Params>(&self, credentials: &Credentials, input: &T) -> ParamMap {
        self.params_at(credentials, input, Utc::now())
    }

    /// Marshals `input` and adds the common parameters.
    ///
    /// The common parameters replace any value with the same key in `input`.
    pub fn params_at<T: Params>(
        &self,
        credentials: &Credentials,
        input: &T,
        now: DateTime<Utc>,
    ) -> ParamMap {
        let mut params = params::to_params(input);
        params.set("AWSAccessKeyId", credentials.access_key_id());
        params.set("Timestamp", now.to_rfc3339_opts(SecondsFormat::Secs, true));
        params.set("Version", self.version.as_str());
        params.set("Action", self.action.as_str());
        params
    }

    /// Builds the request for `input`.
    ///
    /// `GET` requests carry the parameters in the URL, other methods in a
    /// form encoded body.
    pub fn request<T: Params>(
        &self,
        method: Method,
        endpoint: Url,
        credentials: &Credentials,
        input: &T,
    ) -> Request {
        let params = self.params(credentials, input);
        if method == Method::GET {
            Request::query(method, endpoint, params)
        } else {
            Request::form(method, endpoint, params)
        }
    }
}
