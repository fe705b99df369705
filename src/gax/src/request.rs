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

//! The request type handed to signers and transports.
//!
//! A [Request] is built once per call and cloned for each attempt. Query
//! parameters are appended to the endpoint URL, form parameters become an
//! `application/x-www-form-urlencoded` body. Signers see the final URL and
//! payload through [Request::url] and [Request::payload].
//!
//! # Example
//! ```
//! # use stratus_gax::request::Request;
//! # use stratus_gax::params::ParamMap;
//! let endpoint = url::Url::parse("https://queue.example.com/")?;
//! let params = ParamMap::from_iter([("Action", "ListQueues")]);
//! let request = Request::query(http::Method::GET, endpoint, params);
//! assert_eq!(request.url().as_str(), "https://queue.example.com/?Action=ListQueues");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::Result;
use crate::error::Error;
use crate::params::ParamMap;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

/// The content type of form encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// An outgoing HTTP request under construction.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    endpoint: Url,
    headers: HeaderMap,
    query: ParamMap,
    form: ParamMap,
    body: Bytes,
}

impl Request {
    /// Creates a request without parameters or body.
    pub fn new(method: Method, endpoint: Url) -> Self {
        Self {
            method,
            endpoint,
            headers: HeaderMap::new(),
            query: ParamMap::new(),
            form: ParamMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a request where the parameters are sent in the URL query.
    pub fn query(method: Method, endpoint: Url, params: ParamMap) -> Self {
        let mut request = Self::new(method, endpoint);
        request.query = params;
        request
    }

    /// Creates a request where the parameters are sent as a form encoded body.
    pub fn form(method: Method, endpoint: Url, params: ParamMap) -> Self {
        let mut request = Self::new(method, endpoint);
        request.form = params;
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        request
    }

    /// Creates a request with a JSON body.
    ///
    /// Services using JSON bodies have their own content types, for example
    /// `application/x-amz-json-1.0`.
    pub fn json<T>(
        method: Method,
        endpoint: Url,
        body: &T,
        content_type: &'static str,
    ) -> Result<Self>
    where
        T: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(Error::ser)?;
        let mut request = Self::new(method, endpoint);
        request.body = Bytes::from(body);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Ok(request)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Signers use this to install authentication headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous values.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn query_params(&self) -> &ParamMap {
        &self.query
    }

    /// Signers that authenticate through query parameters use this.
    pub fn query_params_mut(&mut self) -> &mut ParamMap {
        &mut self.query
    }

    pub fn form_params(&self) -> &ParamMap {
        &self.form
    }

    pub fn form_params_mut(&mut self) -> &mut ParamMap {
        &mut self.form
    }

    /// Replaces the body.
    ///
    /// The body is ignored if the request has form parameters.
    pub fn set_body<B: Into<Bytes>>(&mut self, body: B) {
        self.body = body.into();
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The URL sent on the wire: the endpoint plus the encoded query.
    ///
    /// Any query already present in the endpoint is kept, the parameters are
    /// appended to it.
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if self.query.is_empty() {
            return url;
        }
        let encoded = self.query.to_query_string();
        let query = match url.query() {
            Some(q) if !q.is_empty() => format!("{q}&{encoded}"),
            _ => encoded,
        };
        url.set_query(Some(&query));
        url
    }

    /// The payload sent on the wire.
    pub fn payload(&self) -> Bytes {
        if self.form.is_empty() {
            return self.body.clone();
        }
        Bytes::from(self.form.to_query_string())
    }
}
