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

//! Decoders for the two response shapes used by the services.
//!
//! Query-style services answer with XML documents, and report errors as
//! `<Error><Code>..</Code><Message>..</Message></Error>`. JSON services answer
//! with JSON documents, and report errors as
//! `{"__type": "..", "message": ".."}`.
//!
//! A [DecoderStrategy] also carries the rules to classify errors as
//! retriable: a set of HTTP status codes, and a set of markers searched for in
//! the error kind.

use bytes::Bytes;
use gax::Result;
use gax::error::{Error, ServiceError};
use http::{HeaderMap, StatusCode};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::de::DeserializeOwned;

/// Status codes retried by both strategies.
const RETRY_CODES: [u16; 4] = [500, 502, 503, 504];

const XML_RETRY_MARKERS: [&str; 4] = [
    "Throttling",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalError",
];

const JSON_RETRY_MARKERS: [&str; 6] = [
    "Throttling",
    "ProvisionedThroughputExceeded",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalFailure",
    "InternalServerError",
];

/// Some JSON services report the error kind in this header.
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// The response body format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Xml,
    Json,
}

/// Decodes responses of a given format and classifies their errors.
#[derive(Clone, Debug, PartialEq)]
pub struct DecoderStrategy {
    format: Format,
    retry_codes: Vec<u16>,
    retry_markers: Vec<String>,
}

impl DecoderStrategy {
    /// Creates a strategy with custom classification rules.
    pub fn new<C, M>(format: Format, retry_codes: C, retry_markers: M) -> Self
    where
        C: IntoIterator<Item = u16>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let mut retry_codes = retry_codes.into_iter().collect::<Vec<_>>();
        retry_codes.sort_unstable();
        retry_codes.dedup();
        Self {
            format,
            retry_codes,
            retry_markers: retry_markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    /// The strategy for query-style services.
    pub fn xml() -> Self {
        Self::new(Format::Xml, RETRY_CODES, XML_RETRY_MARKERS)
    }

    /// The strategy for JSON services.
    pub fn json() -> Self {
        Self::new(Format::Json, RETRY_CODES, JSON_RETRY_MARKERS)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn retry_codes(&self) -> &[u16] {
        &self.retry_codes
    }

    pub fn retry_markers(&self) -> &[String] {
        &self.retry_markers
    }

    /// Returns true if an error with this code and kind should be retried.
    pub fn is_retriable(&self, code: u16, kind: &str) -> bool {
        self.retry_codes.binary_search(&code).is_ok()
            || self.retry_markers.iter().any(|m| kind.contains(m.as_str()))
    }

    /// Decodes a successful response body.
    ///
    /// JSON responses without content, and `204 No Content` responses,
    /// decode to the default value. Decoding failures are never retried.
    pub fn decode<O>(&self, status: StatusCode, body: &Bytes) -> Result<O>
    where
        O: DeserializeOwned + Default,
    {
        match self.format {
            Format::Json if body.is_empty() || status == StatusCode::NO_CONTENT => {
                Ok(O::default())
            }
            Format::Json => serde_json::from_slice::<O>(body).map_err(Error::deser),
            Format::Xml => quick_xml::de::from_reader::<_, O>(body.as_ref()).map_err(Error::deser),
        }
    }

    /// Builds the error for a response with a 4xx or 5xx status.
    ///
    /// Bodies that cannot be parsed produce an error without a kind or
    /// message, classified on its status code alone.
    pub fn decode_error(
        &self,
        status: StatusCode,
        headers: HeaderMap,
        body: &Bytes,
    ) -> ServiceError {
        let (kind, message) = match self.format {
            Format::Xml => parse_xml_error(body),
            Format::Json => parse_json_error(&headers, body),
        };
        let kind = kind.unwrap_or_default();
        let retry = self.is_retriable(status.as_u16(), &kind);
        ServiceError::from_http(status, headers)
            .set_kind(kind)
            .set_message(message.unwrap_or_default())
            .set_retry(retry)
    }
}

/// Finds the first `Code` and `Message` elements directly under an `Error`
/// element, at any depth.
fn parse_xml_error(body: &[u8]) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_reader(body);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let (mut code, mut message) = (None, None);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(e.local_name().as_ref().to_vec());
                text.clear();
            }
            Ok(Event::Text(e)) => {
                let Ok(decoded) = e.decode() else { break };
                match quick_xml::escape::unescape(&decoded) {
                    Ok(s) => text.push_str(&s),
                    Err(_) => text.push_str(&decoded),
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(c)) = e.resolve_char_ref() {
                    text.push(c);
                } else if let Some(s) = e
                    .decode()
                    .ok()
                    .and_then(|name| quick_xml::escape::resolve_predefined_entity(&name))
                {
                    text.push_str(s);
                }
            }
            Ok(Event::End(_)) => {
                let in_error = path.len() >= 2 && path[path.len() - 2] == b"Error";
                match path.pop().as_deref() {
                    Some(b"Code") if in_error && code.is_none() => {
                        code = Some(text.trim().to_string());
                    }
                    Some(b"Message") if in_error && message.is_none() => {
                        message = Some(text.trim().to_string());
                    }
                    _ => {}
                }
                text.clear();
                if code.is_some() && message.is_some() {
                    break;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    (code, message)
}

/// Extracts the error kind and message from a JSON error body.
///
/// The kind may be namespaced, as in `com.example#ResourceNotFoundException`,
/// only the part after the last `#` is kept.
fn parse_json_error(headers: &HeaderMap, body: &[u8]) -> (Option<String>, Option<String>) {
    let value = serde_json::from_slice::<serde_json::Value>(body).unwrap_or_default();
    let field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);
    let kind = field("__type")
        .or_else(|| field("code"))
        .or_else(|| {
            headers
                .get(ERROR_TYPE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(':').next().unwrap_or(v).to_string())
        })
        .map(|k| match k.rsplit_once('#') {
            Some((_, k)) => k.to_string(),
            None => k,
        });
    let message = field("message").or_else(|| field("Message"));
    (kind, message)
}
