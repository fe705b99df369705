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

use crate::decoder::DecoderStrategy;
use crate::runtime::Runtime;
use gax::Result;
use gax::backoff_policy::BackoffPolicy;
use gax::error::Error;
use gax::exponential_backoff::ExponentialBackoff;
use gax::options::{Configuration, RequestOptions};
use gax::request::Request;
use gax::response::{Parts, Response};
use gax::retry_policy::{ClassifiedErrors, RetryPolicy, RetryPolicyExt};
use gax::signer::Signer;
use http::header::{HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// The `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("stratus-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Sends requests: signs, submits, classifies, retries, and decodes.
///
/// The client is cheap to clone. All clones share the runtime and the signer.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    runtime: Arc<Runtime>,
    signer: Signer,
}

impl ReqwestClient {
    pub fn new(runtime: Arc<Runtime>, signer: Signer) -> Self {
        Self { runtime, signer }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Performs `request`, decoding a successful response body into `O`.
    ///
    /// Responses with a 4xx or 5xx status are returned as service errors,
    /// retried while the retry policy allows it.
    pub async fn perform<O>(
        &self,
        request: Request,
        decoder: &DecoderStrategy,
        options: RequestOptions,
    ) -> Result<Response<O>>
    where
        O: DeserializeOwned + Default,
    {
        self.execute(request, decoder, options, true).await
    }

    /// Performs `request` discarding the response body.
    pub async fn perform_empty(
        &self,
        request: Request,
        decoder: &DecoderStrategy,
        options: RequestOptions,
    ) -> Result<Response<()>> {
        self.execute(request, decoder, options, false).await
    }

    async fn execute<O>(
        &self,
        request: Request,
        decoder: &DecoderStrategy,
        options: RequestOptions,
        decode_body: bool,
    ) -> Result<Response<O>>
    where
        O: DeserializeOwned + Default,
    {
        let config = self.runtime.configuration();
        let retry_policy = self.get_retry_policy(&options, &config);
        let backoff_policy = self.get_backoff_policy(&options);
        let cancel = options.cancellation().cloned();
        let this = self.clone();
        let decoder = decoder.clone();
        let inner = async move |attempt| {
            this.request_attempt(&request, &decoder, &options, attempt, decode_body)
                .await
        };
        let sleep = async move |d| gax::retry_loop_internal::cancellable_sleep(d, cancel.as_ref()).await;
        gax::retry_loop_internal::retry_loop_with_callback(
            inner,
            sleep,
            retry_policy,
            backoff_policy,
            |attempt, error, delay| {
                tracing::debug!(
                    attempt,
                    ?delay,
                    code = error.code(),
                    kind = error.kind(),
                    "retrying request: {error}"
                );
            },
        )
        .await
    }

    async fn request_attempt<O>(
        &self,
        request: &Request,
        decoder: &DecoderStrategy,
        options: &RequestOptions,
        attempt: u32,
        decode_body: bool,
    ) -> Result<Response<O>>
    where
        O: DeserializeOwned + Default,
    {
        let (client, config) = self.runtime.snapshot();
        let mut request = request.clone();
        request.insert_header(USER_AGENT, user_agent(options)?);
        self.signer
            .sign(&mut request)
            .await
            .map_err(Error::signing)?;

        let url = request.url();
        tracing::debug!(method = %request.method(), %url, attempt, "sending request");
        if config.debug() {
            tracing::trace!(
                headers = ?request.headers(),
                payload = ?request.payload(),
                "request dump"
            );
        }
        let builder = client
            .request(request.method().clone(), url)
            .headers(request.headers().clone())
            .body(request.payload());

        let (status, headers, body) = cancellable(options, async {
            let response = builder.send().await.map_err(Error::io)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(Error::io)?;
            Ok((status, headers, body))
        })
        .await?;
        tracing::debug!(%status, attempt, "received response");
        if config.debug() {
            tracing::trace!(?headers, ?body, "response dump");
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(Error::service(decoder.decode_error(status, headers, &body)));
        }
        let body = if decode_body {
            decoder.decode::<O>(status, &body)?
        } else {
            O::default()
        };
        Ok(Response::from_parts(
            Parts::new().set_status(status).set_headers(headers),
            body,
        ))
    }

    fn get_retry_policy(
        &self,
        options: &RequestOptions,
        config: &Configuration,
    ) -> Arc<dyn RetryPolicy> {
        options.retry_policy().clone().unwrap_or_else(|| {
            Arc::new(
                ClassifiedErrors::default()
                    .with_transport_errors(config.retry_transport_errors())
                    .with_attempt_limit(config.retry_attempts()),
            )
        })
    }

    fn get_backoff_policy(&self, options: &RequestOptions) -> Arc<dyn BackoffPolicy> {
        options
            .backoff_policy()
            .clone()
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::default()))
    }
}

fn user_agent(options: &RequestOptions) -> Result<HeaderValue> {
    match options.user_agent() {
        None => Ok(HeaderValue::from_static(DEFAULT_USER_AGENT)),
        Some(prefix) => HeaderValue::try_from(format!("{prefix} {DEFAULT_USER_AGENT}"))
            .map_err(Error::ser),
    }
}

/// Runs `f` until it completes or the request is cancelled.
///
/// Dropping the future on cancellation closes the connection, and with it any
/// partially received body.
async fn cancellable<T, F>(options: &RequestOptions, f: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match options.cancellation() {
        None => f.await,
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(Error::cancelled()),
            r = f => r,
        },
    }
}
