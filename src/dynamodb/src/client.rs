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

//! A client for the item operations of the document store.

use crate::Result;
use crate::model::*;
use gax::options::RequestOptions;
use gax::request::Request;
use gax::signer::Signer;
use gaxi::decoder::DecoderStrategy;
use gaxi::http::ReqwestClient;
use gaxi::runtime::Runtime;
use http::header::{HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// The content type of requests using the service's JSON protocol.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// The prefix for the `X-Amz-Target` header.
pub const TARGET_PREFIX: &str = "DynamoDB_20120810";

const TARGET: HeaderName = HeaderName::from_static("x-amz-target");

/// The item operations used by [DocumentMapper][crate::mapper::DocumentMapper].
///
/// [Client] is the implementation used by applications. Tests can provide
/// their own implementation, or a mock.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput>;
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput>;
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput>;
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput>;
}

/// Sends item operations to a document store endpoint.
///
/// # Example
/// ```
/// # use stratus_dynamodb::client::Client;
/// # use gax::signer::Signer;
/// # use gaxi::runtime::Runtime;
/// let endpoint = url::Url::parse("https://dynamodb.us-east-1.example.com/")?;
/// let client = Client::new(Runtime::global(), Signer::anonymous(), endpoint);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: ReqwestClient,
    endpoint: Url,
    decoder: DecoderStrategy,
    options: RequestOptions,
}

impl Client {
    pub fn new(runtime: Arc<Runtime>, signer: Signer, endpoint: Url) -> Self {
        Self {
            inner: ReqwestClient::new(runtime, signer),
            endpoint,
            decoder: DecoderStrategy::json(),
            options: RequestOptions::default(),
        }
    }

    /// Sets the options used by the [DocumentStore] implementation.
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn put_item_with(
        &self,
        input: &PutItemInput,
        options: RequestOptions,
    ) -> Result<PutItemOutput> {
        self.call("PutItem", input, options).await
    }

    pub async fn get_item_with(
        &self,
        input: &GetItemInput,
        options: RequestOptions,
    ) -> Result<GetItemOutput> {
        self.call("GetItem", input, options).await
    }

    pub async fn update_item_with(
        &self,
        input: &UpdateItemInput,
        options: RequestOptions,
    ) -> Result<UpdateItemOutput> {
        self.call("UpdateItem", input, options).await
    }

    pub async fn delete_item_with(
        &self,
        input: &DeleteItemInput,
        options: RequestOptions,
    ) -> Result<DeleteItemOutput> {
        self.call("DeleteItem", input, options).await
    }

    async fn call<I, O>(&self, operation: &str, input: &I, options: RequestOptions) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned + Default,
    {
        let mut request = Request::json(
            http::Method::POST,
            self.endpoint.clone(),
            input,
            CONTENT_TYPE,
        )?;
        let target = HeaderValue::try_from(format!("{TARGET_PREFIX}.{operation}"))
            .map_err(gax::error::Error::ser)?;
        request.insert_header(TARGET, target);
        tracing::debug!(operation, endpoint = %self.endpoint, "document store call");
        let response = self.inner.perform(request, &self.decoder, options).await?;
        Ok(response.into_body())
    }
}

#[async_trait::async_trait]
impl DocumentStore for Client {
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput> {
        self.put_item_with(&input, self.options.clone()).await
    }

    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput> {
        self.get_item_with(&input, self.options.clone()).await
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput> {
        self.update_item_with(&input, self.options.clone()).await
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput> {
        self.delete_item_with(&input, self.options.clone()).await
    }
}
