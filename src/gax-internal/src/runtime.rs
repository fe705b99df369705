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

//! The state shared by all requests: the HTTP client and its configuration.
//!
//! Clients hold an `Arc<Runtime>`. Applications may create their own runtime,
//! which keeps tests independent of each other, or use [Runtime::global].
//!
//! Each attempt takes a snapshot of the state under the read lock.
//! Reconfiguring the runtime takes the write lock and replaces the state, so
//! requests in flight complete on the client they started with.

use gax::Result;
use gax::error::Error;
use gax::options::Configuration;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use std::time::Duration;

static GLOBAL: LazyLock<Arc<Runtime>> = LazyLock::new(|| {
    let config = Configuration::default();
    let client = build_client(&config).unwrap_or_default();
    Arc::new(Runtime::with_client(client, config))
});

#[derive(Debug)]
struct State {
    client: reqwest::Client,
    config: Configuration,
}

/// The HTTP client handle and configuration shared by a set of clients.
#[derive(Debug)]
pub struct Runtime {
    state: RwLock<State>,
}

impl Runtime {
    /// Creates a runtime, building its HTTP client from `config`.
    pub fn new(config: Configuration) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self::with_client(client, config))
    }

    /// The process-wide default runtime.
    pub fn global() -> Arc<Runtime> {
        GLOBAL.clone()
    }

    fn with_client(client: reqwest::Client, config: Configuration) -> Self {
        Self {
            state: RwLock::new(State { client, config }),
        }
    }

    /// Returns the shared HTTP client.
    ///
    /// The client is reference counted, cloning it is cheap.
    pub fn http_client(&self) -> reqwest::Client {
        self.read(|s| s.client.clone())
    }

    /// Replaces the shared HTTP client.
    ///
    /// The new client is built before the lock is taken. If building it
    /// fails the runtime is unchanged.
    pub fn set_http_client(
        &self,
        max_idle_per_host: usize,
        response_header_timeout: Duration,
    ) -> Result<()> {
        let config = self
            .configuration()
            .set_max_idle_per_host(max_idle_per_host)
            .set_response_header_timeout(response_header_timeout);
        let client = build_client(&config)?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.client = client;
        state.config = state
            .config
            .clone()
            .set_max_idle_per_host(max_idle_per_host)
            .set_response_header_timeout(response_header_timeout);
        tracing::debug!(max_idle_per_host, ?response_header_timeout, "replaced HTTP client");
        Ok(())
    }

    pub fn retry_attempts(&self) -> u32 {
        self.read(|s| s.config.retry_attempts())
    }

    /// Changes the number of retries for requests without a retry policy.
    pub fn set_retry_attempts(&self, n: u32) {
        self.update(|c| c.set_retry_attempts(n));
    }

    pub fn is_debugging(&self) -> bool {
        self.read(|s| s.config.debug())
    }

    /// If set, request and response dumps are logged at the `TRACE` level.
    pub fn set_debugging(&self, v: bool) {
        self.update(|c| c.set_debug(v));
    }

    pub fn retry_transport_errors(&self) -> bool {
        self.read(|s| s.config.retry_transport_errors())
    }

    /// If set, transport errors are retried for requests without a retry
    /// policy.
    pub fn set_retry_transport_errors(&self, v: bool) {
        self.update(|c| c.set_retry_transport_errors(v));
    }

    /// Returns a snapshot of the configuration.
    pub fn configuration(&self) -> Configuration {
        self.read(|s| s.config.clone())
    }

    pub(crate) fn snapshot(&self) -> (reqwest::Client, Configuration) {
        self.read(|s| (s.client.clone(), s.config.clone()))
    }

    fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&State) -> T,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update<F>(&self, f: F)
    where
        F: FnOnce(Configuration) -> Configuration,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.config = f(state.config.clone());
    }
}

fn build_client(config: &Configuration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_idle_per_host())
        .read_timeout(config.response_header_timeout())
        .build()
        .map_err(Error::io)
}
