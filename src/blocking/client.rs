use std::fmt;
use std::thread::sleep;

use reqwest::header::HeaderMap;
use serde_json::Value;

use super::Collection;
use crate::{
    decode::decode_collection_names,
    request,
    retry::{Decision, Outcome, RetryPolicy},
    transport::Transport,
    ClientOptions, JsonDbError, Request, Result,
};

/// Blocking client for the jsondb.cloud API.
///
/// `Clone + Send + Sync`; clones share one connection pool and may be used
/// from several threads without extra locking.
#[derive(Clone)]
pub struct JsonDb {
    http: reqwest::blocking::Client,
    transport: Transport,
    retry: RetryPolicy,
    options: ClientOptions,
}

impl fmt::Debug for JsonDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::JsonDb")
            .field("transport", &self.transport)
            .field("options", &self.options)
            .finish()
    }
}

impl JsonDb {
    /// Creates a client with default options.
    ///
    /// Fails with [`JsonDbError::Config`] when `api_key` is empty.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self> {
        Self::with_options(api_key, ClientOptions::default())
    }

    pub fn with_options(api_key: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        let transport = Transport::new(api_key.as_ref(), &options)?;
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(JsonDbError::Transport)?;
        Ok(Self {
            http,
            transport,
            retry: RetryPolicy::from_options(&options),
            options,
        })
    }

    /// Creates a client from `JSONDB_API_KEY`, `JSONDB_PROJECT` and `JSONDB_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let (api_key, options) = crate::options::from_env()?;
        Self::with_options(api_key, options)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn collection(&self, name: impl Into<String>) -> Collection<'_> {
        Collection::new(self, name.into())
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        let body = self.request(request::list_collections(&self.options.project))?;
        decode_collection_names(body)
    }

    /// Executes a request, retrying transient failures on the calling thread.
    ///
    /// Returns the parsed JSON body, or `None` for `204 No Content`.
    pub fn request(&self, request: Request) -> Result<Option<Value>> {
        let url = self.transport.url(&request.path)?;
        let headers = self.transport.headers_for(&request)?;
        let mut attempt = 0usize;
        loop {
            let outcome = self.attempt(&request, &url, headers.clone());
            match self.retry.decide(outcome, attempt) {
                Decision::Retry(delay) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Decision::Succeed(body) => return Ok(body),
                Decision::Fail(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        error = %err,
                        "request failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    fn attempt(&self, request: &Request, url: &str, headers: HeaderMap) -> Outcome {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers)
            .timeout(self.transport.timeout());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send() {
            Ok(response) => response,
            Err(err) => return Outcome::Fault(err),
        };
        let status = response.status().as_u16();

        #[cfg(feature = "tracing")]
        tracing::debug!(method = %request.method, path = %request.path, status, "received response");

        match response.text() {
            Ok(body) => Outcome::Response { status, body },
            Err(err) => Outcome::Fault(err),
        }
    }

    /// Releases this handle's share of the connection pool.
    pub fn close(self) {
        drop(self);
    }
}
