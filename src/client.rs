use std::fmt;

use serde_json::Value;
use tokio::time::sleep;

use crate::{
    collection::Collection,
    decode::decode_collection_names,
    request,
    retry::{Decision, Outcome, RetryPolicy},
    transport::Transport,
    ClientOptions, JsonDbError, Request, Result,
};

/// Async client for the jsondb.cloud API.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct JsonDb {
    http: reqwest::Client,
    transport: Transport,
    retry: RetryPolicy,
    options: ClientOptions,
}

impl fmt::Debug for JsonDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDb")
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

    /// Creates a client with explicit project, endpoint, timeout and retry options.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use jsondb_cloud::{ClientOptions, JsonDb};
    ///
    /// let db = JsonDb::with_options(
    ///     "jdb_sk_live_xxxx",
    ///     ClientOptions::default().project("myns").max_retries(5),
    /// )
    /// .expect("valid options");
    /// ```
    pub fn with_options(api_key: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        let transport = Transport::new(api_key.as_ref(), &options)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(JsonDbError::Transport)?;
        Ok(Self {
            http,
            transport,
            retry: RetryPolicy::from_options(&options),
            options,
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `JSONDB_API_KEY`: required
    /// - `JSONDB_PROJECT`: optional, defaults to `v1`
    /// - `JSONDB_BASE_URL`: optional, defaults to `https://api.jsondb.cloud`
    pub fn from_env() -> Result<Self> {
        let (api_key, options) = crate::options::from_env()?;
        Self::with_options(api_key, options)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns a handle to a collection in the configured project.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_> {
        Collection::new(self, name.into())
    }

    /// Lists collection names in the configured project.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let body = self
            .request(request::list_collections(&self.options.project))
            .await?;
        decode_collection_names(body)
    }

    /// Executes a request, retrying transient failures.
    ///
    /// Returns the parsed JSON body, or `None` for `204 No Content`.
    /// Requests are retried regardless of method, so a retried `POST` may
    /// create a document twice if the first response was lost.
    pub async fn request(&self, request: Request) -> Result<Option<Value>> {
        let url = self.transport.url(&request.path)?;
        let headers = self.transport.headers_for(&request)?;
        let mut attempt = 0usize;
        loop {
            let outcome = self.attempt(&request, &url, headers.clone()).await;
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
                    sleep(delay).await;
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

    async fn attempt(
        &self,
        request: &Request,
        url: &str,
        headers: reqwest::header::HeaderMap,
    ) -> Outcome {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers)
            .timeout(self.transport.timeout());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return Outcome::Fault(err),
        };
        let status = response.status().as_u16();

        #[cfg(feature = "tracing")]
        tracing::debug!(method = %request.method, path = %request.path, status, "received response");

        match response.text().await {
            Ok(body) => Outcome::Response { status, body },
            Err(err) => Outcome::Fault(err),
        }
    }

    /// Releases this handle's share of the connection pool.
    ///
    /// The pool closes once every clone is closed or dropped.
    pub fn close(self) {
        drop(self);
    }
}
