use crate::{JsonDbError, Result};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.jsondb.cloud";

/// Default project namespace.
pub const DEFAULT_PROJECT: &str = "v1";

/// Configures project, endpoint, timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Project namespace prefixed to every collection path.
    pub project: String,
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Backoff before the first retry, doubled on every further retry.
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff wait.
    pub retry_max_delay_ms: u64,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Extra headers sent with every request.
    ///
    /// They may override `Content-Type` and `Accept` but never `Authorization`.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 10_000,
            timeout_ms: 30_000,
            headers: Vec::new(),
        }
    }
}

impl ClientOptions {
    /// Sets the project namespace.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the retry budget.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets base and cap of the exponential backoff, in milliseconds.
    pub fn retry_delays_ms(mut self, base: u64, max: u64) -> Self {
        self.retry_base_delay_ms = base;
        self.retry_max_delay_ms = max;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(JsonDbError::Config("project cannot be empty".to_owned()));
        }
        if self.base_url.trim().is_empty() {
            return Err(JsonDbError::Config("base_url cannot be empty".to_owned()));
        }
        if self.timeout_ms == 0 {
            return Err(JsonDbError::Config(
                "timeout_ms must be greater than zero".to_owned(),
            ));
        }
        if self.retry_base_delay_ms == 0 {
            return Err(JsonDbError::Config(
                "retry_base_delay_ms must be greater than zero".to_owned(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(JsonDbError::Config(format!(
                "retry_max_delay_ms ({}) must not be lower than retry_base_delay_ms ({})",
                self.retry_max_delay_ms, self.retry_base_delay_ms
            )));
        }
        Ok(())
    }
}

/// Reads `JSONDB_API_KEY`, `JSONDB_PROJECT` and `JSONDB_BASE_URL`.
pub(crate) fn from_env() -> Result<(String, ClientOptions)> {
    let api_key = std::env::var("JSONDB_API_KEY").map_err(|_| {
        JsonDbError::Config("missing JSONDB_API_KEY environment variable".to_owned())
    })?;
    if api_key.trim().is_empty() {
        return Err(JsonDbError::Config(
            "JSONDB_API_KEY is set but empty".to_owned(),
        ));
    }

    let mut options = ClientOptions::default();
    if let Some(project) = non_empty_var("JSONDB_PROJECT") {
        options.project = project;
    }
    if let Some(base_url) = non_empty_var("JSONDB_BASE_URL") {
        options.base_url = base_url;
    }
    Ok((api_key, options))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
