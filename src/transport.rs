use std::fmt;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::{ClientOptions, JsonDbError, Request, Result};

/// Connection-independent half of the transport: base address, default
/// headers and per-attempt timeout. Shared by the async and blocking engines.
#[derive(Clone)]
pub(crate) struct Transport {
    base_url: String,
    defaults: HeaderMap,
    authorization: HeaderValue,
    timeout: Duration,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("authorization", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Transport {
    pub(crate) fn new(api_key: &str, options: &ClientOptions) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(JsonDbError::Config("api_key is required".to_owned()));
        }
        options.validate()?;

        let mut authorization = HeaderValue::from_str(&normalize_bearer_authorization(api_key))
            .map_err(|_| JsonDbError::Config("api_key contains invalid characters".to_owned()))?;
        authorization.set_sensitive(true);

        let mut defaults = HeaderMap::new();
        defaults.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        defaults.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        merge_headers(&mut defaults, &options.headers)?;

        Ok(Self {
            base_url: options.base_url.trim_end_matches('/').to_owned(),
            defaults,
            authorization,
            timeout: Duration::from_millis(options.timeout_ms),
        })
    }

    /// Joins `path` onto the base URL. The path must start with `/` so it
    /// cannot change the host the key is sent to.
    pub(crate) fn url(&self, path: &str) -> Result<String> {
        if !path.starts_with('/') {
            return Err(JsonDbError::Config(format!(
                "request path must start with '/', got '{path}'"
            )));
        }
        Ok(format!("{}{path}", self.base_url))
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Defaults, then per-request headers, then `Authorization`.
    pub(crate) fn headers_for(&self, request: &Request) -> Result<HeaderMap> {
        let mut headers = self.defaults.clone();
        merge_headers(&mut headers, &request.headers)?;
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        Ok(headers)
    }
}

fn merge_headers(target: &mut HeaderMap, extra: &[(String, String)]) -> Result<()> {
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| JsonDbError::Config(format!("invalid header name '{name}'")))?;
        if name == header::AUTHORIZATION {
            continue;
        }
        let value = HeaderValue::from_str(value)
            .map_err(|_| JsonDbError::Config(format!("invalid value for header '{name}'")))?;
        target.insert(name, value);
    }
    Ok(())
}

/// Always `Bearer <key>`; a key passed with any-case `bearer ` is re-prefixed.
fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let key = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    };
    format!("Bearer {key}")
}
