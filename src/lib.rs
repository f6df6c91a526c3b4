//! `jsondb-cloud` is an HTTP client for the jsondb.cloud document store.
//!
//! Documents live in named collections inside a project namespace:
//! - [`JsonDb::collection`] returns a [`Collection`] with CRUD, bulk, schema,
//!   version history, webhook and import/export methods
//! - [`JsonDb::request`] executes any [`Request`] directly
//!
//! Every call retries `429`/`5xx` responses and transient network failures
//! with capped exponential backoff, then surfaces a single [`JsonDbError`].
//! With the `blocking` feature (default), [`blocking::JsonDb`] offers the same
//! surface without an async runtime.

mod client;
mod collection;
mod decode;
mod error;
mod options;
mod query;
mod request;
mod retry;
mod transport;
mod types;
mod wire;

#[cfg(feature = "blocking")]
pub mod blocking;

pub use client::JsonDb;
pub use collection::Collection;
pub use decode::create_error;
pub use error::{ApiError, ApiErrorKind, FieldError, JsonDbError};
pub use options::{ClientOptions, DEFAULT_BASE_URL, DEFAULT_PROJECT};
pub use query::{Filter, FilterOp, ListOptions};
pub use request::Request;
pub use retry::{is_retryable_status, BackoffPolicy, RETRYABLE_STATUSES};
pub use types::{
    BulkItemResult, BulkOperation, BulkResult, BulkSummary, Document, ImportOptions, ListResult,
    Meta, PatchOperation, WebhookConfig, WebhookUpdate,
};

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, JsonDbError>;
