//! Blocking client with the same surface as the async [`crate::JsonDb`].
//!
//! Enabled with the `blocking` feature (on by default). Retries sleep the
//! calling thread. Do not call these methods from inside an async runtime.

mod client;
mod collection;

pub use client::JsonDb;
pub use collection::Collection;
