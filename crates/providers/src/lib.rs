//! HTTP and process adapters behind the pipeline traits.
//!
//! Everything here wraps an external service with [`reqwest`] (or an
//! external binary with `tokio::process`) and converts its failures into the
//! pipeline's error types.

pub mod fetch;
pub mod ffmpeg;
pub mod hosting;
pub mod http;
pub mod magichour;
pub mod openai;
pub mod operations;
