//! Domain types shared by every reelbot crate.
//!
//! Pure data and pure functions only: job kinds and identifiers, the fixed
//! status set with its classification table, asset location inside result
//! payloads, and the error taxonomy returned to callers. No I/O lives here.

pub mod asset;
pub mod error;
pub mod job;
pub mod job_error;
pub mod status;
pub mod types;
