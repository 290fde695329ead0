//! Discord front end for the media-job pipeline.
//!
//! Slash commands arrive as signed HTTP interactions. Each accepted
//! command is acknowledged with a deferred response and then runs on a
//! background task that submits the job, edits a progress follow-up while
//! it is watched, and posts the result.

pub mod characters;
pub mod commands;
pub mod config;
pub mod discord;
pub mod error;
pub mod render;
pub mod routes;
pub mod services;
pub mod signature;
pub mod state;
