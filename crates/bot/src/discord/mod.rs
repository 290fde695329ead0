//! Discord wire types and REST client.

pub mod client;
pub mod interaction;
pub mod sink;

pub use client::{DiscordClient, DiscordError};
pub use interaction::{Embed, Interaction, InteractionResponse, MessagePayload};
pub use sink::FollowupSink;
