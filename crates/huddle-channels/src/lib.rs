//! # Huddle Channels
//! Chat transport implementations of the core `Channel` trait.

pub mod discord;

pub use discord::DiscordChannel;
