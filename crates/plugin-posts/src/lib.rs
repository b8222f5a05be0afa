//! Post feed plugin for FeedHub.
//!
//! Contributes the `posts.feed` service, the `posts` state slice, the post
//! card and detail screen, and the Like and Share actions on
//! `post.actions`.

pub mod components;
pub mod feed;
pub mod plugin;
pub mod state;

pub use feed::{Post, PostFeed};
pub use plugin::{PLUGIN_ID, definition};
