//! Threaded comments plugin for FeedHub.
//!
//! Requires the posts plugin. Contributes the `comments.thread` service,
//! the `comments` state slice with a guard middleware, and the Comment
//! action on `post.actions`. Notifications are an optional peer.

pub mod guard;
pub mod plugin;
pub mod state;
pub mod thread;

pub use plugin::{PLUGIN_ID, definition};
pub use thread::{Comment, CommentThread};
