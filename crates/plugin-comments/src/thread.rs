//! The `comments.thread` service: comment trees attached to posts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;
use plugin_posts::PostFeed;

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: u64,
    /// Post the comment belongs to.
    pub post_id: u64,
    /// Parent comment for replies.
    pub parent_id: Option<u64>,
    /// Nesting depth, 0 for top-level comments.
    pub depth: u32,
    /// Author handle.
    pub author: String,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Comments per post, validated against the post feed.
#[derive(Debug)]
pub struct CommentThread {
    feed: Arc<PostFeed>,
    comments: DashMap<u64, Vec<Comment>>,
    max_depth: u32,
    next_id: AtomicU64,
}

impl CommentThread {
    /// Creates a thread store over a post feed.
    pub fn new(feed: Arc<PostFeed>, max_depth: u32) -> Self {
        Self {
            feed,
            comments: DashMap::new(),
            max_depth,
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds a comment, or a reply when `parent_id` is set.
    pub fn add(
        &self,
        post_id: u64,
        parent_id: Option<u64>,
        author: &str,
        body: &str,
    ) -> AppResult<Comment> {
        if !self.feed.contains(post_id) {
            return Err(AppError::not_found(format!("Post {post_id} not found")));
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("Comment body must not be empty"));
        }

        let mut thread = self.comments.entry(post_id).or_default();

        let depth = match parent_id {
            None => 0,
            Some(parent) => {
                let parent = thread
                    .iter()
                    .find(|c| c.id == parent)
                    .ok_or_else(|| AppError::not_found(format!("Comment {parent} not found")))?;
                parent.depth + 1
            }
        };
        if depth > self.max_depth {
            return Err(AppError::validation(format!(
                "Replies are limited to {} levels",
                self.max_depth
            )));
        }

        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            post_id,
            parent_id,
            depth,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        thread.push(comment.clone());
        Ok(comment)
    }

    /// Creates an empty thread for a post if it has none.
    pub fn open(&self, post_id: u64) {
        self.comments.entry(post_id).or_default();
    }

    /// Number of posts with a thread.
    pub fn thread_count(&self) -> usize {
        self.comments.len()
    }

    /// Comments on a post in creation order.
    pub fn for_post(&self, post_id: u64) -> Vec<Comment> {
        self.comments
            .get(&post_id)
            .map(|thread| thread.clone())
            .unwrap_or_default()
    }

    /// Number of comments on a post.
    pub fn count(&self, post_id: u64) -> usize {
        self.comments.get(&post_id).map(|t| t.len()).unwrap_or(0)
    }

    /// Maximum reply depth.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
