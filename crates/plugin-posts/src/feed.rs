//! The `posts.feed` service: an in-memory post store.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id.
    pub id: u64,
    /// Author handle.
    pub author: String,
    /// Body text.
    pub body: String,
    /// Like count.
    pub likes: u64,
    /// Publication time.
    pub created_at: DateTime<Utc>,
}

/// Posts keyed by id.
#[derive(Debug)]
pub struct PostFeed {
    posts: DashMap<u64, Post>,
    next_id: AtomicU64,
}

impl PostFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publishes a post.
    pub fn publish(&self, author: &str, body: &str) -> AppResult<Post> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("Post body must not be empty"));
        }

        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            author: author.to_string(),
            body: body.to_string(),
            likes: 0,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    /// Looks up a post.
    pub fn get(&self, id: u64) -> Option<Post> {
        self.posts.get(&id).map(|p| p.clone())
    }

    /// Returns whether a post exists.
    pub fn contains(&self, id: u64) -> bool {
        self.posts.contains_key(&id)
    }

    /// Adds a like and returns the new count.
    pub fn like(&self, id: u64) -> AppResult<u64> {
        let mut post = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Post {id} not found")))?;
        post.likes += 1;
        Ok(post.likes)
    }

    /// Removes a post.
    pub fn remove(&self, id: u64) -> Option<Post> {
        self.posts.remove(&id).map(|(_, post)| post)
    }

    /// All posts, newest first.
    pub fn latest(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        posts
    }

    /// Number of posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Returns whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl Default for PostFeed {
    fn default() -> Self {
        Self::new()
    }
}
