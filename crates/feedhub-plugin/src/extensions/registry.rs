//! Extension registry: named extension points holding priority-ordered
//! contributions from plugins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::components::ComponentHandle;

/// Free-form metadata attached to a contribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionMetadata {
    /// Tags consumers may filter on.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Anything else the contributing plugin wants to pass along.
    #[serde(default)]
    pub extra: Value,
}

impl ExtensionMetadata {
    /// Returns whether the metadata carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Options for a contribution beyond its point and component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionOptions {
    /// Higher renders first.
    pub priority: i32,
    /// Attached metadata.
    pub metadata: ExtensionMetadata,
}

impl ExtensionOptions {
    /// Options with a priority.
    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    /// Sets the free-form metadata.
    pub fn extra(mut self, extra: Value) -> Self {
        self.metadata.extra = extra;
        self
    }
}

/// A plugin's contribution to an extension point.
#[derive(Debug, Clone)]
pub struct ExtensionRegistration {
    /// Unique id, `{plugin_id}:{point}:{seq}`.
    pub id: String,
    /// Contributing plugin.
    pub plugin_id: String,
    /// Extension point name.
    pub point: String,
    /// What to render.
    pub component: ComponentHandle,
    /// Higher renders first.
    pub priority: i32,
    /// Attached metadata.
    pub metadata: ExtensionMetadata,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

/// Narrows the contributions returned for a point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionFilter {
    /// Only contributions from this plugin.
    pub plugin_id: Option<String>,
    /// Only contributions with at least this priority.
    pub min_priority: Option<i32>,
    /// Only contributions carrying this tag.
    pub tag: Option<String>,
    /// At most this many contributions, highest priority first.
    pub limit: Option<usize>,
}

impl ExtensionFilter {
    /// A filter that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps one plugin's contributions.
    pub fn plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    /// Keeps contributions at or above a priority.
    pub fn min_priority(mut self, priority: i32) -> Self {
        self.min_priority = Some(priority);
        self
    }

    /// Keeps contributions carrying a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Caps the result length.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns whether a contribution passes every predicate.
    pub fn matches(&self, registration: &ExtensionRegistration) -> bool {
        if let Some(plugin_id) = &self.plugin_id {
            if &registration.plugin_id != plugin_id {
                return false;
            }
        }
        if let Some(min) = self.min_priority {
            if registration.priority < min {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !registration.metadata.has_tag(tag) {
                return false;
            }
        }
        true
    }

    /// Applies the filter to an already ordered list.
    pub fn apply(&self, registrations: Vec<ExtensionRegistration>) -> Vec<ExtensionRegistration> {
        let matching = registrations.into_iter().filter(|r| self.matches(r));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

/// Registry of contributions organized by extension point.
#[derive(Debug)]
pub struct ExtensionRegistry {
    /// Point → contributions sorted by descending priority.
    points: RwLock<HashMap<String, Vec<ExtensionRegistration>>>,
    /// Monotonic sequence for ids.
    next_seq: AtomicU64,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            points: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Adds a contribution and returns its id.
    pub async fn register(
        &self,
        plugin_id: &str,
        point: &str,
        component: ComponentHandle,
        options: ExtensionOptions,
    ) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("{plugin_id}:{point}:{seq}");
        let priority = options.priority;

        let mut points = self.points.write().await;
        let entries = points.entry(point.to_string()).or_default();
        entries.push(ExtensionRegistration {
            id: id.clone(),
            plugin_id: plugin_id.to_string(),
            point: point.to_string(),
            component,
            priority,
            metadata: options.metadata,
            registered_at: Utc::now(),
        });

        // Stable: equal priorities keep registration order
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        info!(
            point = %point,
            plugin_id = %plugin_id,
            extension_id = %id,
            priority = priority,
            "Extension registered"
        );
        id
    }

    /// Removes a contribution by id. Returns whether it existed.
    pub async fn unregister(&self, id: &str) -> bool {
        let mut points = self.points.write().await;
        let mut removed = false;

        for entries in points.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            removed |= before != entries.len();
        }
        points.retain(|_, entries| !entries.is_empty());

        if removed {
            debug!(extension_id = %id, "Extension unregistered");
        }
        removed
    }

    /// Removes every contribution of a plugin. Returns how many were removed.
    pub async fn unregister_plugin(&self, plugin_id: &str) -> usize {
        let mut points = self.points.write().await;
        let mut removed = 0;

        for entries in points.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.plugin_id != plugin_id);
            removed += before - entries.len();
        }
        points.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Contributions for a point, highest priority first.
    pub async fn get(&self, point: &str) -> Vec<ExtensionRegistration> {
        self.points
            .read()
            .await
            .get(point)
            .cloned()
            .unwrap_or_default()
    }

    /// Contributions for a point passing a filter, highest priority first.
    pub async fn get_filtered(
        &self,
        point: &str,
        filter: &ExtensionFilter,
    ) -> Vec<ExtensionRegistration> {
        filter.apply(self.get(point).await)
    }

    /// Points with at least one contribution, sorted by name.
    pub async fn points(&self) -> Vec<String> {
        let mut names: Vec<String> = self.points.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of contributions for a point.
    pub async fn count(&self, point: &str) -> usize {
        self.points
            .read()
            .await
            .get(point)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of contributions across all points.
    pub async fn total(&self) -> usize {
        self.points.read().await.values().map(Vec::len).sum()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnComponent;
    use serde_json::json;
    use std::sync::Arc;

    fn button(label: &'static str) -> ComponentHandle {
        Arc::new(FnComponent::new(label, move |_| Ok(json!({ "label": label }))))
    }

    fn ids(registrations: &[ExtensionRegistration]) -> Vec<String> {
        registrations.iter().map(|r| r.plugin_id.clone()).collect()
    }

    #[tokio::test]
    async fn test_descending_priority_with_stable_ties() {
        let registry = ExtensionRegistry::new();
        registry
            .register("a", "post.actions", button("a"), ExtensionOptions::with_priority(10))
            .await;
        registry
            .register("b", "post.actions", button("b"), ExtensionOptions::with_priority(50))
            .await;
        registry
            .register("c", "post.actions", button("c"), ExtensionOptions::with_priority(10))
            .await;
        registry
            .register("d", "post.actions", button("d"), ExtensionOptions::default())
            .await;

        let first = registry.get("post.actions").await;
        assert_eq!(ids(&first), vec!["b", "a", "c", "d"]);
        assert_eq!(ids(&registry.get("post.actions").await), ids(&first));
        assert!(registry.get("profile.tabs").await.is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_unique_for_identical_registrations() {
        let registry = ExtensionRegistry::new();
        let first = registry
            .register("a", "feed.header", button("x"), ExtensionOptions::default())
            .await;
        let second = registry
            .register("a", "feed.header", button("x"), ExtensionOptions::default())
            .await;

        assert_ne!(first, second);
        assert!(first.starts_with("a:feed.header:"));
        assert_eq!(registry.count("feed.header").await, 2);
    }

    #[tokio::test]
    async fn test_unregister_by_id_and_plugin() {
        let registry = ExtensionRegistry::new();
        let id = registry
            .register("a", "post.actions", button("a"), ExtensionOptions::default())
            .await;
        registry
            .register("b", "post.actions", button("b"), ExtensionOptions::default())
            .await;
        registry
            .register("b", "feed.header", button("b"), ExtensionOptions::default())
            .await;

        assert!(registry.unregister(&id).await);
        assert!(!registry.unregister(&id).await);
        assert_eq!(registry.unregister_plugin("b").await, 2);
        assert!(registry.points().await.is_empty());
        assert_eq!(registry.total().await, 0);
    }

    #[tokio::test]
    async fn test_filtering() {
        let registry = ExtensionRegistry::new();
        registry
            .register(
                "comments",
                "post.actions",
                button("comment"),
                ExtensionOptions::with_priority(90).tag("social"),
            )
            .await;
        registry
            .register("posts", "post.actions", button("like"), ExtensionOptions::with_priority(100))
            .await;
        registry
            .register("posts", "post.actions", button("share"), ExtensionOptions::with_priority(80))
            .await;

        let social = registry
            .get_filtered("post.actions", &ExtensionFilter::new().tag("social"))
            .await;
        assert_eq!(ids(&social), vec!["comments"]);

        let posts = registry
            .get_filtered("post.actions", &ExtensionFilter::new().plugin("posts"))
            .await;
        assert_eq!(posts.len(), 2);

        let top = registry
            .get_filtered(
                "post.actions",
                &ExtensionFilter::new().min_priority(85).limit(1),
            )
            .await;
        assert_eq!(ids(&top), vec!["posts"]);
        assert_eq!(top[0].priority, 100);
    }
}
