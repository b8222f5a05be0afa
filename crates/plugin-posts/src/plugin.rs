//! Posts plugin definition and lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use feedhub_core::result::AppResult;
use feedhub_plugin::api::context::PluginContext;
use feedhub_plugin::definition::{PluginDefinition, PluginLifecycle};
use feedhub_plugin::extensions::registry::ExtensionOptions;
use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};
use feedhub_plugin::traits::FnComponent;
use feedhub_plugin_sdk::builder::PluginBuilder;

use crate::components;
use crate::feed::PostFeed;
use crate::state;

/// Plugin id.
pub const PLUGIN_ID: &str = "posts";

/// Service name of the post feed.
pub const FEED_SERVICE: &str = "posts.feed";

/// Extension point for per-post action buttons.
pub const POST_ACTIONS: &str = "post.actions";

/// Emitted after a post is published through the feed.
pub const POST_CREATED: &str = "post:created";

/// Lifecycle of the posts plugin.
#[derive(Debug, Default)]
pub struct PostsLifecycle;

#[async_trait]
impl PluginLifecycle for PostsLifecycle {
    async fn install(&self, ctx: &PluginContext) -> AppResult<()> {
        debug!(plugin_id = %ctx.plugin_id(), "Installing posts plugin");
        Ok(())
    }

    async fn activate(&self, ctx: &PluginContext) -> AppResult<()> {
        let compose = Arc::new(FnComponent::new("compose", |_| {
            Ok(json!({ "type": "button", "label": "New post", "action": state::ADD_POST }))
        }));
        ctx.register_extension_with(
            "feed.header",
            compose,
            ExtensionOptions::with_priority(100).tag("compose"),
        )
        .await;

        ctx.subscribe_to_event(POST_CREATED, |event| {
            debug!(post = %event.data["id"], source = %event.source, "Post created");
        })
        .await;

        info!(plugin_id = %ctx.plugin_id(), "Posts plugin activated");
        Ok(())
    }

    async fn deactivate(&self, ctx: &PluginContext) -> AppResult<()> {
        info!(plugin_id = %ctx.plugin_id(), "Posts plugin deactivated");
        Ok(())
    }
}

/// Builds the posts plugin definition.
pub fn definition() -> PluginDefinition {
    PluginBuilder::new(PLUGIN_ID, "Posts", "1.0.0")
        .description("Post feed, post cards and post actions")
        .author("FeedHub")
        .default_config(json!({ "page_size": 20 }))
        .service(
            FEED_SERVICE,
            ServiceProvider::instance(PostFeed::new()),
            ServiceOptions::default().with_tag("content"),
        )
        .reducer(state::SLICE, state::reduce)
        .component("PostCard", components::post_card)
        .screen("PostDetail", components::post_detail)
        .extension(POST_ACTIONS, 100, components::like_button)
        .extension(POST_ACTIONS, 80, components::share_button)
        .lifecycle(PostsLifecycle)
        .build()
}
