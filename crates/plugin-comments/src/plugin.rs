//! Comments plugin definition.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use feedhub_core::error::AppError;
use feedhub_plugin::api::context::PluginContext;
use feedhub_plugin::config::schema::{ConfigSchema, ConfigType};
use feedhub_plugin::definition::PluginDefinition;
use feedhub_plugin::extensions::registry::ExtensionOptions;
use feedhub_plugin::services::registry::{ServiceOptions, ServiceProvider};
use feedhub_plugin_sdk::builder::PluginBuilder;
use plugin_posts::PostFeed;
use plugin_posts::plugin::{FEED_SERVICE, POST_ACTIONS, POST_CREATED};

use crate::guard::comment_guard;
use crate::state;
use crate::thread::CommentThread;

/// Plugin id.
pub const PLUGIN_ID: &str = "comments";

/// Service name of the comment thread store.
pub const THREAD_SERVICE: &str = "comments.thread";

/// Optional peer providing push notifications.
pub const NOTIFICATIONS_PEER: &str = "notifications";

/// Service the notifications peer exposes when it is loaded.
const NOTIFICATIONS_SERVICE: &str = "notifications.center";

/// Default reply depth when the configuration does not set one.
const DEFAULT_MAX_DEPTH: u32 = 3;

fn config_schema() -> ConfigSchema {
    ConfigSchema::new()
        .required("max_depth", ConfigType::Integer)
        .property("allow_anonymous", ConfigType::Boolean)
}

fn comment_button(props: &Value) -> feedhub_core::result::AppResult<Value> {
    let post_id = &props["post_id"];
    if post_id.is_null() {
        return Err(AppError::render("post_id prop is required"));
    }
    Ok(json!({
        "type": "button",
        "label": "Comment",
        "icon": "bubble",
        "post_id": post_id,
        "count": props["comment_count"].as_u64().unwrap_or(0),
    }))
}

async fn activate(ctx: PluginContext) -> feedhub_core::result::AppResult<()> {
    let feed = ctx
        .get_service_as::<PostFeed>(FEED_SERVICE)
        .await
        .ok_or_else(|| AppError::not_found(format!("Service '{FEED_SERVICE}' is not registered")))?;

    let max_depth = ctx
        .get_plugin_config(None)
        .await
        .and_then(|config| config["max_depth"].as_u64())
        .and_then(|depth| u32::try_from(depth).ok())
        .unwrap_or(DEFAULT_MAX_DEPTH);

    let thread = Arc::new(CommentThread::new(feed, max_depth));
    ctx.register_service(
        THREAD_SERVICE,
        ServiceProvider::Instance(thread.clone()),
        ServiceOptions::default()
            .depends_on(FEED_SERVICE)
            .with_tag("social"),
    )
    .await?;

    ctx.subscribe_to_event(POST_CREATED, move |event| {
        if let Some(post_id) = event.data["id"].as_u64() {
            debug!(post_id = post_id, "Opening comment thread for new post");
            thread.open(post_id);
        }
    })
    .await;

    if ctx.get_service(NOTIFICATIONS_SERVICE).await.is_some() {
        debug!(peer = NOTIFICATIONS_PEER, "Notifications peer is active");
    }

    info!(plugin_id = %ctx.plugin_id(), max_depth = max_depth, "Comments plugin activated");
    Ok(())
}

/// Builds the comments plugin definition.
pub fn definition() -> PluginDefinition {
    PluginBuilder::new(PLUGIN_ID, "Comments", "1.0.0")
        .description("Threaded comments on posts")
        .author("FeedHub")
        .depends_on(plugin_posts::PLUGIN_ID)
        .peer(NOTIFICATIONS_PEER)
        .default_config(json!({ "max_depth": DEFAULT_MAX_DEPTH, "allow_anonymous": false }))
        .config_schema(config_schema())
        .reducer(state::SLICE, state::reduce)
        .middleware(comment_guard)
        .extension_with(
            POST_ACTIONS,
            ExtensionOptions::with_priority(90).tag("social"),
            comment_button,
        )
        .on_activate(activate)
        .on_deactivate(|ctx| async move {
            info!(plugin_id = %ctx.plugin_id(), "Comments plugin deactivated");
            Ok(())
        })
        .build()
}
