//! End-to-end scenarios with the bundled posts and comments plugins.

mod helpers;

use std::sync::Arc;
use std::sync::Mutex;

use serde_json::json;

use feedhub_plugin::config::source::MemoryConfigSource;
use feedhub_plugin::error::PluginError;
use feedhub_plugin::events::PLUGIN_ACTIVATED;
use feedhub_plugin::extensions::renderer::RenderRequest;
use feedhub_plugin::registry::PluginState;
use feedhub_plugin::store::action::Action;
use feedhub_plugin_sdk::builder::PluginBuilder;
use plugin_comments::thread::CommentThread;
use plugin_posts::PostFeed;
use plugin_posts::plugin::{FEED_SERVICE, POST_ACTIONS, POST_CREATED};

use helpers::{TestHost, label, plugin};

#[tokio::test]
async fn test_post_actions_follow_priority_not_load_order() {
    let host = TestHost::new();
    host.load(plugin("x").extension("post.actions", 80, label("X")).build())
        .await
        .unwrap();
    host.load(plugin("y").extension("post.actions", 100, label("Y")).build())
        .await
        .unwrap();

    assert_eq!(host.contributors("post.actions").await, vec!["y", "x"]);

    let output = host
        .manager
        .renderer()
        .render("post.actions", &RenderRequest::new(json!({})))
        .await;
    assert_eq!(
        output.views(),
        vec![json!({ "label": "Y" }), json!({ "label": "X" })]
    );
}

#[tokio::test]
async fn test_peer_dependency_is_not_required() {
    let host = TestHost::new();
    host.load(
        PluginBuilder::new("comments", "Comments", "1.0.0")
            .peer("posts")
            .extension("post.actions", 90, label("Comment"))
            .build(),
    )
    .await
    .unwrap();

    assert_eq!(
        host.manager.get_plugin_state("comments").await,
        Some(PluginState::Activated)
    );
    assert!(host.manager.get_plugin("posts").await.is_none());
    assert_eq!(host.priorities("post.actions").await, vec![90]);
}

#[tokio::test]
async fn test_bundled_plugins_cooperate() {
    let host = TestHost::new();
    host.load(plugin_posts::definition()).await.unwrap();
    host.load(plugin_comments::definition()).await.unwrap();

    assert_eq!(host.priorities(POST_ACTIONS).await, vec![100, 90, 80]);
    assert_eq!(
        host.contributors(POST_ACTIONS).await,
        vec!["posts", "comments", "posts"]
    );

    let services = &host.manager.registries().services;
    let feed = services.get_as::<PostFeed>(FEED_SERVICE).await.unwrap();
    let thread = services
        .get_as::<CommentThread>(plugin_comments::plugin::THREAD_SERVICE)
        .await
        .unwrap();

    let post = feed.publish("ana", "first post").unwrap();
    host.manager
        .registries()
        .events
        .emit(POST_CREATED, json!({ "id": post.id }), "host")
        .await;
    assert_eq!(thread.thread_count(), 1);
    thread.add(post.id, None, "ben", "welcome").unwrap();
    assert_eq!(thread.count(post.id), 1);

    host.store
        .dispatch(Action::new(plugin_posts::state::ADD_POST).with_payload(json!(post)))
        .await;
    host.store
        .dispatch(
            Action::new(plugin_comments::state::ADD_COMMENT)
                .with_payload(json!({ "post_id": post.id, "body": "  nice  " })),
        )
        .await;
    let root = host.store.state().await;
    assert_eq!(root["posts"]["items"][0]["id"], post.id);
    assert_eq!(plugin_comments::state::counts(&root)[&post.id.to_string()], 1);

    let output = host
        .manager
        .renderer()
        .render(
            POST_ACTIONS,
            &RenderRequest::new(json!({ "post_id": post.id, "comment_count": 1 })),
        )
        .await;
    assert_eq!(output.rendered.len(), 3);
    assert!(output.failures.is_empty());
    assert_eq!(output.rendered[1].output["label"], "Comment");

    let summary = host.manager.summary().await;
    assert_eq!(summary.plugins, 2);
    assert_eq!(summary.activated, 2);
    assert!(summary.store_bound);

    host.manager.unload_all().await;
    assert!(host.manager.get_extensions(POST_ACTIONS).await.is_empty());
    assert!(services.get(FEED_SERVICE).await.is_none());
    assert!(host.store.slice("posts").await.is_none());
    assert!(host.store.slice("comments").await.is_none());
}

#[tokio::test]
async fn test_dependent_load_order_is_enforced() {
    let host = TestHost::new();
    let err = host.load(plugin_comments::definition()).await.unwrap_err();
    assert!(matches!(err, PluginError::DependencyMissing { ref dependency, .. } if dependency == "posts"));

    host.load(plugin_posts::definition()).await.unwrap();
    host.load(plugin_comments::definition()).await.unwrap();
}

#[tokio::test]
async fn test_persisted_config_overrides_defaults() {
    let source = MemoryConfigSource::new()
        .with_value("comments", json!({ "max_depth": 1 }));
    let host = TestHost::with_config(source);

    host.load(plugin_posts::definition()).await.unwrap();
    host.load(plugin_comments::definition()).await.unwrap();

    let config = host
        .manager
        .registries()
        .configs
        .get("comments")
        .await
        .unwrap();
    assert_eq!(config["max_depth"], 1);
    assert_eq!(config["allow_anonymous"], false);

    let thread = host
        .manager
        .registries()
        .services
        .get_as::<CommentThread>(plugin_comments::plugin::THREAD_SERVICE)
        .await
        .unwrap();
    assert_eq!(thread.max_depth(), 1);
}

#[tokio::test]
async fn test_plugins_talk_through_events_and_config() {
    let host = TestHost::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();

    host.load(
        plugin("listener")
            .default_config(json!({ "enabled": true }))
            .on_activate(move |ctx| {
                let sink = sink.clone();
                async move {
                    ctx.subscribe_to_event("ping", move |event| {
                        if let Ok(mut seen) = sink.lock() {
                            seen.push(event.source.clone());
                        }
                    })
                    .await;
                    Ok(())
                }
            })
            .build(),
    )
    .await
    .unwrap();

    host.load(
        plugin("speaker")
            .on_activate(|ctx| async move {
                let listener = ctx.get_plugin_config(Some("listener")).await;
                assert_eq!(listener, Some(json!({ "enabled": true })));

                let updated = ctx.update_plugin_config(json!({ "volume": 3 })).await?;
                assert_eq!(updated["volume"], 3);

                ctx.emit_event("ping", json!({})).await;
                Ok(())
            })
            .build(),
    )
    .await
    .unwrap();

    assert_eq!(*received.lock().unwrap(), vec!["speaker".to_string()]);

    let activated = host
        .manager
        .registries()
        .events
        .history_for(PLUGIN_ACTIVATED)
        .await;
    let ids: Vec<_> = activated
        .iter()
        .map(|e| e.data["plugin_id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["listener", "speaker"]);
}
