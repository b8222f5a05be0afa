//! Integration tests for extension points and their rendering.

mod helpers;

use serde_json::json;

use feedhub_core::error::AppError;
use feedhub_plugin::extensions::registry::{ExtensionFilter, ExtensionOptions};
use feedhub_plugin::extensions::renderer::RenderRequest;

use helpers::{TestHost, label, plugin};

#[tokio::test]
async fn test_extensions_sorted_by_descending_priority() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .extension("feed.header", 5, label("low"))
            .extension("feed.header", 500, label("high"))
            .build(),
    )
    .await
    .unwrap();
    host.load(
        plugin("beta")
            .extension("feed.header", 50, label("mid"))
            .extension("feed.header", -10, label("negative"))
            .build(),
    )
    .await
    .unwrap();

    assert_eq!(host.priorities("feed.header").await, vec![500, 50, 5, -10]);
}

#[tokio::test]
async fn test_equal_priorities_keep_registration_order() {
    let host = TestHost::new();
    host.load(plugin("first").extension("profile.tabs", 10, label("1")).build())
        .await
        .unwrap();
    host.load(plugin("second").extension("profile.tabs", 10, label("2")).build())
        .await
        .unwrap();

    assert_eq!(host.contributors("profile.tabs").await, vec!["first", "second"]);
}

#[tokio::test]
async fn test_unrelated_plugins_are_order_independent() {
    let alpha = || plugin("alpha").extension("post.actions", 70, label("A")).build();
    let beta = || plugin("beta").extension("post.actions", 30, label("B")).build();

    let forward = TestHost::new();
    forward.load(alpha()).await.unwrap();
    forward.load(beta()).await.unwrap();

    let backward = TestHost::new();
    backward.load(beta()).await.unwrap();
    backward.load(alpha()).await.unwrap();

    assert_eq!(
        forward.contributors("post.actions").await,
        backward.contributors("post.actions").await
    );
    assert_eq!(
        forward.priorities("post.actions").await,
        backward.priorities("post.actions").await
    );
    assert_eq!(forward.manager.summary().await, backward.manager.summary().await);
}

#[tokio::test]
async fn test_extension_ids_are_unique() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .extension("post.actions", 1, label("A"))
            .extension("post.actions", 1, label("B"))
            .extension("post.actions", 1, label("C"))
            .build(),
    )
    .await
    .unwrap();

    let mut ids: Vec<String> = host
        .manager
        .get_extensions("post.actions")
        .await
        .into_iter()
        .map(|e| e.id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.starts_with("alpha:post.actions:")));
}

#[tokio::test]
async fn test_filtered_lookup() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .extension_with(
                "post.actions",
                ExtensionOptions::with_priority(90).tag("social"),
                label("A"),
            )
            .extension("post.actions", 10, label("B"))
            .build(),
    )
    .await
    .unwrap();
    host.load(plugin("beta").extension("post.actions", 60, label("C")).build())
        .await
        .unwrap();

    let extensions = &host.manager.registries().extensions;
    let social = extensions
        .get_filtered("post.actions", &ExtensionFilter::new().tag("social"))
        .await;
    assert_eq!(social.len(), 1);
    assert_eq!(social[0].priority, 90);

    let top = extensions
        .get_filtered("post.actions", &ExtensionFilter::new().min_priority(50).limit(1))
        .await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].priority, 90);

    let beta = extensions
        .get_filtered("post.actions", &ExtensionFilter::new().plugin("beta"))
        .await;
    assert_eq!(beta.len(), 1);
    assert_eq!(beta[0].plugin_id, "beta");
}

#[tokio::test]
async fn test_renderer_isolates_failing_contributions() {
    let host = TestHost::new();
    host.load(
        plugin("alpha")
            .extension("post.actions", 100, label("Like"))
            .extension("post.actions", 90, |_| Err(AppError::render("no post")))
            .extension("post.actions", 80, |_| panic!("render exploded"))
            .extension("post.actions", 70, label("Share"))
            .build(),
    )
    .await
    .unwrap();

    let output = host
        .manager
        .renderer()
        .render(
            "post.actions",
            &RenderRequest::new(json!({ "post_id": 1 })).with_fallback(json!({ "type": "empty" })),
        )
        .await;

    assert!(output.fallback.is_none());
    assert_eq!(
        output.views(),
        vec![json!({ "label": "Like" }), json!({ "label": "Share" })]
    );
    assert_eq!(output.failures.len(), 2);
    assert!(!output.failures[0].panicked);
    assert!(output.failures[1].panicked);
    assert!(output.failures[1].message.contains("render exploded"));
}

#[tokio::test]
async fn test_renderer_falls_back_on_empty_point() {
    let host = TestHost::new();
    let output = host
        .manager
        .renderer()
        .render(
            "settings.sections",
            &RenderRequest::new(json!({})).with_fallback(json!({ "type": "empty" })),
        )
        .await;

    assert!(output.rendered.is_empty());
    assert_eq!(output.views(), vec![json!({ "type": "empty" })]);
    assert!(!output.is_empty());
}
