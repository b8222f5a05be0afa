//! FeedHub host: loads the bundled plugins, exercises their extension
//! points and shuts the plugin system down again.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};

use feedhub_core::config::AppConfig;
use feedhub_core::error::AppError;
use feedhub_plugin::config::source::FileConfigSource;
use feedhub_plugin::extensions::renderer::RenderRequest;
use feedhub_plugin::host::HostRegistries;
use feedhub_plugin::manager::PluginManager;
use feedhub_plugin::store::Store;
use feedhub_plugin::store::action::Action;
use feedhub_plugin::store::reducer::Reducer;
use feedhub_plugin::traits::FnReducer;
use plugin_posts::PostFeed;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "feedhub-host", version, about = "FeedHub plugin host")]
struct Args {
    /// Configuration environment overlay (`config/{env}.toml`).
    #[arg(long, default_value = "development")]
    env: String,

    /// Directory holding the configuration files.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Extension point to render after loading.
    #[arg(long, default_value = plugin_posts::plugin::POST_ACTIONS)]
    point: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_configuration(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, &args.point).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from the config directory and environment
fn load_configuration(args: &Args) -> Result<AppConfig, AppError> {
    AppConfig::load_from(&args.config_dir, &args.env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main host run function
async fn run(config: AppConfig, point: &str) -> Result<(), AppError> {
    tracing::info!(
        environment = %config.app.environment,
        "Starting {} v{}",
        config.app.name,
        env!("CARGO_PKG_VERSION")
    );

    // ── Step 1: State store with the host's base slices ──────────
    let session: Arc<dyn Reducer> = Arc::new(FnReducer::new(|state, action| {
        let mut state = state.cloned().unwrap_or_else(|| json!({ "user": null }));
        if action.kind == "session/login" {
            state["user"] = action.payload.clone();
        }
        state
    }));
    let store = Arc::new(Store::with_reducers(vec![("session".to_string(), session)]));

    // ── Step 2: Shared registries ────────────────────────────────
    let source = Arc::new(FileConfigSource::new(&config.plugins.config_directory));
    let registries = HostRegistries::new(source, config.events.history_size);

    // ── Step 3: Plugin manager ───────────────────────────────────
    tracing::info!("Initializing plugin system...");
    let manager =
        PluginManager::with_store(registries, Arc::clone(&store)).with_settings(config.plugins);

    let report = manager
        .load_all(vec![
            plugin_posts::definition(),
            plugin_comments::definition(),
        ])
        .await?;
    for (plugin_id, err) in &report.failed {
        tracing::warn!(plugin_id = %plugin_id, error = %err, "Plugin failed to load");
    }
    tracing::info!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Plugins loaded"
    );

    // ── Step 4: Exercise the loaded plugins ──────────────────────
    store
        .dispatch(Action::new("session/login").with_payload(json!({ "handle": "ana" })))
        .await;

    let mut props = json!({ "post_id": 0 });
    if let Some(feed) = manager
        .registries()
        .services
        .get_as::<PostFeed>(plugin_posts::plugin::FEED_SERVICE)
        .await
    {
        let post = feed.publish("ana", "Hello from the host")?;
        manager
            .registries()
            .events
            .emit(
                plugin_posts::plugin::POST_CREATED,
                json!({ "id": post.id }),
                "host",
            )
            .await;
        store
            .dispatch(Action::new(plugin_posts::state::ADD_POST).with_payload(json!(post)))
            .await;
        props = json!({ "post_id": post.id });
    }

    // ── Step 5: Render the requested extension point ─────────────
    let output = manager
        .renderer()
        .render(
            point,
            &RenderRequest::new(props).with_fallback(json!({ "type": "empty" })),
        )
        .await;
    for view in output.views() {
        tracing::info!(point = %point, view = %view, "Rendered");
    }
    for failure in &output.failures {
        tracing::warn!(
            point = %point,
            plugin_id = %failure.plugin_id,
            "Contribution failed: {}",
            failure.message
        );
    }

    let summary = manager.summary().await;
    tracing::info!(
        plugins = summary.plugins,
        activated = summary.activated,
        services = summary.services,
        extensions = summary.extensions,
        "Plugin system ready"
    );

    // ── Step 6: Shutdown ─────────────────────────────────────────
    manager.unload_all().await;
    tracing::info!("FeedHub host shut down");
    Ok(())
}
