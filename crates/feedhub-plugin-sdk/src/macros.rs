//! Convenience macros for plugin development.

/// Macro for creating a plugin manifest.
///
/// # Example
/// ```rust,ignore
/// let manifest = plugin_manifest!(
///     id: "comments",
///     name: "Comments",
///     version: "1.0.0",
///     description: "Threaded comments on posts",
///     author: "FeedHub",
///     dependencies: ["posts"]
/// );
/// ```
#[macro_export]
macro_rules! plugin_manifest {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr
    ) => {
        $crate::prelude::PluginManifest::new($id, $name, $version)
    };
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        description: $desc:expr,
        author: $author:expr
    ) => {
        $crate::prelude::PluginManifest::new($id, $name, $version)
            .with_description($desc)
            .with_author($author)
    };
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        description: $desc:expr,
        author: $author:expr,
        dependencies: [$($dep:expr),* $(,)?]
    ) => {{
        let manifest = $crate::prelude::PluginManifest::new($id, $name, $version)
            .with_description($desc)
            .with_author($author);
        $(
            let manifest = manifest.depends_on($dep);
        )*
        manifest
    }};
}

/// Macro for quickly building a store `Action`.
///
/// # Example
/// ```rust,ignore
/// let action = action!("posts/add", {
///     "id" => json!(1),
///     "body" => json!("hello"),
/// });
/// ```
#[macro_export]
macro_rules! action {
    ($kind:expr) => {
        $crate::prelude::Action::new($kind)
    };
    ($kind:expr, { $($key:expr => $value:expr),* $(,)? }) => {{
        let mut payload = $crate::serde_json::Map::new();
        $(
            payload.insert($key.to_string(), $value);
        )*
        $crate::prelude::Action::new($kind).with_payload($crate::serde_json::Value::Object(payload))
    }};
}
