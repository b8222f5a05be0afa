//! The `comments` state slice.

use serde_json::{Map, Value, json};

use feedhub_plugin::store::action::Action;

/// Slice name.
pub const SLICE: &str = "comments";

/// Appends `payload` (`{ post_id, body, .. }`) to the post's list.
pub const ADD_COMMENT: &str = "comments/add";
/// Drops every comment of `payload.post_id`.
pub const CLEAR_POST: &str = "comments/clear";

/// Reducer for the `comments` slice.
pub fn reduce(state: Option<&Value>, action: &Action) -> Value {
    let mut state = state
        .cloned()
        .unwrap_or_else(|| json!({ "by_post": {} }));

    let key = match &action.payload["post_id"] {
        Value::Null => return state,
        id => id.to_string(),
    };

    let Some(by_post) = state["by_post"].as_object_mut() else {
        return state;
    };

    match action.kind.as_str() {
        ADD_COMMENT => {
            let list = by_post
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Some(list) = list.as_array_mut() {
                list.push(action.payload.clone());
            }
        }
        CLEAR_POST => {
            by_post.remove(&key);
        }
        _ => {}
    }

    state
}

/// Comment count per post id, read from a root state snapshot.
pub fn counts(root: &Value) -> Map<String, Value> {
    root[SLICE]["by_post"]
        .as_object()
        .map(|by_post| {
            by_post
                .iter()
                .map(|(post, list)| {
                    let count = list.as_array().map(Vec::len).unwrap_or(0);
                    (post.clone(), json!(count))
                })
                .collect()
        })
        .unwrap_or_default()
}
