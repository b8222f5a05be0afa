//! The `posts` state slice.

use serde_json::{Value, json};

use feedhub_plugin::store::action::Action;

/// Slice name.
pub const SLICE: &str = "posts";

/// Appends `payload` (a post object) to `items`.
pub const ADD_POST: &str = "posts/add";
/// Marks `payload.id` as liked.
pub const LIKE_POST: &str = "posts/like";
/// Removes the post with id `payload.id`.
pub const REMOVE_POST: &str = "posts/remove";

fn initial() -> Value {
    json!({ "items": [], "liked": [] })
}

/// Reducer for the `posts` slice.
pub fn reduce(state: Option<&Value>, action: &Action) -> Value {
    let mut state = state.cloned().unwrap_or_else(initial);

    match action.kind.as_str() {
        ADD_POST => {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(action.payload.clone());
            }
        }
        LIKE_POST => {
            let id = action.payload["id"].clone();
            if let Some(liked) = state["liked"].as_array_mut() {
                if !id.is_null() && !liked.contains(&id) {
                    liked.push(id);
                }
            }
        }
        REMOVE_POST => {
            let id = &action.payload["id"];
            if let Some(items) = state["items"].as_array_mut() {
                items.retain(|item| &item["id"] != id);
            }
        }
        _ => {}
    }

    state
}
