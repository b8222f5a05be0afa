//! View descriptions rendered by the posts plugin.

use serde_json::{Value, json};

use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;

fn post_id(props: &Value) -> AppResult<&Value> {
    match &props["post_id"] {
        Value::Null => Err(AppError::render("post_id prop is required")),
        id => Ok(id),
    }
}

/// The Like action button.
pub fn like_button(props: &Value) -> AppResult<Value> {
    Ok(json!({
        "type": "button",
        "label": "Like",
        "icon": "heart",
        "action": crate::state::LIKE_POST,
        "post_id": post_id(props)?,
    }))
}

/// The Share action button.
pub fn share_button(props: &Value) -> AppResult<Value> {
    Ok(json!({
        "type": "button",
        "label": "Share",
        "icon": "share",
        "post_id": post_id(props)?,
    }))
}

/// A post card in the feed.
pub fn post_card(props: &Value) -> AppResult<Value> {
    Ok(json!({
        "type": "card",
        "author": props["author"],
        "body": props["body"],
        "likes": props["likes"].as_u64().unwrap_or(0),
    }))
}

/// The post detail screen.
pub fn post_detail(props: &Value) -> AppResult<Value> {
    Ok(json!({
        "type": "screen",
        "title": "Post",
        "post_id": post_id(props)?,
        "slots": ["post.actions", "post.footer"],
    }))
}
