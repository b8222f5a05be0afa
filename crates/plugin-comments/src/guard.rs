//! Middleware guarding comment actions.

use serde_json::Value;

use feedhub_plugin::store::action::Action;
use feedhub_plugin::store::middleware::MiddlewareAction;

use crate::state::ADD_COMMENT;

/// Halts empty comments and trims surrounding whitespace from the rest.
pub fn comment_guard(_state: &Value, action: &Action) -> MiddlewareAction {
    if action.kind != ADD_COMMENT {
        return MiddlewareAction::Continue;
    }

    let body = action.payload["body"].as_str().unwrap_or_default();
    let trimmed = body.trim();

    if trimmed.is_empty() {
        return MiddlewareAction::Halt {
            reason: "comment body is empty".to_string(),
        };
    }
    if trimmed.len() == body.len() {
        return MiddlewareAction::Continue;
    }

    let mut payload = action.payload.clone();
    payload["body"] = Value::String(trimmed.to_string());
    MiddlewareAction::Replace(Action::new(ADD_COMMENT).with_payload(payload))
}
