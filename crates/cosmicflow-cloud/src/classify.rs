//! "Already gone" classification for delete-style operations
//!
//! The Cosmic API only reports a vanished entity through a human readable
//! message. A client that can map it to [`ApiError::NotFound`] should do so;
//! the message patterns below are the fallback. All delete paths go through
//! this module so the policy stays identical everywhere.

use crate::error::{ApiError, CloudError};

/// Returns true when `err` says the entity identified by `id` no longer exists
pub fn is_gone(err: &ApiError, id: &str) -> bool {
    match err {
        ApiError::NotFound(_) => true,
        ApiError::Remote { message, .. } => message_says_gone(message, id),
        ApiError::AsyncTimeout { .. } | ApiError::Transport(_) => false,
    }
}

/// Same as [`is_gone`] for errors already wrapped by an adapter
pub fn is_gone_cloud(err: &CloudError, id: &str) -> bool {
    err.api_error().is_some_and(|e| is_gone(e, id))
}

fn message_says_gone(message: &str, id: &str) -> bool {
    let invalid_id = format!(
        "Invalid parameter id value={} due to incorrect long value format, \
         or entity does not exist",
        id
    );
    let missing_key_pair = format!("A key pair with name '{}' does not exist for account", id);

    message.contains(&invalid_id) || message.contains(&missing_key_pair)
}

/// Turn an "already gone" failure of a delete into success
pub fn ignore_gone(result: Result<(), ApiError>, id: &str) -> Result<(), ApiError> {
    match result {
        Err(e) if is_gone(&e, id) => {
            tracing::debug!(id, "entity already gone, treating delete as done");
            Ok(())
        }
        other => other,
    }
}
