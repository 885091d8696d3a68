//! One-shot messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::ApiError;
use crate::constants::session::FLASH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Queue a message for the next page view.
pub async fn push(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), ApiError> {
    let mut pending: Vec<Flash> = session
        .get(FLASH)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or_default();

    pending.push(Flash {
        level,
        message: message.into(),
    });

    session
        .insert(FLASH, pending)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Remove and return every queued message.
pub async fn take(session: &Session) -> Result<Vec<Flash>, ApiError> {
    Ok(session
        .remove::<Vec<Flash>>(FLASH)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn flashes_are_consumed_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push(&session, FlashLevel::Success, "Saved").await.unwrap();
        push(&session, FlashLevel::Warning, "Careful").await.unwrap();

        let taken = take(&session).await.unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].level, FlashLevel::Success);
        assert_eq!(taken[1].message, "Careful");

        assert!(take(&session).await.unwrap().is_empty());
    }

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_string(&FlashLevel::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
    }
}
