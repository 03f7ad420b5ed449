use tracing::{debug, warn};

use crate::AppState;

pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// Best-effort removal of an asset that is no longer referenced
pub(crate) async fn discard_asset(state: &AppState, url: &str) {
    if url.is_empty() {
        return;
    }
    match state.media.delete(url).await {
        Ok(true) => debug!("Deleted media asset {}", url),
        Ok(false) => debug!("Media asset already gone: {}", url),
        Err(e) => warn!("Failed to delete media asset {}: {}", url, e),
    }
}
