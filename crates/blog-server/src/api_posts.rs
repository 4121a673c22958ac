//! Read-only post views: the index listing and the per-post detail page.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, FromRequestParts, Path},
    http::request::Parts,
    response::{Json, Redirect},
};
use blog_model::PostStore;
use blog_types::PostDetail;
use std::sync::Arc;

/// A post identifier taken from the `{id}` path segment.
///
/// Only ASCII digits that fit in an `i64` are accepted. Anything else is
/// answered with 404 before the handler runs, the same as a URL that
/// matches no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostId(pub i64);

/// Parses a path segment of ASCII digits into a post id.
pub fn parse_post_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound("no such page".to_string()))?;
        parse_post_id(&raw)
            .map(PostId)
            .ok_or_else(|| ApiError::NotFound(format!("no such page: /post/{raw}/")))
    }
}

/// GET /
///
/// Every post with category, author and tags resolved, newest first.
pub async fn list_posts_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<PostDetail>>, ApiError> {
    let posts = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get()?;
        conn.list_post_details().map_err(ApiError::from)
    })
    .await??;

    tracing::debug!(count = posts.len(), "listed posts");
    Ok(Json(posts))
}

/// GET /post/{id}/
pub async fn get_post_handler(
    Extension(state): Extension<Arc<AppState>>,
    PostId(id): PostId,
) -> Result<Json<PostDetail>, ApiError> {
    let post = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get()?;
        conn.get_post_detail(id).map_err(ApiError::from)
    })
    .await??;

    Ok(Json(post))
}

/// GET /post/{id}
///
/// Permanently redirects to the canonical, slash-terminated detail URL.
pub async fn redirect_post_handler(PostId(id): PostId) -> Redirect {
    Redirect::permanent(&format!("/post/{id}/"))
}
