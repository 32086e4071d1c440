use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use subscope_core::{
    filter_recent, group_by_theme, CategorizedPost, CoreError, DatabaseError, Subreddit,
};

use super::AppState;

const MISSING_SUBREDDIT: &str = "Subreddit name is required";
const FETCH_FAILED: &str = "Failed to fetch posts";
const CLASSIFY_FAILED: &str = "Failed to fetch and categorize posts";

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reddit/posts", get(reddit_posts))
        .route("/api/reddit/themes", get(reddit_themes))
        .route("/api/subreddits", get(list_subreddits).post(add_subreddit))
        .route("/api/subreddits/:name", delete(remove_subreddit))
        .route("/healthz", get(health))
}

#[derive(Debug, Deserialize)]
pub struct SubredditParams {
    subreddit: Option<String>,
}

impl SubredditParams {
    /// The original UI sends an empty value through the same code path as a
    /// missing one, so both are validation failures.
    fn name(self) -> Option<String> {
        self.subreddit.filter(|s| !s.is_empty())
    }
}

fn error_body(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "error": message }))
}

// ========== Post Fetcher ==========

async fn reddit_posts(
    State(state): State<AppState>,
    Query(params): Query<SubredditParams>,
) -> Response {
    let Some(subreddit) = params.name() else {
        return (StatusCode::BAD_REQUEST, error_body(MISSING_SUBREDDIT)).into_response();
    };

    match state.reddit.fetch_top_posts_of_day(&subreddit).await {
        Ok(posts) => {
            let now = chrono::Utc::now().timestamp();
            let recent = filter_recent(posts, now);
            tracing::info!(subreddit, count = recent.len(), "Returning recent posts");
            Json(recent).into_response()
        }
        Err(e) => {
            tracing::error!(subreddit, code = e.error_code(), "Failed to fetch posts: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(FETCH_FAILED)).into_response()
        }
    }
}

// ========== Theme Categorizer ==========

async fn reddit_themes(
    State(state): State<AppState>,
    Query(params): Query<SubredditParams>,
) -> Response {
    let Some(subreddit) = params.name() else {
        return (StatusCode::BAD_REQUEST, error_body(MISSING_SUBREDDIT)).into_response();
    };

    // Unlike the post fetcher, the categorizer takes the top-of-day listing
    // as-is with no recency filter.
    let posts = match state.reddit.fetch_top_posts_of_day(&subreddit).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(subreddit, code = e.error_code(), "Failed to fetch posts: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(CLASSIFY_FAILED),
            )
                .into_response();
        }
    };

    let flags = match state
        .llm
        .classify_batch(&posts, state.classify_concurrency)
        .await
    {
        Ok(flags) => flags,
        Err(e) => {
            tracing::error!(subreddit, code = e.error_code(), "Classification failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(CLASSIFY_FAILED),
            )
                .into_response();
        }
    };

    let categorized: Vec<CategorizedPost> = posts
        .into_iter()
        .zip(flags)
        .map(|(post, categories)| CategorizedPost { post, categories })
        .collect();

    tracing::info!(subreddit, count = categorized.len(), "Categorized posts");
    Json(group_by_theme(&categorized)).into_response()
}

// ========== Subreddit store ==========

async fn list_subreddits(State(state): State<AppState>) -> Response {
    match state.db.list_subreddits().await {
        Ok(subreddits) => Json(subreddits).into_response(),
        Err(e) => {
            tracing::error!(code = e.error_code(), "Failed to list subreddits: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to list subreddits"),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewSubreddit {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

async fn add_subreddit(State(state): State<AppState>, Json(body): Json<NewSubreddit>) -> Response {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, error_body(MISSING_SUBREDDIT)).into_response();
    }

    let url = body
        .url
        .unwrap_or_else(|| format!("https://www.reddit.com/r/{name}/"));
    let subreddit = Subreddit { name, url };

    match state.db.add_subreddit(&subreddit).await {
        Ok(()) => (StatusCode::CREATED, Json(subreddit)).into_response(),
        Err(CoreError::Database(DatabaseError::AlreadyExists { .. })) => (
            StatusCode::CONFLICT,
            error_body("Subreddit already exists"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(code = e.error_code(), "Failed to add subreddit: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to add subreddit"),
            )
                .into_response()
        }
    }
}

async fn remove_subreddit(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.db.remove_subreddit(&name).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, error_body("Subreddit not found")).into_response(),
        Err(e) => {
            tracing::error!(code = e.error_code(), "Failed to remove subreddit: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to remove subreddit"),
            )
                .into_response()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}
