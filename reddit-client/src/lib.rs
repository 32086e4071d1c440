mod rate_limiter;

pub use rate_limiter::{RateLimitConfig, RateLimitPermit, RateLimiter};

use std::time::{Duration, SystemTime};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use subscope_core::{AppConfig, CoreError, RedditApiError, RedditPost};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const TOP_OF_DAY_LIMIT: u32 = 100;

/// Refresh the cached token this close to its expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub api_base: String,
    pub token_url: String,
}

impl RedditClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            client_id: config.reddit_client_id.clone(),
            client_secret: config.reddit_client_secret.clone(),
            username: config.reddit_username.clone(),
            password: config.reddit_password.clone(),
            user_agent: config.reddit_user_agent.clone(),
            api_base: REDDIT_API_BASE.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub url: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: f64,
}

impl From<RedditPostData> for RedditPost {
    fn from(data: RedditPostData) -> Self {
        Self {
            title: data.title,
            url: data.url,
            selftext: data.selftext,
            score: data.score,
            num_comments: data.num_comments,
            created_utc: data.created_utc as i64,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct RedditToken {
    access_token: String,
    expires_at: SystemTime,
}

impl RedditToken {
    fn needs_refresh(&self) -> bool {
        SystemTime::now() + TOKEN_REFRESH_MARGIN >= self.expires_at
    }
}

/// Script-app Reddit client: password-grant authentication plus the
/// top-of-day listing fetch. The access token is cached until shortly
/// before expiry.
#[derive(Debug)]
pub struct RedditClient {
    http_client: Client,
    config: RedditClientConfig,
    rate_limiter: RateLimiter,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            config,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            token: Mutex::new(None),
        })
    }

    /// Fetch up to 100 posts from `/r/{subreddit}/top?t=day`, normalized to
    /// `RedditPost`. No recency filtering happens here; callers decide.
    pub async fn fetch_top_posts_of_day(
        &self,
        subreddit: &str,
    ) -> Result<Vec<RedditPost>, CoreError> {
        let access_token = self.access_token().await?;

        let _permit = self.rate_limiter.acquire_permit().await;
        let url = format!("{}/r/{}/top", self.config.api_base, subreddit);
        let limit = TOP_OF_DAY_LIMIT.to_string();

        debug!(subreddit, "Fetching top-of-day listing");
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&access_token)
            .query(&[("t", "day"), ("limit", limit.as_str()), ("raw_json", "1")])
            .send()
            .await
            .map_err(|e| {
                error!(subreddit, "Network error fetching listing: {e}");
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(&response, subreddit));
        }

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!(subreddit, "Failed to parse listing: {e}");
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{subreddit}"),
            })
        })?;

        let posts: Vec<RedditPost> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect();

        info!(count = posts.len(), subreddit, "Retrieved posts");
        Ok(posts)
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Reddit token is stale, refreshing");
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn request_token(&self) -> Result<RedditToken, CoreError> {
        let _permit = self.rate_limiter.acquire_permit().await;

        debug!("Requesting Reddit access token");
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Network error requesting token: {e}");
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Token endpoint rejected request");
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("token endpoint returned {}", status.as_u16()),
            }));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {e}");
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse token response".to_string(),
            })
        })?;

        // Reddit answers 200 with an error field on bad credentials.
        if let Some(reason) = body.error {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason,
            }));
        }
        let access_token =
            body.access_token
                .filter(|t| !t.is_empty())
                .ok_or(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "no access token in response".to_string(),
                }))?;

        let expires_in = Duration::from_secs(body.expires_in.unwrap_or(3600));
        debug!(expires_in = expires_in.as_secs(), "Obtained Reddit token");

        Ok(RedditToken {
            access_token,
            expires_at: SystemTime::now() + expires_in,
        })
    }

}

fn map_error_status(response: &reqwest::Response, subreddit: &str) -> CoreError {
    let status = response.status();
    error!(status = status.as_u16(), subreddit, "Listing request failed");

    match status.as_u16() {
        401 => CoreError::RedditApi(RedditApiError::InvalidToken),
        403 => CoreError::RedditApi(RedditApiError::Forbidden {
            resource: format!("r/{subreddit}"),
        }),
        404 => CoreError::RedditApi(RedditApiError::SubredditNotFound {
            subreddit: subreddit.to_string(),
        }),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            warn!(retry_after, "Rate limited by Reddit");
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })
        }
        code if status.is_server_error() => {
            CoreError::RedditApi(RedditApiError::ServerError { status_code: code })
        }
        code => CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("unexpected status {code}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> RedditClientConfig {
        RedditClientConfig {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            username: "test_user".to_string(),
            password: "test_pass".to_string(),
            user_agent: "subscope/0.1 by test_user".to_string(),
            api_base: server.uri(),
            token_url: format!("{}/api/v1/access_token", server.uri()),
        }
    }

    fn token_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "*"
        }))
    }

    fn listing_response(posts: Vec<serde_json::Value>) -> ResponseTemplate {
        let children: Vec<serde_json::Value> = posts
            .into_iter()
            .map(|data| json!({ "kind": "t3", "data": data }))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": { "children": children, "after": null, "before": null }
        }))
    }

    #[test]
    fn post_data_conversion_truncates_timestamp() {
        let data = RedditPostData {
            title: "Test Post".to_string(),
            selftext: "This is test content".to_string(),
            url: "https://reddit.com/r/test/comments/abc".to_string(),
            score: 42,
            num_comments: 5,
            created_utc: 1640995200.7,
        };

        let post: RedditPost = data.into();
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.created_utc, 1640995200);
        assert_eq!(post.num_comments, 5);
    }

    #[tokio::test]
    async fn fetches_and_normalizes_top_posts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(token_response())
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/openai/top"))
            .and(query_param("t", "day"))
            .and(query_param("limit", "100"))
            .respond_with(listing_response(vec![
                json!({
                    "title": "First",
                    "selftext": "body",
                    "url": "https://example.com/1",
                    "score": 10,
                    "num_comments": 3,
                    "created_utc": 1700000000.0,
                    "author": "someone",
                    "over_18": false
                }),
                json!({
                    "title": "Second",
                    "url": "https://example.com/2",
                    "score": 5,
                    "num_comments": 0,
                    "created_utc": 1700000100.0
                }),
            ]))
            .mount(&server)
            .await;

        let client = RedditClient::new(test_config(&server)).unwrap();
        let posts = client.fetch_top_posts_of_day("openai").await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "First");
        assert_eq!(posts[0].selftext, "body");
        // selftext missing upstream defaults to empty
        assert_eq!(posts[1].selftext, "");
    }

    #[tokio::test]
    async fn token_is_cached_across_fetches() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(token_response())
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/rust/top"))
            .respond_with(listing_response(vec![]))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::new(test_config(&server)).unwrap();
        client.fetch_top_posts_of_day("rust").await.unwrap();
        client.fetch_top_posts_of_day("rust").await.unwrap();
    }

    #[tokio::test]
    async fn bad_credentials_fail_authentication() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let client = RedditClient::new(test_config(&server)).unwrap();
        let result = client.fetch_top_posts_of_day("openai").await;

        match result {
            Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) => {
                assert_eq!(reason, "invalid_grant");
            }
            other => panic!("Expected AuthenticationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_subreddit_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(token_response())
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/doesnotexist/top"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RedditClient::new(test_config(&server)).unwrap();
        let result = client.fetch_top_posts_of_day("doesnotexist").await;

        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn rate_limit_response_carries_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(token_response())
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/openai/top"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let client = RedditClient::new(test_config(&server)).unwrap();
        let result = client.fetch_top_posts_of_day("openai").await;

        match result {
            Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })) => {
                assert_eq!(retry_after, 30);
            }
            other => panic!("Expected RateLimitExceeded, got {other:?}"),
        }
    }
}
