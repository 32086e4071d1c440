use serde::{Deserialize, Serialize};

use crate::themes::ThemeKey;

/// Seconds in the recency window applied by the post fetcher.
pub const DAY_SECONDS: i64 = 24 * 60 * 60;

/// A Reddit post normalized to the fields this system cares about.
/// Everything else in the upstream listing is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    pub title: String,
    pub url: String,
    pub selftext: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: i64,
}

/// The four-boolean classification result for a single post.
///
/// Flags are independent; a post may match zero, one, or all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlags {
    pub solution_request: bool,
    pub pain_anger: bool,
    pub advice_request: bool,
    pub money_talk: bool,
}

impl CategoryFlags {
    pub fn matches(&self, key: ThemeKey) -> bool {
        match key {
            ThemeKey::SolutionRequest => self.solution_request,
            ThemeKey::PainAnger => self.pain_anger,
            ThemeKey::AdviceRequest => self.advice_request,
            ThemeKey::MoneyTalk => self.money_talk,
        }
    }
}

/// A post decorated with its classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedPost {
    #[serde(flatten)]
    pub post: RedditPost,
    pub categories: CategoryFlags,
}

/// A tracked subreddit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subreddit {
    pub name: String,
    pub url: String,
}

/// Keep only posts created strictly within the last 24 hours of `now_utc`.
///
/// The boundary is exclusive: a post created exactly 86400 seconds ago is
/// dropped. Relative order of retained posts is preserved.
pub fn filter_recent(posts: Vec<RedditPost>, now_utc: i64) -> Vec<RedditPost> {
    let cutoff = now_utc - DAY_SECONDS;
    posts
        .into_iter()
        .filter(|post| post.created_utc > cutoff)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, created_utc: i64) -> RedditPost {
        RedditPost {
            title: title.to_string(),
            url: format!("https://reddit.com/{title}"),
            selftext: String::new(),
            score: 1,
            num_comments: 0,
            created_utc,
        }
    }

    #[test]
    fn filter_recent_keeps_only_last_day() {
        let now = 1_700_000_000;
        let posts = vec![
            post("an-hour-old", now - 3_600),
            post("too-old", now - 90_000),
            post("fresh", now - 10),
        ];

        let recent = filter_recent(posts, now);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "an-hour-old");
        assert_eq!(recent[1].title, "fresh");
    }

    #[test]
    fn filter_recent_boundary_is_exclusive() {
        let now = 1_700_000_000;
        let posts = vec![
            post("exactly-at-boundary", now - DAY_SECONDS),
            post("one-second-inside", now - DAY_SECONDS + 1),
        ];

        let recent = filter_recent(posts, now);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "one-second-inside");
    }

    #[test]
    fn category_flags_roundtrip() {
        let flags = CategoryFlags {
            solution_request: true,
            pain_anger: false,
            advice_request: true,
            money_talk: false,
        };

        let json = serde_json::to_string(&flags).unwrap();
        assert!(json.contains("\"solution_request\":true"));
        assert!(json.contains("\"money_talk\":false"));

        let parsed: CategoryFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flags);
    }

    #[test]
    fn categorized_post_serializes_flat() {
        let categorized = CategorizedPost {
            post: post("flat", 42),
            categories: CategoryFlags::default(),
        };

        let value = serde_json::to_value(&categorized).unwrap();
        assert_eq!(value["title"], "flat");
        assert_eq!(value["created_utc"], 42);
        assert_eq!(value["categories"]["solution_request"], false);
    }
}
