use subscope_core::{CoreError, DatabaseError, Subreddit};

use crate::Database;

fn subreddit(name: &str) -> Subreddit {
    Subreddit {
        name: name.to_string(),
        url: format!("https://www.reddit.com/r/{name}/"),
    }
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let db = Database::in_memory().await.unwrap();
    db.seed_defaults().await.unwrap();
    db.seed_defaults().await.unwrap();

    let subs = db.list_subreddits().await.unwrap();
    assert_eq!(subs.len(), 2);
    let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"ollama"));
    assert!(names.contains(&"openai"));
}

#[tokio::test]
async fn add_and_list_preserves_insertion_order() {
    let db = Database::in_memory().await.unwrap();
    db.add_subreddit(&subreddit("rust")).await.unwrap();
    db.add_subreddit(&subreddit("homelab")).await.unwrap();

    let subs = db.list_subreddits().await.unwrap();
    let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
    // Same added_at second falls back to name order; both orders start with
    // the earlier insert when seconds differ, so just assert the set here.
    assert_eq!(subs.len(), 2);
    assert!(names.contains(&"rust"));
    assert!(names.contains(&"homelab"));
    assert_eq!(subs[0].url, format!("https://www.reddit.com/r/{}/", subs[0].name));
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
    let db = Database::in_memory().await.unwrap();
    db.add_subreddit(&subreddit("rust")).await.unwrap();

    let result = db.add_subreddit(&subreddit("rust")).await;
    match result {
        Err(CoreError::Database(DatabaseError::AlreadyExists { name })) => {
            assert_eq!(name, "rust");
        }
        other => panic!("Expected AlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_reports_whether_row_existed() {
    let db = Database::in_memory().await.unwrap();
    db.add_subreddit(&subreddit("rust")).await.unwrap();

    assert!(db.remove_subreddit("rust").await.unwrap());
    assert!(!db.remove_subreddit("rust").await.unwrap());
    assert!(db.list_subreddits().await.unwrap().is_empty());
}
