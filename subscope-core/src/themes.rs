use serde::{Deserialize, Serialize};

use crate::types::CategorizedPost;

/// Identifier tying a theme to its `CategoryFlags` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKey {
    SolutionRequest,
    PainAnger,
    AdviceRequest,
    MoneyTalk,
}

/// A fixed catalog entry. Themes are configuration constants, not derived data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub key: ThemeKey,
    pub description: &'static str,
}

/// The theme catalog, in the order every themes response uses.
pub const THEMES: [Theme; 4] = [
    Theme {
        name: "Solution Requests",
        key: ThemeKey::SolutionRequest,
        description: "Posts where users are seeking solutions for problems",
    },
    Theme {
        name: "Pain & Anger",
        key: ThemeKey::PainAnger,
        description: "Posts where users are expressing pain or frustration",
    },
    Theme {
        name: "Advice Requests",
        key: ThemeKey::AdviceRequest,
        description: "Posts where users are seeking advice",
    },
    Theme {
        name: "Money Talk",
        key: ThemeKey::MoneyTalk,
        description: "Posts where users are discussing spending money",
    },
];

/// One theme paired with the categorized posts whose matching flag is true.
#[derive(Debug, Clone, Serialize)]
pub struct ThemedGroup {
    pub name: &'static str,
    pub key: ThemeKey,
    pub description: &'static str,
    pub posts: Vec<CategorizedPost>,
}

/// Bucket categorized posts under each theme they match.
///
/// Always returns all four groups in catalog order, empty groups included.
/// Membership is not exclusive and within-group order is the input order.
pub fn group_by_theme(posts: &[CategorizedPost]) -> Vec<ThemedGroup> {
    THEMES
        .iter()
        .map(|theme| ThemedGroup {
            name: theme.name,
            key: theme.key,
            description: theme.description,
            posts: posts
                .iter()
                .filter(|p| p.categories.matches(theme.key))
                .cloned()
                .collect(),
        })
        .collect()
}
