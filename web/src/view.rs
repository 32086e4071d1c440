//! Client-local view state: re-sorting an already-fetched post list and
//! selecting a theme. Pure, synchronous transitions — nothing here touches
//! the network or changes the underlying data set.

use std::cmp::Ordering;

use subscope_core::{RedditPost, ThemedGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Url,
    Selftext,
    Score,
    NumComments,
    CreatedUtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Sortable view over a fetched post list.
#[derive(Debug)]
pub struct PostsView {
    posts: Vec<RedditPost>,
    sort_field: SortField,
    sort_direction: SortDirection,
}

impl PostsView {
    /// Posts are shown in fetch order until a sort is requested.
    pub fn new(posts: Vec<RedditPost>) -> Self {
        Self {
            posts,
            sort_field: SortField::Score,
            sort_direction: SortDirection::Desc,
        }
    }

    pub fn posts(&self) -> &[RedditPost] {
        &self.posts
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Re-sort by `field`. Selecting the current field toggles direction;
    /// selecting a new field resets to descending. The sort is stable.
    pub fn sort_by(&mut self, field: SortField) {
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }

        let direction = self.sort_direction;
        self.posts.sort_by(|a, b| {
            let ordering = compare(a, b, field);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

fn compare(a: &RedditPost, b: &RedditPost, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Url => a.url.cmp(&b.url),
        SortField::Selftext => a.selftext.cmp(&b.selftext),
        SortField::Score => a.score.cmp(&b.score),
        SortField::NumComments => a.num_comments.cmp(&b.num_comments),
        SortField::CreatedUtc => a.created_utc.cmp(&b.created_utc),
    }
}

/// Theme tab state: at most one group selected at a time.
#[derive(Debug)]
pub struct ThemesView {
    groups: Vec<ThemedGroup>,
    selected: Option<usize>,
}

impl ThemesView {
    pub fn new(groups: Vec<ThemedGroup>) -> Self {
        Self {
            groups,
            selected: None,
        }
    }

    pub fn groups(&self) -> &[ThemedGroup] {
        &self.groups
    }

    pub fn select(&mut self, index: usize) {
        if index < self.groups.len() {
            self.selected = Some(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&ThemedGroup> {
        self.selected.and_then(|i| self.groups.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subscope_core::group_by_theme;

    fn post(title: &str, score: i64, num_comments: i64) -> RedditPost {
        RedditPost {
            title: title.to_string(),
            url: format!("https://reddit.com/{title}"),
            selftext: String::new(),
            score,
            num_comments,
            created_utc: 0,
        }
    }

    fn sample() -> Vec<RedditPost> {
        vec![
            post("middling", 5, 2),
            post("top", 9, 0),
            post("low", 1, 7),
        ]
    }

    #[test]
    fn first_sort_on_new_field_is_descending() {
        let mut view = PostsView::new(sample());
        view.sort_by(SortField::NumComments);

        assert_eq!(view.sort_direction(), SortDirection::Desc);
        let comments: Vec<i64> = view.posts().iter().map(|p| p.num_comments).collect();
        assert_eq!(comments, [7, 2, 0]);
    }

    #[test]
    fn sorting_same_field_twice_reverses_direction() {
        let mut view = PostsView::new(sample());
        view.sort_by(SortField::NumComments);
        let before: Vec<String> = view.posts().iter().map(|p| p.title.clone()).collect();

        view.sort_by(SortField::NumComments);
        assert_eq!(view.sort_direction(), SortDirection::Asc);

        // Same data set, only order changed.
        assert_eq!(view.posts().len(), before.len());
        let reversed: Vec<String> = view.posts().iter().rev().map(|p| p.title.clone()).collect();
        assert_eq!(reversed, before);
    }

    #[test]
    fn switching_fields_resets_to_descending() {
        let mut view = PostsView::new(sample());
        view.sort_by(SortField::Score);
        view.sort_by(SortField::Score); // now ascending
        assert_eq!(view.sort_direction(), SortDirection::Asc);

        view.sort_by(SortField::Title);
        assert_eq!(view.sort_field(), SortField::Title);
        assert_eq!(view.sort_direction(), SortDirection::Desc);
    }

    #[test]
    fn theme_selection_points_at_one_group_or_none() {
        let mut view = ThemesView::new(group_by_theme(&[]));
        assert!(view.selected().is_none());

        view.select(1);
        assert_eq!(view.selected().unwrap().name, "Pain & Anger");

        view.select(99); // out of range, selection unchanged
        assert_eq!(view.selected().unwrap().name, "Pain & Anger");

        view.clear_selection();
        assert!(view.selected().is_none());
    }
}
