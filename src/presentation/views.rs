//! JSON view models for the public and admin surfaces.
//!
//! Views are assembled from domain records and serialized as response
//! bodies; timestamps are rendered as RFC 3339 strings.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::application::feed::{GroupFeed, PostDetail, ProfileFeed};
use crate::application::pagination::FeedPage;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Group reference embedded in a post view.
#[derive(Debug, Clone, Serialize)]
pub struct GroupRefView {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub group: Option<GroupRefView>,
    pub image: Option<String>,
    pub created_at: String,
}

impl From<&PostRecord> for PostView {
    fn from(record: &PostRecord) -> Self {
        let group = match (&record.group_title, &record.group_slug) {
            (Some(title), Some(slug)) => Some(GroupRefView {
                title: title.clone(),
                slug: slug.clone(),
            }),
            _ => None,
        };
        Self {
            id: record.id,
            author: record.author_username.clone(),
            text: record.text.clone(),
            group,
            image: record.image.clone(),
            created_at: format_timestamp(record.created_at),
        }
    }
}

/// One feed page with pager totals. `total_pages` is zero for an empty
/// feed; out-of-range requests keep their number and carry no posts.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPageView {
    pub posts: Vec<PostView>,
    pub page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<&FeedPage<PostRecord>> for FeedPageView {
    fn from(page: &FeedPage<PostRecord>) -> Self {
        Self {
            posts: page.items.iter().map(PostView::from).collect(),
            page: page.number,
            total_pages: page.total_pages,
            total_items: page.total_items,
            has_next: page.has_next,
            has_previous: page.has_previous,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<&GroupRecord> for GroupView {
    fn from(record: &GroupRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            slug: record.slug.clone(),
            description: record.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeedView {
    pub group: GroupView,
    #[serde(flatten)]
    pub feed: FeedPageView,
}

impl From<&GroupFeed> for GroupFeedView {
    fn from(feed: &GroupFeed) -> Self {
        Self {
            group: GroupView::from(&feed.group),
            feed: FeedPageView::from(&feed.page),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub author: String,
    pub post_count: u64,
    pub is_following: bool,
    #[serde(flatten)]
    pub feed: FeedPageView,
}

impl From<&ProfileFeed> for ProfileView {
    fn from(feed: &ProfileFeed) -> Self {
        Self {
            author: feed.author.username.clone(),
            post_count: feed.page.total_items,
            is_following: feed.is_following,
            feed: FeedPageView::from(&feed.page),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub created_at: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(record: &CommentRecord) -> Self {
        Self {
            id: record.id,
            author: record.author_username.clone(),
            text: record.text.clone(),
            created_at: format_timestamp(record.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetailView {
    pub post: PostView,
    /// How many posts the author has published in total.
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
}

impl From<&PostDetail> for PostDetailView {
    fn from(detail: &PostDetail) -> Self {
        Self {
            post: PostView::from(&detail.post),
            author_post_count: detail.author_post_count,
            comments: detail.comments.iter().map(CommentView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub created_at: String,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            created_at: format_timestamp(record.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::PageRequest;

    fn sample_post(group: bool) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_username: "leo".to_string(),
            text: "first post".to_string(),
            group_id: group.then(Uuid::new_v4),
            group_title: group.then(|| "Cats".to_string()),
            group_slug: group.then(|| "cats".to_string()),
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn post_view_carries_group_reference() {
        let view = PostView::from(&sample_post(true));
        let group = view.group.expect("group reference");
        assert_eq!(group.slug, "cats");
        assert_eq!(view.created_at, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn post_view_omits_absent_group() {
        let view = PostView::from(&sample_post(false));
        assert!(view.group.is_none());
    }

    #[test]
    fn feed_page_view_preserves_pager_totals() {
        let page = FeedPage::assemble(vec![sample_post(false)], 13, PageRequest::new(2));
        let view = FeedPageView::from(&page);
        assert_eq!(view.page, 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.total_items, 13);
        assert!(view.has_previous);
    }
}
