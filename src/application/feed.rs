use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{FeedPage, PageRequest};
use crate::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostFeedFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group page: the group header plus its slice of the timeline.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: FeedPage<PostRecord>,
}

/// An author page: profile header, their posts, and whether the viewer
/// already follows them.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub page: FeedPage<PostRecord>,
    pub is_following: bool,
}

/// A single post with its discussion thread.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub author_post_count: u64,
    pub comments: Vec<CommentRecord>,
}

/// Read side of the service: every feed is a filtered, numbered page over
/// the same reverse-chronological timeline.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
    ) -> Self {
        Self {
            posts,
            users,
            groups,
            comments,
            follows,
        }
    }

    async fn assemble(
        &self,
        filter: PostFeedFilter,
        request: PageRequest,
    ) -> Result<FeedPage<PostRecord>, FeedError> {
        let items = self.posts.list_posts(&filter, request).await?;
        let total = self.posts.count_posts(&filter).await?;
        Ok(FeedPage::assemble(items, total, request))
    }

    pub async fn global_feed(
        &self,
        request: PageRequest,
    ) -> Result<FeedPage<PostRecord>, FeedError> {
        self.assemble(PostFeedFilter::everything(), request).await
    }

    pub async fn group_feed(
        &self,
        slug: &str,
        request: PageRequest,
    ) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let page = self.assemble(PostFeedFilter::in_group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    /// The author's posts. `viewer` drives the `is_following` flag; authors
    /// never count as following themselves.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&UserRecord>,
        request: PageRequest,
    ) -> Result<ProfileFeed, FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;
        let page = self
            .assemble(PostFeedFilter::by_author(author.id), request)
            .await?;
        let is_following = match viewer {
            Some(user) if user.id != author.id => self.follows.exists(user.id, author.id).await?,
            _ => false,
        };
        Ok(ProfileFeed {
            author,
            page,
            is_following,
        })
    }

    /// Posts by every author the user follows, merged into one timeline.
    pub async fn following_feed(
        &self,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<FeedPage<PostRecord>, FeedError> {
        self.assemble(PostFeedFilter::followed_by(user_id), request)
            .await
    }

    pub async fn find_post(&self, id: Uuid) -> Result<PostRecord, FeedError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(FeedError::UnknownPost)
    }

    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail, FeedError> {
        let post = self.find_post(id).await?;
        let author_post_count = self
            .posts
            .count_posts(&PostFeedFilter::by_author(post.author_id))
            .await?;
        let comments = self.comments.list_for_post(id).await?;
        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }
}
