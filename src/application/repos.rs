//! Persistence traits the application services depend on.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("storage failure: {0}")]
    Persistence(String),
    #[error("unique constraint `{constraint}` rejected a duplicate")]
    Duplicate { constraint: String },
    #[error("record not found")]
    NotFound,
    #[error("input rejected: {message}")]
    InvalidInput { message: String },
    #[error("integrity rule broken: {message}")]
    Integrity { message: String },
    #[error("storage timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Which slice of the post timeline a feed query covers. Multiple
/// restrictions compose with AND semantics, though the feeds only ever set
/// one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFeedFilter {
    pub group_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Restrict to posts whose author this user follows.
    pub followed_by: Option<Uuid>,
}

impl PostFeedFilter {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn in_group(group_id: Uuid) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn followed_by(user_id: Uuid) -> Self {
        Self {
            followed_by: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// How an update treats the post's group association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupPatch {
    #[default]
    Keep,
    Clear,
    Set(Uuid),
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    /// `None` keeps the stored text.
    pub text: Option<String>,
    pub group: GroupPatch,
    /// `None` keeps the stored image reference.
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// One page of posts matching the filter, newest first with a stable
    /// tiebreak, sized and offset by `page`.
    async fn list_posts(
        &self,
        filter: &PostFeedFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, filter: &PostFeedFilter) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    /// Comments for a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Record the follow edge. Returns `false` when it already existed.
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Remove the follow edge. Returns `false` when there was none.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
}
