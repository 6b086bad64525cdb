//! Write coordination for posts and comments.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupPatch, GroupsRepo, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::cache::PageCache;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::posts::{self, TextError};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown post")]
    UnknownPost,
    #[error("only the author may change a post")]
    NotAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// New post as submitted by the author. The group is referenced by slug;
/// blank means no group.
#[derive(Debug, Clone, Default)]
pub struct NewPostInput {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

/// Partial edit of an existing post. Absent fields keep their stored value;
/// an empty group slug detaches the post from its group.
#[derive(Debug, Clone, Default)]
pub struct EditPostInput {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

/// Write side of the service. Every mutation validates against the current
/// stored state, then hands the storage layer a single atomic operation.
#[derive(Clone)]
pub struct PostComposerService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
    page_cache: Option<Arc<PageCache>>,
}

impl PostComposerService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            comments,
            groups,
            page_cache: None,
        }
    }

    /// Wire up the page cache that must be flushed when a new post lands.
    pub fn with_page_cache(mut self, page_cache: Option<Arc<PageCache>>) -> Self {
        self.page_cache = page_cache;
        self
    }

    async fn resolve_group(&self, slug: &str) -> Result<GroupRecord, ComposeError> {
        self.groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ComposeError::UnknownGroup(slug.to_string()))
    }

    /// Publish a new post and flush the cached global feed so the post is
    /// visible immediately.
    pub async fn create_post(
        &self,
        author: &UserRecord,
        input: NewPostInput,
    ) -> Result<PostRecord, ComposeError> {
        posts::validate_text(&input.text, "text")?;

        let group_id = match input.group.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => Some(self.resolve_group(slug).await?.id),
            None => None,
        };

        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: author.id,
                text: input.text.trim().to_string(),
                group_id,
                image: input.image,
            })
            .await?;

        counter!("foglio_posts_created_total").increment(1);

        if let Some(cache) = &self.page_cache {
            let dropped = cache.flush();
            debug!(
                post = %posts::preview(&post.text),
                dropped,
                "flushed page cache after publish"
            );
        }

        Ok(post)
    }

    /// Apply an author's edit. Edits never flush the page cache; the cached
    /// global feed ages out on its own.
    pub async fn edit_post(
        &self,
        actor: &UserRecord,
        post_id: Uuid,
        input: EditPostInput,
    ) -> Result<PostRecord, ComposeError> {
        let existing = self
            .reader
            .find_by_id(post_id)
            .await?
            .ok_or(ComposeError::UnknownPost)?;
        if existing.author_id != actor.id {
            return Err(ComposeError::NotAuthor);
        }

        let text = match input.text {
            Some(text) => {
                posts::validate_text(&text, "text")?;
                Some(text.trim().to_string())
            }
            None => None,
        };

        let group = match input.group.as_deref().map(str::trim) {
            None => GroupPatch::Keep,
            Some("") => GroupPatch::Clear,
            Some(slug) => GroupPatch::Set(self.resolve_group(slug).await?.id),
        };

        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: post_id,
                text,
                group,
                image: input.image,
            })
            .await?;

        Ok(post)
    }

    pub async fn add_comment(
        &self,
        author: &UserRecord,
        post_id: Uuid,
        text: String,
    ) -> Result<CommentRecord, ComposeError> {
        posts::validate_text(&text, "text")?;

        if self.reader.find_by_id(post_id).await?.is_none() {
            return Err(ComposeError::UnknownPost);
        }

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: author.id,
                text: text.trim().to_string(),
            })
            .await?;

        counter!("foglio_comments_created_total").increment(1);

        Ok(comment)
    }

    /// Storage-level removal. Deliberately leaves the page cache alone, so a
    /// cached global feed may keep serving the post until its TTL lapses.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), ComposeError> {
        match self.writer.delete_post(post_id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(ComposeError::UnknownPost),
            Err(err) => Err(ComposeError::Repo(err)),
        }
    }
}
