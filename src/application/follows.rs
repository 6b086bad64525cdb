//! Subscription management between readers and authors.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// What a follow request did. Repeats and self-follows are absorbed rather
/// than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyPresent,
    SelfIgnored,
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    async fn resolve_author(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UnknownAuthor)
    }

    pub async fn follow(
        &self,
        user: &UserRecord,
        author_username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.resolve_author(author_username).await?;
        if author.id == user.id {
            return Ok(FollowOutcome::SelfIgnored);
        }
        let created = self.follows.create_follow(user.id, author.id).await?;
        if created {
            counter!("foglio_follows_created_total").increment(1);
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyPresent)
        }
    }

    /// Drop the subscription. Returns `false` when none existed; repeated
    /// unfollows are not an error.
    pub async fn unfollow(
        &self,
        user: &UserRecord,
        author_username: &str,
    ) -> Result<bool, FollowError> {
        let author = self.resolve_author(author_username).await?;
        let removed = self.follows.delete_follow(user.id, author.id).await?;
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, FollowError> {
        let exists = self.follows.exists(user_id, author_id).await?;
        Ok(exists)
    }
}
