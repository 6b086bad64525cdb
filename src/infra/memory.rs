//! In-memory repositories.
//!
//! Backs the same traits as the Postgres adapters with plain maps, for
//! hermetic tests and database-free development. Ordering and constraint
//! behavior mirror the schema: feeds sort newest first with an insertion
//! sequence as tiebreak, usernames and slugs are unique, and the follow
//! edge table rejects self references.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
    FollowsRepo, GroupPatch, GroupsRepo, PostFeedFilter, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams, UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Clone)]
struct StoredPost {
    seq: u64,
    record: PostRecord,
}

#[derive(Debug, Clone)]
struct StoredComment {
    seq: u64,
    record: CommentRecord,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserRecord>,
    groups: HashMap<Uuid, GroupRecord>,
    posts: HashMap<Uuid, StoredPost>,
    comments: HashMap<Uuid, StoredComment>,
    follows: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryRepositories {
    state: RwLock<State>,
    sequence: AtomicU64,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn matches(state: &State, filter: &PostFeedFilter, post: &PostRecord) -> bool {
        if let Some(group_id) = filter.group_id {
            if post.group_id != Some(group_id) {
                return false;
            }
        }
        if let Some(author_id) = filter.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(user_id) = filter.followed_by {
            if !state.follows.contains(&(user_id, post.author_id)) {
                return false;
            }
        }
        true
    }

    /// Filtered posts, newest first, the way the feed index orders them.
    fn collect_feed(state: &State, filter: &PostFeedFilter) -> Vec<StoredPost> {
        let mut posts: Vec<StoredPost> = state
            .posts
            .values()
            .filter(|stored| Self::matches(state, filter, &stored.record))
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        posts
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.write();
        if state
            .users
            .values()
            .any(|user| user.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_unique".to_string(),
            });
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let state = self.read();
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let state = self.read();
        Ok(state.users.get(&id).cloned())
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepositories {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = self.write();
        if state.groups.values().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_unique".to_string(),
            });
        }
        let record = GroupRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at: OffsetDateTime::now_utc(),
        };
        state.groups.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let state = self.read();
        Ok(state
            .groups
            .values()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let state = self.read();
        let mut groups: Vec<GroupRecord> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(groups)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn list_posts(
        &self,
        filter: &PostFeedFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.read();
        let posts = Self::collect_feed(&state, filter);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(page.limit() as usize)
            .map(|stored| stored.record)
            .collect())
    }

    async fn count_posts(&self, filter: &PostFeedFilter) -> Result<u64, RepoError> {
        let state = self.read();
        let count = state
            .posts
            .values()
            .filter(|stored| Self::matches(&state, filter, &stored.record))
            .count();
        Ok(count as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let state = self.read();
        Ok(state.posts.get(&id).map(|stored| stored.record.clone()))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.write();
        let seq = self.next_seq();

        let author = state
            .users
            .get(&params.author_id)
            .cloned()
            .ok_or_else(|| RepoError::invalid_input("post author does not exist"))?;
        let group = match params.group_id {
            Some(group_id) => Some(
                state
                    .groups
                    .get(&group_id)
                    .cloned()
                    .ok_or_else(|| RepoError::invalid_input("post group does not exist"))?,
            ),
            None => None,
        };

        let record = PostRecord {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_username: author.username,
            text: params.text,
            group_id: group.as_ref().map(|g| g.id),
            group_title: group.as_ref().map(|g| g.title.clone()),
            group_slug: group.as_ref().map(|g| g.slug.clone()),
            image: params.image,
            created_at: OffsetDateTime::now_utc(),
        };
        state.posts.insert(
            record.id,
            StoredPost {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.write();

        let group = match params.group {
            GroupPatch::Keep | GroupPatch::Clear => None,
            GroupPatch::Set(group_id) => Some(
                state
                    .groups
                    .get(&group_id)
                    .cloned()
                    .ok_or_else(|| RepoError::invalid_input("post group does not exist"))?,
            ),
        };

        let stored = state.posts.get_mut(&params.id).ok_or(RepoError::NotFound)?;

        if let Some(text) = params.text {
            stored.record.text = text;
        }
        if let Some(image) = params.image {
            stored.record.image = Some(image);
        }
        match params.group {
            GroupPatch::Keep => {}
            GroupPatch::Clear => {
                stored.record.group_id = None;
                stored.record.group_title = None;
                stored.record.group_slug = None;
            }
            GroupPatch::Set(_) => {
                if let Some(group) = group {
                    stored.record.group_id = Some(group.id);
                    stored.record.group_title = Some(group.title);
                    stored.record.group_slug = Some(group.slug);
                }
            }
        }

        Ok(stored.record.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.write();
        if state.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        state.comments.retain(|_, stored| stored.record.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.write();
        let seq = self.next_seq();

        if !state.posts.contains_key(&params.post_id) {
            return Err(RepoError::invalid_input("comment post does not exist"));
        }
        let author = state
            .users
            .get(&params.author_id)
            .cloned()
            .ok_or_else(|| RepoError::invalid_input("comment author does not exist"))?;

        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: author.id,
            author_username: author.username,
            text: params.text,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.insert(
            record.id,
            StoredComment {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.read();
        let mut comments: Vec<StoredComment> = state
            .comments
            .values()
            .filter(|stored| stored.record.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.record
                .created_at
                .cmp(&b.record.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(comments.into_iter().map(|stored| stored.record).collect())
    }
}

#[async_trait]
impl FollowsRepo for MemoryRepositories {
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        if user_id == author_id {
            return Err(RepoError::Integrity {
                message: "follows_no_self_edge".to_string(),
            });
        }
        let mut state = self.write();
        if !state.users.contains_key(&user_id) || !state.users.contains_key(&author_id) {
            return Err(RepoError::invalid_input("follow endpoint does not exist"));
        }
        Ok(state.follows.insert((user_id, author_id)))
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.write();
        Ok(state.follows.remove(&(user_id, author_id)))
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let state = self.read();
        Ok(state.follows.contains(&(user_id, author_id)))
    }
}
