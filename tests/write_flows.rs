//! Write-side coordination: publishing, edits, comments, subscriptions,
//! and the cache flush rules tied to each mutation.

use std::sync::Arc;

use bytes::Bytes;
use foglio::application::follows::{FollowError, FollowOutcome, FollowService};
use foglio::application::posts::{
    ComposeError, EditPostInput, NewPostInput, PostComposerService,
};
use foglio::application::repos::{
    CommentsRepo, CreateGroupParams, CreateUserParams, GroupsRepo, PostsRepo, UsersRepo,
};
use foglio::cache::{CacheConfig, ManualClock, PageCache, PageKey};
use foglio::domain::entities::UserRecord;
use foglio::infra::memory::MemoryRepositories;
use uuid::Uuid;

fn composer(repos: &Arc<MemoryRepositories>) -> PostComposerService {
    PostComposerService::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos.clone(),
    )
}

fn follow_service(repos: &Arc<MemoryRepositories>) -> FollowService {
    FollowService::new(repos.clone(), repos.clone())
}

fn empty_cache() -> Arc<PageCache> {
    let config = CacheConfig::default();
    Arc::new(PageCache::new(&config, Arc::new(ManualClock::default())))
}

async fn seed_user(repos: &MemoryRepositories, username: &str) -> UserRecord {
    repos
        .create_user(CreateUserParams {
            username: username.to_string(),
        })
        .await
        .expect("user should persist")
}

async fn seed_group(repos: &MemoryRepositories, title: &str, slug: &str) {
    repos
        .create_group(CreateGroupParams {
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
        })
        .await
        .expect("group should persist");
}

#[tokio::test]
async fn publishing_trims_text_and_resolves_the_group() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;
    seed_group(&repos, "Tech Talk", "tech").await;

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "  hello world  ".to_string(),
                group: Some("tech".to_string()),
                image: None,
            },
        )
        .await
        .expect("post should publish");
    assert_eq!(post.text, "hello world");
    assert_eq!(post.group_slug.as_deref(), Some("tech"));
    assert_eq!(post.group_title.as_deref(), Some("Tech Talk"));

    let ungrouped = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "standalone".to_string(),
                group: Some("   ".to_string()),
                image: None,
            },
        )
        .await
        .expect("post should publish");
    assert!(ungrouped.group_id.is_none());
}

#[tokio::test]
async fn blank_posts_are_rejected() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;

    for text in ["", "   \n\t "] {
        let result = composer
            .create_post(
                &leo,
                NewPostInput {
                    text: text.to_string(),
                    group: None,
                    image: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ComposeError::Text(_))));
    }
}

#[tokio::test]
async fn unknown_group_slug_fails_publish() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;

    let result = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "where does this go".to_string(),
                group: Some("ghost".to_string()),
                image: None,
            },
        )
        .await;
    match result {
        Err(ComposeError::UnknownGroup(slug)) => assert_eq!(slug, "ghost"),
        other => panic!("expected unknown group, got {other:?}"),
    }
}

#[tokio::test]
async fn publishing_flushes_the_page_cache() {
    let repos = Arc::new(MemoryRepositories::new());
    let cache = empty_cache();
    let composer = composer(&repos).with_page_cache(Some(cache.clone()));
    let leo = seed_user(&repos, "leo").await;

    cache.insert(
        PageKey::new("/", 1),
        200,
        Vec::new(),
        Bytes::from_static(b"{}"),
    );
    assert_eq!(cache.len(), 1);

    composer
        .create_post(
            &leo,
            NewPostInput {
                text: "fresh".to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .expect("post should publish");
    assert!(cache.is_empty());
}

#[tokio::test]
async fn edits_patch_group_membership() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;
    seed_group(&repos, "Tech Talk", "tech").await;
    seed_group(&repos, "Everyday Life", "life").await;

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "draft".to_string(),
                group: Some("tech".to_string()),
                image: None,
            },
        )
        .await
        .expect("post should publish");

    // Absent group keeps the stored membership.
    let kept = composer
        .edit_post(
            &leo,
            post.id,
            EditPostInput {
                text: Some("updated".to_string()),
                group: None,
                image: None,
            },
        )
        .await
        .expect("edit should apply");
    assert_eq!(kept.text, "updated");
    assert_eq!(kept.group_slug.as_deref(), Some("tech"));

    // A blank slug detaches the post.
    let cleared = composer
        .edit_post(
            &leo,
            post.id,
            EditPostInput {
                text: None,
                group: Some(String::new()),
                image: None,
            },
        )
        .await
        .expect("edit should apply");
    assert!(cleared.group_id.is_none());
    assert!(cleared.group_slug.is_none());
    assert_eq!(cleared.text, "updated");

    // A concrete slug moves it.
    let moved = composer
        .edit_post(
            &leo,
            post.id,
            EditPostInput {
                text: None,
                group: Some("life".to_string()),
                image: None,
            },
        )
        .await
        .expect("edit should apply");
    assert_eq!(moved.group_slug.as_deref(), Some("life"));
    assert_eq!(moved.group_title.as_deref(), Some("Everyday Life"));
}

#[tokio::test]
async fn edits_without_an_image_keep_the_stored_one() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "scenery".to_string(),
                group: None,
                image: Some("posts/sunset.png".to_string()),
            },
        )
        .await
        .expect("post should publish");
    assert_eq!(post.image.as_deref(), Some("posts/sunset.png"));

    let kept = composer
        .edit_post(
            &leo,
            post.id,
            EditPostInput {
                text: Some("scenery, revisited".to_string()),
                group: None,
                image: None,
            },
        )
        .await
        .expect("edit should apply");
    assert_eq!(kept.image.as_deref(), Some("posts/sunset.png"));

    let swapped = composer
        .edit_post(
            &leo,
            post.id,
            EditPostInput {
                text: None,
                group: None,
                image: Some("posts/dawn.png".to_string()),
            },
        )
        .await
        .expect("edit should apply");
    assert_eq!(swapped.image.as_deref(), Some("posts/dawn.png"));
    assert_eq!(swapped.text, "scenery, revisited");
}

#[tokio::test]
async fn only_the_author_may_edit() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "mine".to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .expect("post should publish");

    let result = composer
        .edit_post(
            &mia,
            post.id,
            EditPostInput {
                text: Some("hijacked".to_string()),
                group: None,
                image: None,
            },
        )
        .await;
    assert!(matches!(result, Err(ComposeError::NotAuthor)));

    let stored = PostsRepo::find_by_id(repos.as_ref(), post.id)
        .await
        .expect("lookup should succeed")
        .expect("post should remain");
    assert_eq!(stored.text, "mine");
}

#[tokio::test]
async fn editing_a_missing_post_fails() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;

    let result = composer
        .edit_post(
            &leo,
            Uuid::new_v4(),
            EditPostInput {
                text: Some("into the void".to_string()),
                group: None,
                image: None,
            },
        )
        .await;
    assert!(matches!(result, Err(ComposeError::UnknownPost)));
}

#[tokio::test]
async fn comments_require_an_existing_post() {
    let repos = Arc::new(MemoryRepositories::new());
    let composer = composer(&repos);
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;

    let missing = composer
        .add_comment(&mia, Uuid::new_v4(), "anyone there".to_string())
        .await;
    assert!(matches!(missing, Err(ComposeError::UnknownPost)));

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "open thread".to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .expect("post should publish");

    let blank = composer.add_comment(&mia, post.id, "   ".to_string()).await;
    assert!(matches!(blank, Err(ComposeError::Text(_))));

    let comment = composer
        .add_comment(&mia, post.id, "  well said  ".to_string())
        .await
        .expect("comment should publish");
    assert_eq!(comment.text, "well said");
    assert_eq!(comment.author_username, "mia");
    assert_eq!(comment.post_id, post.id);
}

#[tokio::test]
async fn follow_outcomes_absorb_repeats_and_self() {
    let repos = Arc::new(MemoryRepositories::new());
    let follows = follow_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;

    let first = follows
        .follow(&mia, "leo")
        .await
        .expect("follow should succeed");
    assert_eq!(first, FollowOutcome::Created);
    assert!(follows
        .is_following(mia.id, leo.id)
        .await
        .expect("lookup should succeed"));

    let repeat = follows
        .follow(&mia, "leo")
        .await
        .expect("follow should succeed");
    assert_eq!(repeat, FollowOutcome::AlreadyPresent);

    let own = follows
        .follow(&leo, "leo")
        .await
        .expect("follow should succeed");
    assert_eq!(own, FollowOutcome::SelfIgnored);
    assert!(!follows
        .is_following(leo.id, leo.id)
        .await
        .expect("lookup should succeed"));

    assert!(follows
        .unfollow(&mia, "leo")
        .await
        .expect("unfollow should succeed"));
    assert!(!follows
        .unfollow(&mia, "leo")
        .await
        .expect("unfollow should succeed"));
    assert!(!follows
        .is_following(mia.id, leo.id)
        .await
        .expect("lookup should succeed"));

    let missing = follows.follow(&mia, "ghost").await;
    assert!(matches!(missing, Err(FollowError::UnknownAuthor)));
}

#[tokio::test]
async fn deletion_cascades_comments_and_spares_the_cache() {
    let repos = Arc::new(MemoryRepositories::new());
    let cache = empty_cache();
    let composer = composer(&repos).with_page_cache(Some(cache.clone()));
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;

    let post = composer
        .create_post(
            &leo,
            NewPostInput {
                text: "short lived".to_string(),
                group: None,
                image: None,
            },
        )
        .await
        .expect("post should publish");
    composer
        .add_comment(&mia, post.id, "noted".to_string())
        .await
        .expect("comment should publish");

    cache.insert(
        PageKey::new("/", 1),
        200,
        Vec::new(),
        Bytes::from_static(b"{}"),
    );

    composer
        .delete_post(post.id)
        .await
        .expect("delete should succeed");
    assert!(PostsRepo::find_by_id(repos.as_ref(), post.id)
        .await
        .expect("lookup should succeed")
        .is_none());
    assert!(repos
        .list_for_post(post.id)
        .await
        .expect("lookup should succeed")
        .is_empty());
    // Deletions age out of the cached front page rather than flushing it.
    assert_eq!(cache.len(), 1);

    let repeat = composer.delete_post(post.id).await;
    assert!(matches!(repeat, Err(ComposeError::UnknownPost)));
}
