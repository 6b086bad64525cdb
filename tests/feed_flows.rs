//! Read-side feed behavior over the in-memory repositories: pagination,
//! per-feed filtering, and post detail assembly.

use std::sync::Arc;

use foglio::application::feed::{FeedError, FeedService};
use foglio::application::pagination::{PAGE_SIZE, PageRequest};
use foglio::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
    FollowsRepo, GroupsRepo, PostsWriteRepo, UsersRepo,
};
use foglio::domain::entities::{GroupRecord, PostRecord, UserRecord};
use foglio::infra::memory::MemoryRepositories;
use uuid::Uuid;

fn feed_service(repos: &Arc<MemoryRepositories>) -> FeedService {
    FeedService::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos.clone(),
    )
}

async fn seed_user(repos: &MemoryRepositories, username: &str) -> UserRecord {
    repos
        .create_user(CreateUserParams {
            username: username.to_string(),
        })
        .await
        .expect("user should persist")
}

async fn seed_group(repos: &MemoryRepositories, title: &str, slug: &str) -> GroupRecord {
    repos
        .create_group(CreateGroupParams {
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
        })
        .await
        .expect("group should persist")
}

async fn seed_post(
    repos: &MemoryRepositories,
    author: &UserRecord,
    group: Option<&GroupRecord>,
    text: &str,
) -> PostRecord {
    repos
        .create_post(CreatePostParams {
            author_id: author.id,
            text: text.to_string(),
            group_id: group.map(|group| group.id),
            image: None,
        })
        .await
        .expect("post should persist")
}

#[tokio::test]
async fn thirteen_posts_split_into_ten_and_three() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    for n in 1..=13 {
        seed_post(&repos, &leo, None, &format!("post {n}")).await;
    }

    let first = feed
        .global_feed(PageRequest::first())
        .await
        .expect("first page should render");
    assert_eq!(first.items.len(), PAGE_SIZE as usize);
    assert_eq!(first.number, 1);
    assert_eq!(first.total_items, 13);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_next);
    assert!(!first.has_previous);
    assert_eq!(first.items[0].text, "post 13");

    let second = feed
        .global_feed(PageRequest::new(2))
        .await
        .expect("second page should render");
    assert_eq!(second.items.len(), 3);
    assert!(!second.has_next);
    assert!(second.has_previous);
    assert_eq!(second.items[2].text, "post 1");
}

#[tokio::test]
async fn page_past_the_end_stays_numbered_but_empty() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    for n in 1..=13 {
        seed_post(&repos, &leo, None, &format!("post {n}")).await;
    }

    let page = feed
        .global_feed(PageRequest::new(9))
        .await
        .expect("overshoot page should render");
    assert!(page.is_empty());
    assert_eq!(page.number, 9);
    assert_eq!(page.total_pages, 2);
    assert!(!page.has_next);
    assert!(page.has_previous);
}

#[tokio::test]
async fn group_feed_filters_to_members_and_rejects_unknown_slugs() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    let tech = seed_group(&repos, "Tech Talk", "tech").await;
    let life = seed_group(&repos, "Everyday Life", "life").await;
    seed_post(&repos, &leo, Some(&tech), "about compilers").await;
    seed_post(&repos, &leo, Some(&life), "about coffee").await;
    seed_post(&repos, &leo, None, "no group at all").await;

    let page = feed
        .group_feed("tech", PageRequest::first())
        .await
        .expect("group feed should render");
    assert_eq!(page.group.slug, "tech");
    assert_eq!(page.page.total_items, 1);
    assert_eq!(page.page.items[0].text, "about compilers");
    assert_eq!(page.page.items[0].group_slug.as_deref(), Some("tech"));

    let missing = feed.group_feed("ghost", PageRequest::first()).await;
    assert!(matches!(missing, Err(FeedError::UnknownGroup)));
}

#[tokio::test]
async fn profile_feed_reports_the_follow_state() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;
    seed_post(&repos, &leo, None, "first").await;
    seed_post(&repos, &leo, None, "second").await;
    seed_post(&repos, &mia, None, "someone else").await;

    let anonymous_view = feed
        .profile_feed("leo", None, PageRequest::first())
        .await
        .expect("profile should render");
    assert_eq!(anonymous_view.author.username, "leo");
    assert_eq!(anonymous_view.page.total_items, 2);
    assert!(!anonymous_view.is_following);

    repos
        .create_follow(mia.id, leo.id)
        .await
        .expect("follow should persist");
    let subscribed_view = feed
        .profile_feed("leo", Some(&mia), PageRequest::first())
        .await
        .expect("profile should render");
    assert!(subscribed_view.is_following);

    let own_view = feed
        .profile_feed("leo", Some(&leo), PageRequest::first())
        .await
        .expect("profile should render");
    assert!(!own_view.is_following);

    let missing = feed.profile_feed("ghost", None, PageRequest::first()).await;
    assert!(matches!(missing, Err(FeedError::UnknownAuthor)));
}

#[tokio::test]
async fn following_feed_tracks_subscriptions() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let reader = seed_user(&repos, "reader").await;
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;
    seed_post(&repos, &leo, None, "from leo").await;
    seed_post(&repos, &leo, None, "more from leo").await;
    seed_post(&repos, &mia, None, "from mia").await;

    repos
        .create_follow(reader.id, leo.id)
        .await
        .expect("follow should persist");
    let page = feed
        .following_feed(reader.id, PageRequest::first())
        .await
        .expect("following feed should render");
    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().all(|post| post.author_username == "leo"));

    repos
        .delete_follow(reader.id, leo.id)
        .await
        .expect("unfollow should persist");
    let empty = feed
        .following_feed(reader.id, PageRequest::first())
        .await
        .expect("following feed should render");
    assert!(empty.is_empty());
    assert_eq!(empty.total_items, 0);
}

#[tokio::test]
async fn post_detail_collects_comments_oldest_first() {
    let repos = Arc::new(MemoryRepositories::new());
    let feed = feed_service(&repos);
    let leo = seed_user(&repos, "leo").await;
    let mia = seed_user(&repos, "mia").await;
    let post = seed_post(&repos, &leo, None, "discussed").await;
    seed_post(&repos, &leo, None, "second post").await;
    seed_post(&repos, &leo, None, "third post").await;

    for text in ["first", "second", "third"] {
        repos
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: mia.id,
                text: text.to_string(),
            })
            .await
            .expect("comment should persist");
    }

    let detail = feed.post_detail(post.id).await.expect("detail should render");
    assert_eq!(detail.post.id, post.id);
    assert_eq!(detail.author_post_count, 3);
    let order: Vec<&str> = detail
        .comments
        .iter()
        .map(|comment| comment.text.as_str())
        .collect();
    assert_eq!(order, vec!["first", "second", "third"]);

    let missing = feed.post_detail(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(FeedError::UnknownPost)));
}
