use std::sync::Arc;

use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        feed::FeedService,
        follows::FollowService,
        guard::{self, Access, Identity},
        pagination::PageRequest,
        posts::{EditPostInput, NewPostInput, PostComposerService},
        repos::UsersRepo,
    },
    cache::{CacheState, page_cache_layer},
    domain::entities::UserRecord,
    infra::db::PostgresRepositories,
    presentation::views::{FeedPageView, GroupFeedView, PostDetailView, ProfileView},
};

use super::{
    db_health_response,
    identity::attach_identity,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub composer: Arc<PostComposerService>,
    pub follows: Arc<FollowService>,
    pub users: Arc<dyn UsersRepo>,
    pub db: Option<Arc<PostgresRepositories>>,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    // Only the front page is cached; every other feed renders live.
    let cached_routes = Router::new().route("/", get(global_feed));

    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(cache_state, page_cache_layer))
    } else {
        cached_routes
    };

    let live_routes = Router::new()
        .route("/group/{slug}", get(group_feed))
        .route("/profile/{username}", get(profile))
        .route("/posts/{id}", get(post_detail))
        .route("/follow", get(following_feed))
        .route("/create", post(create_post))
        .route("/posts/{id}/edit", post(edit_post))
        .route("/posts/{id}/comment", post(add_comment))
        .route("/profile/{username}/follow", post(follow_author))
        .route("/profile/{username}/unfollow", post(unfollow_author))
        .route("/_health/db", get(public_health));

    cached_routes
        .merge(live_routes)
        .layer(middleware::from_fn_with_state(state.clone(), attach_identity))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedQuery {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostForm {
    text: Option<String>,
    group: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentForm {
    text: Option<String>,
}

/// Resolve the caller or produce the login bounce carrying the denied path.
fn require_user_or_redirect(identity: &Identity, next_path: &str) -> Result<UserRecord, Response> {
    match guard::require_user(identity, next_path) {
        Access::Granted(user) => Ok(user),
        Access::LoginRedirect { to } | Access::Detour { to } => {
            Err(Redirect::to(&to).into_response())
        }
    }
}

async fn global_feed(
    State(state): State<HttpState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, HttpError> {
    let page = PageRequest::from_param(query.page.as_deref());
    let feed = state.feed.global_feed(page).await?;
    Ok(Json(FeedPageView::from(&feed)).into_response())
}

async fn group_feed(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, HttpError> {
    let page = PageRequest::from_param(query.page.as_deref());
    let feed = state.feed.group_feed(&slug, page).await?;
    Ok(Json(GroupFeedView::from(&feed)).into_response())
}

async fn profile(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, HttpError> {
    let page = PageRequest::from_param(query.page.as_deref());
    let feed = state
        .feed
        .profile_feed(&username, identity.user(), page)
        .await?;
    Ok(Json(ProfileView::from(&feed)).into_response())
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpError> {
    let detail = state.feed.post_detail(id).await?;
    Ok(Json(PostDetailView::from(&detail)).into_response())
}

async fn following_feed(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Query(query): Query<FeedQuery>,
) -> Response {
    let user = match require_user_or_redirect(&identity, uri.path()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let page = PageRequest::from_param(query.page.as_deref());
    match state.feed.following_feed(user.id, page).await {
        Ok(feed) => Json(FeedPageView::from(&feed)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_post(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> Response {
    let user = match require_user_or_redirect(&identity, uri.path()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let input = NewPostInput {
        text: form.text.unwrap_or_default(),
        group: form.group,
        image: form.image,
    };

    match state.composer.create_post(&user, input).await {
        Ok(_) => Redirect::to(&format!("/profile/{}", user.username)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn edit_post(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Path(id): Path<Uuid>,
    Form(form): Form<PostForm>,
) -> Response {
    // The login bounce happens before the post lookup, so an anonymous
    // caller never learns whether the id exists.
    if identity.is_anonymous() {
        return Redirect::to(&guard::login_redirect(uri.path())).into_response();
    }

    let existing = match state.feed.find_post(id).await {
        Ok(post) => post,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let actor = match guard::require_author(&identity, &existing, uri.path()) {
        Access::Granted(user) => user,
        Access::LoginRedirect { to } | Access::Detour { to } => {
            return Redirect::to(&to).into_response();
        }
    };

    let input = EditPostInput {
        text: form.text,
        group: form.group,
        image: form.image,
    };

    match state.composer.edit_post(&actor, id, input).await {
        Ok(post) => Redirect::to(&format!("/posts/{}", post.id)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Path(id): Path<Uuid>,
    Form(form): Form<CommentForm>,
) -> Response {
    let user = match require_user_or_redirect(&identity, uri.path()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let text = form.text.unwrap_or_default();
    match state.composer.add_comment(&user, id, text).await {
        Ok(_) => Redirect::to(&format!("/posts/{id}")).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn follow_author(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Path(username): Path<String>,
) -> Response {
    let user = match require_user_or_redirect(&identity, uri.path()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    // Repeats and self-follows land on the profile like any other outcome.
    match state.follows.follow(&user, &username).await {
        Ok(_) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn unfollow_author(
    State(state): State<HttpState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Path(username): Path<String>,
) -> Response {
    let user = match require_user_or_redirect(&identity, uri.path()) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.follows.unfollow(&user, &username).await {
        Ok(_) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
