use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        posts::PostComposerService,
        repos::{CreateGroupParams, CreateUserParams, GroupsRepo, RepoError, UsersRepo},
    },
    cache::PageCache,
    domain::{slug, users},
    infra::db::PostgresRepositories,
    presentation::views::{GroupView, UserView},
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
    repo_error_to_http,
};

#[derive(Clone)]
pub struct AdminState {
    pub users: Arc<dyn UsersRepo>,
    pub groups: Arc<dyn GroupsRepo>,
    pub composer: Arc<PostComposerService>,
    pub page_cache: Option<Arc<PageCache>>,
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/users", post(admin_create_user))
        .route("/groups", get(admin_list_groups).post(admin_create_group))
        .route("/posts/{id}/delete", post(admin_delete_post))
        .route("/cache/flush", post(admin_flush_cache))
        .route("/_health/db", get(admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    username: String,
}

#[derive(Debug, Deserialize)]
struct CreateGroupRequest {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

async fn admin_create_user(
    State(state): State<AdminState>,
    Json(payload): Json<CreateUserRequest>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::create_user";

    let username = payload.username.trim().to_string();
    if let Err(err) = users::validate_username(&username) {
        return HttpError::from_error(SOURCE, StatusCode::BAD_REQUEST, "Invalid username", &err)
            .into_response();
    }

    match state.users.create_user(CreateUserParams { username }).await {
        Ok(user) => (StatusCode::CREATED, Json(UserView::from(&user))).into_response(),
        Err(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn admin_list_groups(State(state): State<AdminState>) -> Response {
    const SOURCE: &str = "infra::http::admin::list_groups";

    match state.groups.list_groups().await {
        Ok(groups) => {
            let views: Vec<GroupView> = groups.iter().map(GroupView::from).collect();
            Json(views).into_response()
        }
        Err(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn admin_create_group(
    State(state): State<AdminState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::create_group";

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Title must not be empty",
            "Group title was blank",
        )
        .into_response();
    }

    let slug = match payload.slug.as_deref().map(str::trim) {
        Some(candidate) if !candidate.is_empty() => {
            if !slug::is_well_formed(candidate) {
                return HttpError::new(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    "Invalid slug",
                    format!("Slug `{candidate}` is not in canonical form"),
                )
                .into_response();
            }
            candidate.to_string()
        }
        _ => {
            let groups = state.groups.clone();
            let generated = slug::generate_unique_slug(&title, |candidate| {
                let groups = groups.clone();
                let candidate = candidate.to_string();
                async move {
                    Ok::<bool, RepoError>(groups.find_by_slug(&candidate).await?.is_none())
                }
            })
            .await;
            match generated {
                Ok(slug) => slug,
                Err(slug::SlugAsyncError::Slug(err)) => {
                    return HttpError::from_error(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Could not derive slug",
                        &err,
                    )
                    .into_response();
                }
                Err(slug::SlugAsyncError::Predicate(err)) => {
                    return repo_error_to_http(SOURCE, err).into_response();
                }
            }
        }
    };

    let params = CreateGroupParams {
        title,
        slug,
        description: payload.description.unwrap_or_default(),
    };

    match state.groups.create_group(params).await {
        Ok(group) => (StatusCode::CREATED, Json(GroupView::from(&group))).into_response(),
        Err(err) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

async fn admin_delete_post(State(state): State<AdminState>, Path(id): Path<Uuid>) -> Response {
    match state.composer.delete_post(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn admin_flush_cache(State(state): State<AdminState>) -> Response {
    let flushed = match &state.page_cache {
        Some(cache) => cache.flush(),
        None => 0,
    };
    Json(json!({ "flushed": flushed })).into_response()
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
