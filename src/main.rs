use std::{net::SocketAddr, process, sync::Arc};

use foglio::{
    application::{
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        posts::PostComposerService,
        repos::{CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, UsersRepo},
    },
    cache::{CacheConfig, CacheState, PageCache, SystemClock},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let fallback = Dispatch::new(tracing_fmt().with_max_level(Level::ERROR).finish());
    dispatcher::with_default(&fallback, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Some(config::Command::Serve(_)) | None => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings);
    serve_http(&settings, app.http_state, app.admin_state).await
}

struct ApplicationContext {
    http_state: HttpState,
    admin_state: AdminState,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let Some(database_url) = settings.database.url.as_deref() else {
        return Err(InfraError::configuration("database url is not configured").into());
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> ApplicationContext {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();

    let cache_config = CacheConfig::from(&settings.cache);
    let (page_cache, cache_state) = if cache_config.enabled {
        let store = Arc::new(PageCache::new(&cache_config, Arc::new(SystemClock)));
        let state = CacheState {
            store: store.clone(),
        };
        (Some(store), Some(state))
    } else {
        (None, None)
    };

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        users_repo.clone(),
        groups_repo.clone(),
        comments_repo.clone(),
        follows_repo.clone(),
    ));
    let composer = Arc::new(
        PostComposerService::new(
            posts_repo,
            posts_write_repo,
            comments_repo,
            groups_repo.clone(),
        )
        .with_page_cache(page_cache.clone()),
    );
    let follows = Arc::new(FollowService::new(users_repo.clone(), follows_repo));

    let http_state = HttpState {
        feed,
        composer: composer.clone(),
        follows,
        users: users_repo.clone(),
        db: Some(repositories.clone()),
        cache: cache_state,
    };

    let admin_state = AdminState {
        users: users_repo,
        groups: groups_repo,
        composer,
        page_cache,
        db: Some(repositories),
    };

    ApplicationContext {
        http_state,
        admin_state,
    }
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_listener = bind(settings.server.public_addr).await?;
    let admin_listener = bind(settings.server.admin_addr).await?;

    let public_server = axum::serve(
        public_listener,
        http::build_router(http_state).into_make_service(),
    );
    let admin_server = axum::serve(
        admin_listener,
        http::build_admin_router(admin_state).into_make_service(),
    );

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn bind(addr: SocketAddr) -> Result<tokio::net::TcpListener, AppError> {
    tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}
