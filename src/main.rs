use std::{process, sync::Arc};

use lectern::{
    application::{
        admin::{AdminCommentService, AdminPostService, AdminTagService, AdminUserService},
        blog::BlogService,
        error::AppError,
        repos::{
            CommentsRepo, CommentsWriteRepo, HealthRepo, PostsRepo, PostsWriteRepo, TagsRepo,
            TagsWriteRepo, UsersRepo, UsersWriteRepo,
        },
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        media::MediaStorage,
        telemetry,
    },
    presentation::views::LayoutChrome,
};
use sqlx::PgPool;
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;
    info!(target: "lectern::migrate", "database migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let media = Arc::new(
        MediaStorage::new(settings.media.directory.clone()).map_err(InfraError::Io)?,
    );
    let (http_state, admin_state) = build_states(repositories, media, &settings)?;

    serve_http(&settings, http_state, admin_state).await
}

async fn connect_pool(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    Ok(pool)
}

fn build_states(
    repositories: Arc<PostgresRepositories>,
    media: Arc<MediaStorage>,
    settings: &config::Settings,
) -> Result<(HttpState, AdminState), AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let tags_write_repo: Arc<dyn TagsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let comments_write_repo: Arc<dyn CommentsWriteRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let users_write_repo: Arc<dyn UsersWriteRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let media_url_prefix = settings.media.url_prefix.clone();
    let max_upload_bytes = usize::try_from(settings.media.max_upload_bytes.get())
        .map_err(|_| InfraError::configuration("media.max_upload_bytes does not fit in memory"))?;

    let blog = Arc::new(BlogService::new(
        posts_repo.clone(),
        tags_repo.clone(),
        comments_repo.clone(),
        media_url_prefix.clone(),
    ));

    let http_state = HttpState {
        blog,
        chrome: LayoutChrome::for_site(&settings.site.title),
        media: media.clone(),
        media_url_prefix: media_url_prefix.clone(),
        health: health_repo.clone(),
    };

    let admin_state = AdminState {
        posts: Arc::new(AdminPostService::new(
            posts_repo.clone(),
            posts_write_repo,
            tags_repo.clone(),
            users_repo.clone(),
        )),
        tags: Arc::new(AdminTagService::new(tags_repo, tags_write_repo)),
        comments: Arc::new(AdminCommentService::new(
            comments_repo,
            comments_write_repo,
            posts_repo,
            users_repo.clone(),
        )),
        users: Arc::new(AdminUserService::new(users_repo, users_write_repo)),
        media,
        media_url_prefix,
        max_upload_bytes,
        health: health_repo,
    };

    Ok((http_state, admin_state))
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(InfraError::from)?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target: "lectern::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
