use std::{process, sync::Arc};

use postboard::{
    application::{
        api_keys::{ApiKeyService, IssueApiKeyCommand},
        error::AppError,
        posts::PostService,
        repos::{ApiKeysRepo, HealthRepo, PostsRepo, PostsWriteRepo},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use time::{Duration, OffsetDateTime};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
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
        config::Command::Keys(args) => run_keys(settings, args.command).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "postboard::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "postboard::serve", "Server stopped");
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "postboard::migrate", "Migrations applied");
    Ok(())
}

async fn run_keys(settings: config::Settings, command: config::KeysCommand) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let api_keys_repo: Arc<dyn ApiKeysRepo> = repositories;
    let service = ApiKeyService::new(api_keys_repo);

    match command {
        config::KeysCommand::Issue(args) => {
            let expires_at = args
                .expires_in_days
                .map(|days| OffsetDateTime::now_utc() + Duration::days(i64::from(days)));
            let issued = service
                .issue(IssueApiKeyCommand {
                    user_id: args.user_id,
                    name: args.name,
                    expires_at,
                })
                .await?;
            info!(
                target = "postboard::keys",
                key_id = %issued.record.id,
                user_id = issued.record.user_id,
                "API key issued"
            );
            println!("{}", issued.token);
        }
        config::KeysCommand::Revoke(args) => {
            service.revoke(args.key_id).await?;
            info!(target = "postboard::keys", key_id = %args.key_id, "API key revoked");
        }
        config::KeysCommand::List => {
            let now = OffsetDateTime::now_utc();
            for key in service.list().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    key.id,
                    key.prefix,
                    key.user_id,
                    key.status_at(now),
                    key.name
                );
            }
        }
    }

    Ok(())
}

/// Connects the pool and applies pending migrations.
async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(repositories: Arc<PostgresRepositories>) -> ApiState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let api_keys_repo: Arc<dyn ApiKeysRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    ApiState {
        posts: Arc::new(PostService::new(posts_repo, posts_write_repo)),
        api_keys: Arc::new(ApiKeyService::new(api_keys_repo)),
        health: health_repo,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "postboard::serve", "Shutdown signal received");
}
