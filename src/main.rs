use library_lending::{
    adapters::{
        http::{HttpBookService, HttpMemberService},
        postgres::PostgresLoanRepository,
    },
    api::{AppState, create_router},
    application::loan::ServiceDependencies,
    config::AppConfig,
    resilience::BreakerRegistry,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        port = config.port,
        book_service_url = %config.book_service_url,
        user_service_url = %config.user_service_url,
        environment = ?config.environment,
        "starting lending service"
    );

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    let loan_repository = PostgresLoanRepository::new(pool);
    loan_repository.migrate().await?;

    // One registry for the process; every proxy shares it
    let registry = Arc::new(BreakerRegistry::with_overrides(
        config.circuit_defaults.clone(),
        config.circuit_overrides.clone(),
    ));

    let service_deps = ServiceDependencies {
        loan_repository: Arc::new(loan_repository),
        member_service: Arc::new(HttpMemberService::new(
            config.user_service_url.as_str(),
            &registry,
        )),
        book_service: Arc::new(HttpBookService::new(
            config.book_service_url.as_str(),
            &registry,
        )),
    };

    let app_state = Arc::new(AppState {
        service_deps,
        registry,
        expose_internal_errors: config.expose_internal_errors(),
    });

    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
