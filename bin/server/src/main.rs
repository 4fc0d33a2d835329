use mon_auth::login::{LoginFlow, OAuth2CodeExchanger};
use mon_auth::{EmailClaimsExtractor, IdentityClaimsAuthoriser, JwksTokenValidator, RequestTokenAuthoriser};
use mon_ledger::Ledger;
use mon_server::{AppState, config::ServerConfig, db::PgLedgerStore, router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    if let Err(report) = config.validate() {
        panic!("invalid configuration: {report}");
    }
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let validator = match JwksTokenValidator::from_config(&config.authorisation) {
        Ok(validator) => validator,
        Err(report) => panic!("failed to create token validator: {report}"),
    };
    let authoriser = RequestTokenAuthoriser::new(
        validator,
        EmailClaimsExtractor,
        IdentityClaimsAuthoriser::new(config.authorisation.authorised_identity()),
    );

    let login = match &config.login {
        Some(login_config) => {
            let exchanger = match OAuth2CodeExchanger::new(login_config) {
                Ok(exchanger) => exchanger,
                Err(report) => panic!("failed to create OAuth2 client: {report}"),
            };
            tracing::info!("Login endpoints enabled");
            Some(Arc::new(
                LoginFlow::new(Arc::new(exchanger))
                    .with_exchange_timeout(login_config.exchange_timeout()),
            ))
        }
        None => {
            tracing::info!("No login configuration, login endpoints disabled");
            None
        }
    };

    let state = AppState::new(
        Ledger::new(Arc::new(PgLedgerStore::new(db_pool))),
        Arc::new(authoriser),
    );
    let app = router(Arc::new(state), login);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
