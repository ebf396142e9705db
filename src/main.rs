mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{
    db::{DBClient, HelpdeskStore},
    lookupdb::LookupExt,
};
use dotenv::dotenv;
use routes::create_router;
use service::{
    intervention_service::InterventionService, lookup_registry::LookupRegistry,
    technician_service::TechnicianService, ticket_service::TicketService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn HelpdeskStore>,
    pub lookups: Arc<LookupRegistry>,
    pub ticket_service: TicketService,
    pub intervention_service: InterventionService,
    pub technician_service: TechnicianService,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(
            config
                .log_level
                .parse::<LevelFilter>()
                .unwrap_or(LevelFilter::DEBUG),
        )
        .init();

    error::set_debug_errors(config.app_debug);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!("🔥 Failed to run migrations: {:?}", err);
            std::process::exit(1);
        }
    }

    let db_client = DBClient::new(pool);

    let lookups = match db_client.get_lookup_tables().await {
        Ok(tables) => match LookupRegistry::from_tables(tables) {
            Ok(registry) => Arc::new(registry),
            Err(err) => {
                tracing::error!("🔥 Lookup tables are incomplete: {}", err);
                std::process::exit(1);
            }
        },
        Err(err) => {
            tracing::error!("🔥 Failed to load lookup tables: {:?}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE]);

    let store: Arc<dyn HelpdeskStore> = Arc::new(db_client);
    let app_state = AppState {
        env: config.clone(),
        store: store.clone(),
        lookups: lookups.clone(),
        ticket_service: TicketService::new(store.clone(), lookups.clone()),
        intervention_service: InterventionService::new(store.clone(), lookups.clone()),
        technician_service: TechnicianService::new(store, lookups),
    };

    let app = create_router(Arc::new(app_state)).layer(cors);

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("🔥 Server error: {:?}", err);
    }
}
