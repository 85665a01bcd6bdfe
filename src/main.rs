use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware};

use homeserve::app::{AppState, session_middleware};
use homeserve::auth::{password, rate_limit::RateLimiter};
use homeserve::config::AppConfig;
use homeserve::dispatch::Dispatcher;
use homeserve::store::{CatalogStore, MemoryStore, PgStore, UserStore};
use homeserve::{db, fixtures};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env();

    let (catalog, users) = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url).await.map_err(io::Error::other)?;
            db::run_migrations(&pool).await.map_err(io::Error::other)?;
            let store = Arc::new(PgStore::new(pool));
            let catalog: Arc<dyn CatalogStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            (catalog, users)
        }
        None => {
            log::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            let store = Arc::new(MemoryStore::new());
            let catalog: Arc<dyn CatalogStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            (catalog, users)
        }
    };

    fixtures::seed(catalog.as_ref()).await.map_err(io::Error::other)?;
    bootstrap_admin(&config, users.as_ref()).await.map_err(io::Error::other)?;

    let key = config.cookie_key();
    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        catalog,
        users,
        dispatcher: Dispatcher::from_config(&config),
        limiter: RateLimiter::default(),
        config,
    };

    log::info!("Starting {} at http://{bind_addr}", state.config.app_name);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(session_middleware(key.clone()))
            .wrap(middleware::Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind(bind_addr)?
    .run()
    .await
}

/// Create or promote the admin named by ADMIN_EMAIL / ADMIN_PASSWORD.
async fn bootstrap_admin(config: &AppConfig, users: &dyn UserStore) -> Result<(), homeserve::errors::AppError> {
    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(admin_password)) => {
            let hash = password::hash_password(admin_password)?;
            let id = users.upsert_admin("Administrator", email, &hash).await?;
            log::info!("Admin account {email} ready (user {id})");
        }
        (Some(_), None) | (None, Some(_)) => {
            log::warn!("Set both ADMIN_EMAIL and ADMIN_PASSWORD to bootstrap an admin");
        }
        (None, None) => {}
    }
    if users.count_admins().await? == 0 {
        log::warn!("No admin account exists; the dashboard is unreachable until one is created");
    }
    Ok(())
}
