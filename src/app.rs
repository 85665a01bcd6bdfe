//! Route table and shared application state.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{cookie::Key, web};

use crate::auth::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::handlers::{
    admin_handlers::{categories, dashboard, services, steps, users},
    api_handlers, auth_handlers, default_not_found, public_handlers, wizard_handlers,
};
use crate::store::{CatalogStore, UserStore};

/// Everything the handlers receive through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub users: Arc<dyn UserStore>,
    pub config: AppConfig,
    pub dispatcher: Dispatcher,
    pub limiter: RateLimiter,
}

impl AppState {
    /// Register the state and every route on an `App`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.catalog.clone()))
            .app_data(web::Data::from(self.users.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.dispatcher.clone()))
            .app_data(web::Data::new(self.limiter.clone()));
        routes(cfg);
    }
}

pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(false)
        .cookie_http_only(true)
        .build()
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(actix_files::Files::new("/static", "./static"));
    api_handlers::configure(cfg);

    cfg
        // Public pages
        .route("/", web::get().to(public_handlers::home))
        .route("/categories/{id}", web::get().to(public_handlers::category))
        // Request wizard; /request/success before /request/{id}
        .route("/request/success", web::get().to(wizard_handlers::request_success))
        .route("/request/{id}", web::get().to(wizard_handlers::request_form))
        .route("/request/{id}/answer", web::post().to(wizard_handlers::request_answer))
        .route("/request/{id}/back", web::post().to(wizard_handlers::request_back))
        .route("/request/{id}/contact", web::post().to(wizard_handlers::request_contact))
        .route("/request/{id}/cancel", web::post().to(wizard_handlers::request_cancel))
        // Accounts
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/register", web::get().to(auth_handlers::register_page))
        .route("/register", web::post().to(auth_handlers::register_submit))
        .route("/logout", web::post().to(auth_handlers::logout));

    cfg.service(
        web::scope("/admin")
            .wrap(actix_web::middleware::from_fn(crate::auth::middleware::require_admin))
            .route("", web::get().to(dashboard::index))
            // Categories; /categories/new before /categories/{id}
            .route("/categories", web::get().to(categories::list))
            .route("/categories/new", web::get().to(categories::new_form))
            .route("/categories", web::post().to(categories::create))
            .route("/categories/{id}/edit", web::get().to(categories::edit_form))
            .route("/categories/{id}", web::post().to(categories::update))
            .route("/categories/{id}/delete", web::post().to(categories::delete))
            // Step editor; /steps/initial before /steps/{step_id}
            .route("/categories/{id}/steps", web::get().to(steps::list))
            .route("/categories/{id}/steps/new", web::get().to(steps::new_form))
            .route("/categories/{id}/steps", web::post().to(steps::create))
            .route("/categories/{id}/steps/initial", web::post().to(steps::set_initial))
            .route("/categories/{id}/steps/{step_id}/edit", web::get().to(steps::edit_form))
            .route("/categories/{id}/steps/{step_id}", web::post().to(steps::update))
            .route("/categories/{id}/steps/{step_id}/delete", web::post().to(steps::delete))
            .route("/categories/{id}/steps/{step_id}/move", web::post().to(steps::move_step))
            .route("/categories/{id}/steps/{step_id}/options", web::post().to(steps::add_option))
            .route(
                "/categories/{id}/steps/{step_id}/options/{option_id}/delete",
                web::post().to(steps::remove_option),
            )
            .route("/categories/{id}/steps/{step_id}/branches", web::post().to(steps::set_branch))
            // Preview of the request wizard
            .route("/categories/{id}/preview", web::get().to(wizard_handlers::preview_form))
            .route("/categories/{id}/preview/answer", web::post().to(wizard_handlers::preview_answer))
            .route("/categories/{id}/preview/back", web::post().to(wizard_handlers::preview_back))
            .route("/categories/{id}/preview/contact", web::post().to(wizard_handlers::preview_contact))
            .route("/categories/{id}/preview/cancel", web::post().to(wizard_handlers::preview_cancel))
            // Services; /services/new before /services/{id}
            .route("/services", web::get().to(services::list))
            .route("/services/new", web::get().to(services::new_form))
            .route("/services", web::post().to(services::create))
            .route("/services/{id}/edit", web::get().to(services::edit_form))
            .route("/services/{id}", web::post().to(services::update))
            .route("/services/{id}/delete", web::post().to(services::delete))
            // Users
            .route("/users", web::get().to(users::list))
            .route("/users/{id}/role", web::post().to(users::set_role))
            .route("/users/{id}/delete", web::post().to(users::delete)),
    );

    cfg.default_service(web::to(default_not_found));
}
