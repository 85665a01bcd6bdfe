pub mod admin_handlers;
pub mod api_handlers;
pub mod auth_handlers;
pub mod public_handlers;
pub mod wizard_handlers;

use actix_session::Session;
use actix_web::{HttpResponse, web};
use askama::Template;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::templates_structs::{NotFoundTemplate, PageContext};

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

/// 404 page with a link back to where the visitor came from.
pub fn not_found_page(
    session: &Session,
    config: &AppConfig,
    message: &str,
    back_href: &str,
    back_label: &str,
) -> Result<HttpResponse, AppError> {
    let tmpl = NotFoundTemplate {
        ctx: PageContext::build(session, config, back_href),
        message: message.to_string(),
        back_href: back_href.to_string(),
        back_label: back_label.to_string(),
    };
    Ok(HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(tmpl.render()?))
}

/// Fallback for unmatched routes.
pub async fn default_not_found(
    session: Session,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    not_found_page(&session, &config, "The page you are looking for does not exist.", "/", "Back to home")
}
