use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::require_admin;
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::store::{CatalogStore, UserStore};
use crate::templates_structs::{CategoryCard, DashboardTemplate, PageContext};

pub async fn index(
    catalog: web::Data<dyn CatalogStore>,
    users: web::Data<dyn UserStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;

    let categories = catalog.list_categories().await?;
    let services = catalog.list_services(None).await?;
    let user_count = users.list_users().await?.len();

    let mut without_flow = vec![];
    let mut flow_count = 0;
    for category in &categories {
        match catalog.find_flow(category.id).await? {
            Some(flow) if !flow.steps.is_empty() => flow_count += 1,
            _ => without_flow.push(CategoryCard::from(category)),
        }
    }

    let tmpl = DashboardTemplate {
        ctx: PageContext::build(&session, &config, "/admin"),
        category_count: categories.len(),
        service_count: services.len(),
        user_count,
        flow_count,
        without_flow,
    };
    render(tmpl)
}
