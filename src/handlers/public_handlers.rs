use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::set_flash;
use crate::config::AppConfig;
use crate::errors::{AppError, render};
use crate::handlers::not_found_page;
use crate::models::category::{build_tree, popular};
use crate::models::service::{ServiceSort, filter_and_sort, parse_price_cents};
use crate::store::CatalogStore;
use crate::templates_structs::{
    CategoryCard, CategoryGroup, CategoryTemplate, HomeTemplate, PageContext, SelectOption, ServiceCard,
};

/// Popular categories shown at the top of the home page.
const POPULAR_LIMIT: usize = 3;

pub async fn home(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let categories = match catalog.list_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            log::error!("Failed to load categories: {e}");
            set_flash(&session, "Categories could not be loaded. Please try again later.");
            vec![]
        }
    };

    let groups = build_tree(&categories)
        .iter()
        .map(|node| CategoryGroup {
            category: CategoryCard::from(&node.category),
            children: node.children.iter().map(CategoryCard::from).collect(),
        })
        .collect();

    let tmpl = HomeTemplate {
        ctx: PageContext::build(&session, &config, "/"),
        popular: popular(&categories, POPULAR_LIMIT).iter().map(CategoryCard::from).collect(),
        groups,
    };
    render(tmpl)
}

#[derive(Deserialize)]
pub struct ServiceQuery {
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub min_price: String,
    #[serde(default)]
    pub max_price: String,
}

pub async fn category(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<ServiceQuery>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let Some(category) = catalog.find_category(id).await? else {
        return not_found_page(&session, &config, "This category does not exist.", "/", "Back to home");
    };

    let parent = match category.parent_id {
        Some(parent_id) => catalog.find_category(parent_id).await?,
        None => None,
    };
    let children = catalog
        .list_categories()
        .await?
        .iter()
        .filter(|c| c.parent_id == Some(id))
        .map(CategoryCard::from)
        .collect();

    let services = match catalog.list_services(Some(id)).await {
        Ok(services) => services,
        Err(e) => {
            log::error!("Failed to load services of category {id}: {e}");
            set_flash(&session, "Services could not be loaded. Please try again later.");
            vec![]
        }
    };
    let sort = ServiceSort::parse(&query.sort);
    let services = filter_and_sort(
        services,
        sort,
        parse_price_cents(&query.min_price),
        parse_price_cents(&query.max_price),
    );

    let has_flow = catalog
        .find_flow(id)
        .await?
        .is_some_and(|flow| !flow.steps.is_empty());

    let tmpl = CategoryTemplate {
        ctx: PageContext::build(&session, &config, &format!("/categories/{id}")),
        category: CategoryCard::from(&category),
        parent: parent.as_ref().map(CategoryCard::from),
        children,
        services: services.iter().map(ServiceCard::from).collect(),
        has_flow,
        sort_options: ServiceSort::ALL
            .into_iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), s == sort))
            .collect(),
        min_price: query.min_price.trim().to_string(),
        max_price: query.max_price.trim().to_string(),
    };
    render(tmpl)
}
