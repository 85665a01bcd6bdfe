use askama::Template;

use crate::models::service::Service;
use super::{CategoryCard, PageContext, SelectOption};

pub struct CategoryGroup {
    pub category: CategoryCard,
    pub children: Vec<CategoryCard>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub popular: Vec<CategoryCard>,
    pub groups: Vec<CategoryGroup>,
}

pub struct ServiceCard {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub provider_name: String,
}

impl From<&Service> for ServiceCard {
    fn from(s: &Service) -> Self {
        ServiceCard {
            id: s.id,
            name: s.name.clone(),
            description: s.description.clone(),
            price: s.price_display(),
            duration: s.duration_display(),
            provider_name: s.provider_name.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub ctx: PageContext,
    pub category: CategoryCard,
    pub parent: Option<CategoryCard>,
    pub children: Vec<CategoryCard>,
    pub services: Vec<ServiceCard>,
    pub has_flow: bool,
    pub sort_options: Vec<SelectOption>,
    pub min_price: String,
    pub max_price: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub ctx: PageContext,
    pub message: String,
    pub back_href: String,
    pub back_label: String,
}
