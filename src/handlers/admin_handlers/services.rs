use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{require_admin, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render, see_other};
use crate::handlers::{CsrfOnly, not_found_page};
use crate::models::category::Category;
use crate::models::service::{ServiceForm, format_price};
use crate::store::CatalogStore;
use crate::templates_structs::{PageContext, SelectOption, ServiceFormTemplate, ServiceListTemplate, ServiceRow};
use super::category_options;

#[derive(Deserialize)]
pub struct ServiceFilter {
    #[serde(default)]
    pub category_id: String,
}

fn category_name(categories: &[Category], id: i64) -> String {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

pub async fn list(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<ServiceFilter>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;

    let selected = query.category_id.trim().parse::<i64>().ok();
    let categories = catalog.list_categories().await?;
    let services = catalog.list_services(selected).await?;

    let rows = services
        .iter()
        .map(|s| ServiceRow {
            id: s.id,
            name: s.name.clone(),
            category_name: category_name(&categories, s.category_id),
            price: s.price_display(),
            duration: s.duration_display(),
            provider_name: s.provider_name.clone(),
        })
        .collect();

    let mut category_filter = vec![SelectOption::new("", "All categories", selected.is_none())];
    category_filter.extend(category_options(&categories, selected));

    let tmpl = ServiceListTemplate {
        ctx: PageContext::build(&session, &config, "/admin/services"),
        rows,
        category_filter,
    };
    render(tmpl)
}

struct FormValues {
    name: String,
    description: String,
    price: String,
    duration_minutes: String,
    provider_name: String,
    category_id: Option<i64>,
}

impl From<&ServiceForm> for FormValues {
    fn from(form: &ServiceForm) -> Self {
        FormValues {
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            price: form.price.trim().to_string(),
            duration_minutes: form.duration_minutes.trim().to_string(),
            provider_name: form.provider_name.trim().to_string(),
            category_id: form.category_id.trim().parse().ok(),
        }
    }
}

fn form_template(
    ctx: PageContext,
    form_action: String,
    form_title: &str,
    values: FormValues,
    categories: &[Category],
    errors: Vec<String>,
) -> ServiceFormTemplate {
    let mut options = vec![SelectOption::new("", "Select a category", values.category_id.is_none())];
    options.extend(category_options(categories, values.category_id));
    ServiceFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        name: values.name,
        description: values.description,
        price: values.price,
        duration_minutes: values.duration_minutes,
        provider_name: values.provider_name,
        categories: options,
        errors,
    }
}

pub async fn new_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let categories = catalog.list_categories().await?;
    let values = FormValues {
        name: String::new(),
        description: String::new(),
        price: String::new(),
        duration_minutes: "60".to_string(),
        provider_name: String::new(),
        category_id: None,
    };
    let ctx = PageContext::build(&session, &config, "/admin/services");
    render(form_template(ctx, "/admin/services".to_string(), "New service", values, &categories, vec![]))
}

pub async fn create(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let categories = catalog.list_categories().await?;
    let new = match form.parse(|id| categories.iter().any(|c| c.id == id)) {
        Ok(new) => new,
        Err(errors) => {
            let ctx = PageContext::build(&session, &config, "/admin/services");
            let values = FormValues::from(&*form);
            return render(form_template(ctx, "/admin/services".to_string(), "New service", values, &categories, errors));
        }
    };

    let id = catalog.create_service(&new).await?;
    log::info!("Admin {} created service {id} at {}", admin.id, format_price(new.price_cents));
    set_flash(&session, format!("Service '{}' created", new.name));
    Ok(see_other("/admin/services"))
}

pub async fn edit_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let id = path.into_inner();
    let Some(service) = catalog.find_service(id).await? else {
        return not_found_page(&session, &config, "Service not found.", "/admin/services", "Back to services");
    };
    let categories = catalog.list_categories().await?;
    let values = FormValues {
        price: service.price_display(),
        duration_minutes: service.duration_minutes.to_string(),
        category_id: Some(service.category_id),
        name: service.name,
        description: service.description,
        provider_name: service.provider_name,
    };
    let ctx = PageContext::build(&session, &config, "/admin/services");
    render(form_template(ctx, format!("/admin/services/{id}"), "Edit service", values, &categories, vec![]))
}

pub async fn update(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let categories = catalog.list_categories().await?;
    let new = match form.parse(|cid| categories.iter().any(|c| c.id == cid)) {
        Ok(new) => new,
        Err(errors) => {
            let ctx = PageContext::build(&session, &config, "/admin/services");
            let values = FormValues::from(&*form);
            return render(form_template(ctx, format!("/admin/services/{id}"), "Edit service", values, &categories, errors));
        }
    };

    match catalog.update_service(id, &new).await {
        Ok(()) => {
            log::info!("Admin {} updated service {id}", admin.id);
            set_flash(&session, "Service updated");
            Ok(see_other("/admin/services"))
        }
        Err(AppError::NotFound) => {
            not_found_page(&session, &config, "Service not found.", "/admin/services", "Back to services")
        }
        Err(e) => Err(e),
    }
}

pub async fn delete(
    catalog: web::Data<dyn CatalogStore>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    if catalog.delete_service(id).await? {
        log::info!("Admin {} deleted service {id}", admin.id);
        set_flash(&session, "Service deleted");
    } else {
        set_flash(&session, "Service not found");
    }
    Ok(see_other("/admin/services"))
}
