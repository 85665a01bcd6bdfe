use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::csrf;
use crate::auth::session::{require_admin, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render, see_other};
use crate::handlers::{CsrfOnly, not_found_page};
use crate::models::category::{Category, CategoryForm, NewCategory, build_tree, validate_category};
use crate::store::CatalogStore;
use crate::templates_structs::{
    CategoryFormTemplate, CategoryListTemplate, CategoryRow, PageContext, SelectOption,
};

pub async fn list(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;

    let categories = catalog.list_categories().await?;
    let mut rows = vec![];
    for node in build_tree(&categories) {
        let parent_name = node.category.name.clone();
        rows.push(category_row(catalog.get_ref(), &node.category, "").await?);
        for child in &node.children {
            rows.push(category_row(catalog.get_ref(), child, &parent_name).await?);
        }
    }

    let tmpl = CategoryListTemplate {
        ctx: PageContext::build(&session, &config, "/admin/categories"),
        rows,
    };
    render(tmpl)
}

async fn category_row(catalog: &dyn CatalogStore, c: &Category, parent_name: &str) -> Result<CategoryRow, AppError> {
    let step_count = catalog.find_flow(c.id).await?.map(|f| f.steps.len()).unwrap_or(0);
    Ok(CategoryRow {
        id: c.id,
        name: c.name.clone(),
        icon: c.icon.clone().unwrap_or_default(),
        parent_name: parent_name.to_string(),
        is_child: c.parent_id.is_some(),
        is_popular: c.is_popular,
        step_count,
    })
}

/// Top-level categories other than `editing` can be chosen as parent.
fn parent_options(categories: &[Category], editing: Option<i64>, selected: Option<i64>) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("", "(none, top level)", selected.is_none())];
    options.extend(
        categories
            .iter()
            .filter(|c| c.parent_id.is_none() && Some(c.id) != editing)
            .map(|c| SelectOption::new(c.id.to_string(), c.name.clone(), selected == Some(c.id))),
    );
    options
}

fn form_template(
    ctx: PageContext,
    form_action: String,
    form_title: &str,
    new: &NewCategory,
    categories: &[Category],
    editing: Option<i64>,
    errors: Vec<String>,
) -> CategoryFormTemplate {
    CategoryFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        name: new.name.clone(),
        description: new.description.clone().unwrap_or_default(),
        icon: new.icon.clone().unwrap_or_default(),
        is_popular: new.is_popular,
        parents: parent_options(categories, editing, new.parent_id),
        errors,
    }
}

fn blank() -> NewCategory {
    NewCategory { name: String::new(), description: None, icon: None, parent_id: None, is_popular: false }
}

pub async fn new_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let categories = catalog.list_categories().await?;
    let ctx = PageContext::build(&session, &config, "/admin/categories");
    render(form_template(ctx, "/admin/categories".to_string(), "New category", &blank(), &categories, None, vec![]))
}

pub async fn create(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<CategoryForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let new = NewCategory::from_form(&form);
    let categories = catalog.list_categories().await?;
    let errors = validate_category(&new, &categories, None);
    let rerender = |errors: Vec<String>| {
        let ctx = PageContext::build(&session, &config, "/admin/categories");
        render(form_template(ctx, "/admin/categories".to_string(), "New category", &new, &categories, None, errors))
    };
    if !errors.is_empty() {
        return rerender(errors);
    }

    match catalog.create_category(&new).await {
        Ok(id) => {
            log::info!("Admin {} created category {id} '{}'", admin.id, new.name);
            set_flash(&session, format!("Category '{}' created. Add its request steps next.", new.name));
            Ok(see_other(format!("/admin/categories/{id}/steps")))
        }
        Err(AppError::Conflict(message)) => rerender(vec![message]),
        Err(e) => Err(e),
    }
}

pub async fn edit_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let id = path.into_inner();
    let Some(category) = catalog.find_category(id).await? else {
        return not_found_page(&session, &config, "Category not found.", "/admin/categories", "Back to categories");
    };
    let categories = catalog.list_categories().await?;
    let current = NewCategory {
        name: category.name,
        description: category.description,
        icon: category.icon,
        parent_id: category.parent_id,
        is_popular: category.is_popular,
    };
    let ctx = PageContext::build(&session, &config, "/admin/categories");
    render(form_template(
        ctx,
        format!("/admin/categories/{id}"),
        "Edit category",
        &current,
        &categories,
        Some(id),
        vec![],
    ))
}

pub async fn update(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CategoryForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let new = NewCategory::from_form(&form);
    let categories = catalog.list_categories().await?;
    if !categories.iter().any(|c| c.id == id) {
        return not_found_page(&session, &config, "Category not found.", "/admin/categories", "Back to categories");
    }
    let errors = validate_category(&new, &categories, Some(id));
    let rerender = |errors: Vec<String>| {
        let ctx = PageContext::build(&session, &config, "/admin/categories");
        render(form_template(ctx, format!("/admin/categories/{id}"), "Edit category", &new, &categories, Some(id), errors))
    };
    if !errors.is_empty() {
        return rerender(errors);
    }

    match catalog.update_category(id, &new).await {
        Ok(()) => {
            log::info!("Admin {} updated category {id}", admin.id);
            set_flash(&session, "Category updated");
            Ok(see_other("/admin/categories"))
        }
        Err(AppError::Conflict(message)) => rerender(vec![message]),
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

    match catalog.delete_category(id).await {
        Ok(true) => {
            log::info!("Admin {} deleted category {id}", admin.id);
            set_flash(&session, "Category deleted");
        }
        Ok(false) => set_flash(&session, "Category not found"),
        Err(AppError::Conflict(message)) => {
            set_flash(&session, format!("{message}. Move or delete its services first."))
        }
        Err(e) => return Err(e),
    }
    Ok(see_other("/admin/categories"))
}
