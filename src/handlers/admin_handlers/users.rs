use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{require_admin, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render, see_other};
use crate::handlers::CsrfOnly;
use crate::models::user::{Role, User};
use crate::store::UserStore;
use crate::templates_structs::{PageContext, SelectOption, UserListTemplate, UserRow};

#[derive(Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct RoleForm {
    pub csrf_token: String,
    pub role: String,
}

/// Case-insensitive match on name, email or phone.
pub fn matches_search(user: &User, q: &str) -> bool {
    let q = q.trim().to_lowercase();
    q.is_empty()
        || user.name.to_lowercase().contains(&q)
        || user.email.contains(&q)
        || user.phone.as_deref().is_some_and(|p| p.contains(&q))
}

pub async fn list(
    users: web::Data<dyn UserStore>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;

    let rows = users
        .list_users()
        .await?
        .into_iter()
        .filter(|u| matches_search(u, &query.q))
        .map(|u| UserRow {
            id: u.id,
            is_self: u.id == admin.id,
            role_label: u.role.label().to_string(),
            roles: Role::ALL
                .into_iter()
                .map(|r| SelectOption::new(r.as_str(), r.label(), r == u.role))
                .collect(),
            created_at: u.created_at.format("%Y-%m-%d").to_string(),
            phone: u.phone.unwrap_or_default(),
            name: u.name,
            email: u.email,
        })
        .collect();

    let tmpl = UserListTemplate {
        ctx: PageContext::build(&session, &config, "/admin/users"),
        rows,
        q: query.q.trim().to_string(),
    };
    render(tmpl)
}

pub async fn set_role(
    users: web::Data<dyn UserStore>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<RoleForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let Some(role) = Role::parse(&form.role) else {
        set_flash(&session, "Unknown role");
        return Ok(see_other("/admin/users"));
    };
    if id == admin.id && role != Role::Admin {
        set_flash(&session, "You cannot remove your own admin role");
        return Ok(see_other("/admin/users"));
    }

    if users.set_role(id, role).await? {
        log::info!("Admin {} set role of user {id} to {}", admin.id, role.as_str());
        set_flash(&session, format!("Role changed to {}", role.label()));
    } else {
        set_flash(&session, "User not found");
    }
    Ok(see_other("/admin/users"))
}

pub async fn delete(
    users: web::Data<dyn UserStore>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    if id == admin.id {
        set_flash(&session, "You cannot delete your own account");
        return Ok(see_other("/admin/users"));
    }

    if users.delete_user(id).await? {
        log::info!("Admin {} deleted user {id}", admin.id);
        set_flash(&session, "User deleted");
    } else {
        set_flash(&session, "User not found");
    }
    Ok(see_other("/admin/users"))
}
