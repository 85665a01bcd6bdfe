use std::net::{IpAddr, Ipv4Addr};

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::session::{current_user, set_flash, sign_in};
use crate::auth::{csrf, password, rate_limit::RateLimiter};
use crate::config::AppConfig;
use crate::errors::{AppError, render, see_other};
use crate::handlers::CsrfOnly;
use crate::models::user::{LoginForm, NewUser, RegisterForm, Role, normalize_email};
use crate::store::UserStore;
use crate::templates_structs::{LoginTemplate, PageContext, RegisterTemplate};

fn landing(role: Role) -> &'static str {
    if role == Role::Admin { "/admin" } else { "/" }
}

pub async fn login_page(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if let Some(user) = current_user(&session) {
        return Ok(see_other(landing(user.role)));
    }
    let tmpl = LoginTemplate {
        ctx: PageContext::build(&session, &config, "/login"),
        error: None,
        email: String::new(),
    };
    render(tmpl)
}

pub async fn login_submit(
    req: HttpRequest,
    users: web::Data<dyn UserStore>,
    config: web::Data<AppConfig>,
    limiter: web::Data<RateLimiter>,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check before any store access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let failed = |message: &str| {
        let tmpl = LoginTemplate {
            ctx: PageContext::build(&session, &config, "/login"),
            error: Some(message.to_string()),
            email: form.email.trim().to_string(),
        };
        render(tmpl)
    };

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return failed("Too many failed login attempts. Please try again later.");
    }

    let found = users.find_user_by_email(&form.email).await?;
    match found {
        Some(user) if password::verify_password(&form.password, &user.password_hash)? => {
            limiter.clear(ip);
            sign_in(&session, &user)?;
            log::info!("User {} signed in", user.id);
            Ok(see_other(landing(user.role)))
        }
        _ => {
            limiter.record_failure(ip);
            failed("Invalid email or password")
        }
    }
}

pub async fn register_page(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if current_user(&session).is_some() {
        return Ok(see_other("/"));
    }
    let tmpl = RegisterTemplate {
        ctx: PageContext::build(&session, &config, "/register"),
        errors: vec![],
        name: String::new(),
        email: String::new(),
        phone: String::new(),
    };
    render(tmpl)
}

pub async fn register_submit(
    users: web::Data<dyn UserStore>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let rerender = |errors: Vec<String>| {
        let tmpl = RegisterTemplate {
            ctx: PageContext::build(&session, &config, "/register"),
            errors,
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
        };
        render(tmpl)
    };

    let errors = form.errors();
    if !errors.is_empty() {
        return rerender(errors);
    }

    let phone = Some(form.phone.trim().to_string()).filter(|p| !p.is_empty());
    let new = NewUser {
        name: form.name.trim().to_string(),
        email: normalize_email(&form.email),
        password_hash: password::hash_password(&form.password)?,
        role: Role::User,
        phone,
    };

    match users.create_user(&new).await {
        Ok(id) => {
            log::info!("Registered user {id}");
            if let Some(user) = users.find_user_by_email(&new.email).await? {
                sign_in(&session, &user)?;
            }
            set_flash(&session, "Welcome! Your account has been created.");
            Ok(see_other("/"))
        }
        Err(AppError::Conflict(message)) => rerender(vec![message]),
        Err(e) => Err(e),
    }
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(see_other("/"))
}
