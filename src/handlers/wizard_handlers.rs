//! The request wizard. The public form under `/request/{id}` and the admin
//! preview under `/admin/categories/{id}/preview` run the same walker; the
//! preview never dispatches.

use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::set_flash;
use crate::config::AppConfig;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::errors::{AppError, render, see_other};
use crate::flow::render::extract_answer;
use crate::flow::{ContactInfo, Flow, FlowError, Next, Walker};
use crate::handlers::not_found_page;
use crate::models::category::Category;
use crate::store::CatalogStore;
use crate::templates_structs::{PageContext, StepView, SuccessTemplate, WizardTemplate};

const OUTCOME_KEY: &str = "request_outcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Preview,
}

impl Mode {
    fn session_key(self) -> &'static str {
        match self {
            Mode::Live => "wizard",
            Mode::Preview => "preview_wizard",
        }
    }

    fn base_url(self, category_id: i64) -> String {
        match self {
            Mode::Live => format!("/request/{category_id}"),
            Mode::Preview => format!("/admin/categories/{category_id}/preview"),
        }
    }

    /// Where "close" and a finished preview lead.
    fn exit_url(self, category_id: i64) -> String {
        match self {
            Mode::Live => format!("/categories/{category_id}"),
            Mode::Preview => format!("/admin/categories/{category_id}/steps"),
        }
    }
}

#[derive(Deserialize)]
pub struct AnswerForm {
    pub csrf_token: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ContactForm {
    pub csrf_token: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Category and its flow, or the 404 panel to show instead.
async fn load(
    catalog: &dyn CatalogStore,
    session: &Session,
    config: &AppConfig,
    mode: Mode,
    category_id: i64,
) -> Result<Result<(Category, Flow), HttpResponse>, AppError> {
    let (back_href, back_label) = match mode {
        Mode::Live => ("/".to_string(), "Back to home"),
        Mode::Preview => (mode.exit_url(category_id), "Back to the step editor"),
    };
    let Some(category) = catalog.find_category(category_id).await? else {
        return not_found_page(session, config, "This category does not exist.", &back_href, back_label).map(Err);
    };
    match catalog.find_flow(category_id).await? {
        Some(flow) if !flow.steps.is_empty() => Ok(Ok((category, flow))),
        _ => not_found_page(
            session,
            config,
            "This category has no request form yet.",
            &back_href,
            back_label,
        )
        .map(Err),
    }
}

fn load_walker(session: &Session, mode: Mode, flow: &Flow) -> Option<Walker> {
    session
        .get::<Walker>(mode.session_key())
        .unwrap_or(None)
        .filter(|w| w.category_id == flow.category_id && flow.contains(&w.current_step_id))
}

fn store_walker(session: &Session, mode: Mode, walker: &Walker) -> Result<(), AppError> {
    session
        .insert(mode.session_key(), walker)
        .map_err(|e| AppError::Session(e.to_string()))
}

fn render_step(
    session: &Session,
    config: &AppConfig,
    mode: Mode,
    category: &Category,
    flow: &Flow,
    walker: &Walker,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let step = walker.current(flow)?;
    let base_url = mode.base_url(category.id);
    let tmpl = WizardTemplate {
        ctx: PageContext::build(session, config, &base_url),
        category_name: category.name.clone(),
        base_url,
        preview: mode == Mode::Preview,
        step: StepView::new(step, &walker.answers),
        progress: walker.progress(flow),
        step_position: flow.position(&step.id).map(|i| i + 1).unwrap_or(0),
        step_count: flow.steps.len(),
        can_go_back: walker.can_go_back(flow),
        is_valid: walker.is_valid(flow),
        errors,
        contact: walker.contact.clone(),
        submitting: walker.submitting,
    };
    render(tmpl)
}

async fn show(
    mode: Mode,
    catalog: &dyn CatalogStore,
    config: &AppConfig,
    session: Session,
    category_id: i64,
) -> Result<HttpResponse, AppError> {
    let (category, flow) = match load(catalog, &session, config, mode, category_id).await? {
        Ok(loaded) => loaded,
        Err(panel) => return Ok(panel),
    };

    let walker = match load_walker(&session, mode, &flow) {
        Some(walker) => walker,
        None => match Walker::start(&flow) {
            Ok(walker) => walker,
            Err(e) => {
                log::error!("Flow of category {category_id} cannot start: {e}");
                return not_found_page(
                    &session,
                    config,
                    "The request form for this category is not available.",
                    &mode.exit_url(category_id),
                    "Back",
                );
            }
        },
    };
    store_walker(&session, mode, &walker)?;
    render_step(&session, config, mode, &category, &flow, &walker, vec![])
}

async fn answer(
    mode: Mode,
    catalog: &dyn CatalogStore,
    config: &AppConfig,
    session: Session,
    category_id: i64,
    form: AnswerForm,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category, flow) = match load(catalog, &session, config, mode, category_id).await? {
        Ok(loaded) => loaded,
        Err(panel) => return Ok(panel),
    };
    let base_url = mode.base_url(category_id);
    let Some(mut walker) = load_walker(&session, mode, &flow) else {
        return Ok(see_other(base_url));
    };
    if walker.submitting || walker.is_at_terminal(&flow) {
        return Ok(see_other(base_url));
    }

    let step = walker.current(&flow)?;
    match extract_answer(step, &form.answer) {
        Ok(answer) => walker.record_answer(answer),
        Err(e) => {
            return render_step(&session, config, mode, &category, &flow, &walker, vec![e.to_string()]);
        }
    }

    let result = walker.advance(&flow);
    store_walker(&session, mode, &walker)?;
    match result {
        Ok(Next::Step(_)) | Ok(Next::Submit) => Ok(see_other(base_url)),
        Err(FlowError::InvalidAnswer { .. }) => render_step(
            &session,
            config,
            mode,
            &category,
            &flow,
            &walker,
            vec!["Please answer this question to continue.".to_string()],
        ),
        Err(e) => {
            log::error!("Flow of category {category_id} cannot continue: {e}");
            render_step(
                &session,
                config,
                mode,
                &category,
                &flow,
                &walker,
                vec!["This form cannot continue from here. Please contact us directly.".to_string()],
            )
        }
    }
}

async fn back(
    mode: Mode,
    catalog: &dyn CatalogStore,
    config: &AppConfig,
    session: Session,
    category_id: i64,
    csrf_token: &str,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, csrf_token)?;
    let flow = match load(catalog, &session, config, mode, category_id).await? {
        Ok((_, flow)) => flow,
        Err(panel) => return Ok(panel),
    };
    if let Some(mut walker) = load_walker(&session, mode, &flow) {
        if walker.back(&flow) {
            store_walker(&session, mode, &walker)?;
        }
    }
    Ok(see_other(mode.base_url(category_id)))
}

async fn contact(
    mode: Mode,
    catalog: &dyn CatalogStore,
    config: &AppConfig,
    dispatcher: &Dispatcher,
    session: Session,
    category_id: i64,
    form: ContactForm,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category, flow) = match load(catalog, &session, config, mode, category_id).await? {
        Ok(loaded) => loaded,
        Err(panel) => return Ok(panel),
    };
    let base_url = mode.base_url(category_id);
    let Some(mut walker) = load_walker(&session, mode, &flow) else {
        return Ok(see_other(base_url));
    };
    if !walker.is_at_terminal(&flow) {
        return Ok(see_other(base_url));
    }

    walker.contact = ContactInfo::new(&form.full_name, &form.email, &form.phone);
    let errors = walker.contact.errors();
    if !errors.is_empty() {
        store_walker(&session, mode, &walker)?;
        return render_step(&session, config, mode, &category, &flow, &walker, errors);
    }

    let submission = match walker.begin_submit(&flow) {
        Ok(submission) => submission,
        Err(FlowError::AlreadySubmitting) => {
            set_flash(&session, "Your request is already being sent.");
            return Ok(see_other(base_url));
        }
        Err(e) => {
            return render_step(&session, config, mode, &category, &flow, &walker, vec![e.to_string()]);
        }
    };
    store_walker(&session, mode, &walker)?;

    match mode {
        Mode::Live => {
            let outcome = match dispatcher.dispatch(&submission, &flow, &category.name).await {
                Ok(outcome) => outcome,
                Err(FlowError::AlreadySubmitted) => {
                    log::warn!("Replayed submission for category {category_id} refused");
                    session.remove(mode.session_key());
                    set_flash(&session, "This request has already been sent.");
                    return Ok(see_other(mode.exit_url(category_id)));
                }
                Err(e) => {
                    walker.abort_submit();
                    store_walker(&session, mode, &walker)?;
                    set_flash(&session, e.to_string());
                    return Ok(see_other(base_url));
                }
            };
            walker.finish_submit();
            session.remove(mode.session_key());
            session
                .insert(OUTCOME_KEY, &outcome)
                .map_err(|e| AppError::Session(e.to_string()))?;
            Ok(see_other("/request/success"))
        }
        Mode::Preview => {
            walker.finish_submit();
            session.remove(mode.session_key());
            log::info!(
                "Preview of category {category_id} completed with {} answers",
                submission.answers().len()
            );
            set_flash(&session, "Preview complete. A live request would have been sent now.");
            Ok(see_other(mode.exit_url(category_id)))
        }
    }
}

async fn cancel(
    mode: Mode,
    catalog: &dyn CatalogStore,
    config: &AppConfig,
    dispatcher: &Dispatcher,
    session: Session,
    category_id: i64,
    csrf_token: &str,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, csrf_token)?;
    let flow = match load(catalog, &session, config, mode, category_id).await? {
        Ok((_, flow)) => flow,
        Err(panel) => return Ok(panel),
    };
    if let Some(walker) = load_walker(&session, mode, &flow) {
        if !walker.can_close() || dispatcher.is_in_flight(&walker.nonce) {
            set_flash(&session, "Please wait until your request has been sent.");
            return Ok(see_other(mode.base_url(category_id)));
        }
    }
    session.remove(mode.session_key());
    Ok(see_other(mode.exit_url(category_id)))
}

// Live wizard

pub async fn request_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    show(Mode::Live, catalog.get_ref(), &config, session, path.into_inner()).await
}

pub async fn request_answer(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<AnswerForm>,
) -> Result<HttpResponse, AppError> {
    answer(Mode::Live, catalog.get_ref(), &config, session, path.into_inner(), form.into_inner()).await
}

pub async fn request_back(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<super::CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    back(Mode::Live, catalog.get_ref(), &config, session, path.into_inner(), &form.csrf_token).await
}

pub async fn request_contact(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    dispatcher: web::Data<Dispatcher>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<ContactForm>,
) -> Result<HttpResponse, AppError> {
    contact(
        Mode::Live,
        catalog.get_ref(),
        &config,
        &dispatcher,
        session,
        path.into_inner(),
        form.into_inner(),
    )
    .await
}

pub async fn request_cancel(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    dispatcher: web::Data<Dispatcher>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<super::CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    cancel(Mode::Live, catalog.get_ref(), &config, &dispatcher, session, path.into_inner(), &form.csrf_token).await
}

pub async fn request_success(
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let Some(outcome) = session.get::<DispatchOutcome>(OUTCOME_KEY).unwrap_or(None) else {
        return Ok(see_other("/"));
    };
    session.remove(OUTCOME_KEY);
    let tmpl = SuccessTemplate {
        ctx: PageContext::build(&session, &config, "/request/success"),
        message: outcome.message,
        email_delivered: outcome.email_delivered,
        chat_link: outcome.chat_link,
        redirect_secs: config.success_redirect_secs,
    };
    render(tmpl)
}

// Admin preview

pub async fn preview_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    show(Mode::Preview, catalog.get_ref(), &config, session, path.into_inner()).await
}

pub async fn preview_answer(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<AnswerForm>,
) -> Result<HttpResponse, AppError> {
    answer(Mode::Preview, catalog.get_ref(), &config, session, path.into_inner(), form.into_inner()).await
}

pub async fn preview_back(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<super::CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    back(Mode::Preview, catalog.get_ref(), &config, session, path.into_inner(), &form.csrf_token).await
}

pub async fn preview_contact(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    dispatcher: web::Data<Dispatcher>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<ContactForm>,
) -> Result<HttpResponse, AppError> {
    contact(
        Mode::Preview,
        catalog.get_ref(),
        &config,
        &dispatcher,
        session,
        path.into_inner(),
        form.into_inner(),
    )
    .await
}

pub async fn preview_cancel(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    dispatcher: web::Data<Dispatcher>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<super::CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    cancel(Mode::Preview, catalog.get_ref(), &config, &dispatcher, session, path.into_inner(), &form.csrf_token).await
}
