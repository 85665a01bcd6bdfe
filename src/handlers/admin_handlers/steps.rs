//! Step editor for a category's request flow. Every successful change saves the
//! whole flow back to the store.

use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{CurrentUser, require_admin, set_flash};
use crate::config::AppConfig;
use crate::errors::{AppError, render, see_other};
use crate::flow::render::preview;
use crate::flow::validate::lint;
use crate::flow::{Direction, Flow, FlowEditor, FlowError, Step, StepType, is_terminal};
use crate::handlers::{CsrfOnly, not_found_page};
use crate::models::category::Category;
use crate::store::CatalogStore;
use crate::templates_structs::{
    BranchView, CategoryCard, OptionRow, PageContext, SelectOption, StepFormTemplate, StepListTemplate,
    StepRow,
};

#[derive(Deserialize)]
pub struct StepForm {
    pub csrf_token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub step_type: String,
    pub required: Option<String>,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub next_step: String,
    /// Labels of options to add, one per line.
    #[serde(default)]
    pub new_options: String,
}

#[derive(Deserialize)]
pub struct MoveForm {
    pub csrf_token: String,
    pub direction: String,
}

#[derive(Deserialize)]
pub struct OptionForm {
    pub csrf_token: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Deserialize)]
pub struct BranchForm {
    pub csrf_token: String,
    pub option_id: String,
    /// Blank removes the rule for the option.
    #[serde(default)]
    pub next_step_id: String,
}

#[derive(Deserialize)]
pub struct InitialForm {
    pub csrf_token: String,
    pub step_id: String,
}

fn steps_url(category_id: i64) -> String {
    format!("/admin/categories/{category_id}/steps")
}

fn step_url(category_id: i64, step_id: &str) -> String {
    format!("/admin/categories/{category_id}/steps/{step_id}/edit")
}

fn flow_messages(e: FlowError) -> Vec<String> {
    match e {
        FlowError::Invalid(errors) => errors,
        other => vec![other.to_string()],
    }
}

/// Category and its flow; a category without a flow starts with an empty one.
async fn load(catalog: &dyn CatalogStore, category_id: i64) -> Result<Option<(Category, Flow)>, AppError> {
    let Some(category) = catalog.find_category(category_id).await? else {
        return Ok(None);
    };
    let flow = catalog
        .find_flow(category_id)
        .await?
        .unwrap_or_else(|| Flow::new(0, category_id));
    Ok(Some((category, flow)))
}

fn missing(session: &Session, config: &AppConfig, what: &str, back: &str) -> Result<HttpResponse, AppError> {
    not_found_page(session, config, &format!("{what} not found."), back, "Back")
}

async fn save(catalog: &dyn CatalogStore, admin: &CurrentUser, editor: FlowEditor, what: &str) -> Result<(), AppError> {
    let flow = editor.into_flow();
    catalog.save_flow(&flow).await?;
    log::info!("Admin {} {what} in flow of category {}", admin.id, flow.category_id);
    Ok(())
}

fn step_label(flow: &Flow, step_id: &str) -> String {
    match flow.step(step_id) {
        Some(step) => format!("{}. {}", step.order, step.title),
        None => step_id.to_string(),
    }
}

/// Every other step as a navigation target, plus a leading blank entry.
fn target_options(flow: &Flow, own_id: &str, selected: Option<&str>, blank_label: &str) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("", blank_label, selected.is_none())];
    options.extend(
        flow.authoring_order()
            .into_iter()
            .filter(|s| s.id != own_id)
            .map(|s| SelectOption::new(s.id.clone(), step_label(flow, &s.id), selected == Some(s.id.as_str()))),
    );
    options
}

fn step_form(
    ctx: PageContext,
    category: &Category,
    flow: &Flow,
    step: &Step,
    editing: bool,
    new_options: String,
    errors: Vec<String>,
) -> StepFormTemplate {
    let form_action = if editing {
        format!("/admin/categories/{}/steps/{}", category.id, step.id)
    } else {
        steps_url(category.id)
    };
    StepFormTemplate {
        ctx,
        category: CategoryCard::from(category),
        form_action,
        form_title: if editing { format!("Edit step: {}", step.title) } else { "New step".to_string() },
        editing,
        step_id: step.id.clone(),
        title: step.title.clone(),
        question: step.question.clone(),
        types: StepType::ALL
            .into_iter()
            .map(|t| SelectOption::new(t.as_str(), t.label(), t == step.step_type))
            .collect(),
        is_choice: step.step_type.is_choice(),
        required: step.required,
        placeholder: step.placeholder.clone().unwrap_or_default(),
        next_choices: target_options(flow, &step.id, step.next_step.as_deref(), "(none, ends the questions)"),
        options: step
            .options
            .iter()
            .map(|o| OptionRow {
                id: o.id.clone(),
                label: o.label.clone(),
                value: o.value.clone(),
                targets: target_options(flow, &step.id, step.conditional_target(&o.id), "(default next step)"),
            })
            .collect(),
        new_options,
        errors,
    }
}

/// Apply the submitted fields to `step`. New option labels are appended to choice steps.
fn apply_form(editor: &FlowEditor, mut step: Step, form: &StepForm) -> Step {
    step.title = form.title.clone();
    step.question = form.question.clone();
    step.step_type = StepType::parse(&form.step_type).unwrap_or(step.step_type);
    step.required = form.required.is_some();
    step.placeholder = Some(form.placeholder.clone());
    step.next_step = Some(form.next_step.trim().to_string()).filter(|n| !n.is_empty());
    if step.step_type.is_choice() {
        let added = editor.new_options(form.new_options.lines());
        step.options.extend(added);
    }
    step
}

pub async fn list(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let category_id = path.into_inner();
    let Some((category, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let ordered = flow.authoring_order();
    let last = ordered.len().saturating_sub(1);
    let steps = ordered
        .iter()
        .enumerate()
        .map(|(i, step)| StepRow {
            id: step.id.clone(),
            order: step.order,
            title: step.title.clone(),
            question: step.question.clone(),
            type_label: step.step_type.label().to_string(),
            preview: preview(step),
            next_step: step.next_step.as_deref().map(|n| step_label(&flow, n)).unwrap_or_default(),
            branches: step
                .conditional_next_step
                .iter()
                .map(|rule| BranchView {
                    option_label: step
                        .option(&rule.option_id)
                        .map(|o| o.label.clone())
                        .unwrap_or_else(|| rule.option_id.clone()),
                    target: step_label(&flow, &rule.next_step_id),
                })
                .collect(),
            is_initial: step.id == flow.initial_step_id,
            is_terminal: is_terminal(step),
            is_first: i == 0,
            is_last: i == last,
        })
        .collect();

    let initial_choices = ordered
        .iter()
        .map(|s| SelectOption::new(s.id.clone(), step_label(&flow, &s.id), s.id == flow.initial_step_id))
        .collect();

    let tmpl = StepListTemplate {
        ctx: PageContext::build(&session, &config, "/admin/categories"),
        category: CategoryCard::from(&category),
        steps,
        initial_choices,
        notes: lint(&flow),
    };
    render(tmpl)
}

pub async fn new_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let category_id = path.into_inner();
    let Some((category, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };
    let editor = FlowEditor::new(flow);
    let step = Step::blank(editor.next_step_id(), 0);
    let ctx = PageContext::build(&session, &config, "/admin/categories");
    render(step_form(ctx, &category, editor.flow(), &step, false, String::new(), vec![]))
}

pub async fn create(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<StepForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let category_id = path.into_inner();
    let Some((category, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    let step = apply_form(&editor, Step::blank(editor.next_step_id(), 0), &form);
    if let Err(e) = editor.add_step(step.clone()) {
        let ctx = PageContext::build(&session, &config, "/admin/categories");
        let tmpl = step_form(ctx, &category, editor.flow(), &step, false, String::new(), flow_messages(e));
        return render(tmpl);
    }

    save(catalog.get_ref(), &admin, editor, &format!("added step {}", step.id)).await?;
    set_flash(&session, format!("Step '{}' added", step.title.trim()));
    Ok(see_other(step_url(category_id, &step.id)))
}

pub async fn edit_form(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let (category_id, step_id) = path.into_inner();
    let Some((category, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };
    let Some(step) = flow.step(&step_id).cloned() else {
        return missing(&session, &config, "Step", &steps_url(category_id));
    };
    let ctx = PageContext::build(&session, &config, "/admin/categories");
    render(step_form(ctx, &category, &flow, &step, true, String::new(), vec![]))
}

pub async fn update(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<StepForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id) = path.into_inner();
    let Some((category, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };
    let Some(existing) = flow.step(&step_id).cloned() else {
        return missing(&session, &config, "Step", &steps_url(category_id));
    };

    let mut editor = FlowEditor::new(flow);
    let step = apply_form(&editor, existing, &form);
    if let Err(e) = editor.update_step(step.clone()) {
        let ctx = PageContext::build(&session, &config, "/admin/categories");
        let tmpl = step_form(ctx, &category, editor.flow(), &step, true, form.new_options.clone(), flow_messages(e));
        return render(tmpl);
    }

    save(catalog.get_ref(), &admin, editor, &format!("updated step {step_id}")).await?;
    set_flash(&session, "Step saved");
    Ok(see_other(step_url(category_id, &step_id)))
}

pub async fn delete(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id) = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    match editor.remove_step(&step_id) {
        Ok(removed) => {
            save(catalog.get_ref(), &admin, editor, &format!("removed step {step_id}")).await?;
            set_flash(&session, format!("Step '{}' deleted", removed.title));
        }
        Err(e) => set_flash(&session, e.to_string()),
    }
    Ok(see_other(steps_url(category_id)))
}

pub async fn move_step(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<MoveForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id) = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };
    let Some(direction) = Direction::parse(&form.direction) else {
        set_flash(&session, "Unknown direction");
        return Ok(see_other(steps_url(category_id)));
    };

    let mut editor = FlowEditor::new(flow);
    match editor.reorder(&step_id, direction) {
        Ok(true) => save(catalog.get_ref(), &admin, editor, &format!("moved step {step_id}")).await?,
        Ok(false) => {}
        Err(e) => set_flash(&session, e.to_string()),
    }
    Ok(see_other(steps_url(category_id)))
}

pub async fn add_option(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<OptionForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id) = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    match editor.add_option(&step_id, &form.label) {
        Ok(option_id) => {
            save(catalog.get_ref(), &admin, editor, &format!("added option {option_id} to {step_id}")).await?;
            set_flash(&session, "Option added");
        }
        Err(e) => set_flash(&session, flow_messages(e).join("; ")),
    }
    Ok(see_other(step_url(category_id, &step_id)))
}

pub async fn remove_option(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String, String)>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id, option_id) = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    match editor.remove_option(&step_id, &option_id) {
        Ok(()) => {
            save(catalog.get_ref(), &admin, editor, &format!("removed option {option_id} from {step_id}")).await?;
            set_flash(&session, "Option removed");
        }
        Err(e) => set_flash(&session, flow_messages(e).join("; ")),
    }
    Ok(see_other(step_url(category_id, &step_id)))
}

pub async fn set_branch(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<(i64, String)>,
    form: web::Form<BranchForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let (category_id, step_id) = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    let target = form.next_step_id.trim();
    let result = if target.is_empty() {
        editor.clear_conditional_next(&step_id, &form.option_id)
    } else {
        editor.set_conditional_next(&step_id, &form.option_id, target)
    };
    match result {
        Ok(()) => {
            save(catalog.get_ref(), &admin, editor, &format!("rerouted option {} of {step_id}", form.option_id)).await?;
            set_flash(&session, "Branch saved");
        }
        Err(e) => set_flash(&session, flow_messages(e).join("; ")),
    }
    Ok(see_other(step_url(category_id, &step_id)))
}

pub async fn set_initial(
    catalog: web::Data<dyn CatalogStore>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<InitialForm>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let category_id = path.into_inner();
    let Some((_, flow)) = load(catalog.get_ref(), category_id).await? else {
        return missing(&session, &config, "Category", "/admin/categories");
    };

    let mut editor = FlowEditor::new(flow);
    match editor.set_initial_step(&form.step_id) {
        Ok(()) => {
            save(catalog.get_ref(), &admin, editor, &format!("set first step to {}", form.step_id)).await?;
            set_flash(&session, "First step updated");
        }
        Err(e) => set_flash(&session, e.to_string()),
    }
    Ok(see_other(steps_url(category_id)))
}
