use askama::Template;

use super::{CategoryCard, PageContext, SelectOption};

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub category_count: usize,
    pub service_count: usize,
    pub user_count: usize,
    pub flow_count: usize,
    /// Categories whose request wizard cannot be started yet.
    pub without_flow: Vec<CategoryCard>,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub parent_name: String,
    pub is_child: bool,
    pub is_popular: bool,
    pub step_count: usize,
}

#[derive(Template)]
#[template(path = "admin/categories.html")]
pub struct CategoryListTemplate {
    pub ctx: PageContext,
    pub rows: Vec<CategoryRow>,
}

#[derive(Template)]
#[template(path = "admin/category_form.html")]
pub struct CategoryFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub is_popular: bool,
    pub parents: Vec<SelectOption>,
    pub errors: Vec<String>,
}

pub struct BranchView {
    pub option_label: String,
    pub target: String,
}

pub struct StepRow {
    pub id: String,
    pub order: i64,
    pub title: String,
    pub question: String,
    pub type_label: String,
    pub preview: String,
    pub next_step: String,
    pub branches: Vec<BranchView>,
    pub is_initial: bool,
    pub is_terminal: bool,
    pub is_first: bool,
    pub is_last: bool,
}

#[derive(Template)]
#[template(path = "admin/steps.html")]
pub struct StepListTemplate {
    pub ctx: PageContext,
    pub category: CategoryCard,
    pub steps: Vec<StepRow>,
    pub initial_choices: Vec<SelectOption>,
    pub notes: Vec<String>,
}

pub struct OptionRow {
    pub id: String,
    pub label: String,
    pub value: String,
    /// Branch target choices; the empty value means "use the default next step".
    pub targets: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "admin/step_form.html")]
pub struct StepFormTemplate {
    pub ctx: PageContext,
    pub category: CategoryCard,
    pub form_action: String,
    pub form_title: String,
    pub editing: bool,
    pub step_id: String,
    pub title: String,
    pub question: String,
    pub types: Vec<SelectOption>,
    pub is_choice: bool,
    pub required: bool,
    pub placeholder: String,
    pub next_choices: Vec<SelectOption>,
    pub options: Vec<OptionRow>,
    pub new_options: String,
    pub errors: Vec<String>,
}

pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub category_name: String,
    pub price: String,
    pub duration: String,
    pub provider_name: String,
}

#[derive(Template)]
#[template(path = "admin/services.html")]
pub struct ServiceListTemplate {
    pub ctx: PageContext,
    pub rows: Vec<ServiceRow>,
    pub category_filter: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "admin/service_form.html")]
pub struct ServiceFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration_minutes: String,
    pub provider_name: String,
    pub categories: Vec<SelectOption>,
    pub errors: Vec<String>,
}

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role_label: String,
    pub created_at: String,
    pub is_self: bool,
    pub roles: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct UserListTemplate {
    pub ctx: PageContext,
    pub rows: Vec<UserRow>,
    pub q: String,
}
