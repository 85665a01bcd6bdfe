//! Admin dashboard. Every route here sits behind `auth::middleware::require_admin`;
//! handlers re-check with `require_admin` to get the acting user.

pub mod categories;
pub mod dashboard;
pub mod services;
pub mod steps;
pub mod users;

use crate::models::category::Category;
use crate::templates_structs::SelectOption;

/// Options for a category `<select>`; subcategories are indented under their parent.
fn category_options(categories: &[Category], selected: Option<i64>) -> Vec<SelectOption> {
    crate::models::category::build_tree(categories)
        .into_iter()
        .flat_map(|node| {
            let parent = SelectOption::new(
                node.category.id.to_string(),
                node.category.name.clone(),
                selected == Some(node.category.id),
            );
            let children = node.children.into_iter().map(move |c| {
                SelectOption::new(c.id.to_string(), format!("  {}", c.name), selected == Some(c.id))
            });
            std::iter::once(parent).chain(children)
        })
        .collect()
}
