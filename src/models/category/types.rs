use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_optional, validate_required};

/// A service category. `parent_id` allows one level of nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub is_popular: bool,
}

/// Category data for create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub is_popular: bool,
}

impl NewCategory {
    pub fn from_form(form: &CategoryForm) -> Self {
        let optional = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        NewCategory {
            name: form.name.trim().to_string(),
            description: optional(&form.description),
            icon: optional(&form.icon),
            parent_id: form.parent_id.trim().parse().ok().filter(|id: &i64| *id > 0),
            is_popular: form.is_popular.is_some(),
        }
    }
}

/// Form data from the create/edit category forms.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub parent_id: String,
    pub is_popular: Option<String>,
    pub csrf_token: String,
}

/// A top-level category with its subcategories.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<Category>,
}

/// Validate category data against the existing categories. `editing` is the id
/// of the category being updated, if any.
pub fn validate_category(new: &NewCategory, existing: &[Category], editing: Option<i64>) -> Vec<String> {
    let mut errors = vec![];
    errors.extend(validate_required(&new.name, "Name", 100));
    errors.extend(validate_optional(new.description.as_deref().unwrap_or(""), "Description", 500));
    errors.extend(validate_optional(new.icon.as_deref().unwrap_or(""), "Icon", 16));

    let duplicate = existing.iter().any(|c| {
        Some(c.id) != editing && c.name.eq_ignore_ascii_case(new.name.trim())
    });
    if duplicate {
        errors.push(format!("A category named '{}' already exists", new.name.trim()));
    }

    if let Some(parent_id) = new.parent_id {
        match existing.iter().find(|c| c.id == parent_id) {
            None => errors.push("Parent category does not exist".to_string()),
            Some(_) if Some(parent_id) == editing => {
                errors.push("A category cannot be its own parent".to_string())
            }
            Some(parent) if parent.parent_id.is_some() => {
                errors.push("Subcategories cannot have subcategories".to_string())
            }
            Some(_) => {
                let has_children = editing
                    .is_some_and(|id| existing.iter().any(|c| c.parent_id == Some(id)));
                if has_children {
                    errors.push("A category with subcategories cannot become a subcategory".to_string());
                }
            }
        }
    }
    errors
}

/// Group categories into top-level nodes, keeping input order.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    categories
        .iter()
        .filter(|c| c.parent_id.is_none())
        .map(|parent| CategoryNode {
            category: parent.clone(),
            children: categories
                .iter()
                .filter(|c| c.parent_id == Some(parent.id))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Up to `limit` popular categories for the home page.
pub fn popular(categories: &[Category], limit: usize) -> Vec<Category> {
    categories.iter().filter(|c| c.is_popular).take(limit).cloned().collect()
}
