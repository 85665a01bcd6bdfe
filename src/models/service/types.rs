use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_optional, validate_required};

/// A bookable service offered within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category_id: i64,
    pub provider_name: String,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn price_display(&self) -> String {
        format_price(self.price_cents)
    }

    pub fn duration_display(&self) -> String {
        match (self.duration_minutes / 60, self.duration_minutes % 60) {
            (0, m) => format!("{m} min"),
            (h, 0) => format!("{h} h"),
            (h, m) => format!("{h} h {m} min"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category_id: i64,
    pub provider_name: String,
}

/// Form data from the create/edit service forms.
#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub duration_minutes: String,
    pub category_id: String,
    #[serde(default)]
    pub provider_name: String,
    pub csrf_token: String,
}

impl ServiceForm {
    /// Parse and validate; `category_exists` checks the selected category.
    pub fn parse(&self, category_exists: impl Fn(i64) -> bool) -> Result<NewService, Vec<String>> {
        let mut errors = vec![];
        errors.extend(validate_required(&self.name, "Name", 150));
        errors.extend(validate_optional(&self.description, "Description", 2000));
        errors.extend(validate_optional(&self.provider_name, "Provider", 150));

        let price_cents = parse_price_cents(&self.price);
        if price_cents.is_none() {
            errors.push("Price must be a non-negative amount like 150 or 149.90".to_string());
        }
        let duration_minutes = self.duration_minutes.trim().parse::<i32>().ok().filter(|m| *m > 0);
        if duration_minutes.is_none() {
            errors.push("Duration must be a positive number of minutes".to_string());
        }
        let category_id = self.category_id.trim().parse::<i64>().ok().filter(|id| category_exists(*id));
        if category_id.is_none() {
            errors.push("Select a category".to_string());
        }

        match (price_cents, duration_minutes, category_id) {
            (Some(price_cents), Some(duration_minutes), Some(category_id)) if errors.is_empty() => {
                Ok(NewService {
                    name: self.name.trim().to_string(),
                    description: self.description.trim().to_string(),
                    price_cents,
                    duration_minutes,
                    category_id,
                    provider_name: self.provider_name.trim().to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parse "150", "149.9", "149,90" into cents. More than two decimals is rejected.
pub fn parse_price_cents(input: &str) -> Option<i64> {
    let normalized = input.trim().replace(',', ".");
    let (whole, frac) = match normalized.split_once('.') {
        Some((w, f)) => (w, f),
        None => (normalized.as_str(), ""),
    };
    if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok().filter(|w| *w >= 0)?;
    let frac: i64 = if frac.is_empty() { 0 } else { format!("{frac:0<2}").parse().ok()? };
    whole.checked_mul(100)?.checked_add(frac)
}

pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Ordering offered on the public category page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSort {
    Name,
    PriceLow,
    PriceHigh,
    Duration,
}

impl ServiceSort {
    pub const ALL: [ServiceSort; 4] =
        [ServiceSort::Name, ServiceSort::PriceLow, ServiceSort::PriceHigh, ServiceSort::Duration];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceSort::Name => "name",
            ServiceSort::PriceLow => "price-low",
            ServiceSort::PriceHigh => "price-high",
            ServiceSort::Duration => "duration",
        }
    }

    /// Unknown values fall back to sorting by name.
    pub fn parse(s: &str) -> Self {
        ServiceSort::ALL.into_iter().find(|o| o.as_str() == s).unwrap_or(ServiceSort::Name)
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceSort::Name => "Name",
            ServiceSort::PriceLow => "Price: low to high",
            ServiceSort::PriceHigh => "Price: high to low",
            ServiceSort::Duration => "Shortest first",
        }
    }
}

/// Keep services within the optional price bounds (in cents) and order them.
pub fn filter_and_sort(
    mut services: Vec<Service>,
    sort: ServiceSort,
    min_cents: Option<i64>,
    max_cents: Option<i64>,
) -> Vec<Service> {
    services.retain(|s| {
        min_cents.is_none_or(|min| s.price_cents >= min) && max_cents.is_none_or(|max| s.price_cents <= max)
    });
    match sort {
        ServiceSort::Name => services.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        ServiceSort::PriceLow => services.sort_by_key(|s| s.price_cents),
        ServiceSort::PriceHigh => services.sort_by_key(|s| std::cmp::Reverse(s.price_cents)),
        ServiceSort::Duration => services.sort_by_key(|s| s.duration_minutes),
    }
    services
}
