use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::AppError;
use crate::flow::Flow;
use crate::models::category::{Category, NewCategory};
use crate::models::service::{NewService, Service};
use crate::models::user::{NewUser, Role, User, normalize_email};
use super::{CatalogStore, UserStore};

#[derive(Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    flows: BTreeMap<i64, Flow>,
    services: BTreeMap<i64, Service>,
    users: BTreeMap<i64, User>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with the same semantics as the PostgreSQL one:
/// lowercase emails are unique, and a category with services cannot be
/// deleted. Deleting a category drops its flow and detaches its subcategories.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| {
            (a.parent_id.is_some(), &a.name, a.id).cmp(&(b.parent_id.is_some(), &b.name, b.id))
        });
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<i64, AppError> {
        let mut tables = self.write();
        let taken = tables.categories.values().any(|c| c.name.eq_ignore_ascii_case(&new.name));
        if taken {
            return Err(AppError::Conflict(format!("A category named '{}' already exists", new.name)));
        }
        let id = tables.allocate_id();
        tables.categories.insert(id, category_from(id, new));
        Ok(id)
    }

    async fn update_category(&self, id: i64, new: &NewCategory) -> Result<(), AppError> {
        let mut tables = self.write();
        let taken = tables
            .categories
            .values()
            .any(|c| c.id != id && c.name.eq_ignore_ascii_case(&new.name));
        if taken {
            return Err(AppError::Conflict(format!("A category named '{}' already exists", new.name)));
        }
        match tables.categories.get_mut(&id) {
            Some(existing) => {
                *existing = category_from(id, new);
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.services.values().any(|s| s.category_id == id) {
            return Err(AppError::Conflict("Category still has services".to_string()));
        }
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        tables.flows.remove(&id);
        for child in tables.categories.values_mut().filter(|c| c.parent_id == Some(id)) {
            child.parent_id = None;
        }
        Ok(true)
    }

    async fn find_flow(&self, category_id: i64) -> Result<Option<Flow>, AppError> {
        Ok(self.read().flows.get(&category_id).cloned())
    }

    async fn save_flow(&self, flow: &Flow) -> Result<Flow, AppError> {
        let mut tables = self.write();
        if !tables.categories.contains_key(&flow.category_id) {
            return Err(AppError::NotFound);
        }
        let id = match tables.flows.get(&flow.category_id) {
            Some(existing) => existing.id,
            None => tables.allocate_id(),
        };
        let stored = Flow { id, ..flow.clone() };
        tables.flows.insert(flow.category_id, stored.clone());
        Ok(stored)
    }

    async fn list_services(&self, category_id: Option<i64>) -> Result<Vec<Service>, AppError> {
        let mut services: Vec<Service> = self
            .read()
            .services
            .values()
            .filter(|s| category_id.is_none_or(|id| s.category_id == id))
            .cloned()
            .collect();
        services.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(services)
    }

    async fn find_service(&self, id: i64) -> Result<Option<Service>, AppError> {
        Ok(self.read().services.get(&id).cloned())
    }

    async fn create_service(&self, new: &NewService) -> Result<i64, AppError> {
        let mut tables = self.write();
        if !tables.categories.contains_key(&new.category_id) {
            return Err(AppError::NotFound);
        }
        let id = tables.allocate_id();
        let service = Service {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            price_cents: new.price_cents,
            duration_minutes: new.duration_minutes,
            category_id: new.category_id,
            provider_name: new.provider_name.clone(),
            created_at: Utc::now(),
        };
        tables.services.insert(id, service);
        Ok(id)
    }

    async fn update_service(&self, id: i64, new: &NewService) -> Result<(), AppError> {
        let mut tables = self.write();
        if !tables.categories.contains_key(&new.category_id) {
            return Err(AppError::NotFound);
        }
        let service = tables.services.get_mut(&id).ok_or(AppError::NotFound)?;
        service.name = new.name.clone();
        service.description = new.description.clone();
        service.price_cents = new.price_cents;
        service.duration_minutes = new.duration_minutes;
        service.category_id = new.category_id;
        service.provider_name = new.provider_name.clone();
        Ok(())
    }

    async fn delete_service(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().services.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    async fn create_user(&self, new: &NewUser) -> Result<i64, AppError> {
        let email = normalize_email(&new.email);
        let mut tables = self.write();
        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict(format!("Email '{email}' is already registered")));
        }
        let id = tables.allocate_id();
        let user = User {
            id,
            name: new.name.clone(),
            email,
            password_hash: new.password_hash.clone(),
            role: new.role,
            phone: new.phone.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, user);
        Ok(id)
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<bool, AppError> {
        match self.write().users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().users.remove(&id).is_some())
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        let count = self.read().users.values().filter(|u| u.role == Role::Admin).count();
        Ok(count as i64)
    }

    async fn upsert_admin(&self, name: &str, email: &str, password_hash: &str) -> Result<i64, AppError> {
        let email = normalize_email(email);
        let mut tables = self.write();
        if let Some(user) = tables.users.values_mut().find(|u| u.email == email) {
            user.role = Role::Admin;
            user.password_hash = password_hash.to_string();
            return Ok(user.id);
        }
        let id = tables.allocate_id();
        let user = User {
            id,
            name: name.to_string(),
            email,
            password_hash: password_hash.to_string(),
            role: Role::Admin,
            phone: None,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user);
        Ok(id)
    }
}

fn category_from(id: i64, new: &NewCategory) -> Category {
    Category {
        id,
        name: new.name.clone(),
        description: new.description.clone(),
        icon: new.icon.clone(),
        parent_id: new.parent_id,
        is_popular: new.is_popular,
    }
}
