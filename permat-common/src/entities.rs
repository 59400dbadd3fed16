//! Entity model for the permission admin surfaces
//!
//! Five CRUD-managed collections: Roles, Features, Menus, Permission Actions
//! and Packages. All carry an integer id unique within their collection,
//! a display name and audit fields (epoch-millisecond timestamps plus
//! created/updated user tags). Field names serialize in camelCase to stay
//! compatible with previously persisted state blobs.

use serde::{Deserialize, Serialize};

use crate::search::Searchable;
use crate::store::Entity;
use crate::time;

/// User tag recorded in audit fields written by the tool itself.
pub const SYSTEM_USER: &str = "system";

fn default_active() -> bool {
    true
}

fn system_user() -> String {
    SYSTEM_USER.to_string()
}

/// Role: top-level subject of the role/feature/menu/action hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "system_user")]
    pub created_by: String,
    #[serde(default = "system_user")]
    pub updated_by: String,
}

impl Role {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let now = time::now_millis();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
            created_by: system_user(),
            updated_by: system_user(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Feature: assignable capability; leaf of the package scenario, second
/// level of the role scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "system_user")]
    pub created_by: String,
    #[serde(default = "system_user")]
    pub updated_by: String,
}

impl Feature {
    pub fn new(id: i64, name: impl Into<String>, code: impl Into<String>) -> Self {
        let now = time::now_millis();
        Self {
            id,
            name: name.into(),
            code: code.into(),
            description: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
            created_by: system_user(),
            updated_by: system_user(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Menu: third level of the role scenario hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "system_user")]
    pub created_by: String,
    #[serde(default = "system_user")]
    pub updated_by: String,
}

impl Menu {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let now = time::now_millis();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
            created_by: system_user(),
            updated_by: system_user(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Permission action: leaf of the role scenario hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionAction {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "system_user")]
    pub created_by: String,
    #[serde(default = "system_user")]
    pub updated_by: String,
}

impl PermissionAction {
    pub fn new(id: i64, name: impl Into<String>, code: impl Into<String>) -> Self {
        let now = time::now_millis();
        Self {
            id,
            name: name.into(),
            code: code.into(),
            active: true,
            created_at: now,
            updated_at: now,
            created_by: system_user(),
            updated_by: system_user(),
        }
    }
}

/// Package: top-level subject of the package/feature scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub duration_days: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "system_user")]
    pub created_by: String,
    #[serde(default = "system_user")]
    pub updated_by: String,
}

impl Package {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let now = time::now_millis();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            price: 0.0,
            duration_days: 0,
            active: true,
            created_at: now,
            updated_at: now,
            created_by: system_user(),
            updated_by: system_user(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_duration_days(mut self, days: i64) -> Self {
        self.duration_days = days;
        self
    }
}

macro_rules! impl_entity {
    ($ty:ty) => {
        impl Entity for $ty {
            fn id(&self) -> i64 {
                self.id
            }

            fn touch(&mut self) {
                self.updated_at = time::now_millis();
                self.updated_by = system_user();
            }
        }
    };
}

impl_entity!(Role);
impl_entity!(Feature);
impl_entity!(Menu);
impl_entity!(PermissionAction);
impl_entity!(Package);

impl Searchable for Role {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.description]
    }
}

impl Searchable for Feature {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.code, &self.description]
    }
}

impl Searchable for Menu {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.description]
    }
}

impl Searchable for PermissionAction {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.code]
    }
}

impl Searchable for Package {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.description]
    }
}
