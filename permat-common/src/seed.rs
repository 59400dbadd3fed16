//! Built-in seed catalogs
//!
//! First run of either admin surface starts from these fixtures; imports
//! and edits then evolve the stored state away from them.

use crate::entities::{Feature, Menu, Package, PermissionAction, Role};

pub fn default_roles() -> Vec<Role> {
    vec![
        Role::new(1, "Administrator").with_description("Full access to every feature"),
        Role::new(2, "Manager").with_description("Operational oversight"),
        Role::new(3, "Operator").with_description("Day to day data entry"),
        Role::new(4, "Viewer").with_description("Read only access"),
    ]
}

pub fn default_features() -> Vec<Feature> {
    vec![
        Feature::new(1, "Dashboard", "DASH"),
        Feature::new(2, "Reports", "RPT").with_description("Standard and scheduled reports"),
        Feature::new(3, "Billing", "BIL"),
        Feature::new(4, "User Management", "USR"),
        Feature::new(5, "Settings", "SET"),
    ]
}

pub fn default_menus() -> Vec<Menu> {
    vec![
        Menu::new(1, "Overview"),
        Menu::new(2, "Detail"),
        Menu::new(3, "Archive"),
        Menu::new(4, "Audit"),
    ]
}

pub fn default_actions() -> Vec<PermissionAction> {
    vec![
        PermissionAction::new(1, "View", "VIEW"),
        PermissionAction::new(2, "Create", "CREATE"),
        PermissionAction::new(3, "Edit", "EDIT"),
        PermissionAction::new(4, "Delete", "DELETE"),
        PermissionAction::new(5, "Export", "EXPORT"),
    ]
}

pub fn default_packages() -> Vec<Package> {
    vec![
        Package::new(1, "Starter")
            .with_description("Entry tier")
            .with_price(9.0)
            .with_duration_days(30),
        Package::new(2, "Professional")
            .with_description("Most popular tier")
            .with_price(29.0)
            .with_duration_days(30),
        Package::new(3, "Enterprise")
            .with_description("All features, annual term")
            .with_price(290.0)
            .with_duration_days(365),
    ]
}
