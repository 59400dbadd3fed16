//! Role/feature admin state
//!
//! Owns the four entity catalogs and the grant tree, and translates the
//! surface's gestures (drops, toggles, CRUD) into mapping engine calls.
//! Every mutation replaces the tree through a pure engine operation, so a
//! reader holding [`RoleAdminState::snapshot`] output never observes a
//! half-applied change.

use permat_common::db::{load_state_blob, save_state_blob};
use permat_common::entities::{Feature, Menu, PermissionAction, Role};
use permat_common::grants::persist::{role_map_from_str, role_map_to_json};
use permat_common::grants::{RoleGrantMap, NO_MENU_KEY};
use permat_common::seed;
use permat_common::store::{Entity, EntityStore};
use permat_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Blob store key for the role/feature grant tree.
pub const STATE_BLOB_KEY: &str = "role-feature-permission-admin-v1";

pub struct RoleAdminState {
    pub roles: EntityStore<Role>,
    pub features: EntityStore<Feature>,
    pub menus: EntityStore<Menu>,
    pub actions: EntityStore<PermissionAction>,
    grants: RoleGrantMap,
}

impl RoleAdminState {
    /// Fresh state from the built-in catalogs with no grants.
    pub fn new_seeded() -> Self {
        Self {
            roles: EntityStore::from_items(seed::default_roles()),
            features: EntityStore::from_items(seed::default_features()),
            menus: EntityStore::from_items(seed::default_menus()),
            actions: EntityStore::from_items(seed::default_actions()),
            grants: RoleGrantMap::new(),
        }
    }

    /// Load from the blob store. The blob holds only the grant tree; the
    /// entity catalogs are seeded in code. A missing or unreadable blob
    /// starts the tree empty rather than failing.
    pub async fn load(db: &Pool<Sqlite>) -> Result<Self> {
        let mut state = Self::new_seeded();
        if let Some(text) = load_state_blob(db, STATE_BLOB_KEY).await? {
            state.grants = role_map_from_str(&text);
            info!("Loaded role grant state ({} role entries)", state.grants.len());
        } else {
            info!("No saved role grant state, starting empty");
        }
        Ok(state)
    }

    /// Persist the grant tree as one JSON blob.
    pub async fn save(&self, db: &Pool<Sqlite>) -> Result<()> {
        let text = role_map_to_json(&self.grants).to_string();
        save_state_blob(db, STATE_BLOB_KEY, &text).await
    }

    pub fn grants(&self) -> &RoleGrantMap {
        &self.grants
    }

    /// Deep copy of the tree for concurrent readers.
    pub fn snapshot(&self) -> RoleGrantMap {
        self.grants.clone()
    }

    /// Wholesale tree replacement (import path).
    pub fn replace_grants(&mut self, grants: RoleGrantMap) {
        self.grants = grants;
    }

    // ---- entity CRUD -------------------------------------------------

    pub fn create_role(&mut self, name: &str, description: Option<&str>) -> i64 {
        let id = self.roles.next_id();
        let mut role = Role::new(id, name);
        if let Some(desc) = description {
            role = role.with_description(desc);
        }
        self.roles.add(role);
        self.reconcile();
        id
    }

    /// Full-record replacement. The new record may carry a different id;
    /// grants follow the id through a rekey.
    pub fn update_role(&mut self, id: i64, mut role: Role) -> Result<()> {
        if !self.roles.contains(id) {
            return Err(Error::NotFound(format!("Role {} not found", id)));
        }
        role.touch();
        let new_id = role.id;
        self.roles.replace(id, role);
        if new_id != id {
            self.grants = self
                .grants
                .rekey_role(&id.to_string(), &new_id.to_string());
        }
        self.reconcile();
        Ok(())
    }

    pub fn delete_role(&mut self, id: i64) -> Result<()> {
        self.roles
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Role {} not found", id)))?;
        self.reconcile();
        Ok(())
    }

    pub fn create_feature(&mut self, name: &str, code: &str, description: Option<&str>) -> i64 {
        let id = self.features.next_id();
        let mut feature = Feature::new(id, name, code);
        if let Some(desc) = description {
            feature = feature.with_description(desc);
        }
        self.features.add(feature);
        id
    }

    pub fn update_feature(&mut self, id: i64, mut feature: Feature) -> Result<()> {
        if !self.features.contains(id) {
            return Err(Error::NotFound(format!("Feature {} not found", id)));
        }
        feature.touch();
        let new_id = feature.id;
        self.features.replace(id, feature);
        if new_id != id {
            self.grants = self
                .grants
                .rekey_feature(&id.to_string(), &new_id.to_string());
        }
        Ok(())
    }

    pub fn delete_feature(&mut self, id: i64) -> Result<()> {
        self.features
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Feature {} not found", id)))?;
        self.grants = self.grants.purge_feature(&id.to_string());
        Ok(())
    }

    pub fn create_menu(&mut self, name: &str, description: Option<&str>) -> i64 {
        let id = self.menus.next_id();
        let mut menu = Menu::new(id, name);
        if let Some(desc) = description {
            menu = menu.with_description(desc);
        }
        self.menus.add(menu);
        id
    }

    pub fn update_menu(&mut self, id: i64, mut menu: Menu) -> Result<()> {
        if !self.menus.contains(id) {
            return Err(Error::NotFound(format!("Menu {} not found", id)));
        }
        menu.touch();
        let new_id = menu.id;
        self.menus.replace(id, menu);
        if new_id != id {
            self.grants = self
                .grants
                .rekey_menu(&id.to_string(), &new_id.to_string());
        }
        Ok(())
    }

    pub fn delete_menu(&mut self, id: i64) -> Result<()> {
        self.menus
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Menu {} not found", id)))?;
        self.grants = self.grants.purge_menu(&id.to_string());
        Ok(())
    }

    pub fn create_action(&mut self, name: &str, code: &str) -> i64 {
        let id = self.actions.next_id();
        self.actions.add(PermissionAction::new(id, name, code));
        id
    }

    pub fn update_action(&mut self, id: i64, mut action: PermissionAction) -> Result<()> {
        if !self.actions.contains(id) {
            return Err(Error::NotFound(format!("Action {} not found", id)));
        }
        action.touch();
        let new_id = action.id;
        self.actions.replace(id, action);
        if new_id != id {
            self.grants = self
                .grants
                .rekey_action(&id.to_string(), &new_id.to_string());
        }
        Ok(())
    }

    pub fn delete_action(&mut self, id: i64) -> Result<()> {
        self.actions
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Action {} not found", id)))?;
        self.grants = self.grants.purge_action(&id.to_string());
        Ok(())
    }

    // ---- grant gestures ----------------------------------------------

    /// Drop gesture: attach a feature to a role (present-empty node).
    pub fn drop_feature_on_role(&mut self, feature_id: i64, role_id: i64) -> Result<()> {
        self.require_role(role_id)?;
        self.require_feature(feature_id)?;
        self.grants = self
            .grants
            .assign_feature(&role_id.to_string(), &feature_id.to_string());
        Ok(())
    }

    /// Drop gesture: attach a menu beneath a role's feature.
    pub fn drop_menu_on_feature(&mut self, menu_id: i64, feature_id: i64, role_id: i64) -> Result<()> {
        self.require_role(role_id)?;
        self.require_feature(feature_id)?;
        self.require_menu(menu_id)?;
        self.grants = self.grants.assign_menu(
            &role_id.to_string(),
            &feature_id.to_string(),
            &menu_id.to_string(),
        );
        Ok(())
    }

    /// Checkbox gesture: flip one action grant. The synthetic `-1` menu is
    /// accepted without a matching menu entity.
    pub fn toggle_action(
        &mut self,
        role_id: i64,
        feature_id: i64,
        menu_id: i64,
        action_id: i64,
    ) -> Result<()> {
        self.require_role(role_id)?;
        self.require_feature(feature_id)?;
        let menu_key = menu_id.to_string();
        if menu_key != NO_MENU_KEY {
            self.require_menu(menu_id)?;
        }
        if !self.actions.contains(action_id) {
            return Err(Error::NotFound(format!("Action {} not found", action_id)));
        }
        self.grants = self.grants.toggle_action(
            &role_id.to_string(),
            &feature_id.to_string(),
            &menu_key,
            &action_id.to_string(),
        );
        Ok(())
    }

    /// Detach a feature (and its subtree) from a role. No entity check:
    /// stale keys left behind by imports must stay removable.
    pub fn remove_feature_from_role(&mut self, role_id: i64, feature_id: i64) {
        self.grants = self
            .grants
            .remove_feature(&role_id.to_string(), &feature_id.to_string());
    }

    pub fn remove_menu_from_feature(&mut self, role_id: i64, feature_id: i64, menu_id: i64) {
        self.grants = self.grants.remove_menu(
            &role_id.to_string(),
            &feature_id.to_string(),
            &menu_id.to_string(),
        );
    }

    pub fn clear_role_grants(&mut self, role_id: i64) {
        self.grants = self.grants.clear_role(&role_id.to_string());
    }

    // ---- helpers -----------------------------------------------------

    fn reconcile(&mut self) {
        self.grants = self.grants.reconcile_roles(&self.roles.id_keys());
    }

    fn require_role(&self, id: i64) -> Result<()> {
        if self.roles.contains(id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Role {} not found", id)))
        }
    }

    fn require_feature(&self, id: i64) -> Result<()> {
        if self.features.contains(id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Feature {} not found", id)))
        }
    }

    fn require_menu(&self, id: i64) -> Result<()> {
        if self.menus.contains(id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Menu {} not found", id)))
        }
    }
}
