//! Role grant tree operations

use super::{ActionSet, FeatureGrants, MenuGrants};
use std::collections::BTreeMap;
use tracing::info;

/// Role id -> feature -> menu -> action set.
///
/// The admin surface owns one of these per loaded state; every mutation
/// goes through an operation below and replaces the whole map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrantMap {
    pub(crate) entries: BTreeMap<String, FeatureGrants>,
}

/// One exportable grant: a full role/feature/menu/action path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRow<'a> {
    pub role_id: &'a str,
    pub feature_id: &'a str,
    pub menu_id: &'a str,
    pub action_id: &'a str,
}

impl RoleGrantMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_role(&self, role_id: &str) -> bool {
        self.entries.contains_key(role_id)
    }

    pub fn get(&self, role_id: &str) -> Option<&FeatureGrants> {
        self.entries.get(role_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureGrants)> {
        self.entries.iter()
    }

    /// Align the map's key set with the current role list: missing roles get
    /// empty subtrees, keys for roles no longer in the list are dropped
    /// (their grant data is lost with them).
    pub fn reconcile_roles(&self, role_ids: &[String]) -> Self {
        let mut next = self.clone();
        let dropped: Vec<String> = next
            .entries
            .keys()
            .filter(|key| !role_ids.contains(key))
            .cloned()
            .collect();
        for key in &dropped {
            next.entries.remove(key);
        }
        if !dropped.is_empty() {
            info!(
                "Dropped {} role grant entr{} with no matching role",
                dropped.len(),
                if dropped.len() == 1 { "y" } else { "ies" }
            );
        }
        for id in role_ids {
            next.entries.entry(id.clone()).or_default();
        }
        next
    }

    /// Rename a role key. When the new key already exists the old subtree is
    /// deep-merged into it instead of overwriting.
    pub fn rekey_role(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        if let Some(moved) = next.entries.remove(old_id) {
            match next.entries.get_mut(new_id) {
                Some(existing) => merge_feature_grants(existing, moved),
                None => {
                    next.entries.insert(new_id.to_string(), moved);
                }
            }
        }
        next
    }

    /// Rename a feature key under every role, merging on collision.
    pub fn rekey_feature(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        for features in next.entries.values_mut() {
            if let Some(moved) = features.remove(old_id) {
                match features.get_mut(new_id) {
                    Some(existing) => merge_menu_grants(existing, moved),
                    None => {
                        features.insert(new_id.to_string(), moved);
                    }
                }
            }
        }
        next
    }

    /// Rename a menu key under every role/feature branch, merging action
    /// sets on collision.
    pub fn rekey_menu(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        for features in next.entries.values_mut() {
            for menus in features.values_mut() {
                if let Some(moved) = menus.remove(old_id) {
                    menus.entry(new_id.to_string()).or_default().extend(moved);
                }
            }
        }
        next
    }

    /// Replace an action id in every set it occurs in. Set semantics dedupe
    /// when the new id is already granted.
    pub fn rekey_action(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        for features in next.entries.values_mut() {
            for menus in features.values_mut() {
                for actions in menus.values_mut() {
                    if actions.remove(old_id) {
                        actions.insert(new_id.to_string());
                    }
                }
            }
        }
        next
    }

    /// Flip one action's membership, creating the intermediate nodes on the
    /// way down when absent.
    pub fn toggle_action(&self, role_id: &str, feature_id: &str, menu_id: &str, action_id: &str) -> Self {
        let mut next = self.clone();
        let actions = next
            .entries
            .entry(role_id.to_string())
            .or_default()
            .entry(feature_id.to_string())
            .or_default()
            .entry(menu_id.to_string())
            .or_default();
        if !actions.remove(action_id) {
            actions.insert(action_id.to_string());
        }
        next
    }

    /// Grant one action unconditionally. Import rows accumulate through
    /// here so a duplicated row cannot un-grant what an earlier row added.
    pub fn add_action(&self, role_id: &str, feature_id: &str, menu_id: &str, action_id: &str) -> Self {
        let mut next = self.clone();
        next.entries
            .entry(role_id.to_string())
            .or_default()
            .entry(feature_id.to_string())
            .or_default()
            .entry(menu_id.to_string())
            .or_default()
            .insert(action_id.to_string());
        next
    }

    /// Attach a feature to a role as a present-empty node. No-op when the
    /// feature is already attached.
    pub fn assign_feature(&self, role_id: &str, feature_id: &str) -> Self {
        let mut next = self.clone();
        next.entries
            .entry(role_id.to_string())
            .or_default()
            .entry(feature_id.to_string())
            .or_default();
        next
    }

    /// Attach a menu beneath a role's feature, creating the feature node if
    /// needed.
    pub fn assign_menu(&self, role_id: &str, feature_id: &str, menu_id: &str) -> Self {
        let mut next = self.clone();
        next.entries
            .entry(role_id.to_string())
            .or_default()
            .entry(feature_id.to_string())
            .or_default()
            .entry(menu_id.to_string())
            .or_default();
        next
    }

    /// Detach a feature from a role, discarding the whole subtree under it.
    pub fn remove_feature(&self, role_id: &str, feature_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(features) = next.entries.get_mut(role_id) {
            features.remove(feature_id);
        }
        next
    }

    /// Detach one menu beneath a role's feature, discarding its action set.
    /// The feature stays attached even when its last menu goes.
    pub fn remove_menu(&self, role_id: &str, feature_id: &str, menu_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(menus) = next
            .entries
            .get_mut(role_id)
            .and_then(|features| features.get_mut(feature_id))
        {
            menus.remove(menu_id);
        }
        next
    }

    /// Empty a role's subtree while keeping the role key present. Unknown
    /// roles are left untouched.
    pub fn clear_role(&self, role_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(features) = next.entries.get_mut(role_id) {
            features.clear();
        }
        next
    }

    /// Remove a feature key from every role. Applied when the feature
    /// entity itself is deleted.
    pub fn purge_feature(&self, feature_id: &str) -> Self {
        let mut next = self.clone();
        for features in next.entries.values_mut() {
            features.remove(feature_id);
        }
        next
    }

    /// Remove a menu key from every branch.
    pub fn purge_menu(&self, menu_id: &str) -> Self {
        let mut next = self.clone();
        for features in next.entries.values_mut() {
            for menus in features.values_mut() {
                menus.remove(menu_id);
            }
        }
        next
    }

    /// Remove an action id from every set.
    pub fn purge_action(&self, action_id: &str) -> Self {
        let mut next = self.clone();
        for features in next.entries.values_mut() {
            for menus in features.values_mut() {
                for actions in menus.values_mut() {
                    actions.remove(action_id);
                }
            }
        }
        next
    }

    /// Flatten to exportable quadruples. Present-empty nodes (features with
    /// no menus, menus with no actions) yield nothing.
    pub fn rows(&self) -> Vec<GrantRow<'_>> {
        let mut rows = Vec::new();
        for (role_id, features) in &self.entries {
            for (feature_id, menus) in features {
                for (menu_id, actions) in menus {
                    for action_id in actions {
                        rows.push(GrantRow {
                            role_id,
                            feature_id,
                            menu_id,
                            action_id,
                        });
                    }
                }
            }
        }
        rows
    }
}

fn merge_feature_grants(into: &mut FeatureGrants, from: FeatureGrants) {
    for (feature_id, menus) in from {
        match into.get_mut(&feature_id) {
            Some(existing) => merge_menu_grants(existing, menus),
            None => {
                into.insert(feature_id, menus);
            }
        }
    }
}

fn merge_menu_grants(into: &mut MenuGrants, from: MenuGrants) {
    for (menu_id, actions) in from {
        into.entry(menu_id).or_insert_with(ActionSet::new).extend(actions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> RoleGrantMap {
        RoleGrantMap::new()
            .add_action("1", "10", "100", "5")
            .add_action("1", "10", "100", "6")
            .add_action("1", "11", "101", "5")
            .add_action("2", "10", "100", "5")
    }

    #[test]
    fn test_operations_leave_input_untouched() {
        let map = populated();
        let before = map.clone();
        let _ = map.toggle_action("1", "10", "100", "5");
        let _ = map.remove_feature("1", "10");
        let _ = map.clear_role("1");
        let _ = map.rekey_role("1", "2");
        assert_eq!(map, before);
    }

    #[test]
    fn test_toggle_is_self_inverse() {
        let map = populated();
        let toggled = map.toggle_action("2", "11", "102", "7");
        assert_ne!(map, toggled);
        let back = toggled.toggle_action("2", "11", "102", "7");
        // The round trip leaves behind the intermediate nodes it created
        let expected = map.assign_menu("2", "11", "102");
        assert_eq!(back, expected);
    }

    #[test]
    fn test_toggle_creates_path() {
        let map = RoleGrantMap::new().toggle_action("3", "20", "200", "9");
        assert_eq!(
            map.get("3").unwrap()["20"]["200"],
            ActionSet::from(["9".to_string()])
        );
    }

    #[test]
    fn test_reconcile_adds_missing_and_drops_unknown() {
        let map = populated();
        let ids = vec!["1".to_string(), "3".to_string()];
        let next = map.reconcile_roles(&ids);
        assert!(next.contains_role("1"));
        assert!(next.contains_role("3"));
        assert!(!next.contains_role("2"));
        assert!(next.get("3").unwrap().is_empty());
        // Surviving role keeps its grants
        assert_eq!(next.get("1"), map.get("1"));
    }

    #[test]
    fn test_rekey_role_renames_when_target_absent() {
        let map = populated();
        let next = map.rekey_role("2", "7");
        assert!(!next.contains_role("2"));
        assert_eq!(next.get("7"), map.get("2"));
    }

    #[test]
    fn test_rekey_role_merges_on_collision() {
        let map = populated();
        let next = map.rekey_role("2", "1");
        assert!(!next.contains_role("2"));
        let merged = next.get("1").unwrap();
        // Role 1's own grants survive and role 2's are folded in
        assert_eq!(
            merged["10"]["100"],
            ActionSet::from(["5".to_string(), "6".to_string()])
        );
        assert!(merged.contains_key("11"));
    }

    #[test]
    fn test_rekey_feature_applies_across_roles() {
        let map = populated();
        let next = map.rekey_feature("10", "12");
        assert!(!next.get("1").unwrap().contains_key("10"));
        assert!(next.get("1").unwrap().contains_key("12"));
        assert!(next.get("2").unwrap().contains_key("12"));
    }

    #[test]
    fn test_rekey_feature_merges_menu_trees() {
        let map = RoleGrantMap::new()
            .add_action("1", "10", "100", "5")
            .add_action("1", "11", "100", "6")
            .add_action("1", "11", "101", "7");
        let next = map.rekey_feature("10", "11");
        let menus = &next.get("1").unwrap()["11"];
        assert_eq!(
            menus["100"],
            ActionSet::from(["5".to_string(), "6".to_string()])
        );
        assert_eq!(menus["101"], ActionSet::from(["7".to_string()]));
    }

    #[test]
    fn test_rekey_menu_merges_action_sets() {
        let map = RoleGrantMap::new()
            .add_action("1", "10", "100", "5")
            .add_action("1", "10", "101", "6");
        let next = map.rekey_menu("100", "101");
        assert_eq!(
            next.get("1").unwrap()["10"]["101"],
            ActionSet::from(["5".to_string(), "6".to_string()])
        );
    }

    #[test]
    fn test_rekey_action_replaces_member_everywhere() {
        let map = populated();
        let next = map.rekey_action("5", "8");
        assert!(next.get("1").unwrap()["10"]["100"].contains("8"));
        assert!(!next.get("1").unwrap()["10"]["100"].contains("5"));
        assert!(next.get("2").unwrap()["10"]["100"].contains("8"));
        // Untouched action stays put
        assert!(next.get("1").unwrap()["10"]["100"].contains("6"));
    }

    #[test]
    fn test_rekey_action_dedupes_into_existing() {
        let map = RoleGrantMap::new()
            .add_action("1", "10", "100", "5")
            .add_action("1", "10", "100", "6");
        let next = map.rekey_action("5", "6");
        assert_eq!(
            next.get("1").unwrap()["10"]["100"],
            ActionSet::from(["6".to_string()])
        );
    }

    #[test]
    fn test_assign_feature_is_idempotent_and_preserving() {
        let map = populated();
        let next = map.assign_feature("1", "10");
        assert_eq!(next, map);
        let added = map.assign_feature("1", "15");
        assert!(added.get("1").unwrap()["15"].is_empty());
    }

    #[test]
    fn test_remove_menu_keeps_feature_attached() {
        let map = RoleGrantMap::new().add_action("1", "10", "100", "5");
        let next = map.remove_menu("1", "10", "100");
        assert!(next.get("1").unwrap().contains_key("10"));
        assert!(next.get("1").unwrap()["10"].is_empty());
    }

    #[test]
    fn test_remove_feature_discards_subtree() {
        let map = populated();
        let next = map.remove_feature("1", "10");
        assert!(!next.get("1").unwrap().contains_key("10"));
        // Other role unaffected
        assert!(next.get("2").unwrap().contains_key("10"));
    }

    #[test]
    fn test_clear_role_keeps_key() {
        let map = populated();
        let next = map.clear_role("1");
        assert!(next.contains_role("1"));
        assert!(next.get("1").unwrap().is_empty());
    }

    #[test]
    fn test_clear_role_ignores_unknown_key() {
        let map = populated();
        let next = map.clear_role("99");
        assert_eq!(next, map);
    }

    #[test]
    fn test_purges_cut_across_all_branches() {
        let map = populated();
        let no_feature = map.purge_feature("10");
        assert!(!no_feature.get("1").unwrap().contains_key("10"));
        assert!(!no_feature.get("2").unwrap().contains_key("10"));

        let no_menu = map.purge_menu("100");
        assert!(!no_menu.get("1").unwrap()["10"].contains_key("100"));

        let no_action = map.purge_action("5");
        assert!(!no_action.get("1").unwrap()["10"]["100"].contains("5"));
        assert!(no_action.get("1").unwrap()["10"]["100"].contains("6"));
    }

    #[test]
    fn test_rows_skip_empty_nodes() {
        let map = populated()
            .assign_feature("1", "30")
            .assign_menu("2", "10", "300");
        let rows = map.rows();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| !r.action_id.is_empty()));
        assert!(!rows.iter().any(|r| r.feature_id == "30"));
        assert!(!rows.iter().any(|r| r.menu_id == "300"));
    }

    #[test]
    fn test_rows_order_follows_key_order() {
        let map = populated();
        let rows = map.rows();
        let paths: Vec<(&str, &str, &str, &str)> = rows
            .iter()
            .map(|r| (r.role_id, r.feature_id, r.menu_id, r.action_id))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("1", "10", "100", "5"),
                ("1", "10", "100", "6"),
                ("1", "11", "101", "5"),
                ("2", "10", "100", "5"),
            ]
        );
    }
}
