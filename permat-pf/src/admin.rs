//! Package/feature admin state
//!
//! Unlike the role surface, this blob persists the entity catalogs along
//! with the assignment map: packages and features are fully user-defined
//! here, so a reload must bring back exactly what the user built. The
//! decode is tolerant per element; one bad record costs that record, not
//! the whole state.

use permat_common::db::{load_state_blob, save_state_blob};
use permat_common::entities::{Feature, Package};
use permat_common::grants::persist::{package_map_from_json, package_map_to_json};
use permat_common::grants::PackageFeatureMap;
use permat_common::seed;
use permat_common::store::{Entity, EntityStore};
use permat_common::{Error, Result};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Blob store key for the package/feature assignment state.
pub const STATE_BLOB_KEY: &str = "pkg-feature-admin-state-v1";

pub struct PackageAdminState {
    pub packages: EntityStore<Package>,
    pub features: EntityStore<Feature>,
    mapping: PackageFeatureMap,
}

impl PackageAdminState {
    /// Fresh state from the built-in catalogs with no assignments.
    pub fn new_seeded() -> Self {
        Self {
            packages: EntityStore::from_items(seed::default_packages()),
            features: EntityStore::from_items(seed::default_features()),
            mapping: PackageFeatureMap::new(),
        }
    }

    /// Load from the blob store, falling back to the seeded state when the
    /// blob is missing or unusable.
    pub async fn load(db: &Pool<Sqlite>) -> Result<Self> {
        let Some(text) = load_state_blob(db, STATE_BLOB_KEY).await? else {
            info!("No saved package admin state, starting from seed data");
            return Ok(Self::new_seeded());
        };

        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!("Package admin state is not valid JSON ({}), starting from seed data", e);
                return Ok(Self::new_seeded());
            }
        };
        let Some(root) = value.as_object() else {
            warn!("Package admin state is not a JSON object, starting from seed data");
            return Ok(Self::new_seeded());
        };

        let packages = decode_entities::<Package>(root.get("packages"), "package");
        let features = decode_entities::<Feature>(root.get("features"), "feature");
        let mapping = root
            .get("mapping")
            .map(package_map_from_json)
            .unwrap_or_default();

        info!(
            "Loaded package admin state ({} packages, {} features)",
            packages.len(),
            features.len()
        );
        Ok(Self {
            packages: EntityStore::from_items(packages),
            features: EntityStore::from_items(features),
            mapping,
        })
    }

    /// Persist catalogs and assignment map as one JSON blob.
    pub async fn save(&self, db: &Pool<Sqlite>) -> Result<()> {
        let blob = json!({
            "packages": self.packages.list(),
            "features": self.features.list(),
            "mapping": package_map_to_json(&self.mapping),
        });
        save_state_blob(db, STATE_BLOB_KEY, &blob.to_string()).await
    }

    pub fn mapping(&self) -> &PackageFeatureMap {
        &self.mapping
    }

    /// Deep copy of the assignment map for concurrent readers.
    pub fn snapshot(&self) -> PackageFeatureMap {
        self.mapping.clone()
    }

    // ---- entity CRUD -------------------------------------------------

    pub fn create_package(
        &mut self,
        name: &str,
        description: Option<&str>,
        price: Option<f64>,
        duration_days: Option<i64>,
    ) -> i64 {
        let id = self.packages.next_id();
        let mut package = Package::new(id, name);
        if let Some(desc) = description {
            package = package.with_description(desc);
        }
        if let Some(price) = price {
            package = package.with_price(price);
        }
        if let Some(days) = duration_days {
            package = package.with_duration_days(days);
        }
        self.packages.add(package);
        self.reconcile();
        id
    }

    /// Full-record replacement. The new record may carry a different id;
    /// assignments follow the id through a rekey.
    pub fn update_package(&mut self, id: i64, mut package: Package) -> Result<()> {
        if !self.packages.contains(id) {
            return Err(Error::NotFound(format!("Package {} not found", id)));
        }
        package.touch();
        let new_id = package.id;
        self.packages.replace(id, package);
        if new_id != id {
            self.mapping = self
                .mapping
                .rekey_package(&id.to_string(), &new_id.to_string());
        }
        self.reconcile();
        Ok(())
    }

    pub fn delete_package(&mut self, id: i64) -> Result<()> {
        self.packages
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Package {} not found", id)))?;
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
            self.mapping = self
                .mapping
                .rekey_feature(&id.to_string(), &new_id.to_string());
        }
        Ok(())
    }

    pub fn delete_feature(&mut self, id: i64) -> Result<()> {
        self.features
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Feature {} not found", id)))?;
        self.mapping = self.mapping.purge_feature(&id.to_string());
        Ok(())
    }

    // ---- assignment gestures -----------------------------------------

    /// Drop gesture: assign a feature to a package.
    pub fn assign(&mut self, package_id: i64, feature_id: i64) -> Result<()> {
        if !self.packages.contains(package_id) {
            return Err(Error::NotFound(format!("Package {} not found", package_id)));
        }
        if !self.features.contains(feature_id) {
            return Err(Error::NotFound(format!("Feature {} not found", feature_id)));
        }
        self.mapping = self
            .mapping
            .add_feature(&package_id.to_string(), &feature_id.to_string());
        Ok(())
    }

    /// Withdraw a feature from a package. No entity check: stale members
    /// left behind by imports must stay removable.
    pub fn unassign(&mut self, package_id: i64, feature_id: i64) {
        self.mapping = self
            .mapping
            .remove_feature(&package_id.to_string(), &feature_id.to_string());
    }

    pub fn clear_package_features(&mut self, package_id: i64) {
        self.mapping = self.mapping.clear_package(&package_id.to_string());
    }

    /// Commit an import: both catalogs and the assignment map are replaced
    /// wholesale by what the import built.
    pub fn apply_import(&mut self, packages: Vec<Package>, features: Vec<Feature>, mapping: PackageFeatureMap) {
        self.packages.replace_all(packages);
        self.features.replace_all(features);
        self.mapping = mapping;
    }

    fn reconcile(&mut self) {
        self.mapping = self.mapping.reconcile_packages(&self.packages.id_keys());
    }
}

/// Decode an entity array field, skipping elements that fail to parse.
fn decode_entities<T: serde::de::DeserializeOwned>(value: Option<&Value>, label: &str) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else {
        if value.is_some() {
            warn!("Saved {} list is not an array, ignoring it", label);
        }
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in items {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(entity) => out.push(entity),
            Err(e) => warn!("Skipping malformed saved {} record: {}", label, e),
        }
    }
    out
}
