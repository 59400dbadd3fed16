//! Mapping engine for permission hierarchies
//!
//! Two mapping shapes are maintained by the admin surfaces:
//! - role -> feature -> menu -> action set ([`RoleGrantMap`])
//! - package -> feature set ([`PackageFeatureMap`])
//!
//! All keys are string forms of entity ids. Operations are pure: they take
//! `&self` and return a new map, leaving the input untouched, so a caller
//! can hold a snapshot for readers while committing the successor state.

pub mod package;
pub mod persist;
pub mod role;

pub use package::PackageFeatureMap;
pub use role::{GrantRow, RoleGrantMap};

/// Synthetic menu key for grants recorded before menu granularity existed.
/// Legacy flat feature entries are migrated under this key on decode.
pub const NO_MENU_KEY: &str = "-1";

/// Innermost tree level: the set of granted permission action ids.
pub type ActionSet = std::collections::BTreeSet<String>;

/// Menu id -> granted actions.
pub type MenuGrants = std::collections::BTreeMap<String, ActionSet>;

/// Feature id -> menu grants. One of these subtrees hangs off each role.
pub type FeatureGrants = std::collections::BTreeMap<String, MenuGrants>;
