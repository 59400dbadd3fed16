//! Role grant CSV export/import
//!
//! Export flattens the grant tree to one row per (role, feature, menu,
//! action) path with names resolved against the current catalogs. Import
//! reads only the four id columns back and replaces the tree wholesale;
//! name columns exist for the humans reading the file in a spreadsheet.

use crate::admin::RoleAdminState;
use permat_common::csv::{format_row, parse_rows};
use permat_common::entities::SYSTEM_USER;
use permat_common::grants::RoleGrantMap;
use permat_common::{Error, Result};
use tracing::debug;

/// Header row, written unquoted.
pub const EXPORT_HEADER: &str = "role_id,role_name,feature_id,feature_name,menu_id,menu_name,\
permission_action_id,permission_action_name,permission_action_code,\
createdAt,updatedAt,createdBy,updatedBy";

/// Outcome of an import, reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Data lines scanned, whether or not they produced a grant.
    pub rows_scanned: usize,
}

/// Render the grant tree as CSV. Every data field is quoted; the audit
/// columns carry the export timestamp and the system user uniformly.
pub fn export_csv(state: &RoleAdminState, exported_at_ms: i64) -> String {
    let stamp = exported_at_ms.to_string();
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');

    for row in state.grants().rows() {
        let role_name = resolve(row.role_id, |id| state.roles.get(id).map(|r| r.name.clone()));
        let feature_name = resolve(row.feature_id, |id| {
            state.features.get(id).map(|f| f.name.clone())
        });
        let menu_name = resolve(row.menu_id, |id| state.menus.get(id).map(|m| m.name.clone()));
        let action_name = resolve(row.action_id, |id| {
            state.actions.get(id).map(|a| a.name.clone())
        });
        let action_code = resolve(row.action_id, |id| {
            state.actions.get(id).map(|a| a.code.clone())
        });

        let fields = [
            row.role_id,
            role_name.as_str(),
            row.feature_id,
            feature_name.as_str(),
            row.menu_id,
            menu_name.as_str(),
            row.action_id,
            action_name.as_str(),
            action_code.as_str(),
            stamp.as_str(),
            stamp.as_str(),
            SYSTEM_USER,
            SYSTEM_USER,
        ];
        out.push_str(&format_row(&fields));
        out.push('\n');
    }
    out
}

/// Parse CSV text and replace the grant tree with its contents.
///
/// The header row is discarded by position. A data row must yield at least
/// 7 columns; columns 0, 2, 4 and 6 are the role, feature, menu and action
/// ids, and a row missing any of them after trimming is skipped. A file
/// with no data rows is rejected before any state changes.
pub fn import_csv(state: &mut RoleAdminState, text: &str) -> Result<ImportReport> {
    let rows = parse_rows(text);
    if rows.len() <= 1 {
        return Err(Error::InvalidInput(
            "CSV file contains no data rows".to_string(),
        ));
    }

    let mut rows_scanned = 0;
    let mut build = RoleGrantMap::new();
    for row in &rows[1..] {
        rows_scanned += 1;
        if row.len() < 7 {
            debug!("Skipping import row {}: too few columns", rows_scanned);
            continue;
        }
        let role_id = row[0].trim();
        let feature_id = row[2].trim();
        let menu_id = row[4].trim();
        let action_id = row[6].trim();
        if role_id.is_empty() || feature_id.is_empty() || menu_id.is_empty() || action_id.is_empty()
        {
            debug!("Skipping import row {}: missing id column", rows_scanned);
            continue;
        }
        build = build.add_action(role_id, feature_id, menu_id, action_id);
    }

    state.replace_grants(build);
    Ok(ImportReport { rows_scanned })
}

fn resolve<F>(id_text: &str, lookup: F) -> String
where
    F: Fn(i64) -> Option<String>,
{
    id_text
        .parse::<i64>()
        .ok()
        .and_then(lookup)
        .unwrap_or_default()
}
