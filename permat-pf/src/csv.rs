//! Package assignment CSV export/import
//!
//! Export flattens the assignment map to one row per (package, feature)
//! pair. Import is header-keyed rather than positional: column headers are
//! normalized so spreadsheet renamings like `Package_ID` or `package id`
//! still match, and unknown packages or features referenced by a row are
//! upserted into the catalogs rather than dropped.

use crate::admin::PackageAdminState;
use permat_common::csv::{format_row, normalize_header, parse_rows};
use permat_common::entities::{Feature, Package, SYSTEM_USER};
use permat_common::grants::PackageFeatureMap;
use permat_common::store::EntityStore;
use permat_common::time::parse_millis;
use permat_common::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// Header row, written unquoted.
pub const EXPORT_HEADER: &str =
    "package_id,package_name,feature_id,feature_name,createdAt,updatedAt,createdBy,updatedBy";

/// Outcome of an import, reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Data lines scanned, whether or not they produced an assignment.
    pub rows_scanned: usize,
    pub packages_created: usize,
    pub features_created: usize,
}

/// Everything an accepted import replaces: both catalogs (pre-existing
/// entities plus upserts, sorted by id) and the rebuilt assignment map.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub packages: Vec<Package>,
    pub features: Vec<Feature>,
    pub mapping: PackageFeatureMap,
    pub report: ImportReport,
}

/// Render the assignment map as CSV. Rows are emitted even when a feature
/// id no longer resolves to a catalog entry; its name field stays empty.
pub fn export_csv(state: &PackageAdminState, exported_at_ms: i64) -> String {
    let stamp = exported_at_ms.to_string();
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');

    for (package_id, feature_id) in state.mapping().pairs() {
        let package_name = resolve(package_id, |id| {
            state.packages.get(id).map(|p| p.name.clone())
        });
        let feature_name = resolve(feature_id, |id| {
            state.features.get(id).map(|f| f.name.clone())
        });
        let fields = [
            package_id,
            package_name.as_str(),
            feature_id,
            feature_name.as_str(),
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

/// Parse CSV text into an [`ImportOutcome`] against the current catalogs.
///
/// Per row: resolve or upsert a package (a numeric unseen id is kept
/// as-is, a non-numeric id gets the next free id; name and timestamps from
/// the row are applied on update as well as insert), then likewise a
/// feature, then record the assignment. Rows without a usable package id
/// are skipped; rows without feature columns upsert the package only. A
/// file with no data rows is rejected.
pub fn import_csv(
    text: &str,
    current_packages: &EntityStore<Package>,
    current_features: &EntityStore<Feature>,
) -> Result<ImportOutcome> {
    let rows = parse_rows(text);
    if rows.len() <= 1 {
        return Err(Error::InvalidInput(
            "CSV file contains no data rows".to_string(),
        ));
    }

    let headers: HashMap<String, usize> = rows[0]
        .iter()
        .enumerate()
        .map(|(index, header)| (normalize_header(header), index))
        .collect();

    let mut packages: Vec<Package> = current_packages.list().to_vec();
    let mut features: Vec<Feature> = current_features.list().to_vec();
    let mut mapping = PackageFeatureMap::new();
    // Raw id text -> resolved id, so repeated ids resolve to one record
    let mut seen_packages: HashMap<String, i64> = HashMap::new();
    let mut seen_features: HashMap<String, i64> = HashMap::new();
    let mut report = ImportReport {
        rows_scanned: 0,
        packages_created: 0,
        features_created: 0,
    };

    for row in &rows[1..] {
        report.rows_scanned += 1;
        let Some(raw_package_id) = cell(row, &headers, "packageid") else {
            debug!("Skipping import row {}: no package id", report.rows_scanned);
            continue;
        };

        let package_id = resolve_package(
            &mut packages,
            &mut seen_packages,
            &mut report,
            raw_package_id,
        );
        if let Some(package) = packages.iter_mut().find(|p| p.id == package_id) {
            if let Some(name) = cell(row, &headers, "packagename") {
                package.name = name.to_string();
            }
            if let Some(ts) = cell(row, &headers, "packagecreatedat").and_then(parse_millis) {
                package.created_at = ts;
            }
            if let Some(ts) = cell(row, &headers, "packageupdatedat").and_then(parse_millis) {
                package.updated_at = ts;
            }
        }

        let Some(raw_feature_id) = cell(row, &headers, "featureid") else {
            // Package-only row: upsert happened, no assignment to record
            continue;
        };

        let feature_id = resolve_feature(
            &mut features,
            &mut seen_features,
            &mut report,
            raw_feature_id,
        );
        if let Some(feature) = features.iter_mut().find(|f| f.id == feature_id) {
            if let Some(name) = cell(row, &headers, "featurename") {
                feature.name = name.to_string();
            }
            if let Some(code) = cell(row, &headers, "featurecode") {
                feature.code = code.to_string();
            }
            if let Some(ts) = cell(row, &headers, "featurecreatedat").and_then(parse_millis) {
                feature.created_at = ts;
            }
            if let Some(ts) = cell(row, &headers, "featureupdatedat").and_then(parse_millis) {
                feature.updated_at = ts;
            }
        }

        mapping = mapping.add_feature(&package_id.to_string(), &feature_id.to_string());
    }

    packages.sort_by_key(|p| p.id);
    features.sort_by_key(|f| f.id);

    Ok(ImportOutcome {
        packages,
        features,
        mapping,
        report,
    })
}

fn resolve_package(
    packages: &mut Vec<Package>,
    seen: &mut HashMap<String, i64>,
    report: &mut ImportReport,
    raw_id: &str,
) -> i64 {
    if let Some(id) = seen.get(raw_id) {
        return *id;
    }
    let id = match raw_id.parse::<i64>() {
        Ok(numeric) => {
            if !packages.iter().any(|p| p.id == numeric) {
                packages.push(Package::new(numeric, ""));
                report.packages_created += 1;
            }
            numeric
        }
        Err(_) => {
            let id = next_free_id(packages.iter().map(|p| p.id));
            packages.push(Package::new(id, ""));
            report.packages_created += 1;
            id
        }
    };
    seen.insert(raw_id.to_string(), id);
    id
}

fn resolve_feature(
    features: &mut Vec<Feature>,
    seen: &mut HashMap<String, i64>,
    report: &mut ImportReport,
    raw_id: &str,
) -> i64 {
    if let Some(id) = seen.get(raw_id) {
        return *id;
    }
    let id = match raw_id.parse::<i64>() {
        Ok(numeric) => {
            if !features.iter().any(|f| f.id == numeric) {
                features.push(Feature::new(numeric, "", ""));
                report.features_created += 1;
            }
            numeric
        }
        Err(_) => {
            let id = next_free_id(features.iter().map(|f| f.id));
            features.push(Feature::new(id, "", ""));
            report.features_created += 1;
            id
        }
    };
    seen.insert(raw_id.to_string(), id);
    id
}

fn next_free_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().map_or(1, |max| max + 1)
}

fn cell<'a>(row: &'a [String], headers: &HashMap<String, usize>, key: &str) -> Option<&'a str> {
    let index = *headers.get(key)?;
    let value = row.get(index)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
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
