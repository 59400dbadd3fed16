//! permat-pf - Package/Feature assignment admin tool
//!
//! Command-line surface over the package -> feature assignment map. State
//! lives in the shared admin database under the package admin blob key;
//! each invocation loads it, applies one command and saves.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use permat_common::config::{database_path, ensure_root_folder, resolve_root_folder};
use permat_common::db::{delete_state_blob, init_database};
use permat_common::search::filter_entities;
use permat_common::time::now_millis;
use permat_pf::admin::{PackageAdminState, STATE_BLOB_KEY};
use permat_pf::csv;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "permat-pf")]
#[command(about = "Package/Feature assignment admin for permat")]
#[command(version)]
struct Args {
    /// Root folder holding the admin database
    #[arg(short, long, env = "PERMAT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List entities of one kind
    List {
        kind: EntityKind,
        /// Case-insensitive substring filter over names, codes, descriptions
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Create an entity
    Add {
        kind: EntityKind,
        #[arg(long)]
        name: String,
        /// Required for features
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Packages only
        #[arg(long)]
        price: Option<f64>,
        /// Packages only
        #[arg(long)]
        duration_days: Option<i64>,
    },
    /// Update an entity record (unset options keep current values)
    Edit {
        kind: EntityKind,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        duration_days: Option<i64>,
        /// Give the record a different id; assignments follow the change
        #[arg(long)]
        new_id: Option<i64>,
    },
    /// Delete an entity and purge it from the assignment map
    Rm {
        kind: EntityKind,
        #[arg(long)]
        id: i64,
    },
    /// Assign a feature to a package
    Assign {
        #[arg(long)]
        package: i64,
        #[arg(long)]
        feature: i64,
    },
    /// Withdraw a feature from a package
    Unassign {
        #[arg(long)]
        package: i64,
        #[arg(long)]
        feature: i64,
    },
    /// Empty a package's feature set while keeping the package entry
    ClearPackage {
        #[arg(long)]
        package: i64,
    },
    /// Print the assignment map
    Show {
        /// Limit output to one package
        #[arg(long)]
        package: Option<i64>,
    },
    /// Write the assignment map as CSV
    Export {
        /// Output file path
        #[arg(long)]
        out: PathBuf,
    },
    /// Upsert packages/features from a CSV file and replace the assignments
    Import {
        /// Input file path
        file: PathBuf,
    },
    /// Discard the saved package admin state
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EntityKind {
    Package,
    Feature,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting permat Package/Feature Admin (permat-pf) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root = resolve_root_folder(args.root_folder.as_deref().and_then(|p| p.to_str()))?;
    ensure_root_folder(&root)?;
    let db_path = database_path(&root);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    let mut state = PackageAdminState::load(&pool).await?;
    let mut dirty = false;

    match args.command {
        Command::List { kind, filter } => {
            list_entities(&state, kind, filter.as_deref().unwrap_or(""));
        }
        Command::Add {
            kind,
            name,
            code,
            description,
            price,
            duration_days,
        } => {
            let id = match kind {
                EntityKind::Package => {
                    if code.is_some() {
                        anyhow::bail!("--code does not apply to packages");
                    }
                    state.create_package(&name, description.as_deref(), price, duration_days)
                }
                EntityKind::Feature => {
                    if price.is_some() || duration_days.is_some() {
                        anyhow::bail!("--price and --duration-days do not apply to features");
                    }
                    let code =
                        code.ok_or_else(|| anyhow::anyhow!("--code is required for features"))?;
                    state.create_feature(&name, &code, description.as_deref())
                }
            };
            println!("Created {:?} {}", kind, id);
            dirty = true;
        }
        Command::Edit {
            kind,
            id,
            name,
            code,
            description,
            price,
            duration_days,
            new_id,
        } => {
            match kind {
                EntityKind::Package => {
                    if code.is_some() {
                        anyhow::bail!("--code does not apply to packages");
                    }
                    let mut package = state
                        .packages
                        .get(id)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("Package {} not found", id))?;
                    if let Some(value) = name {
                        package.name = value;
                    }
                    if let Some(value) = description {
                        package.description = value;
                    }
                    if let Some(value) = price {
                        package.price = value;
                    }
                    if let Some(value) = duration_days {
                        package.duration_days = value;
                    }
                    if let Some(value) = new_id {
                        package.id = value;
                    }
                    state.update_package(id, package)?;
                }
                EntityKind::Feature => {
                    if price.is_some() || duration_days.is_some() {
                        anyhow::bail!("--price and --duration-days do not apply to features");
                    }
                    let mut feature = state
                        .features
                        .get(id)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("Feature {} not found", id))?;
                    if let Some(value) = name {
                        feature.name = value;
                    }
                    if let Some(value) = code {
                        feature.code = value;
                    }
                    if let Some(value) = description {
                        feature.description = value;
                    }
                    if let Some(value) = new_id {
                        feature.id = value;
                    }
                    state.update_feature(id, feature)?;
                }
            }
            println!("Updated {:?} {}", kind, id);
            dirty = true;
        }
        Command::Rm { kind, id } => {
            match kind {
                EntityKind::Package => state.delete_package(id)?,
                EntityKind::Feature => state.delete_feature(id)?,
            }
            println!("Deleted {:?} {}", kind, id);
            dirty = true;
        }
        Command::Assign { package, feature } => {
            state.assign(package, feature)?;
            println!("Assigned feature {} to package {}", feature, package);
            dirty = true;
        }
        Command::Unassign { package, feature } => {
            state.unassign(package, feature);
            println!("Withdrew feature {} from package {}", feature, package);
            dirty = true;
        }
        Command::ClearPackage { package } => {
            state.clear_package_features(package);
            println!("Cleared assignments for package {}", package);
            dirty = true;
        }
        Command::Show { package } => {
            print_mapping(&state, package);
        }
        Command::Export { out } => {
            let text = csv::export_csv(&state, now_millis());
            tokio::fs::write(&out, &text)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!(
                "Exported {} assignment rows to {}",
                state.mapping().pairs().len(),
                out.display()
            );
        }
        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let outcome = csv::import_csv(&text, &state.packages, &state.features)?;
            let report = outcome.report;
            state.apply_import(outcome.packages, outcome.features, outcome.mapping);
            println!(
                "Imported {} rows from {} ({} packages created, {} features created)",
                report.rows_scanned,
                file.display(),
                report.packages_created,
                report.features_created
            );
            dirty = true;
        }
        Command::Reset => {
            delete_state_blob(&pool, STATE_BLOB_KEY).await?;
            println!("Cleared saved package admin state");
        }
    }

    if dirty {
        state.save(&pool).await?;
    }

    Ok(())
}

fn list_entities(state: &PackageAdminState, kind: EntityKind, filter: &str) {
    match kind {
        EntityKind::Package => {
            for package in filter_entities(state.packages.list(), filter) {
                println!(
                    "{:>4}  {}  {:.2} / {}d  {}",
                    package.id, package.name, package.price, package.duration_days, package.description
                );
            }
        }
        EntityKind::Feature => {
            for feature in filter_entities(state.features.list(), filter) {
                println!(
                    "{:>4}  {}  [{}]  {}",
                    feature.id, feature.name, feature.code, feature.description
                );
            }
        }
    }
}

fn print_mapping(state: &PackageAdminState, only_package: Option<i64>) {
    let only_key = only_package.map(|id| id.to_string());
    for (package_key, features) in state.mapping().iter() {
        if let Some(key) = &only_key {
            if package_key != key {
                continue;
            }
        }
        println!("package {}{}", package_key, named(package_key, |id| {
            state.packages.get(id).map(|p| p.name.clone())
        }));
        for feature_key in features {
            println!("  feature {}{}", feature_key, named(feature_key, |id| {
                state.features.get(id).map(|f| f.name.clone())
            }));
        }
    }
}

fn named<F>(id_text: &str, lookup: F) -> String
where
    F: Fn(i64) -> Option<String>,
{
    id_text
        .parse::<i64>()
        .ok()
        .and_then(lookup)
        .map(|name| format!(" ({})", name))
        .unwrap_or_default()
}
