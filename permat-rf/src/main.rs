//! permat-rf - Role/Feature permission admin tool
//!
//! Command-line surface over the role -> feature -> menu -> action grant
//! tree. State lives in the shared admin database under the role admin
//! blob key; each invocation loads it, applies one command and saves.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use permat_common::config::{database_path, ensure_root_folder, resolve_root_folder};
use permat_common::db::{delete_state_blob, init_database};
use permat_common::search::filter_entities;
use permat_common::time::now_millis;
use permat_rf::admin::{RoleAdminState, STATE_BLOB_KEY};
use permat_rf::csv;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "permat-rf")]
#[command(about = "Role/Feature permission admin for permat")]
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
        /// Required for features and actions
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
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
        /// Give the record a different id; grants follow the change
        #[arg(long)]
        new_id: Option<i64>,
    },
    /// Delete an entity and purge it from the grant tree
    Rm {
        kind: EntityKind,
        #[arg(long)]
        id: i64,
    },
    /// Attach a feature to a role
    AssignFeature {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        feature: i64,
    },
    /// Attach a menu beneath a role's feature
    AssignMenu {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        feature: i64,
        #[arg(long)]
        menu: i64,
    },
    /// Flip one action grant (menu -1 grants at the feature level)
    ToggleAction {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        feature: i64,
        #[arg(long, allow_negative_numbers = true)]
        menu: i64,
        #[arg(long)]
        action: i64,
    },
    /// Detach a feature and everything under it from a role
    RevokeFeature {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        feature: i64,
    },
    /// Detach one menu beneath a role's feature
    RevokeMenu {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        feature: i64,
        #[arg(long, allow_negative_numbers = true)]
        menu: i64,
    },
    /// Empty a role's grants while keeping the role entry
    ClearRole {
        #[arg(long)]
        role: i64,
    },
    /// Print the grant tree
    Show {
        /// Limit output to one role
        #[arg(long)]
        role: Option<i64>,
    },
    /// Write the grant tree as CSV
    Export {
        /// Output file path
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace the grant tree from a CSV file
    Import {
        /// Input file path
        file: PathBuf,
    },
    /// Discard the saved grant state
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EntityKind {
    Role,
    Feature,
    Menu,
    Action,
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
        "Starting permat Role/Feature Admin (permat-rf) v{} [{}] built {} ({})",
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
    let mut state = RoleAdminState::load(&pool).await?;
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
        } => {
            let id = match kind {
                EntityKind::Role => {
                    reject_code(kind, &code)?;
                    state.create_role(&name, description.as_deref())
                }
                EntityKind::Feature => {
                    let code = require_code(kind, code)?;
                    state.create_feature(&name, &code, description.as_deref())
                }
                EntityKind::Menu => {
                    reject_code(kind, &code)?;
                    state.create_menu(&name, description.as_deref())
                }
                EntityKind::Action => {
                    let code = require_code(kind, code)?;
                    if description.is_some() {
                        anyhow::bail!("--description does not apply to actions");
                    }
                    state.create_action(&name, &code)
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
            new_id,
        } => {
            edit_entity(&mut state, kind, id, name, code, description, new_id)?;
            println!("Updated {:?} {}", kind, id);
            dirty = true;
        }
        Command::Rm { kind, id } => {
            match kind {
                EntityKind::Role => state.delete_role(id)?,
                EntityKind::Feature => state.delete_feature(id)?,
                EntityKind::Menu => state.delete_menu(id)?,
                EntityKind::Action => state.delete_action(id)?,
            }
            println!("Deleted {:?} {}", kind, id);
            dirty = true;
        }
        Command::AssignFeature { role, feature } => {
            state.drop_feature_on_role(feature, role)?;
            println!("Attached feature {} to role {}", feature, role);
            dirty = true;
        }
        Command::AssignMenu {
            role,
            feature,
            menu,
        } => {
            state.drop_menu_on_feature(menu, feature, role)?;
            println!("Attached menu {} under role {} feature {}", menu, role, feature);
            dirty = true;
        }
        Command::ToggleAction {
            role,
            feature,
            menu,
            action,
        } => {
            state.toggle_action(role, feature, menu, action)?;
            println!(
                "Toggled action {} for role {} feature {} menu {}",
                action, role, feature, menu
            );
            dirty = true;
        }
        Command::RevokeFeature { role, feature } => {
            state.remove_feature_from_role(role, feature);
            println!("Detached feature {} from role {}", feature, role);
            dirty = true;
        }
        Command::RevokeMenu {
            role,
            feature,
            menu,
        } => {
            state.remove_menu_from_feature(role, feature, menu);
            println!("Detached menu {} under role {} feature {}", menu, role, feature);
            dirty = true;
        }
        Command::ClearRole { role } => {
            state.clear_role_grants(role);
            println!("Cleared grants for role {}", role);
            dirty = true;
        }
        Command::Show { role } => {
            print_grants(&state, role);
        }
        Command::Export { out } => {
            let text = csv::export_csv(&state, now_millis());
            tokio::fs::write(&out, &text)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!(
                "Exported {} grant rows to {}",
                state.grants().rows().len(),
                out.display()
            );
        }
        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = csv::import_csv(&mut state, &text)?;
            println!("Imported {} rows from {}", report.rows_scanned, file.display());
            dirty = true;
        }
        Command::Reset => {
            delete_state_blob(&pool, STATE_BLOB_KEY).await?;
            println!("Cleared saved role grant state");
        }
    }

    if dirty {
        state.save(&pool).await?;
    }

    Ok(())
}

fn require_code(kind: EntityKind, code: Option<String>) -> Result<String> {
    code.ok_or_else(|| anyhow::anyhow!("--code is required for {:?}s", kind))
}

fn reject_code(kind: EntityKind, code: &Option<String>) -> Result<()> {
    if code.is_some() {
        anyhow::bail!("--code does not apply to {:?}s", kind);
    }
    Ok(())
}

fn list_entities(state: &RoleAdminState, kind: EntityKind, filter: &str) {
    match kind {
        EntityKind::Role => {
            for role in filter_entities(state.roles.list(), filter) {
                println!("{:>4}  {}  {}", role.id, role.name, role.description);
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
        EntityKind::Menu => {
            for menu in filter_entities(state.menus.list(), filter) {
                println!("{:>4}  {}  {}", menu.id, menu.name, menu.description);
            }
        }
        EntityKind::Action => {
            for action in filter_entities(state.actions.list(), filter) {
                println!("{:>4}  {}  [{}]", action.id, action.name, action.code);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn edit_entity(
    state: &mut RoleAdminState,
    kind: EntityKind,
    id: i64,
    name: Option<String>,
    code: Option<String>,
    description: Option<String>,
    new_id: Option<i64>,
) -> Result<()> {
    match kind {
        EntityKind::Role => {
            reject_code(kind, &code)?;
            let mut role = state
                .roles
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Role {} not found", id))?;
            if let Some(value) = name {
                role.name = value;
            }
            if let Some(value) = description {
                role.description = value;
            }
            if let Some(value) = new_id {
                role.id = value;
            }
            state.update_role(id, role)?;
        }
        EntityKind::Feature => {
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
        EntityKind::Menu => {
            reject_code(kind, &code)?;
            let mut menu = state
                .menus
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Menu {} not found", id))?;
            if let Some(value) = name {
                menu.name = value;
            }
            if let Some(value) = description {
                menu.description = value;
            }
            if let Some(value) = new_id {
                menu.id = value;
            }
            state.update_menu(id, menu)?;
        }
        EntityKind::Action => {
            if description.is_some() {
                anyhow::bail!("--description does not apply to actions");
            }
            let mut action = state
                .actions
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Action {} not found", id))?;
            if let Some(value) = name {
                action.name = value;
            }
            if let Some(value) = code {
                action.code = value;
            }
            if let Some(value) = new_id {
                action.id = value;
            }
            state.update_action(id, action)?;
        }
    }
    Ok(())
}

fn print_grants(state: &RoleAdminState, only_role: Option<i64>) {
    let only_key = only_role.map(|id| id.to_string());
    for (role_key, features) in state.grants().iter() {
        if let Some(key) = &only_key {
            if role_key != key {
                continue;
            }
        }
        println!("role {}{}", role_key, named(role_key, |id| {
            state.roles.get(id).map(|r| r.name.clone())
        }));
        for (feature_key, menus) in features {
            println!("  feature {}{}", feature_key, named(feature_key, |id| {
                state.features.get(id).map(|f| f.name.clone())
            }));
            for (menu_key, actions) in menus {
                let list = actions.iter().cloned().collect::<Vec<_>>().join(", ");
                println!("    menu {}{}: [{}]", menu_key, named(menu_key, |id| {
                    state.menus.get(id).map(|m| m.name.clone())
                }), list);
            }
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
