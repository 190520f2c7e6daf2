mod config;
mod display;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;

use prism_core::differ::create_plan;
use prism_core::effect::Effect;
use prism_core::interpreter::{ApplyResult, EffectOutcome, Interpreter};
use prism_core::permission::{PermissionSet, diff_permissions};
use prism_core::plan::Plan;
use prism_core::provider::{Provider, ProviderError};
use prism_core::resource::{ResourceId, State, Value};
use prism_provider_quicksight::QuickSightProvider;
use prism_provider_quicksight::schemas::schemas_by_type;
use prism_state::{ResourceState, StateBackend, StateFile, create_backend};

use crate::config::Config;
use crate::display::{format_grant, format_revoke, print_permission_delta, print_plan};

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Manage Amazon QuickSight resources as code", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// AWS region, overriding the provider block
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS account ID, overriding the provider block
    #[arg(long, global = true)]
    account_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        #[arg(default_value = "prism.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        #[arg(default_value = "prism.json")]
        file: PathBuf,

        /// Read live state from QuickSight instead of the state file
        #[arg(long)]
        refresh: bool,
    },
    /// Apply changes to reach the desired state
    Apply {
        #[arg(default_value = "prism.json")]
        file: PathBuf,
    },
    /// Permission utilities
    Permissions {
        #[command(subcommand)]
        command: PermissionCommands,
    },
}

#[derive(Subcommand)]
enum PermissionCommands {
    /// Show the grants and revokes that turn one permission list into another
    Diff {
        /// JSON list of { "principal": ..., "actions": [...] }
        old: PathBuf,
        new: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = Overrides {
        region: cli.region,
        account_id: cli.account_id,
    };

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file, refresh } => run_plan(&file, &overrides, refresh).await,
        Commands::Apply { file } => run_apply(&file, &overrides).await,
        Commands::Permissions {
            command: PermissionCommands::Diff { old, new },
        } => run_permissions_diff(&old, &new),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Command line values that take precedence over the configuration file
struct Overrides {
    region: Option<String>,
    account_id: Option<String>,
}

fn load_config(file: &Path, overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load(file)?;
    if let Some(region) = &overrides.region {
        config.provider = config.provider.with_region(region);
    }
    if let Some(account_id) = &overrides.account_id {
        config.provider = config.provider.with_account_id(account_id);
    }
    Ok(config)
}

fn run_validate(file: &Path) -> Result<()> {
    let config = Config::load(file)?;
    config.validate(&schemas_by_type())?;
    println!(
        "{}",
        format!("Configuration is valid ({} resources).", config.resources.len()).green()
    );
    Ok(())
}

async fn run_plan(file: &Path, overrides: &Overrides, refresh: bool) -> Result<()> {
    let config = load_config(file, overrides)?;
    let schemas = schemas_by_type();
    config.validate(&schemas)?;

    let backend = create_backend(&config.backend).await?;
    let state = backend.read_state().await?.unwrap_or_default();

    let current = if refresh {
        let provider = QuickSightProvider::new(config.provider.clone()).await;
        refresh_states(&provider, &state).await?
    } else {
        state.current_states()
    };

    let plan = create_plan(&config.normalized_resources(&schemas), &current, &schemas)?;
    print_plan(&plan);
    Ok(())
}

async fn run_apply(file: &Path, overrides: &Overrides) -> Result<()> {
    let config = load_config(file, overrides)?;
    config.validate(&schemas_by_type())?;

    let backend = create_backend(&config.backend).await?;
    let lock = backend.acquire_lock("apply").await?;

    let result = apply_locked(&config, backend.as_ref()).await;

    if let Err(e) = backend.release_lock(&lock).await {
        log::warn!("Failed to release state lock {}: {}", lock.id, e);
    }
    result
}

async fn apply_locked(config: &Config, backend: &dyn StateBackend) -> Result<()> {
    let schemas = schemas_by_type();
    let mut state = backend.read_state().await?.unwrap_or_default();

    let provider = QuickSightProvider::new(config.provider.clone()).await;
    let current = refresh_states(&provider, &state).await?;
    sync_refreshed(&mut state, &current, provider.name());

    let plan = create_plan(&config.normalized_resources(&schemas), &current, &schemas)?;
    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let provider_name = provider.name();
    let result = Interpreter::new(provider).apply(&plan).await;
    print_outcomes(&plan, &result);
    record_outcomes(&mut state, &plan, &result, provider_name);

    state.increment_serial();
    backend
        .write_state(&state)
        .await
        .context("Failed to save state")?;

    println!();
    if result.is_success() {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", result.success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        bail!(
            "Apply failed. {} succeeded, {} failed.",
            result.success_count,
            result.failure_count
        )
    }
}

/// Read the live state of every recorded resource
async fn refresh_states(
    provider: &impl Provider,
    state: &StateFile,
) -> Result<HashMap<ResourceId, State>, ProviderError> {
    let mut current = HashMap::new();
    for recorded in &state.resources {
        let id = ResourceId::new(&recorded.resource_type, &recorded.name);
        let live = provider.read(&id, recorded.identifier.as_deref()).await?;
        if live.exists {
            current.insert(id, live);
        } else {
            log::warn!("{} no longer exists and will be created again", id);
        }
    }
    Ok(current)
}

/// Bring the state file in line with a refresh
fn sync_refreshed(state: &mut StateFile, current: &HashMap<ResourceId, State>, provider: &str) {
    state
        .resources
        .retain(|r| current.contains_key(&ResourceId::new(&r.resource_type, &r.name)));
    let mut refreshed: Vec<&State> = current.values().collect();
    refreshed.sort_by_key(|s| s.id.to_string());
    for live in refreshed {
        state.upsert_resource(ResourceState::from_state(live, provider));
    }
}

/// Record successful effects in the state file
fn record_outcomes(state: &mut StateFile, plan: &Plan, result: &ApplyResult, provider: &str) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(EffectOutcome::Created { state: live })
            | Ok(EffectOutcome::Updated { state: live })
            | Ok(EffectOutcome::Replaced { state: live }) => {
                state.upsert_resource(ResourceState::from_state(live, provider));
            }
            Ok(EffectOutcome::Deleted { id }) => {
                state.remove_resource(&id.resource_type, &id.name);
            }
            Ok(EffectOutcome::Read { .. }) | Ok(EffectOutcome::Skipped { .. }) => {}
            Err(e) => log::debug!("Not recording {}: {}", effect.resource_id(), e),
        }
    }
    for id in &result.removed {
        state.remove_resource(&id.resource_type, &id.name);
    }
}

fn print_outcomes(plan: &Plan, result: &ApplyResult) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        let label = format!("{} {}", effect.kind(), effect.resource_id());
        match outcome {
            Ok(_) => println!("  {} {}", "✓".green(), label),
            Err(e) => println!("  {} {} - {}", "✗".red(), label, e),
        }
        if let (
            Ok(EffectOutcome::Updated { .. }),
            Effect::Update {
                permissions: Some(delta),
                ..
            },
        ) = (outcome, effect)
        {
            print_permission_delta(delta, "      ");
        }
    }
}

fn run_permissions_diff(old: &Path, new: &Path) -> Result<()> {
    let old = load_permission_set(old)?;
    let new = load_permission_set(new)?;

    let delta = diff_permissions(&old, &new);
    if delta.is_empty() {
        println!("{}", "No permission changes.".green());
        return Ok(());
    }

    for permission in &delta.to_grant {
        println!("{}", format_grant(permission).green());
    }
    for permission in &delta.to_revoke {
        println!("{}", format_revoke(permission).red());
    }
    Ok(())
}

fn load_permission_set(path: &Path) -> Result<PermissionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let Some(value) = Value::from_json(&json) else {
        bail!("{}: expected a list of permissions, got null", path.display());
    };
    PermissionSet::from_value(&value)
        .with_context(|| format!("Invalid permissions in {}", path.display()))
}
