// ABOUTME: Terminal prompts for the create and migrate wizards
// ABOUTME: Each prompt turns user input into wizard events; the wizards own all state

use anyhow::Result;
use dialoguer::console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::catalogue::{Region, TenancyModel, PLANS};
use crate::commands::with_spinner;
use crate::remote::models::MigrationStrategy;
use crate::remote::DatabaseGateway;
use crate::report;
use crate::wizard::create::{name_gate, RETENTION_DAYS};
use crate::wizard::{
    CreateEvent, CreateStep, CreateWizard, MigrateEvent, MigrateStep, MigrateWizard, CREATE_STEPS,
    MIGRATE_STEPS,
};

const BACK: &str = "← Back";
const CANCEL: &str = "Cancel";

enum Flow {
    Stay,
    Done,
    Cancel,
}

fn print_header(steps: &[&str], current: usize) {
    println!();
    let line: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if i == current {
                style(format!("● {}", label)).cyan().bold().to_string()
            } else if i < current {
                style(format!("✓ {}", label)).green().to_string()
            } else {
                style(format!("○ {}", label)).dim().to_string()
            }
        })
        .collect();
    println!("  {}", line.join("  ─  "));
    println!();
}

pub async fn create<G: DatabaseGateway + ?Sized>(
    wizard: &mut CreateWizard,
    gateway: &G,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        print_header(&CREATE_STEPS, wizard.step().index());
        let flow = match wizard.step().index() {
            0 => engine_step(wizard, &theme)?,
            1 => plan_step(wizard, &theme)?,
            _ => {
                configure_step(wizard, &theme)?;
                confirm_create(wizard, &theme, gateway).await?
            }
        };
        match flow {
            Flow::Stay => {}
            Flow::Done => return Ok(()),
            Flow::Cancel => {
                wizard.close();
                println!("Cancelled");
                return Ok(());
            }
        }
    }
}

fn engine_step(wizard: &mut CreateWizard, theme: &ColorfulTheme) -> Result<Flow> {
    let (current_engine, current_version) = match wizard.step() {
        CreateStep::EngineSelection {
            engine, version, ..
        } => (*engine, version.clone()),
        _ => return Ok(Flow::Stay),
    };

    let entries = wizard.catalogue().entries().to_vec();
    let items: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "{:<12} {:<10} {}",
                e.label,
                e.engine.category(),
                style(e.engine.description()).dim()
            )
        })
        .collect();
    let default = current_engine
        .and_then(|engine| entries.iter().position(|e| e.engine == engine))
        .unwrap_or(0);
    let Some(choice) = Select::with_theme(theme)
        .with_prompt("Database engine")
        .items(&items)
        .default(default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    let entry = &entries[choice];
    wizard.dispatch(CreateEvent::SelectEngine(entry.engine));

    let version_default = current_version
        .filter(|_| current_engine == Some(entry.engine))
        .and_then(|v| entry.versions.iter().position(|x| *x == v))
        .unwrap_or(0);
    let Some(version) = Select::with_theme(theme)
        .with_prompt("Version")
        .items(&entry.versions)
        .default(version_default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    wizard.dispatch(CreateEvent::SelectVersion(entry.versions[version].clone()));
    wizard.dispatch(CreateEvent::Continue);
    Ok(Flow::Stay)
}

fn plan_step(wizard: &mut CreateWizard, theme: &ColorfulTheme) -> Result<Flow> {
    let (current_plan, current_tenancy) = match wizard.step() {
        CreateStep::PlanSelection { plan, tenancy, .. } => (*plan, *tenancy),
        _ => return Ok(Flow::Stay),
    };

    let mut items: Vec<String> = PLANS
        .iter()
        .map(|p| {
            format!(
                "{:<14} {:>2} vCPU  {:>6}  {:>5} GB  ${:.3}/hr{}",
                p.label,
                p.vcpus,
                p.memory_display(),
                p.storage_gb,
                p.hourly_usd,
                if p.recommended { "  (recommended)" } else { "" }
            )
        })
        .collect();
    items.push(BACK.to_string());
    let default = current_plan
        .and_then(|plan| PLANS.iter().position(|p| p.id == plan.id))
        .or_else(|| PLANS.iter().position(|p| p.recommended))
        .unwrap_or(0);
    let Some(choice) = Select::with_theme(theme)
        .with_prompt("Hardware plan")
        .items(&items)
        .default(default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    if choice == PLANS.len() {
        wizard.dispatch(CreateEvent::Back);
        return Ok(Flow::Stay);
    }
    wizard.dispatch(CreateEvent::SelectPlan(&PLANS[choice]));

    let tenancies: Vec<String> = TenancyModel::ALL
        .iter()
        .map(|t| format!("{:<10} {}", t.label(), style(t.description()).dim()))
        .collect();
    let tenancy_default = TenancyModel::ALL
        .iter()
        .position(|t| *t == current_tenancy)
        .unwrap_or(0);
    let Some(tenancy) = Select::with_theme(theme)
        .with_prompt("Tenancy")
        .items(&tenancies)
        .default(tenancy_default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    wizard.dispatch(CreateEvent::SelectTenancy(TenancyModel::ALL[tenancy]));
    wizard.dispatch(CreateEvent::Continue);
    Ok(Flow::Stay)
}

fn configure_step(wizard: &mut CreateWizard, theme: &ColorfulTheme) -> Result<()> {
    let config = match wizard.step() {
        CreateStep::Configuration { config, .. } => config.clone(),
        _ => return Ok(()),
    };

    let mut name = Input::<String>::with_theme(theme)
        .with_prompt("Instance name")
        .validate_with(|input: &String| -> Result<(), &str> {
            if name_gate(input) {
                Ok(())
            } else {
                Err("Name must be at least 3 characters")
            }
        });
    if !config.name.is_empty() {
        name = name.with_initial_text(config.name.clone());
    }
    wizard.dispatch(CreateEvent::SetName(name.interact_text()?));

    let database_name: String = Input::with_theme(theme)
        .with_prompt("Initial database name")
        .default(config.database_name.clone())
        .allow_empty(true)
        .interact_text()?;
    wizard.dispatch(CreateEvent::SetDatabaseName(database_name));

    let regions: Vec<String> = Region::ALL
        .iter()
        .map(|r| format!("{:<12} {}", r.as_str(), r.label()))
        .collect();
    let region = Select::with_theme(theme)
        .with_prompt("Region")
        .items(&regions)
        .default(Region::ALL.iter().position(|r| *r == config.region).unwrap_or(0))
        .interact()?;
    wizard.dispatch(CreateEvent::SetRegion(Region::ALL[region]));

    let ssl = Confirm::with_theme(theme)
        .with_prompt("Require SSL/TLS?")
        .default(config.ssl_enabled)
        .interact()?;
    wizard.dispatch(CreateEvent::SetSsl(ssl));

    let public = Confirm::with_theme(theme)
        .with_prompt("Allow public access?")
        .default(config.publicly_accessible)
        .interact()?;
    wizard.dispatch(CreateEvent::SetPublicAccess(public));

    let backup = Confirm::with_theme(theme)
        .with_prompt("Enable automated backups?")
        .default(config.backup_enabled)
        .interact()?;
    wizard.dispatch(CreateEvent::SetBackup(backup));

    if backup {
        let days: u32 = Input::with_theme(theme)
            .with_prompt("Backup retention (days)")
            .default(config.backup_retention_days)
            .validate_with(|d: &u32| -> Result<(), String> {
                if RETENTION_DAYS.contains(d) {
                    Ok(())
                } else {
                    Err(format!(
                        "Retention must be {} to {} days",
                        RETENTION_DAYS.start(),
                        RETENTION_DAYS.end()
                    ))
                }
            })
            .interact_text()?;
        wizard.dispatch(CreateEvent::SetRetentionDays(days));
    }
    Ok(())
}

async fn confirm_create<G: DatabaseGateway + ?Sized>(
    wizard: &mut CreateWizard,
    theme: &ColorfulTheme,
    gateway: &G,
) -> Result<Flow> {
    if let CreateStep::Configuration {
        engine,
        plan,
        tenancy,
        config,
    } = wizard.step()
    {
        println!();
        println!(
            "  {} {} on {} ({}), {} in {}, ${:.3}/hr",
            engine.engine.label(),
            engine.version,
            plan.label,
            tenancy.label(),
            config.name.trim(),
            config.region,
            plan.hourly_usd
        );
        println!();
    }

    let actions = ["Deploy", "Edit settings", BACK, CANCEL];
    let Some(action) = Select::with_theme(theme)
        .with_prompt("Ready to deploy?")
        .items(&actions)
        .default(0)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    match action {
        0 => {
            if !wizard.can_confirm() {
                println!("{}", style("Instance name must be at least 3 characters").red());
                return Ok(Flow::Stay);
            }
            match with_spinner("Deploying database…", wizard.submit(gateway)).await {
                Some(created) => {
                    let password = created.initial_secret.reveal();
                    println!();
                    print!("{}", report::render_created(&created.database, &password));
                    Ok(Flow::Done)
                }
                None => {
                    if let Some(message) = wizard.error() {
                        print!("{}", style(report::render_failure(message)).red());
                    }
                    Ok(Flow::Stay)
                }
            }
        }
        1 => Ok(Flow::Stay),
        2 => {
            wizard.dispatch(CreateEvent::Back);
            Ok(Flow::Stay)
        }
        _ => Ok(Flow::Cancel),
    }
}

pub async fn migrate<G: DatabaseGateway + ?Sized>(
    wizard: &mut MigrateWizard,
    gateway: &G,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!(
        "Migrating from {} ({})",
        style(&wizard.source().name).bold(),
        wizard.source().engine.label()
    );

    loop {
        if let Some(index) = wizard.step().index() {
            print_header(&MIGRATE_STEPS, index);
        }
        let flow = match wizard.step().index() {
            Some(0) => target_step(wizard, &theme)?,
            Some(1) => strategy_step(wizard, &theme)?,
            Some(_) => options_step(wizard, &theme, gateway).await?,
            None => {
                if let Some(result) = wizard.result() {
                    print!("{}", report::render_migration(result));
                }
                Flow::Done
            }
        };
        match flow {
            Flow::Stay => {}
            Flow::Done => {
                wizard.close();
                return Ok(());
            }
            Flow::Cancel => {
                wizard.close();
                println!("Cancelled");
                return Ok(());
            }
        }
    }
}

fn target_step(wizard: &mut MigrateWizard, theme: &ColorfulTheme) -> Result<Flow> {
    if wizard.candidates().is_empty() {
        println!("No other databases are available as a migration target.");
        return Ok(Flow::Cancel);
    }

    let current = match wizard.step() {
        MigrateStep::TargetSelection { target, .. } => target.as_ref().map(|t| t.id.clone()),
        _ => None,
    };
    let mut items: Vec<String> = wizard
        .candidates()
        .iter()
        .map(|c| {
            let label = format!(
                "{:<20} {} {}  {}",
                c.database.name,
                c.database.engine.label(),
                c.database.version,
                c.database.status
            );
            if c.selectable {
                label
            } else {
                style(format!("{}  (different engine)", label)).dim().to_string()
            }
        })
        .collect();
    items.push(CANCEL.to_string());
    let default = current
        .and_then(|id| wizard.candidates().iter().position(|c| c.database.id == id))
        .unwrap_or(0);

    let Some(choice) = Select::with_theme(theme)
        .with_prompt("Target database")
        .items(&items)
        .default(default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    let Some(candidate) = wizard.candidates().get(choice).cloned() else {
        return Ok(Flow::Cancel);
    };
    if !candidate.selectable {
        println!(
            "{}",
            style(format!(
                "Engine mismatch: {} runs {}, the source runs {}",
                candidate.database.name,
                candidate.database.engine.label(),
                wizard.source().engine.label()
            ))
            .yellow()
        );
        return Ok(Flow::Stay);
    }
    wizard.dispatch(MigrateEvent::SelectTarget(candidate.database.id));
    wizard.dispatch(MigrateEvent::Continue);
    Ok(Flow::Stay)
}

fn strategy_step(wizard: &mut MigrateWizard, theme: &ColorfulTheme) -> Result<Flow> {
    let current = match wizard.step() {
        MigrateStep::StrategySelection { strategy, .. } => *strategy,
        _ => return Ok(Flow::Stay),
    };
    let mut items: Vec<String> = MigrationStrategy::ALL
        .iter()
        .map(|s| {
            format!(
                "{:<17} {:<12} {}",
                s.label(),
                style(format!("[{}]", s.tag())).cyan(),
                style(s.description()).dim()
            )
        })
        .collect();
    items.push(BACK.to_string());
    let default = MigrationStrategy::ALL
        .iter()
        .position(|s| *s == current)
        .unwrap_or(0);

    let Some(choice) = Select::with_theme(theme)
        .with_prompt("Migration strategy")
        .items(&items)
        .default(default)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    if choice == MigrationStrategy::ALL.len() {
        wizard.dispatch(MigrateEvent::Back);
        return Ok(Flow::Stay);
    }
    wizard.dispatch(MigrateEvent::SelectStrategy(MigrationStrategy::ALL[choice]));
    if let Some(caution) = wizard.step().caution() {
        println!("{}", style(format!("⚠ {}", caution)).yellow());
    }
    wizard.dispatch(MigrateEvent::Continue);
    Ok(Flow::Stay)
}

async fn options_step<G: DatabaseGateway + ?Sized>(
    wizard: &mut MigrateWizard,
    theme: &ColorfulTheme,
    gateway: &G,
) -> Result<Flow> {
    let options = match wizard.step() {
        MigrateStep::OptionsAndConfirm { options, .. } => options.clone(),
        _ => return Ok(Flow::Stay),
    };

    let tables: String = Input::with_theme(theme)
        .with_prompt("Tables/collections (comma-separated, empty for all)")
        .with_initial_text(options.tables.clone())
        .allow_empty(true)
        .interact_text()?;
    wizard.dispatch(MigrateEvent::SetTables(tables));

    let truncate = Confirm::with_theme(theme)
        .with_prompt("Truncate the target before migrating?")
        .default(options.truncate_target)
        .interact()?;
    wizard.dispatch(MigrateEvent::SetTruncate(truncate));

    let dry_run = Confirm::with_theme(theme)
        .with_prompt("Dry run (validate without writing)?")
        .default(options.dry_run)
        .interact()?;
    wizard.dispatch(MigrateEvent::SetDryRun(dry_run));

    if let Some(caution) = wizard.step().caution() {
        println!("{}", style(format!("⚠ {}", caution)).yellow());
    }
    if let Some(warning) = wizard.step().truncate_warning() {
        println!("{}", style(format!("⚠ {}", warning)).red().bold());
    }

    let submit = if dry_run {
        "Run Dry-Run"
    } else {
        "Start Migration"
    };
    let actions = [submit, "Edit options", BACK, CANCEL];
    let Some(action) = Select::with_theme(theme)
        .with_prompt("Confirm")
        .items(&actions)
        .default(0)
        .interact_opt()?
    else {
        return Ok(Flow::Cancel);
    };
    match action {
        0 => {
            with_spinner("Migrating…", wizard.submit(gateway)).await;
            if wizard.result().is_none() {
                if let Some(message) = wizard.error() {
                    print!("{}", style(report::render_failure(message)).red());
                }
            }
            Ok(Flow::Stay)
        }
        1 => Ok(Flow::Stay),
        2 => {
            wizard.dispatch(MigrateEvent::Back);
            Ok(Flow::Stay)
        }
        _ => Ok(Flow::Cancel),
    }
}
