// ABOUTME: Executes parsed CLI commands against the database service
// ABOUTME: Scripted wizard runs feed flags through the same state machines as the prompts

use anyhow::{Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::catalogue::{find_plan, DatabaseEngine, EngineCatalogue, Region, TenancyModel, PLANS};
use crate::cli::{Cli, Commands, CreateArgs, MigrateArgs, ScaleArgs};
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::interactive;
use crate::remote::models::{DatabaseRef, MigrationStrategy, ScaleRequest};
use crate::remote::{DatabaseClient, DatabaseGateway};
use crate::report;
use crate::wizard::{CreateEvent, CreateStep, CreateWizard, MigrateEvent, MigrateWizard};

/// Runs `fut` behind a terminal spinner.
pub async fn with_spinner<F: Future>(message: &'static str, fut: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let output = fut.await;
    spinner.finish_and_clear();
    output
}

pub async fn run(cli: Cli, config: ConsoleConfig) -> Result<()> {
    let client = DatabaseClient::from_config(&config)?;

    match cli.command {
        Commands::Engines => {
            let catalogue = match client.list_engines().await {
                Ok(entries) if !entries.is_empty() => EngineCatalogue::new(entries),
                Ok(_) | Err(_) => {
                    eprintln!("Engine catalogue unavailable, showing built-in list");
                    EngineCatalogue::new(config.fallback_engines.clone())
                }
            };
            print!("{}", report::render_catalogue(&catalogue));
        }
        Commands::Plans => print!("{}", report::render_plans(&PLANS)),
        Commands::Regions => {
            for region in client.list_regions().await? {
                println!("{:<12} {}", region.region, region.label);
            }
        }
        Commands::List => {
            let dbs = client.list_databases().await?;
            print!("{}", report::render_instances(&dbs));
        }
        Commands::Show { id } => {
            let db = client.get_database(&id).await?;
            print!("{}", report::render_detail(&db));
            if !db.credentials.is_empty() {
                println!("\nCredentials:");
                print!("{}", report::render_credentials(&db.credentials));
            }
            if !db.backups.is_empty() {
                println!("\nBackups:");
                print!("{}", report::render_backups(&db.backups));
            }
        }
        Commands::Create(args) => create(&client, &config, &args).await?,
        Commands::Migrate(args) => migrate(&client, &args).await?,
        Commands::Delete { id, yes } => {
            let db = client.get_database(&id).await?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!(
                        "Delete database {} ({})? This cannot be undone",
                        db.name, db.id
                    ))
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
            client.delete_database(&id).await?;
            println!("Database {} deleted.", db.name);
        }
        Commands::Restart { id } => {
            let response = client.restart_database(&id).await?;
            println!("{}", response.message);
        }
        Commands::Scale(args) => scale(&client, args).await?,
        Commands::Credentials { id } => {
            let creds = client.list_credentials(&id).await?;
            print!("{}", report::render_credentials(&creds));
        }
        Commands::Rotate { id, username } => {
            let rotated = client.rotate_credential(&id, username.as_deref()).await?;
            println!("{}", rotated.message);
            println!("New password for {}: {}", rotated.username, rotated.password);
        }
        Commands::Backups { id } => {
            let backups = client.list_backups(&id).await?;
            print!("{}", report::render_backups(&backups));
        }
        Commands::Backup { id, backup_type } => {
            let backup = client.create_backup(&id, &backup_type).await?;
            println!("Backup {} started ({})", backup.backup_id, backup.status);
        }
        Commands::Restore { id, backup_id } => {
            let response = client.restore_backup(&id, &backup_id).await?;
            println!("{}", response.message);
        }
        Commands::Metrics { id } => {
            for metric in client.list_metrics(&id).await? {
                print!(
                    "{}{}",
                    metric.created_at.as_deref().unwrap_or("-"),
                    report::render_metric(&metric)
                );
            }
        }
    }

    Ok(())
}

async fn create(client: &DatabaseClient, config: &ConsoleConfig, args: &CreateArgs) -> Result<()> {
    let mut wizard = CreateWizard::new(config.fallback_engines.clone(), config.default_region);
    wizard.open(client).await;

    if !args.is_scripted() {
        return interactive::create(&mut wizard, client).await;
    }

    apply_create_args(&mut wizard, args)?;
    match with_spinner("Deploying database…", wizard.submit(client)).await {
        Some(created) => {
            let password = created.initial_secret.reveal();
            print!("{}", report::render_created(&created.database, &password));
            Ok(())
        }
        None => {
            let message = wizard.error().unwrap_or("Failed to create database.");
            anyhow::bail!(message.to_string())
        }
    }
}

/// Walks the create wizard through its three steps from command-line flags,
/// reporting the first gate that does not hold.
pub fn apply_create_args(wizard: &mut CreateWizard, args: &CreateArgs) -> Result<()> {
    let engine: DatabaseEngine = args
        .engine
        .as_deref()
        .context("--engine is required")?
        .parse()?;
    wizard.dispatch(CreateEvent::SelectEngine(engine));
    if let Some(version) = &args.engine_version {
        wizard.dispatch(CreateEvent::SelectVersion(version.clone()));
        let selected = match wizard.step() {
            CreateStep::EngineSelection { version, .. } => version.clone(),
            _ => None,
        };
        if selected.as_deref() != Some(version.as_str()) {
            return Err(ConsoleError::Validation(format!(
                "version {} is not offered for {}",
                version, engine
            ))
            .into());
        }
    }
    if !wizard.can_continue() {
        return Err(
            ConsoleError::Validation(format!("engine {} is not currently offered", engine)).into(),
        );
    }
    wizard.dispatch(CreateEvent::Continue);

    let plan_id = args.plan.as_deref().context("--plan is required")?;
    let plan = find_plan(plan_id).ok_or_else(|| {
        let ids: Vec<&str> = PLANS.iter().map(|p| p.id).collect();
        ConsoleError::Validation(format!(
            "unknown plan '{}', choose one of: {}",
            plan_id,
            ids.join(", ")
        ))
    })?;
    wizard.dispatch(CreateEvent::SelectPlan(plan));
    if let Some(tenancy) = &args.tenancy {
        wizard.dispatch(CreateEvent::SelectTenancy(tenancy.parse::<TenancyModel>()?));
    }
    wizard.dispatch(CreateEvent::Continue);

    wizard.dispatch(CreateEvent::SetName(args.name.clone().unwrap_or_default()));
    if let Some(name) = &args.database_name {
        wizard.dispatch(CreateEvent::SetDatabaseName(name.clone()));
    }
    if let Some(region) = &args.region {
        wizard.dispatch(CreateEvent::SetRegion(region.parse::<Region>()?));
    }
    wizard.dispatch(CreateEvent::SetSsl(!args.no_ssl));
    wizard.dispatch(CreateEvent::SetPublicAccess(args.public));
    wizard.dispatch(CreateEvent::SetBackup(!args.no_backup));
    if let Some(days) = args.retention_days {
        wizard.dispatch(CreateEvent::SetRetentionDays(days));
    }

    if !wizard.can_confirm() {
        return Err(ConsoleError::Validation(
            "instance name must be at least 3 characters".to_string(),
        )
        .into());
    }
    Ok(())
}

async fn migrate(client: &DatabaseClient, args: &MigrateArgs) -> Result<()> {
    let source = client
        .get_database(&args.source)
        .await
        .context("Failed to load the source database")?;
    let mut wizard = MigrateWizard::new(DatabaseRef::from(&source));
    wizard.open(client).await;

    if args.target.is_none() {
        return interactive::migrate(&mut wizard, client).await;
    }

    apply_migrate_args(&mut wizard, args)?;
    if let Some(caution) = wizard.step().caution() {
        eprintln!("⚠ {}", caution);
    }
    if let Some(warning) = wizard.step().truncate_warning() {
        eprintln!("⚠ {}", warning);
        if !args.yes
            && !Confirm::new()
                .with_prompt("Continue?")
                .default(false)
                .interact()?
        {
            wizard.close();
            println!("Cancelled");
            return Ok(());
        }
    }

    info!(source = %wizard.source().id, "Running scripted migration");
    with_spinner("Migrating…", wizard.submit(client)).await;
    match wizard.result() {
        Some(result) => {
            print!("{}", report::render_migration(result));
            Ok(())
        }
        None => {
            let message = wizard.error().unwrap_or("Migration failed.");
            anyhow::bail!(message.to_string())
        }
    }
}

pub fn apply_migrate_args(wizard: &mut MigrateWizard, args: &MigrateArgs) -> Result<()> {
    let target = args.target.as_deref().context("--target is required")?;
    wizard.dispatch(MigrateEvent::SelectTarget(target.to_string()));
    if !wizard.can_continue() {
        let source = wizard.source();
        let reason = match wizard.candidates().iter().find(|c| c.database.id == target) {
            Some(c) => format!(
                "Engine mismatch: cannot migrate from {} to {}",
                source.engine, c.database.engine
            ),
            None if target == source.id => {
                "Source and target databases must be different".to_string()
            }
            None => format!("Target database {} not found", target),
        };
        return Err(ConsoleError::Validation(reason).into());
    }
    wizard.dispatch(MigrateEvent::Continue);

    let strategy = match &args.strategy {
        Some(s) => s.parse::<MigrationStrategy>()?,
        None => MigrationStrategy::default(),
    };
    wizard.dispatch(MigrateEvent::SelectStrategy(strategy));
    wizard.dispatch(MigrateEvent::Continue);

    wizard.dispatch(MigrateEvent::SetTables(args.tables.clone().unwrap_or_default()));
    wizard.dispatch(MigrateEvent::SetTruncate(args.truncate));
    wizard.dispatch(MigrateEvent::SetDryRun(args.dry_run));
    Ok(())
}

async fn scale(client: &DatabaseClient, args: ScaleArgs) -> Result<()> {
    let spec = ScaleRequest {
        vcpus: args.vcpus,
        memory_mb: args.memory_mb,
        storage_gb: args.storage_gb,
        read_replicas: args.read_replicas,
    };
    if spec.is_empty() {
        return Err(ConsoleError::Validation(
            "nothing to scale: pass --vcpus, --memory-mb, --storage-gb or --read-replicas".into(),
        )
        .into());
    }
    let db = with_spinner("Scaling…", client.scale_database(&args.id, &spec)).await?;
    print!("{}", report::render_detail(&db));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::fallback_engines;
    use crate::remote::fake::{instance, FakeGateway};

    fn scripted_create() -> CreateArgs {
        CreateArgs {
            engine: Some("postgresql".into()),
            engine_version: Some("15".into()),
            plan: Some("standard".into()),
            region: Some("eu-west-1".into()),
            name: Some("orders-db".into()),
            ..CreateArgs::default()
        }
    }

    #[test]
    fn test_scripted_create_reaches_confirmation() {
        let mut wizard = CreateWizard::new(fallback_engines(), Region::AfSouth1);
        apply_create_args(&mut wizard, &scripted_create()).unwrap();
        let (_, request) = wizard.begin_submit().unwrap();
        assert_eq!(request.region, Region::EuWest1);
        assert_eq!(request.database_name, "atonix");
        assert_eq!(request.vcpus(), 4);
    }

    #[test]
    fn test_scripted_create_reports_failed_gate() {
        let mut wizard = CreateWizard::new(fallback_engines(), Region::AfSouth1);
        let args = CreateArgs {
            engine_version: Some("7.2".into()),
            ..scripted_create()
        };
        let err = apply_create_args(&mut wizard, &args).unwrap_err();
        assert!(err.to_string().contains("version 7.2 is not offered"));

        let mut wizard = CreateWizard::new(fallback_engines(), Region::AfSouth1);
        let args = CreateArgs {
            name: Some("ab".into()),
            ..scripted_create()
        };
        let err = apply_create_args(&mut wizard, &args).unwrap_err();
        assert!(err.to_string().contains("at least 3 characters"));

        let mut wizard = CreateWizard::new(fallback_engines(), Region::AfSouth1);
        let args = CreateArgs {
            plan: Some("mega".into()),
            ..scripted_create()
        };
        assert!(apply_create_args(&mut wizard, &args).is_err());
    }

    #[tokio::test]
    async fn test_scripted_migrate_rejects_other_engine() {
        let gateway = FakeGateway {
            databases: vec![
                instance("src", "cache", DatabaseEngine::Redis),
                instance("m1", "docs", DatabaseEngine::Mongodb),
            ],
            ..FakeGateway::default()
        };
        let source = instance("src", "cache", DatabaseEngine::Redis);
        let mut wizard = MigrateWizard::new(DatabaseRef::from(&source));
        wizard.open(&gateway).await;

        let args = MigrateArgs {
            source: "src".into(),
            target: Some("m1".into()),
            ..MigrateArgs::default()
        };
        let err = apply_migrate_args(&mut wizard, &args).unwrap_err();
        assert!(err.to_string().contains("Engine mismatch"));
        assert!(gateway.migrations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_migrate_builds_request() {
        let gateway = FakeGateway {
            databases: vec![
                instance("src", "orders", DatabaseEngine::Mysql),
                instance("t1", "orders-copy", DatabaseEngine::Mysql),
            ],
            ..FakeGateway::default()
        };
        let source = instance("src", "orders", DatabaseEngine::Mysql);
        let mut wizard = MigrateWizard::new(DatabaseRef::from(&source));
        wizard.open(&gateway).await;

        let args = MigrateArgs {
            source: "src".into(),
            target: Some("t1".into()),
            strategy: Some("data_only".into()),
            tables: Some("users,orders".into()),
            truncate: true,
            dry_run: false,
            yes: true,
        };
        apply_migrate_args(&mut wizard, &args).unwrap();
        assert!(wizard.step().truncate_warning().is_some());
        assert!(wizard.submit(&gateway).await);

        let result = wizard.result().unwrap();
        assert_eq!(result.strategy, MigrationStrategy::DataOnly);
        assert!(!result.dry_run);
        assert_eq!(result.warnings.len(), 1);
    }
}
