// ABOUTME: Command-line interface definition
// ABOUTME: Global connection flags plus one subcommand per console operation

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "atonix-dbctl")]
#[command(about = "Provision, migrate and manage AtonixCorp managed databases", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./atonix.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the database service API
    #[arg(long, global = true, env = "ATONIX_API_URL")]
    pub api_url: Option<String>,

    /// API token sent as `Authorization: Token <token>`
    #[arg(long, global = true, env = "ATONIX_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported engines and versions
    Engines,
    /// Show the hardware plans and their hourly price
    Plans,
    /// List the regions databases can be deployed to
    Regions,
    /// List your databases
    List,
    /// Show one database with its credentials and backups
    Show { id: String },
    /// Deploy a new managed database
    Create(CreateArgs),
    /// Copy data from one database into another of the same engine
    Migrate(MigrateArgs),
    /// Delete a database
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Restart a database
    Restart { id: String },
    /// Change the hardware allocation of a database
    Scale(ScaleArgs),
    /// List database users
    Credentials { id: String },
    /// Generate a new password for a database user
    Rotate {
        id: String,
        /// User to rotate (the service defaults to the admin user)
        #[arg(long)]
        username: Option<String>,
    },
    /// List backups
    Backups { id: String },
    /// Start a backup
    Backup {
        id: String,
        #[arg(long = "type", default_value = "manual")]
        backup_type: String,
    },
    /// Restore a database from one of its backups
    Restore { id: String, backup_id: String },
    /// Show recent metric snapshots
    Metrics { id: String },
}

/// Without `--engine`, `--plan` and `--name` the wizard runs interactively.
#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    #[arg(long)]
    pub engine: Option<String>,
    /// Engine version (defaults to the newest the catalogue offers)
    #[arg(long = "engine-version")]
    pub engine_version: Option<String>,
    /// Plan id: starter, basic, standard, pro, enterprise
    #[arg(long)]
    pub plan: Option<String>,
    /// shared, dedicated or cluster
    #[arg(long)]
    pub tenancy: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    /// Instance name (at least 3 characters)
    #[arg(long)]
    pub name: Option<String>,
    /// Initial database name (defaults to "atonix")
    #[arg(long)]
    pub database_name: Option<String>,
    #[arg(long)]
    pub no_ssl: bool,
    #[arg(long)]
    pub public: bool,
    #[arg(long)]
    pub no_backup: bool,
    #[arg(long)]
    pub retention_days: Option<u32>,
}

impl CreateArgs {
    pub fn is_scripted(&self) -> bool {
        self.engine.is_some() && self.plan.is_some() && self.name.is_some()
    }
}

/// Without `--target` the wizard runs interactively.
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Source database id
    pub source: String,
    /// Target database id (must run the same engine)
    #[arg(long)]
    pub target: Option<String>,
    /// full_copy, schema_only, data_only or incremental
    #[arg(long)]
    pub strategy: Option<String>,
    /// Comma-separated tables/collections; empty means all
    #[arg(long)]
    pub tables: Option<String>,
    /// Delete all data on the target before writing
    #[arg(long)]
    pub truncate: bool,
    /// Validate and report without writing any data
    #[arg(long)]
    pub dry_run: bool,
    /// Skip the truncate confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ScaleArgs {
    pub id: String,
    #[arg(long)]
    pub vcpus: Option<u32>,
    #[arg(long)]
    pub memory_mb: Option<u32>,
    #[arg(long)]
    pub storage_gb: Option<u32>,
    #[arg(long)]
    pub read_replicas: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scripted_migrate() {
        let cli = Cli::parse_from([
            "atonix-dbctl",
            "migrate",
            "src-1",
            "--target",
            "tgt-2",
            "--strategy",
            "schema_only",
            "--truncate",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Migrate(args) => {
                assert_eq!(args.source, "src-1");
                assert_eq!(args.target.as_deref(), Some("tgt-2"));
                assert!(args.truncate && args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_is_scripted_only_with_required_flags() {
        let cli = Cli::parse_from([
            "atonix-dbctl",
            "create",
            "--engine",
            "postgresql",
            "--plan",
            "standard",
        ]);
        match cli.command {
            Commands::Create(args) => assert!(!args.is_scripted()),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
