// ABOUTME: Renders submission outcomes and instance listings as terminal text
// ABOUTME: Stateless; keyed only on the result or error handed to it

use std::fmt::Write;

use crate::catalogue::{EngineCatalogue, HardwarePlan};
use crate::remote::models::{
    DbBackup, DbCredential, DbMetric, ManagedDatabase, MigratedTables, MigrationResult,
    MigrationStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    DryRun,
    Failure,
}

impl Outcome {
    pub fn of(result: &MigrationResult) -> Self {
        match result.status {
            MigrationStatus::Failed => Outcome::Failure,
            _ if result.dry_run => Outcome::DryRun,
            _ => Outcome::Success,
        }
    }

    pub fn banner(&self) -> &'static str {
        match self {
            Outcome::Success => "✓ Migration Complete",
            Outcome::DryRun => "✓ Dry-Run Complete",
            Outcome::Failure => "✗ Migration Failed",
        }
    }
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_migration(result: &MigrationResult) -> String {
    let mut out = String::new();
    let outcome = Outcome::of(result);

    let _ = writeln!(out, "{}", outcome.banner());
    if !result.message.is_empty() {
        let _ = writeln!(out, "  {}", result.message);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Tables: {}   Rows: {}   Duration: {}s",
        result.tables_migrated,
        group_thousands(result.rows_migrated),
        result.duration_s
    );
    let _ = writeln!(
        out,
        "  {} → {}   [{}]",
        result.source.name,
        result.target.name,
        result.strategy.label()
    );
    if let MigratedTables::Listed(tables) = &result.tables {
        if !tables.is_empty() {
            let _ = writeln!(out, "  Tables: {}", tables.join(", "));
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Warnings:");
        for warning in &result.warnings {
            let _ = writeln!(out, "    ! {}", warning);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  Migration ID: {}", result.migration_id);
    out
}

/// Shown once after provisioning; the password is never retrievable again.
pub fn render_created(db: &ManagedDatabase, initial_password: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "✓ Database {} is being provisioned", db.name);
    let _ = writeln!(out, "  ID:       {}", db.id);
    let _ = writeln!(
        out,
        "  Engine:   {} {} ({})",
        db.engine.label(),
        db.version,
        db.tenancy_model.label()
    );
    let _ = writeln!(out, "  Region:   {} ({})", db.region, db.region.label());
    let _ = writeln!(out, "  Status:   {}", db.status);
    if !db.host.is_empty() {
        let _ = writeln!(out, "  Endpoint: {}:{}", db.host, port_or_dash(db.port));
    }
    if !initial_password.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Admin password: {}", initial_password);
        let _ = writeln!(
            out,
            "  Save it now. It will not be shown again; rotate credentials to get a new one."
        );
    }
    out
}

pub fn render_failure(message: &str) -> String {
    format!("✗ {}\n", message)
}

pub fn render_catalogue(catalogue: &EngineCatalogue) -> String {
    let mut out = String::new();
    for entry in catalogue.entries() {
        let _ = writeln!(
            out,
            "{:<12} {:<12} {:<12} {}",
            entry.engine.as_str(),
            entry.engine.category(),
            entry.versions.join(", "),
            entry.engine.description()
        );
    }
    out
}

pub fn render_plans(plans: &[HardwarePlan]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<14} {:>5} {:>8} {:>9} {:>9}",
        "ID", "PLAN", "vCPU", "MEMORY", "STORAGE", "$/HOUR"
    );
    for plan in plans {
        let _ = writeln!(
            out,
            "{:<12} {:<14} {:>5} {:>8} {:>6} GB {:>9.3}{}",
            plan.id,
            plan.label,
            plan.vcpus,
            plan.memory_display(),
            plan.storage_gb,
            plan.hourly_usd,
            if plan.recommended { "  (recommended)" } else { "" }
        );
    }
    out
}

pub fn render_instances(dbs: &[ManagedDatabase]) -> String {
    if dbs.is_empty() {
        return "No databases found.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<38} {:<20} {:<16} {:<13} {:<12}",
        "ID", "NAME", "ENGINE", "STATUS", "REGION"
    );
    for db in dbs {
        let _ = writeln!(
            out,
            "{:<38} {:<20} {:<16} {:<13} {:<12}",
            db.id,
            db.name,
            format!("{} {}", db.engine, db.version),
            db.status.as_str(),
            db.region.as_str()
        );
    }
    out
}

pub fn render_detail(db: &ManagedDatabase) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", db.name, db.id);
    let _ = writeln!(out, "  Engine:     {} {}", db.engine.label(), db.version);
    let _ = writeln!(out, "  Status:     {}", db.status);
    let _ = writeln!(out, "  Tenancy:    {}", db.tenancy_model.label());
    let _ = writeln!(
        out,
        "  Hardware:   {} vCPU / {} MB / {} GB, {} read replica(s)",
        db.vcpus, db.memory_mb, db.storage_gb, db.read_replicas
    );
    let _ = writeln!(out, "  Region:     {} ({})", db.region, db.region.label());
    if !db.host.is_empty() {
        let _ = writeln!(out, "  Endpoint:   {}:{}", db.host, port_or_dash(db.port));
    }
    let _ = writeln!(
        out,
        "  Security:   ssl={} public={}",
        on_off(db.ssl_enabled),
        on_off(db.publicly_accessible)
    );
    if !db.allowed_ips.is_empty() {
        let _ = writeln!(out, "  Allowed IPs: {}", db.allowed_ips.join(", "));
    }
    let _ = writeln!(
        out,
        "  Backups:    {} (retention {} days)",
        on_off(db.backup_enabled),
        db.backup_retention_days
    );
    if !db.hourly_cost_usd.is_empty() {
        let _ = writeln!(out, "  Cost:       ${}/hr", db.hourly_cost_usd);
    }
    if let Some(metric) = &db.latest_metric {
        out.push_str(&render_metric(metric));
    }
    out
}

pub fn render_credentials(creds: &[DbCredential]) -> String {
    let mut out = String::new();
    for cred in creds {
        let _ = writeln!(
            out,
            "{:<20} {:<10} {:<8} rotated {}",
            cred.username,
            cred.role,
            if cred.is_active { "active" } else { "disabled" },
            cred.last_rotated_at.as_deref().unwrap_or("never")
        );
    }
    out
}

pub fn render_backups(backups: &[DbBackup]) -> String {
    if backups.is_empty() {
        return "No backups.\n".to_string();
    }
    let mut out = String::new();
    for backup in backups {
        let _ = writeln!(
            out,
            "{:<38} {:<10} {:<10} {:>8.2} GB  {}",
            backup.backup_id,
            backup.backup_type,
            backup.status,
            backup.size_gb,
            backup.created_at.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn render_metric(metric: &DbMetric) -> String {
    fn pct(v: Option<f64>) -> String {
        v.map(|v| format!("{:.1}%", v)).unwrap_or_else(|| "-".into())
    }
    format!(
        "  CPU {}  MEM {}  conns {}  qps {}  latency {}\n",
        pct(metric.cpu_percent),
        pct(metric.memory_percent),
        metric
            .active_connections
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into()),
        metric
            .queries_per_second
            .map(|q| format!("{:.0}", q))
            .unwrap_or_else(|| "-".into()),
        metric
            .avg_query_latency_ms
            .map(|l| format!("{:.1}ms", l))
            .unwrap_or_else(|| "-".into()),
    )
}

fn port_or_dash(port: Option<u16>) -> String {
    port.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
