// ABOUTME: Migrate-database wizard: target -> strategy -> options & confirm
// ABOUTME: Filters same-engine targets, builds the MigrationRequest and keeps the result

use anyhow::Result;
use tracing::{debug, info, warn};

use super::session::{Session, Ticket};
use crate::error::display_message;
use crate::remote::models::{
    DatabaseRef, ManagedDatabase, MigrationRequest, MigrationResult, MigrationStrategy,
};
use crate::remote::DatabaseGateway;

const MIGRATE_FAILED: &str = "Migration failed. Please try again.";

/// An instance listed on the target step. Instances running another engine
/// are listed but cannot be picked.
#[derive(Debug, Clone)]
pub struct TargetCandidate {
    pub database: ManagedDatabase,
    pub selectable: bool,
}

/// Every instance except the source, flagged selectable iff it runs the same engine.
pub fn candidates(source: &DatabaseRef, all: Vec<ManagedDatabase>) -> Vec<TargetCandidate> {
    all.into_iter()
        .filter(|db| db.id != source.id)
        .map(|database| TargetCandidate {
            selectable: database.engine == source.engine,
            database,
        })
        .collect()
}

/// Splits the free-text table filter on commas. Empty means all tables.
pub fn parse_tables(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationOptions {
    pub tables: String,
    pub truncate_target: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrateStep {
    TargetSelection {
        target: Option<DatabaseRef>,
        strategy: MigrationStrategy,
        options: MigrationOptions,
    },
    StrategySelection {
        target: DatabaseRef,
        strategy: MigrationStrategy,
        options: MigrationOptions,
    },
    OptionsAndConfirm {
        target: DatabaseRef,
        strategy: MigrationStrategy,
        options: MigrationOptions,
    },
    Finished(MigrationResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrateEvent {
    SelectTarget(String),
    SelectStrategy(MigrationStrategy),
    SetTables(String),
    SetTruncate(bool),
    SetDryRun(bool),
    Continue,
    Back,
}

impl Default for MigrateStep {
    fn default() -> Self {
        MigrateStep::TargetSelection {
            target: None,
            strategy: MigrationStrategy::default(),
            options: MigrationOptions::default(),
        }
    }
}

impl MigrateStep {
    /// Position in the step indicator; `None` once a result is shown.
    pub fn index(&self) -> Option<usize> {
        match self {
            MigrateStep::TargetSelection { .. } => Some(0),
            MigrateStep::StrategySelection { .. } => Some(1),
            MigrateStep::OptionsAndConfirm { .. } => Some(2),
            MigrateStep::Finished(_) => None,
        }
    }

    pub fn can_continue(&self) -> bool {
        match self {
            MigrateStep::TargetSelection { target, .. } => target.is_some(),
            // A strategy is always selected; full copy is the default
            MigrateStep::StrategySelection { .. } => true,
            MigrateStep::OptionsAndConfirm { .. } => true,
            MigrateStep::Finished(_) => false,
        }
    }

    pub fn reduce(self, event: MigrateEvent, candidates: &[TargetCandidate]) -> Self {
        match (self, event) {
            (
                MigrateStep::TargetSelection {
                    target,
                    strategy,
                    options,
                },
                MigrateEvent::SelectTarget(id),
            ) => {
                let picked = candidates
                    .iter()
                    .find(|c| c.selectable && c.database.id == id)
                    .map(|c| DatabaseRef::from(&c.database));
                if picked.is_none() {
                    debug!(candidate = %id, "Target is not a compatible candidate");
                }
                MigrateStep::TargetSelection {
                    target: picked.or(target),
                    strategy,
                    options,
                }
            }

            (
                MigrateStep::TargetSelection {
                    target: Some(target),
                    strategy,
                    options,
                },
                MigrateEvent::Continue,
            ) => MigrateStep::StrategySelection {
                target,
                strategy,
                options,
            },

            (
                MigrateStep::StrategySelection {
                    target, options, ..
                },
                MigrateEvent::SelectStrategy(strategy),
            ) => MigrateStep::StrategySelection {
                target,
                strategy,
                options,
            },

            (
                MigrateStep::StrategySelection {
                    target,
                    strategy,
                    options,
                },
                MigrateEvent::Continue,
            ) => MigrateStep::OptionsAndConfirm {
                target,
                strategy,
                options,
            },

            (
                MigrateStep::StrategySelection {
                    target,
                    strategy,
                    options,
                },
                MigrateEvent::Back,
            ) => MigrateStep::TargetSelection {
                target: Some(target),
                strategy,
                options,
            },

            (
                MigrateStep::OptionsAndConfirm {
                    target,
                    strategy,
                    options,
                },
                MigrateEvent::Back,
            ) => MigrateStep::StrategySelection {
                target,
                strategy,
                options,
            },

            (
                MigrateStep::OptionsAndConfirm {
                    target,
                    strategy,
                    mut options,
                },
                event,
            ) => {
                match event {
                    MigrateEvent::SetTables(tables) => options.tables = tables,
                    MigrateEvent::SetTruncate(on) => options.truncate_target = on,
                    MigrateEvent::SetDryRun(on) => options.dry_run = on,
                    _ => {}
                }
                MigrateStep::OptionsAndConfirm {
                    target,
                    strategy,
                    options,
                }
            }

            (step, _) => step,
        }
    }

    /// The cautionary note for the chosen strategy, shown from the strategy
    /// step onwards.
    pub fn caution(&self) -> Option<&'static str> {
        match self {
            MigrateStep::StrategySelection { strategy, .. }
            | MigrateStep::OptionsAndConfirm { strategy, .. } => strategy.caution(),
            _ => None,
        }
    }

    /// Disclosure shown when the target will be truncated. Advisory only.
    pub fn truncate_warning(&self) -> Option<String> {
        match self {
            MigrateStep::OptionsAndConfirm {
                target, options, ..
            } if options.truncate_target => Some(format!(
                "All existing data in {} will be permanently deleted before migration.",
                target.name
            )),
            _ => None,
        }
    }

    pub fn migration_request(&self) -> Option<MigrationRequest> {
        match self {
            MigrateStep::OptionsAndConfirm {
                target,
                strategy,
                options,
            } => Some(MigrationRequest {
                target_id: target.id.clone(),
                strategy: *strategy,
                tables: parse_tables(&options.tables),
                truncate_target: options.truncate_target,
                dry_run: options.dry_run,
            }),
            _ => None,
        }
    }
}

pub struct MigrateWizard {
    source: DatabaseRef,
    candidates: Vec<TargetCandidate>,
    step: MigrateStep,
    session: Session,
    error: Option<String>,
}

impl MigrateWizard {
    pub fn new(source: DatabaseRef) -> Self {
        Self {
            source,
            candidates: Vec::new(),
            step: MigrateStep::default(),
            session: Session::default(),
            error: None,
        }
    }

    pub fn source(&self) -> &DatabaseRef {
        &self.source
    }

    pub fn candidates(&self) -> &[TargetCandidate] {
        &self.candidates
    }

    pub fn step(&self) -> &MigrateStep {
        &self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&MigrationResult> {
        match &self.step {
            MigrateStep::Finished(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.session.in_flight()
    }

    /// Hidden while a result is displayed; only Close is offered then.
    pub fn shows_step_indicator(&self) -> bool {
        self.step.index().is_some()
    }

    pub fn close(&mut self) {
        self.session.reset();
        self.step = MigrateStep::default();
        self.error = None;
    }

    /// Resets the wizard and returns the ticket for its target-list load.
    pub fn open_session(&mut self) -> Ticket {
        self.close();
        self.candidates.clear();
        self.session.ticket()
    }

    /// A failed load leaves an empty candidate list rather than blocking.
    pub fn apply_targets(&mut self, ticket: Ticket, fetched: Result<Vec<ManagedDatabase>>) {
        if !self.session.is_current(ticket) {
            debug!("Ignoring target list from a closed migrate wizard");
            return;
        }
        self.candidates = match fetched {
            Ok(all) => candidates(&self.source, all),
            Err(e) => {
                warn!(error = %e, "Could not load migration targets");
                Vec::new()
            }
        };
    }

    pub async fn open<G: DatabaseGateway + ?Sized>(&mut self, gateway: &G) {
        let ticket = self.open_session();
        let fetched = gateway.list_databases().await;
        self.apply_targets(ticket, fetched);
    }

    pub fn dispatch(&mut self, event: MigrateEvent) {
        if self.session.in_flight() {
            debug!(?event, "Migrate wizard busy, ignoring event");
            return;
        }
        let step = std::mem::take(&mut self.step);
        self.step = step.reduce(event, &self.candidates);
    }

    pub fn can_continue(&self) -> bool {
        matches!(self.step.index(), Some(0) | Some(1)) && self.step.can_continue()
    }

    pub fn can_confirm(&self) -> bool {
        !self.session.in_flight() && self.step.index() == Some(2)
    }

    pub fn begin_submit(&mut self) -> Option<(Ticket, MigrationRequest)> {
        if !self.can_confirm() {
            return None;
        }
        let request = self.step.migration_request()?;
        let ticket = self.session.begin()?;
        self.error = None;
        Some((ticket, request))
    }

    /// Stores the result (a "failed" status included) or records a
    /// transport error and stays on the confirm step for a retry.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<MigrationResult>) -> bool {
        if !self.session.settle(ticket, outcome.is_ok()) {
            return false;
        }
        match outcome {
            Ok(result) => {
                info!(
                    migration = %result.migration_id,
                    status = ?result.status,
                    dry_run = result.dry_run,
                    "Migration settled"
                );
                self.step = MigrateStep::Finished(result);
            }
            Err(e) => {
                warn!(error = %e, "Migration request failed");
                self.error = Some(display_message(&e, MIGRATE_FAILED));
            }
        }
        true
    }

    pub async fn submit<G: DatabaseGateway + ?Sized>(&mut self, gateway: &G) -> bool {
        let Some((ticket, request)) = self.begin_submit() else {
            return false;
        };
        let source_id = self.source.id.clone();
        let outcome = gateway.migrate_database(&source_id, &request).await;
        self.settle(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::DatabaseEngine;
    use crate::remote::fake::{instance, FakeGateway};
    use crate::remote::models::MigrationStatus;

    fn fleet() -> Vec<ManagedDatabase> {
        vec![
            instance("src", "cache-primary", DatabaseEngine::Redis),
            instance("r2", "cache-replica", DatabaseEngine::Redis),
            instance("m1", "documents", DatabaseEngine::Mongodb),
            instance("p1", "orders", DatabaseEngine::Postgresql),
        ]
    }

    fn source() -> DatabaseRef {
        DatabaseRef::from(&instance("src", "cache-primary", DatabaseEngine::Redis))
    }

    async fn opened(gateway: &FakeGateway) -> MigrateWizard {
        let mut wizard = MigrateWizard::new(source());
        wizard.open(gateway).await;
        wizard
    }

    #[test]
    fn test_candidate_set_is_same_engine_other_id() {
        let source = source();
        let listed = candidates(&source, fleet());
        assert_eq!(listed.len(), 3);
        for c in &listed {
            assert_ne!(c.database.id, source.id);
            assert_eq!(c.selectable, c.database.engine == source.engine);
        }
        let selectable: Vec<_> = listed
            .iter()
            .filter(|c| c.selectable)
            .map(|c| c.database.id.as_str())
            .collect();
        assert_eq!(selectable, vec!["r2"]);
    }

    #[test]
    fn test_parse_tables() {
        assert_eq!(parse_tables(" users, orders ,,  "), vec!["users", "orders"]);
        assert!(parse_tables("").is_empty());
        assert!(parse_tables(" , ").is_empty());
    }

    #[test]
    fn test_incompatible_target_is_listed_but_not_selectable() {
        let listed = candidates(&source(), fleet());
        assert!(listed.iter().any(|c| c.database.id == "m1" && !c.selectable));

        let step = MigrateStep::default().reduce(MigrateEvent::SelectTarget("m1".into()), &listed);
        assert!(!step.can_continue());
        let step = step.reduce(MigrateEvent::Continue, &listed);
        assert_eq!(step.index(), Some(0));

        // Unknown ids and the source itself are rejected too
        let step = step
            .reduce(MigrateEvent::SelectTarget("src".into()), &listed)
            .reduce(MigrateEvent::SelectTarget("nope".into()), &listed);
        assert!(!step.can_continue());
    }

    #[tokio::test]
    async fn test_incremental_caution_before_options() {
        let gateway = FakeGateway {
            databases: fleet(),
            ..FakeGateway::default()
        };
        let mut wizard = opened(&gateway).await;
        wizard.dispatch(MigrateEvent::SelectTarget("r2".into()));
        assert!(wizard.step().caution().is_none());
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::SelectStrategy(MigrationStrategy::Incremental));
        assert_eq!(wizard.step().index(), Some(1));
        assert!(wizard.step().caution().unwrap().contains("WAL"));

        // No acknowledgement is needed to go on and submit
        wizard.dispatch(MigrateEvent::Continue);
        assert!(wizard.can_confirm());
        assert!(wizard.submit(&gateway).await);
        assert_eq!(
            wizard.result().unwrap().strategy,
            MigrationStrategy::Incremental
        );
    }

    #[tokio::test]
    async fn test_truncate_with_dry_run_still_submits() {
        let gateway = FakeGateway {
            databases: fleet(),
            ..FakeGateway::default()
        };
        let mut wizard = opened(&gateway).await;
        wizard.dispatch(MigrateEvent::SelectTarget("r2".into()));
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::SetTables("sessions, carts".into()));
        wizard.dispatch(MigrateEvent::SetTruncate(true));
        wizard.dispatch(MigrateEvent::SetDryRun(true));

        let warning = wizard.step().truncate_warning().unwrap();
        assert!(warning.contains("cache-replica"));

        assert!(wizard.submit(&gateway).await);
        let sent = gateway.migrations.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "src");
        assert_eq!(
            sent[0].1,
            MigrationRequest {
                target_id: "r2".into(),
                strategy: MigrationStrategy::FullCopy,
                tables: vec!["sessions".into(), "carts".into()],
                truncate_target: true,
                dry_run: true,
            }
        );

        let result = wizard.result().unwrap();
        assert!(result.dry_run);
        assert_eq!(result.status, MigrationStatus::Simulated);
        assert!(!wizard.shows_step_indicator());
        assert!(!wizard.can_confirm());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_selections_for_retry() {
        let gateway = FakeGateway {
            databases: fleet(),
            migrate_fail: true,
            ..FakeGateway::default()
        };
        let mut wizard = opened(&gateway).await;
        wizard.dispatch(MigrateEvent::SelectTarget("r2".into()));
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::SelectStrategy(MigrationStrategy::SchemaOnly));
        wizard.dispatch(MigrateEvent::Continue);

        assert!(wizard.submit(&gateway).await);
        assert_eq!(wizard.step().index(), Some(2));
        assert_eq!(
            wizard.error(),
            Some("Target database must be running to accept a migration.")
        );
        assert!(wizard.can_confirm());
        let retry = wizard.step().migration_request().unwrap();
        assert_eq!(retry.strategy, MigrationStrategy::SchemaOnly);
        assert_eq!(retry.target_id, "r2");
    }

    #[tokio::test]
    async fn test_failed_list_gives_empty_candidates() {
        let gateway = FakeGateway {
            databases: fleet(),
            list_fail: true,
            ..FakeGateway::default()
        };
        let wizard = opened(&gateway).await;
        assert!(wizard.candidates().is_empty());
        assert_eq!(wizard.step().index(), Some(0));
    }

    #[tokio::test]
    async fn test_reopen_clears_result_and_error() {
        let gateway = FakeGateway {
            databases: fleet(),
            ..FakeGateway::default()
        };
        let mut wizard = opened(&gateway).await;
        wizard.dispatch(MigrateEvent::SelectTarget("r2".into()));
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::Continue);
        assert!(wizard.submit(&gateway).await);
        assert!(wizard.result().is_some());

        wizard.open(&gateway).await;
        assert_eq!(wizard.step(), &MigrateStep::default());
        assert!(wizard.result().is_none());
        assert!(wizard.error().is_none());
        assert_eq!(wizard.candidates().len(), 3);
    }

    #[tokio::test]
    async fn test_late_result_after_close_is_ignored() {
        let gateway = FakeGateway {
            databases: fleet(),
            ..FakeGateway::default()
        };
        let mut wizard = opened(&gateway).await;
        wizard.dispatch(MigrateEvent::SelectTarget("r2".into()));
        wizard.dispatch(MigrateEvent::Continue);
        wizard.dispatch(MigrateEvent::Continue);

        let (ticket, request) = wizard.begin_submit().unwrap();
        let pending = gateway.migrate_database("src", &request);
        wizard.close();
        let late = pending.await;

        assert!(!wizard.settle(ticket, late));
        assert!(wizard.result().is_none());
        assert_eq!(wizard.step().index(), Some(0));
    }

    #[tokio::test]
    async fn test_stale_target_list_is_ignored() {
        let gateway = FakeGateway {
            databases: fleet(),
            ..FakeGateway::default()
        };
        let mut wizard = MigrateWizard::new(source());
        let old = wizard.open_session();
        let fresh = wizard.open_session();
        wizard.apply_targets(old, gateway.list_databases().await);
        assert!(wizard.candidates().is_empty());
        wizard.apply_targets(fresh, gateway.list_databases().await);
        assert_eq!(wizard.candidates().len(), 3);
    }
}
