// ABOUTME: Create-database wizard: engine -> plan -> configuration
// ABOUTME: Gates each step, builds the CreationRequest and applies the creation outcome

use anyhow::Result;
use tracing::{debug, info, warn};

use super::session::{Session, Ticket};
use crate::catalogue::{
    DatabaseEngine, EngineCatalogue, EngineVersions, HardwarePlan, Region, TenancyModel,
};
use crate::error::display_message;
use crate::remote::models::{CreationRequest, ManagedDatabase};
use crate::remote::{DatabaseGateway, InitialSecret};

pub const DEFAULT_DATABASE_NAME: &str = "atonix";
pub const MIN_NAME_LEN: usize = 3;
pub const RETENTION_DAYS: std::ops::RangeInclusive<u32> = 1..=35;
const CREATE_FAILED: &str = "Failed to create database. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineChoice {
    pub engine: DatabaseEngine,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDraft {
    pub name: String,
    /// Blank means [`DEFAULT_DATABASE_NAME`].
    pub database_name: String,
    pub region: Region,
    pub ssl_enabled: bool,
    pub publicly_accessible: bool,
    pub backup_enabled: bool,
    pub backup_retention_days: u32,
}

impl ConfigDraft {
    pub fn new(region: Region) -> Self {
        Self {
            name: String::new(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            region,
            ssl_enabled: true,
            publicly_accessible: false,
            backup_enabled: true,
            backup_retention_days: 7,
        }
    }
}

/// Selections made on later steps, kept while the user is back on step 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LaterSteps {
    pub plan: Option<&'static HardwarePlan>,
    pub tenancy: TenancyModel,
    pub config: ConfigDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateStep {
    EngineSelection {
        engine: Option<DatabaseEngine>,
        version: Option<String>,
        later: LaterSteps,
    },
    PlanSelection {
        engine: EngineChoice,
        plan: Option<&'static HardwarePlan>,
        tenancy: TenancyModel,
        config: ConfigDraft,
    },
    Configuration {
        engine: EngineChoice,
        plan: &'static HardwarePlan,
        tenancy: TenancyModel,
        config: ConfigDraft,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateEvent {
    SelectEngine(DatabaseEngine),
    SelectVersion(String),
    SelectPlan(&'static HardwarePlan),
    SelectTenancy(TenancyModel),
    SetName(String),
    SetDatabaseName(String),
    SetRegion(Region),
    SetSsl(bool),
    SetPublicAccess(bool),
    SetBackup(bool),
    SetRetentionDays(u32),
    Continue,
    Back,
}

/// Step 0 gate: an engine plus one of that engine's own versions.
pub fn engine_gate(catalogue: &EngineCatalogue, engine: Option<DatabaseEngine>, version: Option<&str>) -> bool {
    match (engine, version) {
        (Some(engine), Some(version)) => catalogue.supports(engine, version),
        _ => false,
    }
}

/// Step 2 gate on the instance name.
pub fn name_gate(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_LEN
}

impl CreateStep {
    pub fn initial(region: Region) -> Self {
        CreateStep::EngineSelection {
            engine: None,
            version: None,
            later: LaterSteps {
                plan: None,
                tenancy: TenancyModel::Shared,
                config: ConfigDraft::new(region),
            },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            CreateStep::EngineSelection { .. } => 0,
            CreateStep::PlanSelection { .. } => 1,
            CreateStep::Configuration { .. } => 2,
        }
    }

    pub fn can_continue(&self, catalogue: &EngineCatalogue) -> bool {
        match self {
            CreateStep::EngineSelection {
                engine, version, ..
            } => engine_gate(catalogue, *engine, version.as_deref()),
            CreateStep::PlanSelection { plan, .. } => plan.is_some(),
            CreateStep::Configuration { config, .. } => name_gate(&config.name),
        }
    }

    pub fn reduce(self, event: CreateEvent, catalogue: &EngineCatalogue) -> Self {
        match (self, event) {
            (
                CreateStep::EngineSelection {
                    engine: current,
                    version,
                    later,
                },
                CreateEvent::SelectEngine(engine),
            ) => match catalogue.versions(engine) {
                Some(entry) => {
                    let version = if current == Some(engine) {
                        version
                    } else {
                        entry.default_version().map(str::to_string)
                    };
                    CreateStep::EngineSelection {
                        engine: Some(engine),
                        version,
                        later,
                    }
                }
                None => CreateStep::EngineSelection {
                    engine: current,
                    version,
                    later,
                },
            },

            (
                CreateStep::EngineSelection {
                    engine: Some(engine),
                    version: current,
                    later,
                },
                CreateEvent::SelectVersion(version),
            ) => {
                let version = if catalogue.supports(engine, &version) {
                    Some(version)
                } else {
                    current
                };
                CreateStep::EngineSelection {
                    engine: Some(engine),
                    version,
                    later,
                }
            }

            (
                step @ CreateStep::EngineSelection { .. },
                CreateEvent::Continue,
            ) => {
                if !step.can_continue(catalogue) {
                    return step;
                }
                match step {
                    CreateStep::EngineSelection {
                        engine: Some(engine),
                        version: Some(version),
                        later,
                    } => CreateStep::PlanSelection {
                        engine: EngineChoice { engine, version },
                        plan: later.plan,
                        tenancy: later.tenancy,
                        config: later.config,
                    },
                    other => other,
                }
            }

            (
                CreateStep::PlanSelection {
                    engine,
                    tenancy,
                    config,
                    ..
                },
                CreateEvent::SelectPlan(plan),
            ) => CreateStep::PlanSelection {
                engine,
                plan: Some(plan),
                tenancy,
                config,
            },

            (
                CreateStep::PlanSelection {
                    engine,
                    plan,
                    config,
                    ..
                },
                CreateEvent::SelectTenancy(tenancy),
            ) => CreateStep::PlanSelection {
                engine,
                plan,
                tenancy,
                config,
            },

            (
                CreateStep::PlanSelection {
                    engine,
                    plan: Some(plan),
                    tenancy,
                    config,
                },
                CreateEvent::Continue,
            ) => CreateStep::Configuration {
                engine,
                plan,
                tenancy,
                config,
            },

            (
                CreateStep::PlanSelection {
                    engine,
                    plan,
                    tenancy,
                    config,
                },
                CreateEvent::Back,
            ) => CreateStep::EngineSelection {
                engine: Some(engine.engine),
                version: Some(engine.version),
                later: LaterSteps {
                    plan,
                    tenancy,
                    config,
                },
            },

            (
                CreateStep::Configuration {
                    engine,
                    plan,
                    tenancy,
                    config,
                },
                CreateEvent::Back,
            ) => CreateStep::PlanSelection {
                engine,
                plan: Some(plan),
                tenancy,
                config,
            },

            (
                CreateStep::Configuration {
                    engine,
                    plan,
                    tenancy,
                    mut config,
                },
                event,
            ) => {
                match event {
                    CreateEvent::SetName(name) => config.name = name,
                    CreateEvent::SetDatabaseName(name) => config.database_name = name,
                    CreateEvent::SetRegion(region) => config.region = region,
                    CreateEvent::SetSsl(on) => config.ssl_enabled = on,
                    CreateEvent::SetPublicAccess(on) => config.publicly_accessible = on,
                    CreateEvent::SetBackup(on) => config.backup_enabled = on,
                    CreateEvent::SetRetentionDays(days) => {
                        config.backup_retention_days =
                            days.clamp(*RETENTION_DAYS.start(), *RETENTION_DAYS.end())
                    }
                    // Continue on the last step is a submission, not a transition
                    _ => {}
                }
                CreateStep::Configuration {
                    engine,
                    plan,
                    tenancy,
                    config,
                }
            }

            (step, _) => step,
        }
    }

    /// Builds the provisioning payload. Only the final step can produce one.
    pub fn creation_request(&self) -> Option<CreationRequest> {
        let CreateStep::Configuration {
            engine,
            plan,
            tenancy,
            config,
        } = self
        else {
            return None;
        };
        if !name_gate(&config.name) {
            return None;
        }

        let database_name = match config.database_name.trim() {
            "" => DEFAULT_DATABASE_NAME.to_string(),
            name => name.to_string(),
        };
        let mut request = CreationRequest::new(
            config.name.trim().to_string(),
            engine.engine,
            engine.version.clone(),
            *tenancy,
            plan,
            config.region,
            database_name,
        );
        request.ssl_enabled = config.ssl_enabled;
        request.publicly_accessible = config.publicly_accessible;
        request.backup_enabled = config.backup_enabled;
        request.backup_retention_days = config.backup_retention_days;
        Some(request)
    }
}

/// A successful creation. The secret is handed out once, to whoever takes it.
#[derive(Debug)]
pub struct CreatedDatabase {
    pub database: ManagedDatabase,
    pub initial_secret: InitialSecret,
}

pub struct CreateWizard {
    fallback: Vec<EngineVersions>,
    default_region: Region,
    catalogue: EngineCatalogue,
    step: CreateStep,
    session: Session,
    error: Option<String>,
}

impl CreateWizard {
    pub fn new(fallback: Vec<EngineVersions>, default_region: Region) -> Self {
        Self {
            catalogue: EngineCatalogue::new(fallback.clone()),
            fallback,
            default_region,
            step: CreateStep::initial(default_region),
            session: Session::default(),
            error: None,
        }
    }

    pub fn step(&self) -> &CreateStep {
        &self.step
    }

    pub fn catalogue(&self) -> &EngineCatalogue {
        &self.catalogue
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.session.in_flight()
    }

    /// Cancel or dismiss. Discards all input; any pending call becomes stale.
    pub fn close(&mut self) {
        self.session.reset();
        self.step = CreateStep::initial(self.default_region);
        self.error = None;
    }

    /// Resets the wizard and returns the ticket for its catalogue refresh.
    pub fn open_session(&mut self) -> Ticket {
        self.close();
        self.session.ticket()
    }

    /// Installs a fetched catalogue, falling back to the configured list when
    /// the fetch failed or came back empty.
    pub fn apply_catalogue(&mut self, ticket: Ticket, fetched: Result<Vec<EngineVersions>>) {
        if !self.session.is_current(ticket) {
            debug!("Ignoring catalogue from a closed create wizard");
            return;
        }
        let entries = match fetched {
            Ok(entries) if !entries.is_empty() => entries,
            Ok(_) => {
                warn!("Engine catalogue is empty, using fallback engine list");
                self.fallback.clone()
            }
            Err(e) => {
                warn!(error = %e, "Engine catalogue unavailable, using fallback engine list");
                self.fallback.clone()
            }
        };
        self.catalogue = EngineCatalogue::new(entries);
    }

    pub async fn open<G: DatabaseGateway + ?Sized>(&mut self, gateway: &G) {
        let ticket = self.open_session();
        let fetched = gateway.list_engines().await;
        self.apply_catalogue(ticket, fetched);
    }

    pub fn dispatch(&mut self, event: CreateEvent) {
        if self.session.in_flight() {
            debug!(?event, "Create wizard busy, ignoring event");
            return;
        }
        let step = std::mem::replace(&mut self.step, CreateStep::initial(self.default_region));
        self.step = step.reduce(event, &self.catalogue);
    }

    pub fn can_continue(&self) -> bool {
        self.step.index() < 2 && self.step.can_continue(&self.catalogue)
    }

    /// Whether the Deploy control is enabled.
    pub fn can_confirm(&self) -> bool {
        !self.session.in_flight()
            && self.step.index() == 2
            && self.step.can_continue(&self.catalogue)
    }

    pub fn begin_submit(&mut self) -> Option<(Ticket, CreationRequest)> {
        if !self.can_confirm() {
            return None;
        }
        let request = self.step.creation_request()?;
        let ticket = self.session.begin()?;
        self.error = None;
        Some((ticket, request))
    }

    /// Applies a creation outcome. Success resets the wizard and hands back
    /// the created database; failure keeps step 2 and records the message.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        outcome: Result<(ManagedDatabase, InitialSecret)>,
    ) -> Option<CreatedDatabase> {
        if !self.session.settle(ticket, outcome.is_ok()) {
            return None;
        }
        match outcome {
            Ok((database, initial_secret)) => {
                info!(database = %database.id, name = %database.name, "Database creation accepted");
                self.close();
                Some(CreatedDatabase {
                    database,
                    initial_secret,
                })
            }
            Err(e) => {
                warn!(error = %e, "Database creation failed");
                self.error = Some(display_message(&e, CREATE_FAILED));
                None
            }
        }
    }

    pub async fn submit<G: DatabaseGateway + ?Sized>(
        &mut self,
        gateway: &G,
    ) -> Option<CreatedDatabase> {
        let (ticket, request) = self.begin_submit()?;
        let outcome = gateway.create_database(&request).await;
        self.settle(ticket, outcome)
    }
}
