// ABOUTME: Create and migrate wizard state machines
// ABOUTME: Each wizard is a tagged step enum driven by a pure reducer

pub mod create;
pub mod migrate;
pub mod session;

pub use create::{CreateEvent, CreateStep, CreateWizard, CreatedDatabase};
pub use migrate::{MigrateEvent, MigrateStep, MigrateWizard, TargetCandidate};
pub use session::{Session, Submission, Ticket};

/// Labels shown in the step indicator, in order.
pub const CREATE_STEPS: [&str; 3] = ["Choose Engine", "Select Plan", "Configure"];
pub const MIGRATE_STEPS: [&str; 3] = ["Choose Target", "Migration Strategy", "Options & Confirm"];
