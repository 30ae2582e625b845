// Module declarations
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod formatting;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod reconcile;
pub mod session;

// Re-export commonly used items
pub use client::{HttpRelay, RelayResponse, RelayTransport, ResourceClient};
pub use config::{load_config, save_config, Config};
pub use controller::{ActionController, ActionReport, AllowedActions, Intent, Mode};
pub use error::{ConsoleError, ConsoleResult};
pub use models::*;
pub use orchestrator::{Attempt, MutationOutcome, OperationStatus, Orchestrator, WorkflowOutcome};
pub use reconcile::{reconcile, MembershipRecord, ObservedFields, VerificationResult};
pub use session::{Session, SessionBuilder};
