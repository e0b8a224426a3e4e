//! External collaborator seams
//!
//! The engine owns scheduling and execution only. The work itself, the
//! persistence of job configurations and the surfacing of failures to users
//! all live behind the traits in this module and are supplied by the wider
//! platform at startup.

pub mod job;
pub mod job_configuration;
pub mod notifier;

pub use job::Job;
pub use job_configuration::{InMemoryJobConfigurationService, JobConfigurationService};
pub use notifier::{LogNotifier, Notifier};
