//! Job scheduling and execution for the platform
//!
//! This crate owns everything between "a job configuration exists" and "its
//! work ran": registering job implementations at startup, turning cron and
//! fixed-cadence triggers into fires, bounding concurrent execution, enforcing
//! the one-run-per-job-type rule, and keeping persisted job status in step
//! with reality. Failures in job bodies are contained here and never reach
//! the scheduler loops.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use meditrack_scheduling::config::SchedulerConfig;
//! use meditrack_scheduling::scheduling::{JobRegistry, SchedulingManager};
//! use meditrack_scheduling::services::{InMemoryJobConfigurationService, LogNotifier};
//!
//! # async fn wire() {
//! let registry = JobRegistry::new();
//! // registry.register(Arc::new(AnalyticsTableJob::new(...)));
//!
//! let manager = SchedulingManager::new(
//!     registry,
//!     Arc::new(InMemoryJobConfigurationService::new()),
//!     Arc::new(LogNotifier),
//!     &SchedulerConfig::default(),
//! );
//! # let _ = manager;
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod observability;
pub mod scheduling;
pub mod services;

pub use errors::{SchedulingError, SchedulingResult};
pub use models::{JobConfiguration, JobStatus, JobType, LastExecutedStatus};
pub use scheduling::{JobRegistry, SchedulingManager};
pub use services::{Job, JobConfigurationService, Notifier};
