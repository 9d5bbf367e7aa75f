//! Sync orchestration.
//!
//! `sync` holds the dataset state machine, `resources` the file-level
//! mirror, `credentials` the per-organization settings, and `worker` the
//! background queue that runs tasks submitted by the hooks.

pub mod credentials;
pub mod dirty;
pub mod resources;
pub mod sync;
pub mod worker;

pub use credentials::{CredentialsUpdate, CredentialsView, update_credentials};
pub use resources::{ResourceEvent, ResourceOutcome};
pub use sync::{SkipReason, SyncAction, SyncOutcome, Synchronizer};
pub use worker::{PushReport, SyncWorkerHandle, Task, TaskOutcome, TaskQueue, push_failed};
