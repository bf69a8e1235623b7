// src/types/mod.rs
//! Domain records shared by the store, the pipeline and the HTTP API

pub mod change;
pub mod outreach;
pub mod profile;
pub mod response;
pub mod run;

pub use change::{ChangeEvent, ChangeKind, ChangeRecord, InsightSource, InsightText};
pub use outreach::{OutreachMethod, OutreachRecord, OutreachStatus};
pub use profile::{ProfileData, ProfileRecord, RoleSnapshot, TrackingStatus};
pub use run::{ChannelOutcome, RowError, RunReport, RunSummary};
