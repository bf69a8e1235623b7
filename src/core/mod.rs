// src/core/mod.rs
//! Storage and shared plumbing used by every pipeline stage

pub mod database;
pub mod rate_limiter;

pub use database::{
    ChangeRepository, Database, OutreachRepository, ProfileRepository, RunRepository,
};
pub use rate_limiter::RateLimiter;
