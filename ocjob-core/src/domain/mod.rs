//! Core domain types
//!
//! These types describe one job run as the agent sees it: what to create,
//! which cluster object it became, what the cluster last reported about it,
//! and how the run ended.

pub mod job;
pub mod log;
pub mod outcome;
pub mod status;
