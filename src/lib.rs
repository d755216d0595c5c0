//! Promille - An in-memory blood alcohol concentration tracking service.
//!
//! # Overview
//!
//! Promille tracks people and the alcoholic drinks they consume, and estimates
//! blood alcohol concentration (BAC, in per-mille) over time with a
//! Widmark-style decay model: alcohol mass spread over body water mass, minus
//! a fixed metabolic burn-off per hour.
//!
//! All state lives in process memory. There is no persistence, no
//! authentication, and no history of edits — a person only ever reflects
//! their current weight, gender flag, and drink list.
//!
//! # Modules
//!
//! - [`model`]: Drink and person entities, the BAC arithmetic, and wire views
//! - [`error`]: Domain error types
//! - [`storage`]: Concurrent in-memory person repository
//! - [`api`]: HTTP API handlers and router

pub mod api;
pub mod error;
pub mod model;
pub mod storage;
