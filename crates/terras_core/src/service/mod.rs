//! Reconciliation services.
//!
//! # Responsibility
//! - Resolve locations and communities referenced by raw records.
//! - Reconcile single records and coordinate whole batch imports.
//! - Keep callers (CLI, tests) decoupled from SQL details.

pub mod community_resolver;
pub mod import_service;
pub mod location_resolver;
pub mod reconciler;
pub mod report;
