//! Domain model for administrative geography, communities and lands.
//!
//! # Responsibility
//! - Define canonical data structures used by the reconciliation pipeline.
//! - Keep persisted identity (`i64` row ids) separate from natural keys.
//!
//! # Invariants
//! - Geography is strictly hierarchical: country -> state -> municipality.
//! - Lands reference communities many-to-many, without ordering.
//! - The raw source payload on a land is opaque and never parsed back into
//!   domain fields.

pub mod community;
pub mod geo;
pub mod land;
