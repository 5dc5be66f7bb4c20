//! salesiq — sales intelligence scoring and aggregation engine.
//!
//! Deterministic rules over an in-memory portfolio snapshot: lead propensity
//! scoring, top-risk selection, next-best-action ordering, MEDDIC deal
//! health, and the portfolio/lead-funnel rollups the dashboard renders.
//! Everything here is pure and synchronous; storage sits behind the
//! [`store::SalesStore`] trait and AI enrichment stays outside the crate
//! boundary entirely.

pub mod action_priority;
pub mod error;
pub mod json_loader;
pub mod lead_scoring;
pub mod meddic;
pub mod pipeline;
pub mod risk;
pub mod services;
pub mod store;
pub mod types;

pub use error::DomainError;
pub use store::{MemoryStore, SalesStore};
pub use types::{DashboardSnapshot, LeadMetrics, LeadScore};
