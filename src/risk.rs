//! Top-risk selection for a deal.
//!
//! Risk lists are chronological (risks are never deleted, only resolved), so
//! the stable min-by-severity here doubles as "earliest detected wins" on
//! severity ties. That tie-break is part of the contract, not an accident.

use crate::types::{Deal, RiskFactor};

/// Shown when a deal has no unresolved risks.
pub const NO_RISK_IDENTIFIED: &str = "No specific risk identified";

/// The single highest-severity unresolved risk, or `None` if everything is
/// resolved (or the deal has no risks at all).
///
/// Severity ranks critical < high < medium < low; ties keep insertion order.
pub fn top_risk(deal: &Deal) -> Option<&RiskFactor> {
    deal.risk_factors
        .iter()
        .filter(|risk| !risk.is_resolved)
        .min_by_key(|risk| risk.severity.rank())
}

/// Display string for the top risk, with the sentinel fallback the dashboard
/// shows for clean deals.
pub fn top_risk_label(deal: &Deal) -> String {
    top_risk(deal)
        .map(|risk| risk.description.clone())
        .unwrap_or_else(|| NO_RISK_IDENTIFIED.to_string())
}
