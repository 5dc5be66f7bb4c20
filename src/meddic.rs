//! MEDDIC overall score derivation (pure math, no store access).

use crate::error::DomainError;
use crate::types::MeddicScore;

/// Pillar names in canonical order, for error reporting.
const PILLAR_NAMES: [&str; 6] = [
    "metrics",
    "economicBuyer",
    "decisionCriteria",
    "decisionProcess",
    "identifyPain",
    "champion",
];

/// Combine the six 0–10 pillar scores into a 0–100 overall figure.
///
/// `overall = round(mean(6 pillars) * 10)`. The denominator is fixed at 6:
/// an unset pillar contributes 0, it is not dropped from the mean. A pillar
/// score above 10 is an upstream invariant violation and is rejected rather
/// than clamped.
pub fn overall(score: &MeddicScore) -> Result<u8, DomainError> {
    let pillars = score.pillars();
    for (pillar, name) in pillars.iter().zip(PILLAR_NAMES) {
        if pillar.score > 10 {
            return Err(DomainError::MeddicScoreOutOfRange {
                pillar: name,
                score: pillar.score,
            });
        }
    }

    let sum: u32 = pillars.iter().map(|p| u32::from(p.score)).sum();
    let mean = sum as f64 / 6.0;
    Ok((mean * 10.0).round() as u8)
}

/// Recompute and store `overall` on the record. The derived field is never
/// written any other way.
pub fn refresh_overall(score: &mut MeddicScore) -> Result<(), DomainError> {
    score.overall = overall(score)?;
    Ok(())
}
