//! Deal and lead lifecycle operations.
//!
//! Mutation surface for the domain records, kept deliberately narrow: stage
//! transitions maintain the history trail and re-derive probability, risks
//! only ever flip to resolved, actions complete once, and a lead's first
//! response time is written exactly once.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::meddic;
use crate::types::{BuyingSignal, Deal, DealStage, Lead, LeadStatus, MeddicScore, StageHistoryEntry};

/// Move a deal to a new stage.
///
/// Appends a history entry (closing out the previous one), re-derives
/// `probability` from the stage table, and resets the days-in-stage counter.
/// Transitions out of a terminal stage are rejected.
pub fn advance_stage(deal: &mut Deal, next: DealStage, now: DateTime<Utc>) -> Result<(), DomainError> {
    if deal.stage.is_terminal() {
        return Err(DomainError::TerminalStage(deal.stage.to_string()));
    }
    if next == deal.stage {
        return Ok(());
    }

    if let Some(current) = deal.stage_history.last_mut() {
        if current.exited_at.is_none() {
            current.exited_at = Some(now);
        }
    }
    deal.stage_history.push(StageHistoryEntry {
        stage: next,
        entered_at: now,
        exited_at: None,
    });

    deal.stage = next;
    deal.probability = next.default_probability();
    deal.days_in_stage = 0;

    log::debug!("deal {} moved to {} (p={})", deal.id, next, deal.probability);
    Ok(())
}

/// Seed the history trail for a deal entering the pipeline. No-op if a trail
/// already exists.
pub fn begin_stage_history(deal: &mut Deal, now: DateTime<Utc>) {
    if deal.stage_history.is_empty() {
        deal.stage_history.push(StageHistoryEntry {
            stage: deal.stage,
            entered_at: now,
            exited_at: None,
        });
    }
}

/// Flip a risk to resolved. Returns whether the risk was found; resolving an
/// already-resolved risk is a no-op.
pub fn resolve_risk(deal: &mut Deal, risk_id: &str) -> bool {
    match deal.risk_factors.iter_mut().find(|r| r.id == risk_id) {
        Some(risk) => {
            risk.is_resolved = true;
            true
        }
        None => false,
    }
}

/// Mark an action complete, stamping `completed_at` on the first call only.
/// Returns whether the action was found.
pub fn complete_action(deal: &mut Deal, action_id: &str, now: DateTime<Utc>) -> bool {
    match deal.next_best_actions.iter_mut().find(|a| a.id == action_id) {
        Some(action) => {
            if !action.is_completed {
                action.is_completed = true;
                action.completed_at = Some(now);
            }
            true
        }
        None => false,
    }
}

/// Replace a deal's MEDDIC pillars, recomputing `overall`. The derived field
/// on the incoming record is ignored.
pub fn update_meddic(deal: &mut Deal, mut meddic_score: MeddicScore) -> Result<(), DomainError> {
    meddic::refresh_overall(&mut meddic_score)?;
    deal.meddic = meddic_score;
    Ok(())
}

/// Record an outreach attempt: bumps the monotone counter, promotes a fresh
/// lead to contacted, and refreshes the activity timestamp.
pub fn record_contact_attempt(lead: &mut Lead, now: DateTime<Utc>) {
    lead.contact_attempts += 1;
    if lead.status == LeadStatus::New {
        lead.status = LeadStatus::Contacted;
    }
    lead.last_activity_at = Some(now);
}

/// Record the first response to a lead. `response_time_ms` is write-once;
/// subsequent responses leave it untouched.
pub fn record_response(lead: &mut Lead, elapsed_ms: u64, automated: bool) {
    if lead.response_time_ms.is_none() {
        lead.response_time_ms = Some(elapsed_ms);
    }
    if automated {
        lead.auto_response_sent = true;
    }
}

/// Append a buying signal and refresh the activity timestamp if the signal is
/// newer than what we had.
pub fn record_buying_signal(lead: &mut Lead, signal: BuyingSignal) {
    if lead
        .last_activity_at
        .map_or(true, |seen| signal.detected_at > seen)
    {
        lead.last_activity_at = Some(signal.detected_at);
    }
    lead.buying_signals.push(signal);
}
