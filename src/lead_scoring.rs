//! Rule-based lead propensity scoring.
//!
//! Additive weighted evidence on top of a neutral base, clamped to 0–100 at
//! the very end; intermediate sums may leave the range. Factor strings are
//! collected in evaluation order (title → signals → tech stack → size →
//! engagement → cooldown → recency) and only the first three are returned;
//! earlier factors are the more diagnostic ones, so this doubles as the
//! tie-break.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Lead, LeadScore, LeadStatus};

/// Neutral starting point for a lead with no evidence either way.
const BASE_SCORE: i32 = 50;

const C_LEVEL_WEIGHT: i32 = 15;
const VP_WEIGHT: i32 = 12;
const DIRECTOR_WEIGHT: i32 = 10;
const MANAGER_WEIGHT: i32 = 7;
const SENIOR_IC_WEIGHT: i32 = 3;

/// CAD/CAE tools whose presence in a lead's stack signals product fit.
const CAD_CAE_TOOLS: [&str; 12] = [
    "solidworks",
    "autocad",
    "catia",
    "creo",
    "fusion 360",
    "inventor",
    "onshape",
    "ansys",
    "abaqus",
    "comsol",
    "revit",
    "rhino",
];

const TECH_MATCH_BONUS: i32 = 10;
const COMPANY_SIZE_BONUS: i32 = 5;
const COMPANY_SIZE_MIN_EMPLOYEES: u32 = 100;
const ENGAGEMENT_BONUS: i32 = 10;
const COOLDOWN_PENALTY: i32 = -15;
const COOLDOWN_MIN_ATTEMPTS: u32 = 3;
const RECENT_ACTIVITY_BONUS: i32 = 5;
const RECENT_ACTIVITY_DAYS: i64 = 7;
const STALE_PENALTY: i32 = -10;
const STALE_DAYS: i64 = 30;

/// Factor text cap; long signal descriptions are cut, not dropped.
const FACTOR_DESCRIPTION_MAX: usize = 80;

/// Score a lead from its weighted signals.
///
/// Pure over the lead snapshot; `now` anchors the recency window so callers
/// (and tests) control the clock.
pub fn score(lead: &Lead, now: DateTime<Utc>) -> LeadScore {
    let mut total = BASE_SCORE;
    let mut factors: Vec<String> = Vec::new();

    // Title seniority
    if let Some((weight, label)) = lead.title.as_deref().and_then(title_weight) {
        total += weight;
        factors.push(label.to_string());
    }

    // Buying signals compound additively; no sub-cap before the final clamp.
    for signal in &lead.buying_signals {
        total += signal.impact_score;
        factors.push(describe_signal(&signal.signal_type, &signal.description));
    }

    // Tech-stack fit
    if let Some(tool) = matched_tool(&lead.tech_stack) {
        total += TECH_MATCH_BONUS;
        factors.push(format!("Tech stack includes {}", tool));
    }

    // Company size
    if lead.employee_count.is_some_and(|n| n > COMPANY_SIZE_MIN_EMPLOYEES) {
        total += COMPANY_SIZE_BONUS;
        factors.push("Mid-size or larger company".to_string());
    }

    // Engagement
    if lead.contact_attempts > 0 && lead.status == LeadStatus::Engaged {
        total += ENGAGEMENT_BONUS;
        factors.push("Actively engaged".to_string());
    }

    // Cooldown: repeated attempts without traction
    if lead.contact_attempts >= COOLDOWN_MIN_ATTEMPTS
        && !matches!(lead.status, LeadStatus::Engaged | LeadStatus::Qualified)
    {
        total += COOLDOWN_PENALTY;
        factors.push("Cooling down after repeated outreach".to_string());
    }

    // Recency: fresh activity nudges up (no factor), stale drags down.
    if let Some(last_activity) = lead.last_activity_at {
        let age = now - last_activity;
        if age < Duration::days(RECENT_ACTIVITY_DAYS) {
            total += RECENT_ACTIVITY_BONUS;
        } else if age > Duration::days(STALE_DAYS) {
            total += STALE_PENALTY;
            factors.push("Stale: no activity in over 30 days".to_string());
        }
    }

    factors.truncate(3);
    LeadScore {
        score: total.clamp(0, 100) as u8,
        factors,
    }
}

/// Seniority tiers, checked top down; the first hit wins. The C-suite
/// acronyms match whole tokens only ("director" contains "cto" as a
/// substring), while the longer markers match anywhere, so "SVP" still
/// lands in the VP tier.
fn title_weight(title: &str) -> Option<(i32, &'static str)> {
    let title_lower = title.to_lowercase();
    let has_token = |needle: &str| {
        title_lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == needle)
    };

    if ["cto", "ceo", "coo"].iter().any(|a| has_token(a)) || title_lower.contains("chief") {
        Some((C_LEVEL_WEIGHT, "C-level title"))
    } else if title_lower.contains("vp") {
        Some((VP_WEIGHT, "VP-level title"))
    } else if title_lower.contains("director") {
        Some((DIRECTOR_WEIGHT, "Director-level title"))
    } else if title_lower.contains("head of") || title_lower.contains("manager") {
        Some((MANAGER_WEIGHT, "Management title"))
    } else if title_lower.contains("senior") || title_lower.contains("lead") {
        Some((SENIOR_IC_WEIGHT, "Senior individual contributor"))
    } else {
        None
    }
}

/// Human-readable factor for a buying signal: underscores become spaces and
/// the description is capped at 80 chars.
fn describe_signal(signal_type: &str, description: &str) -> String {
    let label = signal_type.replace('_', " ");
    let detail: String = description.chars().take(FACTOR_DESCRIPTION_MAX).collect();
    if detail.is_empty() {
        label
    } else {
        format!("{}: {}", label, detail)
    }
}

fn matched_tool(tech_stack: &[String]) -> Option<&'static str> {
    for entry in tech_stack {
        let entry_lower = entry.to_lowercase();
        for tool in CAD_CAE_TOOLS {
            if entry_lower.contains(tool) {
                return Some(tool);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::types::BuyingSignal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap()
    }

    fn lead() -> Lead {
        Lead {
            id: "l1".to_string(),
            name: "Jordan Kim".to_string(),
            title: None,
            company: None,
            employee_count: None,
            tech_stack: Vec::new(),
            source: None,
            region: None,
            status: LeadStatus::New,
            ai_score: 0,
            score_factors: Vec::new(),
            contact_attempts: 0,
            auto_response_sent: false,
            response_time_ms: None,
            buying_signals: Vec::new(),
            last_activity_at: None,
            created_at: now() - Duration::days(1),
        }
    }

    fn signal(impact: i32, description: &str) -> BuyingSignal {
        BuyingSignal {
            signal_type: "demo_request".to_string(),
            description: description.to_string(),
            impact_score: impact,
            detected_at: now(),
        }
    }

    #[test]
    fn neutral_lead_scores_exactly_base() {
        let result = score(&lead(), now());
        assert_eq!(result.score, 50);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn vp_with_signal_tech_and_size_matches_worked_example() {
        let mut l = lead();
        l.title = Some("VP Engineering".to_string());
        l.buying_signals = vec![signal(20, "Requested a demo of the CFD module")];
        l.tech_stack = vec!["SolidWorks".to_string(), "Jira".to_string()];
        l.employee_count = Some(450);
        l.contact_attempts = 1;
        l.status = LeadStatus::Contacted;

        let result = score(&l, now());
        // 50 + 12 + 20 + 10 + 5; no engagement bonus (status != engaged),
        // no cooldown (attempts < 3).
        assert_eq!(result.score, 97);
        assert_eq!(result.factors.len(), 3);
        assert_eq!(result.factors[0], "VP-level title");
        assert_eq!(
            result.factors[1],
            "demo request: Requested a demo of the CFD module"
        );
        assert_eq!(result.factors[2], "Tech stack includes solidworks");
    }

    #[test]
    fn c_level_outranks_other_title_tiers() {
        let mut l = lead();
        l.title = Some("Chief Technology Officer".to_string());
        let result = score(&l, now());
        assert_eq!(result.score, 65);
        assert_eq!(result.factors, vec!["C-level title".to_string()]);
    }

    #[test]
    fn director_is_not_a_cto() {
        // "director" contains "cto" as a substring; must land in its own tier.
        let mut l = lead();
        l.title = Some("Director of Operations".to_string());
        assert_eq!(score(&l, now()).score, 60);

        l.title = Some("CTO".to_string());
        assert_eq!(score(&l, now()).score, 65);
    }

    #[test]
    fn svp_counts_as_vp_tier() {
        let mut l = lead();
        l.title = Some("SVP Sales".to_string());
        let result = score(&l, now());
        assert_eq!(result.score, 62);
        assert_eq!(result.factors, vec!["VP-level title".to_string()]);
    }

    #[test]
    fn score_clamps_at_both_ends() {
        let mut hot = lead();
        hot.buying_signals = vec![signal(40, "a"), signal(40, "b"), signal(40, "c")];
        assert_eq!(score(&hot, now()).score, 100);

        let mut cold = lead();
        cold.buying_signals = vec![signal(-80, "churn risk"), signal(-80, "budget cut")];
        assert_eq!(score(&cold, now()).score, 0);
    }

    #[test]
    fn engagement_bonus_needs_attempts_and_engaged_status() {
        let mut l = lead();
        l.status = LeadStatus::Engaged;
        // Engaged but never contacted: no bonus.
        assert_eq!(score(&l, now()).score, 50);

        l.contact_attempts = 1;
        assert_eq!(score(&l, now()).score, 60);
    }

    #[test]
    fn cooldown_spares_engaged_and_qualified() {
        let mut l = lead();
        l.contact_attempts = 4;
        l.status = LeadStatus::Contacted;
        assert_eq!(score(&l, now()).score, 35);

        l.status = LeadStatus::Qualified;
        assert_eq!(score(&l, now()).score, 50);
    }

    #[test]
    fn recency_bonus_has_no_factor_but_stale_does() {
        let mut fresh = lead();
        fresh.last_activity_at = Some(now() - Duration::days(2));
        let fresh_result = score(&fresh, now());
        assert_eq!(fresh_result.score, 55);
        assert!(fresh_result.factors.is_empty());

        let mut stale = lead();
        stale.last_activity_at = Some(now() - Duration::days(45));
        let stale_result = score(&stale, now());
        assert_eq!(stale_result.score, 40);
        assert_eq!(
            stale_result.factors,
            vec!["Stale: no activity in over 30 days".to_string()]
        );
    }

    #[test]
    fn long_signal_descriptions_are_truncated_in_factors() {
        let mut l = lead();
        l.buying_signals = vec![signal(5, &"x".repeat(200))];
        let result = score(&l, now());
        let factor = &result.factors[0];
        assert!(factor.starts_with("demo request: "));
        assert_eq!(factor.len(), "demo request: ".len() + 80);
    }

    #[test]
    fn factors_cap_at_three_in_evaluation_order() {
        let mut l = lead();
        l.title = Some("Director of Manufacturing".to_string());
        l.buying_signals = vec![signal(5, "pricing page"), signal(5, "webinar")];
        l.tech_stack = vec!["CATIA".to_string()];
        l.employee_count = Some(2_000);

        let result = score(&l, now());
        assert_eq!(
            result.factors,
            vec![
                "Director-level title".to_string(),
                "demo request: pricing page".to_string(),
                "demo request: webinar".to_string(),
            ]
        );
    }
}
