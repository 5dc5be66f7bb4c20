// Dashboard service — portfolio-level rollup of the active deal book.
// Every monetary aggregate here sums over exactly the active deals (stage not
// closed); closed-won revenue comes from the user record, never re-derived
// from deals.

use crate::action_priority;
use crate::risk;
use crate::store::SalesStore;
use crate::types::{
    DashboardSnapshot, Deal, DealAtRisk, DealStage, Forecast, QuotaAttainment, StagePipeline,
    User, ACTIVE_STAGES,
};

/// Health score below which an active deal lands on the at-risk list.
const AT_RISK_HEALTH_THRESHOLD: u8 = 60;

/// Build the full dashboard snapshot from a store read.
pub fn snapshot(store: &dyn SalesStore) -> DashboardSnapshot {
    let deals = store.deals();
    let user = store.user();
    aggregate(&deals, &user)
}

/// Roll up a complete, consistent portfolio snapshot. Pure over its inputs.
pub fn aggregate(deals: &[Deal], user: &User) -> DashboardSnapshot {
    let active: Vec<&Deal> = deals.iter().filter(|d| d.stage.is_active()).collect();

    let open_pipeline_value: f64 = active.iter().map(|d| d.value).sum();
    let weighted_pipeline: f64 = active.iter().map(|d| d.weighted_value()).sum();

    log::debug!(
        "dashboard snapshot: {} active deals, {:.0} weighted pipeline",
        active.len(),
        weighted_pipeline
    );

    DashboardSnapshot {
        active_deal_count: active.len(),
        open_pipeline_value,
        weighted_pipeline,
        quota_attainment: quota_attainment(user, weighted_pipeline),
        pipeline_by_stage: pipeline_by_stage(&active),
        deals_at_risk: deals_at_risk(&active),
        todays_actions: action_priority::today_actions(deals),
        forecast: forecast(&active, user),
    }
}

fn quota_attainment(user: &User, weighted_pipeline: f64) -> QuotaAttainment {
    let attainment_percent = if user.quota == 0.0 {
        log::warn!("user {} has a zero quota; attainment reported as 0%", user.id);
        0
    } else {
        (user.closed_won_ytd / user.quota * 100.0).round() as u32
    };

    QuotaAttainment {
        quota: user.quota,
        closed_won: user.closed_won_ytd,
        gap: user.quota - user.closed_won_ytd,
        projected: user.closed_won_ytd + weighted_pipeline,
        attainment_percent,
    }
}

/// Count and value per active stage, in funnel order. Empty stages still
/// appear with zeros.
fn pipeline_by_stage(active: &[&Deal]) -> Vec<StagePipeline> {
    ACTIVE_STAGES
        .iter()
        .map(|&stage| {
            let in_stage = active.iter().filter(|d| d.stage == stage);
            let (count, value) = in_stage.fold((0usize, 0.0f64), |(count, value), deal| {
                (count + 1, value + deal.value)
            });
            StagePipeline { stage, count, value }
        })
        .collect()
}

/// Active deals below the health threshold, worst first, each annotated with
/// its top unresolved risk.
fn deals_at_risk(active: &[&Deal]) -> Vec<DealAtRisk> {
    let mut at_risk: Vec<DealAtRisk> = active
        .iter()
        .filter(|d| d.health_score < AT_RISK_HEALTH_THRESHOLD)
        .map(|d| DealAtRisk {
            deal_id: d.id.clone(),
            deal_name: d.name.clone(),
            account_name: d.account_name.clone(),
            value: d.value,
            health_score: d.health_score,
            top_risk: risk::top_risk_label(d),
        })
        .collect();
    at_risk.sort_by_key(|d| d.health_score);
    at_risk
}

/// Cumulative forecast bands. Commit starts from realized revenue and each
/// band folds in the next-likeliest slice of the pipeline, so
/// commit ≤ best_case ≤ pipeline holds for any input.
fn forecast(active: &[&Deal], user: &User) -> Forecast {
    let stage_value = |stage: DealStage| -> f64 {
        active
            .iter()
            .filter(|d| d.stage == stage)
            .map(|d| d.value)
            .sum()
    };
    let earlier_stage_value: f64 = active
        .iter()
        .filter(|d| !matches!(d.stage, DealStage::Negotiation | DealStage::Proposal))
        .map(|d| d.value)
        .sum();

    let commit = user.closed_won_ytd + stage_value(DealStage::Negotiation);
    let best_case = commit + stage_value(DealStage::Proposal);
    let pipeline = best_case + earlier_stage_value;

    Forecast {
        commit,
        best_case,
        pipeline,
        target: user.quota,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::{MeddicScore, RiskFactor, Severity};

    fn user(quota: f64, closed_won_ytd: f64) -> User {
        User {
            id: "u1".to_string(),
            name: "Riley".to_string(),
            quota,
            closed_won_ytd,
        }
    }

    fn deal(id: &str, value: f64, stage: DealStage, health: u8) -> Deal {
        Deal {
            id: id.to_string(),
            name: format!("Deal {}", id),
            account_id: format!("acct-{}", id),
            account_name: format!("Account {}", id),
            owner_id: "u1".to_string(),
            value,
            stage,
            probability: stage.default_probability(),
            health_score: health,
            days_in_stage: 5,
            meddic: MeddicScore::default(),
            risk_factors: Vec::new(),
            next_best_actions: Vec::new(),
            competitors: Vec::new(),
            stage_history: Vec::new(),
        }
    }

    #[test]
    fn forecast_matches_worked_example() {
        let deals = vec![
            deal("d1", 100_000.0, DealStage::Negotiation, 80),
            deal("d2", 50_000.0, DealStage::Proposal, 80),
        ];
        let snap = aggregate(&deals, &user(1_000_000.0, 200_000.0));

        assert_eq!(snap.forecast.commit, 300_000.0);
        assert_eq!(snap.forecast.best_case, 350_000.0);
        assert_eq!(snap.forecast.pipeline, 350_000.0);
        // 100000 * 0.8 + 50000 * 0.6
        assert!((snap.weighted_pipeline - 110_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn forecast_bands_stay_monotone() {
        let deals = vec![
            deal("d1", 10_000.0, DealStage::Discovery, 90),
            deal("d2", 20_000.0, DealStage::Qualification, 90),
            deal("d3", 30_000.0, DealStage::TechnicalEvaluation, 90),
            deal("d4", 40_000.0, DealStage::Proposal, 90),
            deal("d5", 50_000.0, DealStage::Negotiation, 90),
            deal("d6", 999_999.0, DealStage::ClosedLost, 90),
        ];
        let snap = aggregate(&deals, &user(500_000.0, 120_000.0));
        let f = &snap.forecast;
        assert!(f.commit <= f.best_case);
        assert!(f.best_case <= f.pipeline);
        assert_eq!(f.commit, 170_000.0);
        assert_eq!(f.best_case, 210_000.0);
        assert_eq!(f.pipeline, 270_000.0);
    }

    #[test]
    fn empty_portfolio_collapses_to_realized_revenue() {
        let snap = aggregate(&[], &user(800_000.0, 250_000.0));
        assert_eq!(snap.forecast.commit, 250_000.0);
        assert_eq!(snap.forecast.best_case, 250_000.0);
        assert_eq!(snap.forecast.pipeline, 250_000.0);
        assert_eq!(snap.weighted_pipeline, 0.0);
        assert_eq!(snap.active_deal_count, 0);
    }

    #[test]
    fn closed_deals_never_enter_monetary_aggregates() {
        let deals = vec![
            deal("d1", 60_000.0, DealStage::Discovery, 90),
            deal("d2", 1_000_000.0, DealStage::ClosedWon, 90),
        ];
        let snap = aggregate(&deals, &user(500_000.0, 0.0));
        assert_eq!(snap.open_pipeline_value, 60_000.0);
        assert_eq!(snap.forecast.pipeline, 60_000.0);
    }

    #[test]
    fn every_stage_bucket_appears_even_when_empty() {
        let deals = vec![deal("d1", 45_000.0, DealStage::Proposal, 85)];
        let snap = aggregate(&deals, &user(500_000.0, 0.0));

        assert_eq!(snap.pipeline_by_stage.len(), 5);
        let stages: Vec<DealStage> = snap.pipeline_by_stage.iter().map(|s| s.stage).collect();
        assert_eq!(stages, ACTIVE_STAGES.to_vec());

        let proposal = &snap.pipeline_by_stage[3];
        assert_eq!(proposal.count, 1);
        assert_eq!(proposal.value, 45_000.0);
        assert_eq!(snap.pipeline_by_stage[0].count, 0);
        assert_eq!(snap.pipeline_by_stage[0].value, 0.0);
    }

    #[test]
    fn at_risk_sorts_by_health_worst_first() {
        let mut risky = deal("d1", 90_000.0, DealStage::Negotiation, 45);
        risky.risk_factors.push(RiskFactor {
            id: "r1".to_string(),
            category: "champion".to_string(),
            severity: Severity::Critical,
            description: "Champion left the company".to_string(),
            mitigation: None,
            is_resolved: false,
            detected_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        });
        let deals = vec![
            deal("d2", 30_000.0, DealStage::Discovery, 58),
            risky,
            deal("d3", 10_000.0, DealStage::Proposal, 75),
            deal("d4", 99_000.0, DealStage::ClosedLost, 10),
        ];
        let snap = aggregate(&deals, &user(500_000.0, 0.0));

        let ids: Vec<&str> = snap.deals_at_risk.iter().map(|d| d.deal_id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert_eq!(snap.deals_at_risk[0].top_risk, "Champion left the company");
        assert_eq!(snap.deals_at_risk[1].top_risk, risk::NO_RISK_IDENTIFIED);
    }

    #[test]
    fn zero_quota_degrades_to_zero_percent() {
        let snap = aggregate(&[], &user(0.0, 50_000.0));
        assert_eq!(snap.quota_attainment.attainment_percent, 0);
        assert_eq!(snap.quota_attainment.gap, -50_000.0);
    }

    #[test]
    fn attainment_rounds_to_nearest_percent() {
        let snap = aggregate(&[], &user(300_000.0, 100_000.0));
        // 33.33…% → 33
        assert_eq!(snap.quota_attainment.attainment_percent, 33);
        assert_eq!(snap.quota_attainment.projected, 100_000.0);
    }
}
