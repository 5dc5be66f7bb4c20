//! Seed document loader.
//!
//! The one place external rows become domain records. Everything downstream
//! of here sees typed records only. Policy at this boundary:
//! - an unknown deal stage is a hard error (upstream invariant violation)
//! - an unknown severity/priority string ranks last: it maps to `Low` with a
//!   warning, matching how the rankers treat out-of-set values

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::DomainError;
use crate::store::MemoryStore;
use crate::types::{
    ActionPriority, Deal, DealStage, Lead, MeddicScore, NextBestAction, RiskFactor, Severity, User,
};

/// Seed document: one user, their deal book, their lead queue.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub deals: Vec<SeedDeal>,
    #[serde(default)]
    pub leads: Vec<Lead>,
}

/// Raw deal row. Stage, severity, and priority arrive as strings and are
/// mapped under this module's boundary policy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDeal {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub account_id: String,
    pub account_name: String,
    #[serde(default)]
    pub owner_id: String,
    pub value: f64,
    pub stage: String,
    pub health_score: u8,
    #[serde(default)]
    pub days_in_stage: u32,
    #[serde(default)]
    pub meddic: MeddicScore,
    #[serde(default)]
    pub risk_factors: Vec<SeedRiskFactor>,
    #[serde(default)]
    pub next_best_actions: Vec<SeedAction>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRiskFactor {
    pub id: String,
    pub category: String,
    pub severity: String,
    pub description: String,
    #[serde(default)]
    pub mitigation: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub priority: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read and parse a seed file.
pub fn load_seed(path: &Path) -> Result<SeedDocument, DomainError> {
    let data = fs::read_to_string(path)
        .map_err(|e| DomainError::Seed(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&data)
        .map_err(|e| DomainError::Seed(format!("failed to parse {}: {}", path.display(), e)))
}

/// Load a seed document into a fresh store.
pub fn populate(doc: SeedDocument, now: DateTime<Utc>) -> Result<MemoryStore, DomainError> {
    let store = MemoryStore::new(doc.user.unwrap_or_default());
    for seed in doc.deals {
        let deal = map_deal(seed)?;
        store.insert_deal(deal, now)?;
    }
    for lead in doc.leads {
        store.insert_lead(lead, now);
    }
    Ok(store)
}

fn map_deal(seed: SeedDeal) -> Result<Deal, DomainError> {
    let stage = DealStage::from_str(&seed.stage)?;
    Ok(Deal {
        id: seed.id,
        name: seed.name,
        account_id: seed.account_id,
        account_name: seed.account_name,
        owner_id: seed.owner_id,
        value: seed.value,
        stage,
        probability: stage.default_probability(),
        health_score: seed.health_score,
        days_in_stage: seed.days_in_stage,
        meddic: seed.meddic,
        risk_factors: seed.risk_factors.into_iter().map(map_risk).collect(),
        next_best_actions: seed.next_best_actions.into_iter().map(map_action).collect(),
        competitors: seed.competitors,
        stage_history: Vec::new(),
    })
}

fn map_risk(seed: SeedRiskFactor) -> RiskFactor {
    RiskFactor {
        severity: severity_or_last(&seed.severity, &seed.id),
        id: seed.id,
        category: seed.category,
        description: seed.description,
        mitigation: seed.mitigation,
        is_resolved: seed.is_resolved,
        detected_at: seed.detected_at,
    }
}

fn map_action(seed: SeedAction) -> NextBestAction {
    NextBestAction {
        priority: priority_or_last(&seed.priority, &seed.id),
        id: seed.id,
        action_type: seed.action_type,
        title: seed.title,
        is_completed: seed.is_completed,
        due_date: seed.due_date,
        completed_at: seed.completed_at,
    }
}

fn severity_or_last(raw: &str, id: &str) -> Severity {
    match raw {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        "low" => Severity::Low,
        other => {
            log::warn!("risk {}: unknown severity {:?}, ranking last", id, other);
            Severity::Low
        }
    }
}

fn priority_or_last(raw: &str, id: &str) -> ActionPriority {
    match raw {
        "critical" => ActionPriority::Critical,
        "high" => ActionPriority::High,
        "medium" => ActionPriority::Medium,
        "low" => ActionPriority::Low,
        other => {
            log::warn!("action {}: unknown priority {:?}, ranking last", id, other);
            ActionPriority::Low
        }
    }
}
