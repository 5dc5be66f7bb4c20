use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// =============================================================================
// Ordered enumerations
// =============================================================================

/// Pipeline stage for a deal.
///
/// The declaration order is the canonical funnel order; `ClosedWon` and
/// `ClosedLost` are terminal. Everything upstream of the closed stages is
/// "active" and participates in pipeline aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Discovery,
    Qualification,
    TechnicalEvaluation,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

/// The five active stages, in funnel order. Stage summaries report every one
/// of these even when a bucket is empty.
pub const ACTIVE_STAGES: [DealStage; 5] = [
    DealStage::Discovery,
    DealStage::Qualification,
    DealStage::TechnicalEvaluation,
    DealStage::Proposal,
    DealStage::Negotiation,
];

impl DealStage {
    pub fn is_active(self) -> bool {
        !matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Stage-derived win probability (percent). Re-applied to a deal on every
    /// stage transition.
    pub fn default_probability(self) -> u8 {
        match self {
            DealStage::Discovery => 10,
            DealStage::Qualification => 25,
            DealStage::TechnicalEvaluation => 40,
            DealStage::Proposal => 60,
            DealStage::Negotiation => 80,
            DealStage::ClosedWon => 100,
            DealStage::ClosedLost => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Discovery => "discovery",
            DealStage::Qualification => "qualification",
            DealStage::TechnicalEvaluation => "technical_evaluation",
            DealStage::Proposal => "proposal",
            DealStage::Negotiation => "negotiation",
            DealStage::ClosedWon => "closed_won",
            DealStage::ClosedLost => "closed_lost",
        }
    }
}

impl FromStr for DealStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(DealStage::Discovery),
            "qualification" => Ok(DealStage::Qualification),
            "technical_evaluation" => Ok(DealStage::TechnicalEvaluation),
            "proposal" => Ok(DealStage::Proposal),
            "negotiation" => Ok(DealStage::Negotiation),
            "closed_won" => Ok(DealStage::ClosedWon),
            "closed_lost" => Ok(DealStage::ClosedLost),
            other => Err(DomainError::InvalidStage(other.to_string())),
        }
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk severity. Declaration order is rank order: `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Next-best-action priority. Same four-tier ordering as [`Severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Urgent tiers surface in the per-deal "do now" list and the portfolio
    /// today view.
    pub fn is_urgent(self) -> bool {
        matches!(self, ActionPriority::Critical | ActionPriority::High)
    }
}

/// Lead funnel state: new → contacted → engaged/qualified →
/// nurture/disqualified → converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Engaged,
    Qualified,
    Nurture,
    Disqualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Engaged => "engaged",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Nurture => "nurture",
            LeadStatus::Disqualified => "disqualified",
            LeadStatus::Converted => "converted",
        }
    }
}

// =============================================================================
// Deal-side records
// =============================================================================

/// An open risk on a deal. Created on detection, only ever mutated to flip
/// `is_resolved`; never deleted, so risk lists stay chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub id: String,
    pub category: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    pub detected_at: DateTime<Utc>,
}

/// A recommended action on a deal. Immutable after creation except for the
/// one-shot completion flip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBestAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub priority: ActionPriority,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One MEDDIC pillar: a 0–10 score plus free-text notes. Notes never
/// participate in scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeddicPillar {
    pub score: u8,
    #[serde(default)]
    pub notes: String,
}

/// MEDDIC qualification record. `overall` is derived: always recomputed from
/// the six pillars, never set independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeddicScore {
    pub metrics: MeddicPillar,
    pub economic_buyer: MeddicPillar,
    pub decision_criteria: MeddicPillar,
    pub decision_process: MeddicPillar,
    pub identify_pain: MeddicPillar,
    pub champion: MeddicPillar,
    #[serde(default)]
    pub overall: u8,
}

impl MeddicScore {
    /// The six pillars in canonical order.
    pub fn pillars(&self) -> [&MeddicPillar; 6] {
        [
            &self.metrics,
            &self.economic_buyer,
            &self.decision_criteria,
            &self.decision_process,
            &self.identify_pain,
            &self.champion,
        ]
    }
}

/// One entry in a deal's stage history. `exited_at` is set when the deal moves
/// on; the current stage's entry has it unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    pub stage: DealStage,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<DateTime<Utc>>,
}

/// An opportunity. Owned by exactly one user, belongs to exactly one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub name: String,
    pub account_id: String,
    pub account_name: String,
    pub owner_id: String,
    pub value: f64,
    pub stage: DealStage,
    /// Stage-derived win probability, 0–100.
    pub probability: u8,
    /// Externally assessed health, 0–100. Below 60 flags the deal at risk.
    pub health_score: u8,
    #[serde(default)]
    pub days_in_stage: u32,
    #[serde(default)]
    pub meddic: MeddicScore,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub next_best_actions: Vec<NextBestAction>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub stage_history: Vec<StageHistoryEntry>,
}

impl Deal {
    /// Value weighted by stage probability, in the same currency unit as
    /// `value`.
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

// =============================================================================
// Lead-side records
// =============================================================================

/// A typed buying signal on a lead. Append-only; `impact_score` is signed, so
/// negative signals pull the propensity score down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyingSignal {
    #[serde(rename = "type")]
    pub signal_type: String,
    pub description: String,
    pub impact_score: i32,
    pub detected_at: DateTime<Utc>,
}

/// An inbound or prospecting lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub status: LeadStatus,
    /// Rule-based propensity score, 0–100.
    #[serde(default)]
    pub ai_score: u8,
    /// Most-impactful factors behind `ai_score`, at most 3.
    #[serde(default)]
    pub score_factors: Vec<String>,
    /// Monotonically increasing; never reset.
    #[serde(default)]
    pub contact_attempts: u32,
    #[serde(default)]
    pub auto_response_sent: bool,
    /// Time to first response. Set once, at the first automated or human
    /// response; later responses don't touch it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub buying_signals: Vec<BuyingSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The quota-carrying owner of the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub quota: f64,
    pub closed_won_ytd: f64,
}

impl Default for User {
    // Demo/placeholder figures for fixtures without a real user record.
    fn default() -> Self {
        Self {
            id: "demo-user".to_string(),
            name: "Demo User".to_string(),
            quota: 1_000_000.0,
            closed_won_ytd: 0.0,
        }
    }
}

// =============================================================================
// Derived / output records
// =============================================================================

/// Output of the signal scorer: clamped score plus the top factor strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
    pub score: u8,
    pub factors: Vec<String>,
}

/// Quota attainment block for the dashboard header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaAttainment {
    pub quota: f64,
    pub closed_won: f64,
    pub gap: f64,
    pub projected: f64,
    pub attainment_percent: u32,
}

/// Count and summed value of active deals in one stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePipeline {
    pub stage: DealStage,
    pub count: usize,
    pub value: f64,
}

/// An active deal whose health dropped below the risk threshold, annotated
/// with its top unresolved risk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAtRisk {
    pub deal_id: String,
    pub deal_name: String,
    pub account_name: String,
    pub value: f64,
    pub health_score: u8,
    pub top_risk: String,
}

/// An urgent incomplete action lifted out of a deal with display context
/// attached for the portfolio today view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAction {
    pub deal_id: String,
    pub deal_name: String,
    pub account_name: String,
    #[serde(flatten)]
    pub action: NextBestAction,
}

/// Three-tier forecast. Cumulative dollar bands, not disjoint deal
/// categories: commit ≤ best_case ≤ pipeline always holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub commit: f64,
    pub best_case: f64,
    pub pipeline: f64,
    pub target: f64,
}

/// Portfolio-level rollup handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub active_deal_count: usize,
    pub open_pipeline_value: f64,
    pub weighted_pipeline: f64,
    pub quota_attainment: QuotaAttainment,
    pub pipeline_by_stage: Vec<StagePipeline>,
    pub deals_at_risk: Vec<DealAtRisk>,
    pub todays_actions: Vec<PortfolioAction>,
    pub forecast: Forecast,
}

/// Speed-to-lead histogram over first-response latency, in seconds.
/// Half-open bins; every lead with a response time lands in exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedToLeadDistribution {
    pub under_5s: usize,
    pub under_15s: usize,
    pub under_30s: usize,
    pub under_60s: usize,
    pub over_60s: usize,
}

impl SpeedToLeadDistribution {
    pub fn total(&self) -> usize {
        self.under_5s + self.under_15s + self.under_30s + self.under_60s + self.over_60s
    }
}

/// Lead funnel rollup.
// BTreeMaps keep the report output key-stable across runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadMetrics {
    pub total_leads: usize,
    pub avg_response_time_ms: f64,
    pub auto_response_rate: f64,
    pub qualification_rate: f64,
    pub conversion_rate: f64,
    pub leads_by_status: BTreeMap<String, usize>,
    pub leads_by_source: BTreeMap<String, usize>,
    pub leads_by_region: BTreeMap<String, usize>,
    pub today_lead_count: usize,
    pub week_lead_count: usize,
    pub speed_to_lead: SpeedToLeadDistribution,
}
