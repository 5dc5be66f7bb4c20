//! Data access seam for the scoring core.
//!
//! Aggregators depend only on [`SalesStore`], never on concrete storage, so
//! any persistent backend can stand in for the in-memory implementation
//! without touching scoring logic. Each read hands out a complete snapshot;
//! aggregation never observes a half-written portfolio.

use parking_lot::RwLock;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::lead_scoring;
use crate::pipeline;
use crate::types::{BuyingSignal, Deal, DealStage, Lead, MeddicScore, User};

/// Read operations the scoring core consumes.
pub trait SalesStore {
    fn user(&self) -> User;
    fn deals(&self) -> Vec<Deal>;
    fn leads(&self) -> Vec<Lead>;

    fn deal(&self, id: &str) -> Option<Deal> {
        self.deals().into_iter().find(|d| d.id == id)
    }

    fn lead(&self, id: &str) -> Option<Lead> {
        self.leads().into_iter().find(|l| l.id == id)
    }
}

#[derive(Debug)]
struct Inner {
    user: User,
    // Vecs, not maps: insertion order is observable through the stable sorts
    // downstream.
    deals: Vec<Deal>,
    leads: Vec<Lead>,
}

/// In-memory store. Reads clone the current snapshot; writers take the lock
/// briefly and go through the `pipeline` mutation surface.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(user: User) -> Self {
        Self {
            inner: RwLock::new(Inner {
                user,
                deals: Vec::new(),
                leads: Vec::new(),
            }),
        }
    }

    /// Insert a deal, seeding its stage history and derived fields. A blank
    /// id gets a generated one; the assigned id is returned.
    pub fn insert_deal(&self, mut deal: Deal, now: DateTime<Utc>) -> Result<String, DomainError> {
        if deal.id.is_empty() {
            deal.id = Uuid::new_v4().to_string();
        }
        deal.probability = deal.stage.default_probability();
        pipeline::begin_stage_history(&mut deal, now);
        let meddic = std::mem::take(&mut deal.meddic);
        pipeline::update_meddic(&mut deal, meddic)?;

        let id = deal.id.clone();
        self.inner.write().deals.push(deal);
        Ok(id)
    }

    /// Insert a lead, scoring it on the way in. Returns the assigned id.
    pub fn insert_lead(&self, mut lead: Lead, now: DateTime<Utc>) -> String {
        if lead.id.is_empty() {
            lead.id = Uuid::new_v4().to_string();
        }
        let scored = lead_scoring::score(&lead, now);
        lead.ai_score = scored.score;
        lead.score_factors = scored.factors;

        let id = lead.id.clone();
        self.inner.write().leads.push(lead);
        id
    }

    pub fn advance_deal_stage(
        &self,
        deal_id: &str,
        next: DealStage,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.with_deal_mut(deal_id, |deal| pipeline::advance_stage(deal, next, now))?
    }

    pub fn resolve_risk(&self, deal_id: &str, risk_id: &str) -> Result<bool, DomainError> {
        self.with_deal_mut(deal_id, |deal| pipeline::resolve_risk(deal, risk_id))
    }

    pub fn complete_action(
        &self,
        deal_id: &str,
        action_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        self.with_deal_mut(deal_id, |deal| pipeline::complete_action(deal, action_id, now))
    }

    pub fn update_meddic(&self, deal_id: &str, meddic: MeddicScore) -> Result<(), DomainError> {
        self.with_deal_mut(deal_id, |deal| pipeline::update_meddic(deal, meddic))?
    }

    pub fn record_contact_attempt(
        &self,
        lead_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.with_lead_mut(lead_id, now, |lead, at| {
            pipeline::record_contact_attempt(lead, at)
        })
    }

    pub fn record_response(
        &self,
        lead_id: &str,
        elapsed_ms: u64,
        automated: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.with_lead_mut(lead_id, now, |lead, _| {
            pipeline::record_response(lead, elapsed_ms, automated)
        })
    }

    pub fn record_buying_signal(
        &self,
        lead_id: &str,
        signal: BuyingSignal,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.with_lead_mut(lead_id, now, |lead, _| {
            pipeline::record_buying_signal(lead, signal)
        })
    }

    fn with_deal_mut<T>(
        &self,
        deal_id: &str,
        mutate: impl FnOnce(&mut Deal) -> T,
    ) -> Result<T, DomainError> {
        let mut inner = self.inner.write();
        let deal = inner
            .deals
            .iter_mut()
            .find(|d| d.id == deal_id)
            .ok_or_else(|| DomainError::DealNotFound(deal_id.to_string()))?;
        Ok(mutate(deal))
    }

    /// Lead mutations re-score on the way out so `ai_score` never drifts from
    /// the signals it summarizes.
    fn with_lead_mut(
        &self,
        lead_id: &str,
        now: DateTime<Utc>,
        mutate: impl FnOnce(&mut Lead, DateTime<Utc>),
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write();
        let lead = inner
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| DomainError::LeadNotFound(lead_id.to_string()))?;
        mutate(lead, now);
        let scored = lead_scoring::score(lead, now);
        lead.ai_score = scored.score;
        lead.score_factors = scored.factors;
        Ok(())
    }
}

impl SalesStore for MemoryStore {
    fn user(&self) -> User {
        self.inner.read().user.clone()
    }

    fn deals(&self) -> Vec<Deal> {
        self.inner.read().deals.clone()
    }

    fn leads(&self) -> Vec<Lead> {
        self.inner.read().leads.clone()
    }
}
