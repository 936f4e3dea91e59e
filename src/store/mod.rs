//! Persistence collaborator seam.
//!
//! Orchestrators hand validated records to an [`OutreachStore`] one at a
//! time and report every provider call outcome through
//! [`OutreachStore::log_action`]. Store failures never fail an orchestrator
//! call; they are logged and the batch continues.
//!
//! [`AuditRow`] and [`OutreachRecord`] are the row shapes derived from a
//! lead audit before it is saved.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::followup::INITIAL_FOLLOW_UP_DAYS;
use crate::records::{EmailSequence, LeadDetails, Tone};
use crate::status::ErrorKind;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::LeadRecord;

/// Fixed score recorded for dimensions the audit does not measure.
pub const UNSCORED_DIMENSION: f64 = 50.0;

/// Where validated records go.
///
/// # Object Safety
///
/// Used as `Arc<dyn OutreachStore>`.
#[async_trait]
pub trait OutreachStore: Send + Sync {
    /// Persist one lead. Implementations may skip duplicates.
    async fn save_lead(&self, lead: &LeadRecord) -> Result<(), StoreError>;

    /// Persist the audit row derived from a lead's details.
    async fn save_audit(&self, audit: &AuditRow) -> Result<(), StoreError>;

    /// Persist the opening email and follow-up schedule for a lead.
    async fn save_outreach(&self, outreach: &OutreachRecord) -> Result<(), StoreError>;

    /// Record one provider call outcome. `error` is `None` on success.
    ///
    /// Must not fail the caller; implementations swallow their own errors.
    async fn log_action(&self, action: &str, model: &str, error: Option<ErrorKind>);
}

/// Scored audit summary for a lead, with the full details kept alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRow {
    pub lead_id: Uuid,
    pub performance_score: f64,
    pub seo_score: f64,
    pub conversion_score: f64,
    pub branding_score: f64,
    pub trust_score: f64,
    pub digital_maturity_index: f64,
    pub primary_opportunity: String,
    pub raw_data: LeadDetails,
}

impl AuditRow {
    /// Map audit details onto score columns. Missing numbers become 0.
    pub fn from_details(lead_id: Uuid, details: &LeadDetails) -> Self {
        let maturity = details.digital_maturity.score.unwrap_or(0.0);
        Self {
            lead_id,
            performance_score: details.priority_score.unwrap_or(0.0),
            seo_score: maturity,
            conversion_score: details
                .revenue_insights
                .response_probability
                .unwrap_or(0.0),
            branding_score: UNSCORED_DIMENSION,
            trust_score: UNSCORED_DIMENSION,
            digital_maturity_index: maturity,
            primary_opportunity: details
                .digital_maturity
                .biggest_gap
                .clone()
                .unwrap_or_default(),
            raw_data: details.clone(),
        }
    }
}

/// The opening email of a sequence plus its follow-up schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub tone: Tone,
    pub subject: String,
    pub body: String,
    /// 1-based position in the sequence.
    pub follow_up_stage: u8,
    /// `None` once the sequence has ended.
    pub next_follow_up_date: Option<DateTime<Utc>>,
    pub response_received: bool,
    pub sequence_data: EmailSequence,
}

impl OutreachRecord {
    /// Build the stage-1 record from the first step of the sequence.
    ///
    /// Returns `None` when the sequence has no steps.
    pub fn from_details(
        lead_id: Uuid,
        tone: Tone,
        details: &LeadDetails,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let first = details.outreach.steps.first()?;
        Some(Self {
            id: Uuid::new_v4(),
            lead_id,
            created_at: now,
            tone,
            subject: first.subject.clone().unwrap_or_default(),
            body: first.body.clone().unwrap_or_default(),
            follow_up_stage: 1,
            next_follow_up_date: Some(now + Duration::days(INITIAL_FOLLOW_UP_DAYS)),
            response_received: false,
            sequence_data: details.outreach.clone(),
        })
    }
}
