//! Follow-up schedule and lead lifecycle derivation.
//!
//! A sequence runs three emails: the opener, a follow-up four days after
//! stage 2 is scheduled, and a break-up five days after that. After stage 3
//! nothing else is scheduled.

use crate::records::LeadStatus;
use crate::store::OutreachRecord;
use chrono::{DateTime, Duration, Utc};

/// Days between the opener and the first follow-up.
pub const INITIAL_FOLLOW_UP_DAYS: i64 = 3;

/// Last stage of a sequence.
pub const FINAL_STAGE: u8 = 3;

/// The next scheduled step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    pub stage: u8,
    pub due: DateTime<Utc>,
}

/// Schedule the step after `current_stage`. `None` once the sequence ends.
///
/// ```
/// use chrono::{Duration, Utc};
/// use revenue_engine::followup::next_follow_up;
///
/// let now = Utc::now();
/// let next = next_follow_up(1, now).unwrap();
/// assert_eq!(next.stage, 2);
/// assert_eq!(next.due, now + Duration::days(4));
/// assert!(next_follow_up(3, now).is_none());
/// ```
pub fn next_follow_up(current_stage: u8, now: DateTime<Utc>) -> Option<FollowUp> {
    let stage = current_stage.checked_add(1)?;
    if stage > FINAL_STAGE {
        return None;
    }
    let days = if stage == 2 { 4 } else { 5 };
    Some(FollowUp {
        stage,
        due: now + Duration::days(days),
    })
}

impl OutreachRecord {
    /// Move to the next stage, or clear the due date when the sequence is over.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        match next_follow_up(self.follow_up_stage, now) {
            Some(next) => {
                self.follow_up_stage = next.stage;
                self.next_follow_up_date = Some(next.due);
            }
            None => self.next_follow_up_date = None,
        }
    }

    /// Due for a follow-up at `now` and still waiting on a reply.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.response_received && self.next_follow_up_date.is_some_and(|due| due <= now)
    }
}

impl LeadStatus {
    /// Lifecycle state implied by the lead's outreach and market scan.
    pub fn derive(
        outreach: Option<&OutreachRecord>,
        has_opportunity_score: bool,
        now: DateTime<Utc>,
    ) -> Self {
        match outreach {
            Some(o) if o.response_received => LeadStatus::Replied,
            Some(o) if o.next_follow_up_date.is_some_and(|due| due <= now) => {
                LeadStatus::FollowUpDue
            }
            Some(_) => LeadStatus::EmailSent,
            None if has_opportunity_score => LeadStatus::Analyzed,
            None => LeadStatus::New,
        }
    }
}
