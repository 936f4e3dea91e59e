//! In-memory [`OutreachStore`] with duplicate detection.
//!
//! Keeps everything in process memory and records every call, which makes it
//! the store of choice for tests and demos. Leads that look like ones
//! already stored are skipped rather than saved twice.

use super::{AuditRow, OutreachRecord, OutreachStore};
use crate::error::StoreError;
use crate::records::LeadRecord;
use crate::status::ErrorKind;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// One `log_action` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub action: String,
    pub model: String,
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Default)]
struct Tables {
    leads: Vec<LeadRecord>,
    audits: Vec<AuditRow>,
    outreach: Vec<OutreachRecord>,
    actions: Vec<ActionLogEntry>,
}

/// Process-local store.
///
/// # Example
///
/// ```
/// use revenue_engine::store::MemoryStore;
///
/// let store = MemoryStore::new();
/// assert!(store.leads().is_empty());
/// let broken = MemoryStore::new().failing();
/// assert_eq!(broken.lead_saves(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_saves: AtomicBool,
    lead_saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `save_*` call fail with [`StoreError::Backend`].
    pub fn failing(self) -> Self {
        self.fail_saves.store(true, Ordering::Relaxed);
        self
    }

    /// Toggle save failures on a live store.
    pub fn set_failing(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Number of `save_lead` calls received, including rejected ones.
    pub fn lead_saves(&self) -> usize {
        self.lead_saves.load(Ordering::Relaxed)
    }

    pub fn leads(&self) -> Vec<LeadRecord> {
        self.lock().leads.clone()
    }

    pub fn audits(&self) -> Vec<AuditRow> {
        self.lock().audits.clone()
    }

    pub fn outreach(&self) -> Vec<OutreachRecord> {
        self.lock().outreach.clone()
    }

    pub fn actions(&self) -> Vec<ActionLogEntry> {
        self.lock().actions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Poisoning only means a writer panicked; the tables stay valid.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failing(&self, what: &str) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Backend(format!("{what} rejected by memory store")));
        }
        Ok(())
    }
}

/// Hostname without `www.`, lowercased. Accepts bare domains.
fn domain_of(website: &str) -> Option<String> {
    let website = website.trim();
    if website.is_empty() {
        return None;
    }
    let parsed = if website.starts_with("http") {
        Url::parse(website)
    } else {
        Url::parse(&format!("https://{website}"))
    };
    let host = parsed.ok()?.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Same email, same website domain, or same name in the same place.
pub fn is_duplicate(lead: &LeadRecord, existing: &[LeadRecord]) -> bool {
    if !lead.email.is_empty()
        && existing
            .iter()
            .any(|m| m.email.eq_ignore_ascii_case(&lead.email))
    {
        return true;
    }

    if let Some(domain) = domain_of(&lead.website_url) {
        if existing
            .iter()
            .any(|m| domain_of(&m.website_url).as_deref() == Some(domain.as_str()))
        {
            return true;
        }
    }

    existing.iter().any(|m| {
        m.business_name.to_lowercase() == lead.business_name.to_lowercase()
            && m.location.to_lowercase() == lead.location.to_lowercase()
    })
}

#[async_trait]
impl OutreachStore for MemoryStore {
    async fn save_lead(&self, lead: &LeadRecord) -> Result<(), StoreError> {
        self.lead_saves.fetch_add(1, Ordering::Relaxed);
        self.check_failing("lead")?;
        if lead.business_name.trim().is_empty() {
            return Err(StoreError::Invalid("lead has no business name".into()));
        }

        let mut tables = self.lock();
        if is_duplicate(lead, &tables.leads) {
            tracing::debug!(lead_id = %lead.id, business = %lead.business_name, "skipping duplicate lead");
            return Ok(());
        }
        tables.leads.push(lead.clone());
        Ok(())
    }

    async fn save_audit(&self, audit: &AuditRow) -> Result<(), StoreError> {
        self.check_failing("audit")?;
        self.lock().audits.push(audit.clone());
        Ok(())
    }

    async fn save_outreach(&self, outreach: &OutreachRecord) -> Result<(), StoreError> {
        self.check_failing("outreach")?;
        self.lock().outreach.push(outreach.clone());
        Ok(())
    }

    async fn log_action(&self, action: &str, model: &str, error: Option<ErrorKind>) {
        self.lock().actions.push(ActionLogEntry {
            action: action.to_string(),
            model: model.to_string(),
            error,
        });
    }
}
