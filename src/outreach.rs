//! Outreach orchestrators.
//!
//! Every operation follows the same path:
//!
//! ```text
//! prompt ──► RetryController::run(Backend::complete) ──► extract_json_text ──► validate_*
//!                                                                              │
//!                                       ServiceResponse::Success ◄── persist ◄─┘
//! ```
//!
//! Any failure before persistence returns [`ServiceResponse::Error`] and
//! nothing is saved. Persistence failures are logged and skipped; they never
//! turn a successful generation into an error.

use crate::backend::{grounding_sources, GenerationOptions, LlmRequest, LlmResponse};
use crate::classify::{ClassifiedError, GenerationResult};
use crate::config::EngineConfig;
use crate::context::EngineCtx;
use crate::error::{ConfigError, ValidationError};
use crate::extract::{extract_json_text, snippet};
use crate::prompts::{self, Prompt};
use crate::records::{LeadBatch, LeadDetails, LeadRecord, SearchCriteria, TimingRecommendation, Tone};
use crate::response::ServiceResponse;
use crate::status::{ErrorKind, ProviderStatus};
use crate::store::{AuditRow, OutreachRecord};
use crate::validate::{validate_lead_details, validate_leads, validate_timing};
use chrono::Utc;
use serde_json::json;

/// Action tag for lead searches.
pub const ACTION_GENERATE_LEADS: &str = "GENERATE_LEADS";
/// Action tag for lead audits.
pub const ACTION_GENERATE_LEAD_DETAILS: &str = "GENERATE_LEAD_DETAILS";
/// Action tag for follow-up timing analysis.
pub const ACTION_ANALYZE_FOLLOW_UP: &str = "ANALYZE_FOLLOW_UP";

const PING_PROMPT: &str = "Ping";

/// Entry point for the outreach operations.
///
/// # Example
///
/// ```no_run
/// use revenue_engine::config::EngineConfig;
/// use revenue_engine::outreach::Engine;
/// use revenue_engine::records::SearchCriteria;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::from_config(&EngineConfig::from_env()?)?;
/// let response = engine
///     .generate_leads(&SearchCriteria::new("Plumbing", "Austin, TX"))
///     .await;
/// if let Some(batch) = response.data() {
///     println!("{} leads", batch.leads.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Engine {
    ctx: EngineCtx,
}

impl Engine {
    pub fn new(ctx: EngineCtx) -> Self {
        Self { ctx }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        EngineCtx::from_config(config).map(Self::new)
    }

    pub fn ctx(&self) -> &EngineCtx {
        &self.ctx
    }

    /// Current provider status.
    pub fn provider_status(&self) -> ProviderStatus {
        self.ctx.retry.register().get()
    }

    /// One generation call under the retry controller.
    async fn generate(
        &self,
        action: &str,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> GenerationResult<LlmResponse> {
        let backend = &self.ctx.backend;
        if !backend.is_configured() {
            self.ctx.retry.register().set(ProviderStatus::NotConfigured);
            tracing::warn!(action, backend = backend.name(), "provider API key not configured");
            return Err(ClassifiedError::new(
                ErrorKind::NotConfigured,
                "Provider API key not configured",
            ));
        }

        let model = self.ctx.model.as_str();
        let request = LlmRequest::new(model, prompt.user)
            .with_system(prompt.system)
            .with_options(options);

        let client = &self.ctx.client;
        let base_url = self.ctx.base_url.as_str();
        let request = &request;
        self.ctx
            .retry
            .run(action, model, move || backend.complete(client, base_url, request))
            .await
    }

    fn options(&self) -> GenerationOptions {
        GenerationOptions::default()
            .with_temperature(self.ctx.temperature)
            .with_json_response(true)
    }

    fn parse_failure<T>(action: &str, raw: &str, err: ValidationError) -> ServiceResponse<T> {
        tracing::warn!(
            action,
            error = %err,
            output = %snippet(raw, 200),
            "model output failed validation"
        );
        ServiceResponse::error(err)
    }

    /// Search for leads matching `criteria` and persist each one.
    pub async fn generate_leads(&self, criteria: &SearchCriteria) -> ServiceResponse<LeadBatch> {
        let options = self.options().with_tool(json!({"googleSearch": {}}));
        let response = match self
            .generate(ACTION_GENERATE_LEADS, prompts::lead_search(criteria), options)
            .await
        {
            Ok(response) => response,
            Err(err) => return ServiceResponse::error(err),
        };

        let sources = grounding_sources(response.metadata.as_ref());
        let leads = match validate_leads(&extract_json_text(&response.text)) {
            Ok(leads) => leads,
            Err(err) => return Self::parse_failure(ACTION_GENERATE_LEADS, &response.text, err),
        };

        if let Some(ref store) = self.ctx.store {
            for lead in &leads {
                if let Err(err) = store.save_lead(lead).await {
                    tracing::warn!(lead_id = %lead.id, error = %err, "failed to persist lead");
                }
            }
        }

        tracing::info!(
            industry = %criteria.industry,
            location = %criteria.location,
            leads = leads.len(),
            sources = sources.len(),
            "lead search complete"
        );
        ServiceResponse::success(LeadBatch { leads, sources })
    }

    /// Audit `lead`, write an outreach sequence in `tone`, and persist both.
    pub async fn generate_lead_details(
        &self,
        lead: &LeadRecord,
        tone: Tone,
    ) -> ServiceResponse<LeadDetails> {
        let options = self.options().with_tool(json!({"googleSearch": {}}));
        let response = match self
            .generate(ACTION_GENERATE_LEAD_DETAILS, prompts::lead_audit(lead, tone), options)
            .await
        {
            Ok(response) => response,
            Err(err) => return ServiceResponse::error(err),
        };

        let details = match validate_lead_details(&extract_json_text(&response.text)) {
            Ok(details) => details,
            Err(err) => {
                return Self::parse_failure(ACTION_GENERATE_LEAD_DETAILS, &response.text, err)
            }
        };

        if let Some(ref store) = self.ctx.store {
            let audit = AuditRow::from_details(lead.id, &details);
            if let Err(err) = store.save_audit(&audit).await {
                tracing::warn!(lead_id = %lead.id, error = %err, "failed to persist audit");
            }

            match OutreachRecord::from_details(lead.id, tone, &details, Utc::now()) {
                Some(outreach) => {
                    if let Err(err) = store.save_outreach(&outreach).await {
                        tracing::warn!(lead_id = %lead.id, error = %err, "failed to persist outreach");
                    }
                }
                None => {
                    tracing::warn!(lead_id = %lead.id, "audit has no outreach steps; outreach not saved")
                }
            }
        }

        tracing::info!(lead_id = %lead.id, tone = %tone, "lead audit complete");
        ServiceResponse::success(details)
    }

    /// Recommend when to send the next follow-up. Nothing is persisted.
    pub async fn analyze_follow_up_timing(
        &self,
        industry: &str,
        context: &str,
    ) -> ServiceResponse<TimingRecommendation> {
        let response = match self
            .generate(
                ACTION_ANALYZE_FOLLOW_UP,
                prompts::follow_up_timing(industry, context),
                self.options(),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => return ServiceResponse::error(err),
        };

        match validate_timing(&extract_json_text(&response.text)) {
            Ok(timing) => ServiceResponse::success(timing),
            Err(err) => Self::parse_failure(ACTION_ANALYZE_FOLLOW_UP, &response.text, err),
        }
    }

    /// Send one tiny request to check the credentials.
    ///
    /// Ignores the circuit breaker so a rotated key can clear a fatal
    /// status. Single attempt, no backoff.
    pub async fn validate_connection(&self) -> bool {
        let register = self.ctx.retry.register();
        let backend = &self.ctx.backend;
        if !backend.is_configured() {
            register.set(ProviderStatus::NotConfigured);
            return false;
        }

        let request = LlmRequest::new(self.ctx.model.as_str(), PING_PROMPT);
        match backend
            .complete(&self.ctx.client, &self.ctx.base_url, &request)
            .await
        {
            Ok(_) => {
                register.set(ProviderStatus::Connected);
                tracing::info!(backend = backend.name(), model = %self.ctx.model, "provider connection ok");
                true
            }
            Err(err) => {
                let classified = self.ctx.retry.classifier().classify(&err, register);
                tracing::warn!(
                    backend = backend.name(),
                    error_kind = %classified.kind,
                    error = %err,
                    "provider connection check failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockReply};
    use crate::response::ErrorCode;
    use crate::retry::RetryPolicy;
    use crate::status::ProviderStatusRegister;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    const DETAILS: &str = r#"{
        "digitalMaturity": {"score": 30, "biggestGap": "No booking"},
        "revenueInsights": {"responseProbability": 55},
        "enrichment": {},
        "competitors": [],
        "proposal": {},
        "outreach": {"steps": [{"step": 1, "subject": "Hi", "body": "Hello"}]},
        "priorityScore": 77
    }"#;

    struct Harness {
        engine: Engine,
        backend: Arc<MockBackend>,
        store: Arc<MemoryStore>,
    }

    fn harness(replies: Vec<MockReply>) -> Harness {
        let backend = Arc::new(MockBackend::new(replies));
        let store = Arc::new(MemoryStore::new());
        let ctx = EngineCtx::builder("http://unused")
            .backend(backend.clone())
            .store(store.clone())
            .register(Arc::new(ProviderStatusRegister::new()))
            .policy(RetryPolicy::new(3, Duration::from_millis(10)))
            .model("test-model")
            .build()
            .unwrap();
        Harness {
            engine: Engine::new(ctx),
            backend,
            store,
        }
    }

    fn lead() -> LeadRecord {
        validate_leads(r#"{"leads":[{"business_name":"Acme","website_url":"acme.com"}]}"#)
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn test_generate_leads_persists_each_lead() {
        let h = harness(vec![MockReply::text_with_metadata(
            r#"{"leads":[{"business_name":"Acme","location":"Austin"},{"business_name":"Bolt","location":"Austin"}]}"#,
            json!({"groundingChunks": [{"web": {"title": "Maps", "uri": "https://maps.example"}}]}),
        )]);
        let resp = h
            .engine
            .generate_leads(&SearchCriteria::new("Plumbing", "Austin"))
            .await;
        let batch = resp.data().unwrap();
        assert_eq!(batch.leads.len(), 2);
        assert_eq!(batch.sources.len(), 1);
        assert_eq!(h.store.lead_saves(), 2);
        assert_eq!(h.engine.provider_status(), ProviderStatus::Connected);

        let request = &h.backend.requests()[0];
        assert_eq!(request.model, "test-model");
        assert!(request.options.json_response);
        assert_eq!(request.options.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_leads_parse_failure_saves_nothing() {
        let h = harness(vec![MockReply::text(r#"{"foo": []}"#)]);
        let resp = h
            .engine
            .generate_leads(&SearchCriteria::new("Plumbing", "Austin"))
            .await;
        let err = resp.error_ref().unwrap();
        assert_eq!(err.code, ErrorCode::ParsingFailed);
        assert!(!err.retryable);
        assert_eq!(h.backend.calls(), 1);
        assert_eq!(h.store.lead_saves(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_call() {
        let h = harness(vec![MockReply::text(
            r#"{"leads":[{"business_name":"Acme"},{"business_name":"Bolt"}]}"#,
        )]);
        h.store.set_failing(true);
        let resp = h
            .engine
            .generate_leads(&SearchCriteria::new("Plumbing", "Austin"))
            .await;
        assert!(resp.is_success());
        assert_eq!(h.store.lead_saves(), 2);
        assert!(h.store.leads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let h = harness(vec![
            MockReply::status(503, "unavailable"),
            MockReply::network("connection reset by peer"),
            MockReply::text(r#"{"leads":[]}"#),
        ]);
        let resp = h
            .engine
            .generate_leads(&SearchCriteria::new("Plumbing", "Austin"))
            .await;
        assert!(resp.is_success());
        assert_eq!(h.backend.calls(), 3);
        let logged: Vec<_> = h.store.actions().into_iter().map(|a| a.error).collect();
        assert_eq!(
            logged,
            vec![Some(ErrorKind::NetworkError), Some(ErrorKind::NetworkError), None]
        );
    }

    #[tokio::test]
    async fn test_not_configured_makes_no_call() {
        let backend = Arc::new(MockBackend::fixed("{}").unconfigured());
        let ctx = EngineCtx::builder("http://unused")
            .backend(backend.clone())
            .register(Arc::new(ProviderStatusRegister::new()))
            .build()
            .unwrap();
        let engine = Engine::new(ctx);
        let resp = engine.analyze_follow_up_timing("Dental", "no reply yet").await;
        let err = resp.error_ref().unwrap();
        assert_eq!(err.code, ErrorCode::NotConfigured);
        assert!(!err.retryable);
        assert_eq!(backend.calls(), 0);
        assert!(!engine.validate_connection().await);
        assert_eq!(engine.provider_status(), ProviderStatus::NotConfigured);
    }

    #[tokio::test]
    async fn test_lead_details_persists_audit_and_outreach() {
        let h = harness(vec![MockReply::text(format!("```json\n{DETAILS}\n```"))]);
        let lead = lead();
        let resp = h.engine.generate_lead_details(&lead, Tone::Analytical).await;
        let details = resp.data().unwrap();
        assert_eq!(details.priority_score, Some(77.0));

        let audits = h.store.audits();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].lead_id, lead.id);
        assert_eq!(audits[0].performance_score, 77.0);

        let outreach = h.store.outreach();
        assert_eq!(outreach.len(), 1);
        assert_eq!(outreach[0].tone, Tone::Analytical);
        assert_eq!(outreach[0].subject, "Hi");
    }

    #[tokio::test]
    async fn test_lead_details_without_steps_skips_outreach() {
        let no_steps = DETAILS.replace(
            r#"{"steps": [{"step": 1, "subject": "Hi", "body": "Hello"}]}"#,
            r#"{"steps": []}"#,
        );
        let h = harness(vec![MockReply::text(no_steps)]);
        let resp = h.engine.generate_lead_details(&lead(), Tone::Soft).await;
        assert!(resp.is_success());
        assert_eq!(h.store.audits().len(), 1);
        assert!(h.store.outreach().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_timing() {
        let h = harness(vec![MockReply::text(
            r#"Sure: {"recommendedDay":"Tuesday","recommendedTime":"10:00 AM","confidenceScore":82,"reasoning":"Mid-week"}"#,
        )]);
        let resp = h.engine.analyze_follow_up_timing("Dental", "opened twice").await;
        let timing = resp.data().unwrap();
        assert_eq!(timing.recommended_day, "Tuesday");
        assert_eq!(timing.confidence_score, 82.0);
        assert!(h.store.leads().is_empty());
    }

    #[tokio::test]
    async fn test_validate_connection_clears_fatal_status() {
        let h = harness(vec![MockReply::text("pong")]);
        h.engine.ctx().retry.register().set(ProviderStatus::InvalidKey);
        assert!(h.engine.validate_connection().await);
        assert_eq!(h.engine.provider_status(), ProviderStatus::Connected);
        assert_eq!(h.backend.requests()[0].prompt, "Ping");
    }

    #[tokio::test]
    async fn test_validate_connection_classifies_failure() {
        let h = harness(vec![MockReply::status(429, "quota exhausted for this month")]);
        assert!(!h.engine.validate_connection().await);
        assert_eq!(h.engine.provider_status(), ProviderStatus::QuotaExceeded);
        assert_eq!(h.backend.calls(), 1);
    }
}
