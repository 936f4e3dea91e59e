//! # Revenue Engine
//!
//! Resilient LLM generation for lead discovery and outreach.
//!
//! Every provider call goes through the same path: a [`RetryController`]
//! with exponential backoff, an [`ErrorClassifier`] that maps failures to a
//! small set of error kinds, and a process-wide [`ProviderStatusRegister`]
//! that acts as a circuit breaker once the key is rejected or the quota is
//! gone. Model output is pulled out of prose or code fences, validated into
//! typed records, and persisted through an [`OutreachStore`].
//!
//! ## Core Concepts
//!
//! - **[`Backend`]**: object-safe trait for a provider API. Ships with
//!   [`OpenAiBackend`] (OpenAI-compatible, Groq by default),
//!   [`GeminiBackend`] and a scripted [`MockBackend`].
//! - **[`EngineCtx`]**: shared context (HTTP client, backend, model, retry
//!   controller, optional store).
//! - **[`Engine`]**: the orchestrators. `generate_leads`,
//!   `generate_lead_details`, `analyze_follow_up_timing` and
//!   `validate_connection`.
//! - **[`ServiceResponse`]**: tagged success or error returned by every
//!   orchestrator. Callers never see a panic or a raw transport error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use revenue_engine::{Engine, EngineConfig, SearchCriteria, ServiceResponse};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::from_config(&EngineConfig::from_env()?)?;
//!
//!     match engine.generate_leads(&SearchCriteria::new("Roofing", "Denver, CO")).await {
//!         ServiceResponse::Success { data } => {
//!             for lead in &data.leads {
//!                 println!("{} ({})", lead.business_name, lead.website_url);
//!             }
//!         }
//!         ServiceResponse::Error { error } => eprintln!("{error}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod followup;
pub mod outreach;
pub mod prompts;
pub mod records;
pub mod response;
pub mod retry;
pub mod status;
pub mod store;
pub mod validate;

#[cfg(feature = "gemini")]
pub use backend::GeminiBackend;
pub use backend::{Backend, LlmRequest, LlmResponse, MockBackend, MockReply, OpenAiBackend};
pub use classify::{ClassifiedError, ErrorClassifier, GenerationResult};
pub use config::{EngineConfig, ProviderKind};
pub use context::{EngineCtx, EngineCtxBuilder};
pub use error::{ConfigError, ProviderError, Result, StoreError, ValidationError};
pub use outreach::Engine;
pub use records::{
    LeadBatch, LeadDetails, LeadRecord, LeadStatus, SearchCriteria, TimingRecommendation, Tone,
};
pub use response::{ErrorCode, ServiceError, ServiceResponse};
pub use retry::{RetryController, RetryPolicy};
pub use status::{ErrorKind, ProviderStatus, ProviderStatusRegister};
pub use store::{MemoryStore, OutreachStore};
