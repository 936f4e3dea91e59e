//! End-to-end flows through the orchestrators, retry controller and store.

use revenue_engine::{
    Engine, EngineCtx, ErrorCode, MemoryStore, MockBackend, MockReply, OpenAiBackend,
    ProviderStatus, ProviderStatusRegister, RetryPolicy, SearchCriteria, ServiceResponse,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACME_RAW: &str = "Here is the data:\n```json\n{\"leads\":[{\"business_name\":\"Acme\",\"industry\":\"Plumbing\",\"location\":\"Austin\",\"website_url\":\"acme.com\",\"website_status\":\"Has Website\",\"source_platform\":\"Hybrid\",\"email\":\"a@acme.com\",\"notes\":\"\",\"contact_info\":{\"fullName\":\"\",\"phone\":\"\"},\"market_scan\":{\"opportunityScore\":80,\"digitalMaturityScore\":40,\"estimatedDealValue\":\"$5k\",\"competitiveRisk\":\"Low\",\"priorityRank\":1}}]}\n```";

fn criteria() -> SearchCriteria {
    SearchCriteria::new("Plumbing", "Austin")
}

fn engine_with(
    backend: Arc<dyn revenue_engine::Backend>,
    base_url: &str,
) -> (Engine, Arc<MemoryStore>, Arc<ProviderStatusRegister>) {
    let store = Arc::new(MemoryStore::new());
    let register = Arc::new(ProviderStatusRegister::new());
    let ctx = EngineCtx::builder(base_url)
        .backend(backend)
        .store(store.clone())
        .register(register.clone())
        .policy(RetryPolicy::new(3, Duration::from_millis(10)))
        .model("llama3-8b-8192")
        .build()
        .unwrap();
    (Engine::new(ctx), store, register)
}

#[tokio::test]
async fn fenced_lead_list_is_validated_and_saved_once() {
    let mock = Arc::new(MockBackend::fixed(ACME_RAW));
    let (engine, store, register) = engine_with(mock.clone(), "http://unused");

    let resp = engine.generate_leads(&criteria()).await;
    let batch = match resp {
        ServiceResponse::Success { data } => data,
        ServiceResponse::Error { error } => panic!("expected success, got {error}"),
    };
    assert_eq!(batch.leads.len(), 1);
    assert_eq!(batch.leads[0].business_name, "Acme");
    assert_eq!(batch.leads[0].market_scan.opportunity_score, Some(80.0));
    assert_eq!(store.lead_saves(), 1);
    assert_eq!(mock.calls(), 1);
    assert_eq!(register.get(), ProviderStatus::Connected);
}

#[tokio::test]
async fn rejected_key_returns_invalid_key_and_saves_nothing() {
    let mock = Arc::new(MockBackend::new(vec![MockReply::status(401, "Unauthorized")]));
    let (engine, store, register) = engine_with(mock.clone(), "http://unused");

    let resp = engine.generate_leads(&criteria()).await;
    let error = resp.error_ref().expect("expected an error");
    assert_eq!(error.code, ErrorCode::InvalidKey);
    assert!(!error.retryable);
    assert_eq!(store.lead_saves(), 0);
    assert_eq!(register.get(), ProviderStatus::InvalidKey);
    assert_eq!(mock.calls(), 1);

    let wire = serde_json::to_value(&resp).unwrap();
    assert_eq!(wire["status"], "error");
    assert_eq!(wire["error"]["code"], "invalid_key");
}

#[tokio::test]
async fn circuit_breaker_blocks_later_calls() {
    let mock = Arc::new(MockBackend::new(vec![
        MockReply::status(429, "You exceeded your current quota"),
        MockReply::text(ACME_RAW),
    ]));
    let (engine, store, register) = engine_with(mock.clone(), "http://unused");

    let first = engine.generate_leads(&criteria()).await;
    assert_eq!(first.error_ref().unwrap().code, ErrorCode::QuotaExceeded);
    assert_eq!(register.get(), ProviderStatus::QuotaExceeded);

    let second = engine
        .analyze_follow_up_timing("Plumbing", "no reply")
        .await;
    assert_eq!(second.error_ref().unwrap().code, ErrorCode::QuotaExceeded);
    assert_eq!(mock.calls(), 1);
    assert_eq!(store.lead_saves(), 0);

    // A successful connection check clears the breaker.
    assert!(engine.validate_connection().await);
    assert_eq!(register.get(), ProviderStatus::Connected);
    assert!(engine.generate_leads(&criteria()).await.is_success());
}

#[tokio::test]
async fn missing_leads_array_is_parsing_failed() {
    let mock = Arc::new(MockBackend::fixed(r#"{"foo": []}"#));
    let (engine, store, _register) = engine_with(mock.clone(), "http://unused");

    let resp = engine.generate_leads(&criteria()).await;
    let error = resp.error_ref().unwrap();
    assert_eq!(error.code, ErrorCode::ParsingFailed);
    assert!(!error.retryable);
    assert_eq!(mock.calls(), 1);
    assert_eq!(store.lead_saves(), 0);
    assert_eq!(
        serde_json::to_value(&resp).unwrap()["error"]["code"],
        "PARSING_FAILED"
    );
}

#[tokio::test]
async fn openai_backend_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk_test_0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "llama3-8b-8192",
            "choices": [{"message": {"role": "assistant", "content": ACME_RAW}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = Arc::new(OpenAiBackend::new().with_api_key("gsk_test_0123456789"));
    let (engine, store, _register) = engine_with(backend, &format!("{}/v1", server.uri()));

    let batch = engine.generate_leads(&criteria()).await.into_result().unwrap();
    assert_eq!(batch.leads[0].email, "a@acme.com");
    assert_eq!(store.leads().len(), 1);
}

#[tokio::test]
async fn openai_backend_rejected_key_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid API Key"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = Arc::new(OpenAiBackend::new().with_api_key("gsk_revoked_0123456789"));
    let (engine, store, register) = engine_with(backend, &server.uri());

    let resp = engine.generate_leads(&criteria()).await;
    assert_eq!(resp.error_ref().unwrap().code, ErrorCode::InvalidKey);
    assert_eq!(register.get(), ProviderStatus::InvalidKey);

    // Breaker is open, so the server sees no second request.
    let again = engine.generate_leads(&criteria()).await;
    assert_eq!(again.error_ref().unwrap().code, ErrorCode::InvalidKey);
    assert_eq!(store.actions().len(), 1);
}

#[cfg(feature = "gemini")]
#[tokio::test]
async fn transport_failure_never_exposes_api_key() {
    use revenue_engine::GeminiBackend;

    const KEY: &str = "AIzaSECRETKEY_0123456789";
    let backend = Arc::new(GeminiBackend::new().with_api_key(KEY));
    let store = Arc::new(MemoryStore::new());
    let ctx = EngineCtx::builder("http://127.0.0.1:9")
        .backend(backend)
        .store(store)
        .register(Arc::new(ProviderStatusRegister::new()))
        .policy(RetryPolicy::single())
        .model("gemini-1.5-pro")
        .build()
        .unwrap();
    let engine = Engine::new(ctx);

    let resp = engine
        .analyze_follow_up_timing("Plumbing", "no reply")
        .await;
    let error = resp.error_ref().expect("closed port should fail");
    assert_eq!(error.code, ErrorCode::NetworkError);
    assert!(!error.message.contains(KEY), "leaked: {}", error.message);
    assert!(!serde_json::to_string(&resp).unwrap().contains(KEY));
}
