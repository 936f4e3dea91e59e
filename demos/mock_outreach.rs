//! Example: the full outreach flow against a scripted backend.
//!
//! The first call fails with a 503 and is retried; the audit and timing
//! calls answer with fenced or chatty JSON that still validates.
//!
//! Run with: `RUST_LOG=revenue_engine=debug cargo run --example mock_outreach`

use revenue_engine::{
    Engine, EngineCtx, MemoryStore, MockBackend, MockReply, ProviderStatusRegister, RetryPolicy,
    SearchCriteria, Tone,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LEADS: &str = r#"Here are the leads:
{"leads": [
  {"business_name": "Acme Plumbing", "website_url": "https://acmeplumbing.example", "location": "Austin, TX",
   "market_scan": {"opportunityScore": 80, "opportunityType": "SEO"}},
  {"business_name": "Bolt Electric", "website_status": "No Website", "location": "Austin, TX"}
]}"#;

const DETAILS: &str = r#"```json
{
  "digitalMaturity": {"score": 35, "level": "Low", "biggestGap": "No online booking"},
  "revenueInsights": {"dealSizeEstimate": "$3k-$5k", "responseProbability": 60},
  "enrichment": {"ssl": true, "mobileResponsive": false},
  "competitors": [{"name": "Rapid Rooter", "vulnerability": "Slow site"}],
  "proposal": {"problemSummary": "Mobile visitors bounce", "pricingRange": "$3,500"},
  "outreach": {"steps": [
    {"step": 1, "subject": "Quick idea for Acme", "body": "Noticed your site...", "type": "Introduction"},
    {"step": 2, "subject": "Booking example", "body": "Here is how...", "type": "Value Add"},
    {"step": 3, "subject": "Closing the loop", "body": "Last note...", "type": "Break-up"}
  ]},
  "priorityScore": 82
}
```"#;

const TIMING: &str = r#"{"recommendedDay": "Tuesday", "recommendedTime": "9:30 AM", "confidenceScore": 74, "reasoning": "Trades check email before dispatch."}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mock = Arc::new(MockBackend::new(vec![
        MockReply::status(503, "service unavailable"),
        MockReply::text(LEADS),
        MockReply::text(DETAILS),
        MockReply::text(TIMING),
    ]));
    let store = Arc::new(MemoryStore::new());

    let ctx = EngineCtx::builder("http://unused")
        .backend(mock.clone())
        .store(store.clone())
        .register(Arc::new(ProviderStatusRegister::new()))
        .policy(RetryPolicy::new(3, Duration::from_millis(200)))
        .build()?;
    let engine = Engine::new(ctx);

    let batch = engine
        .generate_leads(&SearchCriteria::new("Plumbing", "Austin, TX"))
        .await
        .into_result()?;
    for lead in &batch.leads {
        println!(
            "lead: {} [{}] opportunity={:?}",
            lead.business_name, lead.website_status, lead.market_scan.opportunity_score
        );
    }

    let Some(lead) = batch.leads.first() else {
        anyhow::bail!("no leads returned");
    };
    let details = engine
        .generate_lead_details(lead, Tone::ValueDriven)
        .await
        .into_result()?;
    println!(
        "audit: priority={:?} gap={:?} steps={}",
        details.priority_score,
        details.digital_maturity.biggest_gap,
        details.outreach.steps.len()
    );

    let timing = engine
        .analyze_follow_up_timing("Plumbing", "Opened step 1 twice, no reply")
        .await
        .into_result()?;
    println!("next send: {} at {}", timing.recommended_day, timing.recommended_time);

    println!(
        "provider status: {}, backend calls: {}, stored leads: {}, outreach rows: {}",
        engine.provider_status(),
        mock.calls(),
        store.leads().len(),
        store.outreach().len()
    );
    Ok(())
}
