//! System instructions and prompts for the outreach orchestrators.
//!
//! Each prompt spells out the exact JSON shape expected back. Providers do
//! not always comply, so every response still goes through
//! [`extract_json_text`](crate::extract::extract_json_text) and a validator.

use crate::records::{LeadRecord, SearchCriteria, Tone};

/// Number of leads requested per search.
pub const LEADS_PER_SEARCH: usize = 15;

/// A system instruction plus the user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Wrap text in a labeled section.
pub fn section(label: &str, content: &str) -> String {
    format!("## {}\n{}", label, content)
}

/// Create a numbered list from items (1-indexed).
pub fn numbered_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

const STRICT_JSON: &str = "Return STRICT JSON only. No markdown, no commentary.";

const LEADS_SCHEMA: &str = r#"{
  "leads": [
    {
      "business_name": "Name",
      "industry": "Sub-niche",
      "location": "City",
      "website_url": "URL",
      "website_status": "Has Website | No Website | Outdated Website",
      "source_platform": "{source}",
      "email": "Email",
      "notes": "Strategy note",
      "contact_info": { "fullName": "Name", "phone": "Phone" },
      "market_scan": {
        "opportunityScore": 0,
        "digitalMaturityScore": 0,
        "estimatedDealValue": "$Value",
        "competitiveRisk": "Low | Medium | High",
        "priorityRank": 1,
        "opportunityType": "Website | SEO | Automation | Ads"
      }
    }
  ]
}"#;

const DETAILS_SCHEMA: &str = r#"{
  "digitalMaturity": { "score": 0, "level": "Low | Medium | High", "techStack": [], "biggestGap": "" },
  "revenueInsights": { "estimatedTier": "", "dealSizeEstimate": "", "responseProbability": 0, "urgencyScore": 0 },
  "enrichment": { "cms": "", "analytics": [], "ssl": true, "mobileResponsive": true, "pageSpeedObservation": "", "socialPresence": [] },
  "competitors": [ { "name": "", "advantage": "", "vulnerability": "" } ],
  "proposal": { "problemSummary": "", "solution": "", "scopeOfWork": [], "outcome": "", "timeline": "", "pricingRange": "", "roiReasoning": "" },
  "outreach": {
    "steps": [ { "step": 1, "subject": "", "body": "", "type": "Introduction | Value Add | Break-up", "hook_used": "" } ],
    "hook_type": "",
    "angle": ""
  },
  "auditSummary": "",
  "strategicRecommendations": [],
  "priorityScore": 0
}"#;

const TIMING_SCHEMA: &str = r#"{
  "recommendedDay": "Tuesday",
  "recommendedTime": "10:00 AM",
  "confidenceScore": 0,
  "reasoning": "Why this timing"
}"#;

/// Prompt for [`Engine::generate_leads`](crate::outreach::Engine::generate_leads).
pub fn lead_search(criteria: &SearchCriteria) -> Prompt {
    let system = format!(
        "You are an Elite Revenue Intelligence Agent.\n\n\
         Generate {count} high-value leads for: {size} {industry} in {location}.\n\
         Source strategy: {source}.\n\
         Website filter: {website}.\n\
         Strategic intent: {intent}.\n\n\
         {STRICT_JSON}",
        count = LEADS_PER_SEARCH,
        size = criteria.business_size.as_str(),
        industry = criteria.industry,
        location = criteria.location,
        source = criteria.source_strategy.as_str(),
        website = criteria.website_filter.as_str(),
        intent = criteria.strategic_intent.as_str(),
    );

    let schema = LEADS_SCHEMA.replace("{source}", criteria.source_strategy.as_str());
    let user = [
        section(
            "Task",
            &format!(
                "Find {} real {} businesses in {}.",
                LEADS_PER_SEARCH, criteria.industry, criteria.location
            ),
        ),
        section(
            "Rules",
            &numbered_list(&[
                "Score opportunityScore and digitalMaturityScore from 0 to 100.",
                "Rank leads by priorityRank, 1 being the best opportunity.",
                "Leave a field empty rather than inventing contact details.",
            ]),
        ),
        section("Output format", schema.as_str()),
    ]
    .join("\n\n");

    Prompt { system, user }
}

/// Prompt for [`Engine::generate_lead_details`](crate::outreach::Engine::generate_lead_details).
pub fn lead_audit(lead: &LeadRecord, tone: Tone) -> Prompt {
    let system = format!(
        "You are an advanced AI revenue consultant.\n\n\
         Audit {name} and write a three-step outreach sequence.\n\
         Tone: {tone}.\n\n\
         {STRICT_JSON}",
        name = lead.business_name,
    );

    let mut facts = vec![
        format!("Business: {}", lead.business_name),
        format!("Industry: {}", lead.industry),
        format!("Location: {}", lead.location),
        format!("Website: {}", lead.website_url),
    ];
    if !lead.notes.is_empty() {
        facts.push(format!("Notes: {}", lead.notes));
    }

    let user = [
        section("Lead", &facts.join("\n")),
        section(
            "Outreach",
            &numbered_list(&[
                "Step 1 introduces the biggest gap found in the audit.",
                "Step 2 adds value with a concrete idea.",
                "Step 3 is a short break-up email.",
            ]),
        ),
        section("Output format", DETAILS_SCHEMA),
    ]
    .join("\n\n");

    Prompt { system, user }
}

/// Prompt for [`Engine::analyze_follow_up_timing`](crate::outreach::Engine::analyze_follow_up_timing).
pub fn follow_up_timing(industry: &str, context: &str) -> Prompt {
    let system = format!(
        "You are a sales psychology strategist.\n\
         Recommend the best day and time to send the next follow-up.\n\n\
         {STRICT_JSON}"
    );

    let user = [
        section("Industry", industry),
        section("Context", context),
        section("Output format", TIMING_SCHEMA),
    ]
    .join("\n\n");

    Prompt { system, user }
}
