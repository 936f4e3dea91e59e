//! Domain records produced by the outreach orchestrators.
//!
//! Field names on the wire match what the model is asked to return
//! (`business_name`, `market_scan.opportunityScore`, ...), so records can be
//! serialized straight back out for persistence or display.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LeadStatus {
    #[default]
    New,
    Analyzed,
    #[serde(rename = "Email Sent")]
    EmailSent,
    #[serde(rename = "Follow-Up Due")]
    FollowUpDue,
    Replied,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

/// Point of contact at a lead. Either field may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Quick market assessment attached to each lead. Empty (`{}`) when the
/// model omitted it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketScan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_maturity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_deal_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_type: Option<String>,
}

impl MarketScan {
    /// True when none of the fields were provided.
    pub fn is_empty(&self) -> bool {
        *self == MarketScan::default()
    }
}

/// A prospective business lead, validated and ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub business_name: String,
    pub industry: String,
    pub location: String,
    pub website_url: String,
    pub website_status: String,
    pub source_platform: String,
    pub email: String,
    pub notes: String,
    pub contact_info: ContactInfo,
    pub market_scan: MarketScan,
    pub status: LeadStatus,
}

/// Where lead discovery should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SourceStrategy {
    #[default]
    Hybrid,
    #[serde(rename = "Google Maps")]
    GoogleMaps,
    Instagram,
    LinkedIn,
    Directories,
}

impl SourceStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStrategy::Hybrid => "Hybrid",
            SourceStrategy::GoogleMaps => "Google Maps",
            SourceStrategy::Instagram => "Instagram",
            SourceStrategy::LinkedIn => "LinkedIn",
            SourceStrategy::Directories => "Directories",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
    #[default]
    Any,
}

impl BusinessSize {
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessSize::Small => "Small",
            BusinessSize::Medium => "Medium",
            BusinessSize::Large => "Large",
            BusinessSize::Any => "Any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WebsiteFilter {
    #[serde(rename = "With Website")]
    WithWebsite,
    #[serde(rename = "Without Website")]
    WithoutWebsite,
    #[default]
    All,
}

impl WebsiteFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            WebsiteFilter::WithWebsite => "With Website",
            WebsiteFilter::WithoutWebsite => "Without Website",
            WebsiteFilter::All => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StrategicIntent {
    #[default]
    #[serde(rename = "General Discovery")]
    GeneralDiscovery,
    #[serde(rename = "High-Value Fixer Uppers")]
    HighValueFixerUppers,
    #[serde(rename = "Digital Laggards")]
    DigitalLaggards,
    #[serde(rename = "Market Leaders")]
    MarketLeaders,
    #[serde(rename = "Quick Wins")]
    QuickWins,
}

impl StrategicIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategicIntent::GeneralDiscovery => "General Discovery",
            StrategicIntent::HighValueFixerUppers => "High-Value Fixer Uppers",
            StrategicIntent::DigitalLaggards => "Digital Laggards",
            StrategicIntent::MarketLeaders => "Market Leaders",
            StrategicIntent::QuickWins => "Quick Wins",
        }
    }
}

/// What the operator is searching for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub industry: String,
    pub location: String,
    #[serde(default)]
    pub source_strategy: SourceStrategy,
    #[serde(default)]
    pub business_size: BusinessSize,
    #[serde(default)]
    pub website_filter: WebsiteFilter,
    #[serde(default)]
    pub strategic_intent: StrategicIntent,
}

impl SearchCriteria {
    /// Criteria with default strategy, size, filter and intent.
    pub fn new(industry: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            location: location.into(),
            source_strategy: SourceStrategy::default(),
            business_size: BusinessSize::default(),
            website_filter: WebsiteFilter::default(),
            strategic_intent: StrategicIntent::default(),
        }
    }

    pub fn with_source_strategy(mut self, strategy: SourceStrategy) -> Self {
        self.source_strategy = strategy;
        self
    }

    pub fn with_business_size(mut self, size: BusinessSize) -> Self {
        self.business_size = size;
        self
    }

    pub fn with_website_filter(mut self, filter: WebsiteFilter) -> Self {
        self.website_filter = filter;
        self
    }

    pub fn with_strategic_intent(mut self, intent: StrategicIntent) -> Self {
        self.strategic_intent = intent;
        self
    }
}

/// Voice used for generated outreach copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Tone {
    Soft,
    #[default]
    Direct,
    Bold,
    Analytical,
    #[serde(rename = "Value-driven")]
    ValueDriven,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Soft => "Soft",
            Tone::Direct => "Direct",
            Tone::Bold => "Bold",
            Tone::Analytical => "Analytical",
            Tone::ValueDriven => "Value-driven",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Audit / lead details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalMaturity {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biggest_gap: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueInsights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_size_estimate: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub response_probability: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cms: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analytics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_responsive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_speed_observation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub social_presence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Competitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advantage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope_of_work: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_reasoning: Option<String>,
}

/// One email in an outreach sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailStep {
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// `Introduction`, `Value Add` or `Break-up`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailSequence {
    #[serde(default)]
    pub steps: Vec<EmailStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
}

/// Full AI audit of a lead, including the proposal and outreach sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetails {
    pub digital_maturity: DigitalMaturity,
    pub revenue_insights: RevenueInsights,
    pub enrichment: EnrichmentData,
    pub competitors: Vec<Competitor>,
    pub proposal: Proposal,
    pub outreach: EmailSequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_recommendations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub priority_score: Option<f64>,
}

/// Best moment to send the next follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecommendation {
    pub recommended_day: String,
    pub recommended_time: String,
    pub confidence_score: f64,
    pub reasoning: String,
}

/// Numbers, or strings holding a number (`"80"`, `" 72.5 "`, `"40%"`).
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Whole, non-negative numbers that fit a `u32`.
pub(crate) fn whole_number(n: f64) -> Option<u32> {
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

// Scores the model sends as strings are coerced; anything else becomes `None`.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(number_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(number_from_value(&Value::deserialize(deserializer)?).and_then(whole_number))
}

/// A web source the provider cited while generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Payload returned by lead generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadBatch {
    pub leads: Vec<LeadRecord>,
    pub sources: Vec<GroundingSource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_status_wire_names() {
        assert_eq!(serde_json::to_value(LeadStatus::New).unwrap(), json!("New"));
        assert_eq!(
            serde_json::to_value(LeadStatus::FollowUpDue).unwrap(),
            json!("Follow-Up Due")
        );
    }

    #[test]
    fn test_empty_market_scan_serializes_as_empty_object() {
        assert_eq!(serde_json::to_value(MarketScan::default()).unwrap(), json!({}));
        assert!(MarketScan::default().is_empty());
    }

    #[test]
    fn test_lead_details_reads_camel_case() {
        let details: LeadDetails = serde_json::from_value(json!({
            "digitalMaturity": {"score": 42, "techStack": ["WordPress"], "biggestGap": "No booking"},
            "revenueInsights": {"responseProbability": 35},
            "enrichment": {"ssl": true},
            "competitors": [{"name": "Rival Co"}],
            "proposal": {"scopeOfWork": ["Redesign"]},
            "outreach": {"steps": [{"step": 1, "subject": "Hi", "body": "Hello", "type": "Introduction"}], "hook_type": "Gap", "angle": "Speed"}
        }))
        .unwrap();
        assert_eq!(details.digital_maturity.score, Some(42.0));
        assert_eq!(details.digital_maturity.tech_stack, vec!["WordPress"]);
        assert_eq!(details.outreach.steps[0].kind.as_deref(), Some("Introduction"));
        assert_eq!(details.outreach.hook_type.as_deref(), Some("Gap"));
        assert!(details.audit_summary.is_none());
    }

    #[test]
    fn test_lead_details_coerces_scores() {
        let details: LeadDetails = serde_json::from_value(json!({
            "digitalMaturity": {"score": "35"},
            "revenueInsights": {"responseProbability": "40%", "urgencyScore": "high"},
            "enrichment": {},
            "competitors": [],
            "proposal": {},
            "outreach": {"steps": [{"step": "2", "subject": "Hi"}, {"step": 1.5}]},
            "priorityScore": " 85 "
        }))
        .unwrap();
        assert_eq!(details.digital_maturity.score, Some(35.0));
        assert_eq!(details.revenue_insights.response_probability, Some(40.0));
        assert_eq!(details.revenue_insights.urgency_score, None);
        assert_eq!(details.outreach.steps[0].step, Some(2));
        assert_eq!(details.outreach.steps[1].step, None);
        assert_eq!(details.priority_score, Some(85.0));
    }

    #[test]
    fn test_search_criteria_builder() {
        let c = SearchCriteria::new("Plumbing", "Austin")
            .with_source_strategy(SourceStrategy::GoogleMaps)
            .with_business_size(BusinessSize::Small);
        assert_eq!(c.source_strategy.as_str(), "Google Maps");
        assert_eq!(c.business_size.as_str(), "Small");
        assert_eq!(c.website_filter, WebsiteFilter::All);
    }

    #[test]
    fn test_tone_display() {
        assert_eq!(Tone::ValueDriven.to_string(), "Value-driven");
        assert_eq!(
            serde_json::to_value(Tone::ValueDriven).unwrap(),
            json!("Value-driven")
        );
    }
}
