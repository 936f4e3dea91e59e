//! Turning extracted JSON text into typed domain records.
//!
//! Each validator parses the text, checks the structure it needs, and
//! returns a typed record or a [`ValidationError`]. Validators never panic
//! and never retry; the orchestrators report failures as `PARSING_FAILED`.
//!
//! The lead validator is deliberately lenient per element: one incomplete
//! lead must not sink the batch. The audit and timing validators are strict
//! about their required sections and never invent content.

use crate::error::ValidationError;
use crate::records::{
    number_from_value, whole_number, ContactInfo, LeadDetails, LeadRecord, LeadStatus, MarketScan,
    TimingRecommendation,
};
use serde_json::{Map, Value};
use uuid::Uuid;

type Object = Map<String, Value>;

/// Top-level sections an audit must contain, with their expected JSON type.
const AUDIT_SECTIONS: [(&str, Section); 6] = [
    ("digitalMaturity", Section::Object),
    ("revenueInsights", Section::Object),
    ("enrichment", Section::Object),
    ("competitors", Section::Array),
    ("proposal", Section::Object),
    ("outreach", Section::Object),
];

#[derive(Clone, Copy)]
enum Section {
    Object,
    Array,
}

fn parse_object(json_text: &str) -> Result<Object, ValidationError> {
    match serde_json::from_str::<Value>(json_text)? {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotAnObject),
    }
}

/// Read a string-ish field. Numbers and booleans are stringified; anything
/// else (missing, null, objects, arrays) becomes `""`.
fn lenient_string(obj: &Object, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn optional_string(obj: &Object, key: &str) -> Option<String> {
    Some(lenient_string(obj, key)).filter(|s| !s.is_empty())
}

fn lenient_number(obj: &Object, key: &str) -> Option<f64> {
    number_from_value(obj.get(key)?)
}

fn lenient_rank(obj: &Object, key: &str) -> Option<u32> {
    lenient_number(obj, key).and_then(whole_number)
}

fn contact_info(value: Option<&Value>) -> ContactInfo {
    match value {
        Some(Value::Object(obj)) => ContactInfo {
            full_name: optional_string(obj, "fullName"),
            phone: optional_string(obj, "phone"),
        },
        _ => ContactInfo::default(),
    }
}

fn market_scan(value: Option<&Value>) -> MarketScan {
    match value {
        Some(Value::Object(obj)) => MarketScan {
            opportunity_score: lenient_number(obj, "opportunityScore"),
            digital_maturity_score: lenient_number(obj, "digitalMaturityScore"),
            estimated_deal_value: optional_string(obj, "estimatedDealValue"),
            competitive_risk: optional_string(obj, "competitiveRisk"),
            priority_rank: lenient_rank(obj, "priorityRank"),
            opportunity_type: optional_string(obj, "opportunityType"),
        },
        _ => MarketScan::default(),
    }
}

fn lead_from_object(obj: &Object) -> LeadRecord {
    LeadRecord {
        id: Uuid::new_v4(),
        business_name: lenient_string(obj, "business_name"),
        industry: lenient_string(obj, "industry"),
        location: lenient_string(obj, "location"),
        website_url: lenient_string(obj, "website_url"),
        website_status: lenient_string(obj, "website_status"),
        source_platform: lenient_string(obj, "source_platform"),
        email: lenient_string(obj, "email"),
        notes: lenient_string(obj, "notes"),
        contact_info: contact_info(obj.get("contact_info")),
        market_scan: market_scan(obj.get("market_scan")),
        status: LeadStatus::New,
    }
}

/// Validate a `{"leads": [...]}` payload into fresh [`LeadRecord`]s.
///
/// Missing fields are filled with empty defaults, every lead gets a new id
/// and status [`LeadStatus::New`]. Array elements that are not objects are
/// skipped. Fails only when the text is not a JSON object or `leads` is
/// absent or not an array.
///
/// # Example
///
/// ```
/// use revenue_engine::validate::validate_leads;
///
/// let leads = validate_leads(r#"{"leads":[{"business_name":"Acme"}]}"#).unwrap();
/// assert_eq!(leads[0].business_name, "Acme");
/// assert_eq!(leads[0].email, "");
/// ```
pub fn validate_leads(json_text: &str) -> Result<Vec<LeadRecord>, ValidationError> {
    let root = parse_object(json_text)?;
    let items = match root.get("leads") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("leads")),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "leads",
                expected: "an array",
            })
        }
    };

    let leads = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(lead_from_object(obj)),
            other => {
                tracing::debug!(element = %other, "skipping non-object lead element");
                None
            }
        })
        .collect();
    Ok(leads)
}

/// Validate an audit payload into [`LeadDetails`].
///
/// The six structural sections must be present with the right JSON type.
/// Narrative fields (`auditSummary`, `strategicRecommendations`,
/// `priorityScore`) stay `None` when the model left them out. Scores sent
/// as numeric strings are coerced; a score that is not a number at all is
/// dropped to `None`.
pub fn validate_lead_details(json_text: &str) -> Result<LeadDetails, ValidationError> {
    let root = parse_object(json_text)?;

    for (name, kind) in AUDIT_SECTIONS {
        match (root.get(name), kind) {
            (None | Some(Value::Null), _) => return Err(ValidationError::MissingField(name)),
            (Some(Value::Object(_)), Section::Object) | (Some(Value::Array(_)), Section::Array) => {}
            (Some(_), Section::Object) => {
                return Err(ValidationError::WrongType {
                    field: name,
                    expected: "an object",
                })
            }
            (Some(_), Section::Array) => {
                return Err(ValidationError::WrongType {
                    field: name,
                    expected: "an array",
                })
            }
        }
    }

    serde_json::from_value(Value::Object(root)).map_err(|e| ValidationError::Malformed {
        section: "lead details",
        reason: e.to_string(),
    })
}

fn required_string(obj: &Object, key: &'static str) -> Result<String, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field: key,
            expected: "a string",
        }),
    }
}

/// Validate a follow-up timing payload into a [`TimingRecommendation`].
///
/// All four fields are required; `confidenceScore` may be a number or a
/// numeric string.
pub fn validate_timing(json_text: &str) -> Result<TimingRecommendation, ValidationError> {
    let root = parse_object(json_text)?;

    let confidence_score = match root.get("confidenceScore") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("confidenceScore")),
        Some(_) => lenient_number(&root, "confidenceScore").ok_or(ValidationError::WrongType {
            field: "confidenceScore",
            expected: "a number",
        })?,
    };

    Ok(TimingRecommendation {
        recommended_day: required_string(&root, "recommendedDay")?,
        recommended_time: required_string(&root, "recommendedTime")?,
        confidence_score,
        reasoning: required_string(&root, "reasoning")?,
    })
}
