use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::airdrop::AirdropInput;
use crate::sheet::{parse_date, split_tasks};

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"^(?i)https?://\S+$").unwrap();
}

/// Minimum input length for a text extraction request.
pub const MIN_EXTRACT_CHARS: usize = 10;

/// Minimum query length for a research request (unless it is a URL).
pub const MIN_RESEARCH_CHARS: usize = 3;

/// Type hint attached to an extracted field by the assist service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    StringShort,
    StringLong,
    Date,
    Url,
    Number,
    Boolean,
    Unknown,
}

impl FieldKind {
    fn from_hint(hint: &str) -> Self {
        match hint.trim() {
            "string_short" => FieldKind::StringShort,
            "string_long" => FieldKind::StringLong,
            "date" => FieldKind::Date,
            "url" => FieldKind::Url,
            "number" => FieldKind::Number,
            "boolean" => FieldKind::Boolean,
            _ => FieldKind::Unknown,
        }
    }
}

/// One labelled value extracted from free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

/// Structured result of a research request
///
/// Every field defaults to empty when the service reply is absent or
/// malformed; a partial reply never propagates further than this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchReport {
    pub summary: String,
    pub key_points: Vec<String>,
    pub official_links: Vec<String>,
    pub sentiment: String,
}

/// Check an extraction input before any service call is made.
pub fn validate_extract_text(text: &str) -> Result<(), String> {
    if text.trim().chars().count() < MIN_EXTRACT_CHARS {
        return Err(format!(
            "Extraction needs at least {} characters of text",
            MIN_EXTRACT_CHARS
        ));
    }
    Ok(())
}

/// Check a research query: short queries are allowed only when they are
/// absolute URLs.
pub fn validate_research_query(query: &str) -> Result<(), String> {
    let query = query.trim();
    if query.chars().count() >= MIN_RESEARCH_CHARS || URL_REGEX.is_match(query) {
        Ok(())
    } else {
        Err(format!(
            "Research needs at least {} characters or a full URL",
            MIN_RESEARCH_CHARS
        ))
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Repair one raw field entry into a well-formed `ExtractedField`
///
/// The service is supposed to send `{value, type}` objects; anything else
/// (missing value, wrong shape, unknown hint) is kept by stringifying the
/// original and tagging it `unknown` rather than being dropped.
fn repair_field(label: &str, raw: &Value) -> ExtractedField {
    if let Value::Object(map) = raw {
        if let Some(value) = map.get("value") {
            let kind = map
                .get("type")
                .and_then(|t| t.as_str())
                .map(FieldKind::from_hint)
                .unwrap_or(FieldKind::Unknown);
            return ExtractedField {
                label: label.to_string(),
                value: stringify(value),
                kind,
            };
        }
    }

    ExtractedField {
        label: label.to_string(),
        value: stringify(raw),
        kind: FieldKind::Unknown,
    }
}

/// Convert a raw extraction reply into fields
///
/// Accepts the documented `{fields: {label: {value, type}}}` shape and,
/// tolerantly, a bare top-level map. Anything unrecognisable yields an
/// empty list, never an error.
pub fn parse_extraction(body: &Value) -> Vec<ExtractedField> {
    let map = match body.get("fields").and_then(|f| f.as_object()) {
        Some(map) => map,
        None => match body.as_object() {
            Some(map) => map,
            None => return Vec::new(),
        },
    };

    map.iter()
        .map(|(label, raw)| repair_field(label, raw))
        .collect()
}

/// Convert a raw research reply into a report, defaulting every missing
/// or mistyped field.
pub fn parse_research(body: &Value) -> ResearchReport {
    let string_list = |key: &str| -> Vec<String> {
        body.get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    };

    ResearchReport {
        summary: body
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        key_points: string_list("key_points"),
        official_links: string_list("official_links"),
        sentiment: body
            .get("sentiment")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Map extracted fields onto airdrop input data
///
/// Well-known labels fill the matching input fields; date-kind values go
/// through the same lenient parser as sheet imports; anything unrecognised
/// lands in the notes so nothing the service returned is lost.
pub fn fields_to_input(fields: &[ExtractedField]) -> AirdropInput {
    let mut input = AirdropInput::default();
    let mut extra_notes: Vec<String> = Vec::new();

    for field in fields {
        let value = field.value.trim();
        if value.is_empty() {
            continue;
        }
        let label = field.label.trim().to_lowercase().replace('_', " ");

        match label.as_str() {
            "name" | "project" | "project name" | "title" => {
                input.name = Some(value.to_string());
            }
            "description" | "summary" => {
                input.description = Some(value.to_string());
            }
            "notes" | "note" => {
                extra_notes.push(value.to_string());
            }
            "wallet" | "wallet address" => {
                input.wallet_address = Some(value.to_string());
            }
            "blockchain" | "chain" | "network" => {
                input.blockchain = Some(value.to_string());
            }
            "link" | "url" | "website" | "airdrop link" | "official link" => {
                input.airdrop_link = Some(value.to_string());
            }
            "referral" | "referral code" => {
                input.referral_code = Some(value.to_string());
            }
            "type" | "airdrop type" | "category" => {
                input.airdrop_type = Some(value.to_string());
            }
            "source" | "information source" => {
                input.information_source = Some(value.to_string());
            }
            "requirements" | "participation requirements" | "eligibility" => {
                input.participation_requirements = Some(value.to_string());
            }
            "status" => {
                input.user_defined_status = Some(value.to_string());
            }
            "token amount" | "amount" | "allocation" => {
                input.token_amount = value.parse::<f64>().ok().filter(|a| *a >= 0.0);
            }
            "start date" | "start" => {
                input.start_date = parse_date(value);
            }
            "deadline" | "end date" | "ends" => {
                input.deadline = parse_date(value);
            }
            "registration date" | "registration" => {
                input.registration_date = parse_date(value);
            }
            "claim date" | "claim" => {
                input.claim_date = parse_date(value);
            }
            "tasks" | "task list" | "steps" => {
                input.tasks = split_tasks(value);
            }
            _ => {
                extra_notes.push(format!("{}: {}", field.label, value));
            }
        }
    }

    if !extra_notes.is_empty() {
        input.notes = Some(extra_notes.join("\n"));
    }

    input
}

/// HTTP client for the external extraction/research service
///
/// Service failures and malformed replies stop here: callers get either a
/// well-formed value or an error message, never a partial shape.
#[cfg(feature = "web")]
pub struct Assistant {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[cfg(feature = "web")]
impl Assistant {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Assistant {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Build a client from `ASSIST_API_URL` and `ASSIST_API_KEY`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("ASSIST_API_URL")
            .unwrap_or_else(|_| "http://localhost:8090".to_string());
        let api_key = std::env::var("ASSIST_API_KEY").ok();
        Self::new(base_url, api_key)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, String> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Assist service unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Assist service returned {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Assist service sent an undecodable reply: {}", e))
    }

    /// Extract labelled fields from pasted free text.
    pub async fn extract(&self, text: &str) -> Result<Vec<ExtractedField>, String> {
        validate_extract_text(text)?;
        let body = self
            .post("extract", serde_json::json!({ "text": text }))
            .await?;
        Ok(parse_extraction(&body))
    }

    /// Research a project by name or URL.
    pub async fn research(&self, query: &str) -> Result<ResearchReport, String> {
        validate_research_query(query)?;
        let body = self
            .post("research", serde_json::json!({ "query": query }))
            .await?;
        Ok(parse_research(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_length_gate() {
        assert!(validate_extract_text("too short").is_err());
        assert!(validate_extract_text("just about long enough").is_ok());
    }

    #[test]
    fn research_query_gate() {
        assert!(validate_research_query("ab").is_err());
        assert!(validate_research_query("zk").is_err());
        assert!(validate_research_query("zks").is_ok());
        // URLs pass regardless of other rules
        assert!(validate_research_query("https://x.io").is_ok());
        assert!(validate_research_query("ftp://x.io/file").is_ok()); // 3+ chars
    }

    #[test]
    fn well_formed_fields_parse_with_their_hints() {
        let body = json!({
            "fields": {
                "name": {"value": "Nexus", "type": "string_short"},
                "deadline": {"value": "2024-09-01", "type": "date"}
            }
        });
        let mut fields = parse_extraction(&body);
        fields.sort_by(|a, b| a.label.cmp(&b.label));

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "deadline");
        assert_eq!(fields[0].kind, FieldKind::Date);
        assert_eq!(fields[1].value, "Nexus");
        assert_eq!(fields[1].kind, FieldKind::StringShort);
    }

    #[test]
    fn malformed_fields_are_repaired_not_dropped() {
        let body = json!({
            "fields": {
                "plain": "just a string",
                "no_value": {"type": "date"},
                "odd_hint": {"value": "x", "type": "string_extra_long"},
                "numeric_value": {"value": 42, "type": "number"}
            }
        });
        let fields = parse_extraction(&body);
        assert_eq!(fields.len(), 4);

        let by_label = |l: &str| fields.iter().find(|f| f.label == l).unwrap();
        assert_eq!(by_label("plain").kind, FieldKind::Unknown);
        assert_eq!(by_label("plain").value, "just a string");
        assert_eq!(by_label("no_value").kind, FieldKind::Unknown);
        assert_eq!(by_label("odd_hint").kind, FieldKind::Unknown);
        assert_eq!(by_label("numeric_value").value, "42");
        assert_eq!(by_label("numeric_value").kind, FieldKind::Number);
    }

    #[test]
    fn unrecognisable_reply_yields_an_empty_list() {
        assert!(parse_extraction(&json!("nonsense")).is_empty());
        assert!(parse_extraction(&json!(null)).is_empty());
    }

    #[test]
    fn research_reply_defaults_every_missing_field() {
        let report = parse_research(&json!({"summary": "fine"}));
        assert_eq!(report.summary, "fine");
        assert!(report.key_points.is_empty());
        assert!(report.official_links.is_empty());
        assert_eq!(report.sentiment, "");

        let report = parse_research(&json!({
            "summary": 7,
            "key_points": ["a", 3, "b"],
            "official_links": "not a list",
            "sentiment": "positive"
        }));
        assert_eq!(report.summary, "");
        assert_eq!(report.key_points, vec!["a", "b"]);
        assert!(report.official_links.is_empty());
        assert_eq!(report.sentiment, "positive");
    }

    #[test]
    fn fields_map_onto_input_with_leftovers_in_notes() {
        let fields = vec![
            ExtractedField {
                label: "Name".to_string(),
                value: "Nexus".to_string(),
                kind: FieldKind::StringShort,
            },
            ExtractedField {
                label: "deadline".to_string(),
                value: "2024-09-01".to_string(),
                kind: FieldKind::Date,
            },
            ExtractedField {
                label: "tasks".to_string(),
                value: "bridge; swap".to_string(),
                kind: FieldKind::StringLong,
            },
            ExtractedField {
                label: "snapshot block".to_string(),
                value: "19,000,000".to_string(),
                kind: FieldKind::Unknown,
            },
        ];

        let input = fields_to_input(&fields);
        assert_eq!(input.name.as_deref(), Some("Nexus"));
        assert_eq!(input.deadline, parse_date("2024-09-01"));
        assert_eq!(input.tasks.len(), 2);
        assert_eq!(
            input.notes.as_deref(),
            Some("snapshot block: 19,000,000")
        );
        assert!(input.validate().is_ok());
    }
}
