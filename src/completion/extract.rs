//! Structured-output extraction from free-text completions.
//!
//! The provider is asked for bare JSON but does not reliably deliver it:
//! answers arrive wrapped in prose, markdown fences, or both. `parse_structured`
//! runs a fallback chain over the raw text and, when every step fails, returns
//! a sentinel carrying the original response instead of an error — callers
//! must check for the sentinel before trusting the result.

use serde_json::{Map, Value};

use super::gateway::CompletionGateway;
use super::errors::CompletionError;

/// Temperature used for extraction calls unless a handler overrides it.
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Token budget for extraction calls. Generous relative to the largest
/// expected record so truncation never corrupts the JSON.
pub const EXTRACTION_MAX_TOKENS: u32 = 1024;

/// Outcome of parsing a completion as structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A JSON object was recovered.
    Fields(Map<String, Value>),
    /// Nothing parseable was found. The original response is preserved
    /// verbatim for logging and debugging.
    Unparsed { raw_response: String },
}

impl Extraction {
    /// The extracted fields, unless this is the sentinel.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Extraction::Fields(map) => Some(map),
            Extraction::Unparsed { .. } => None,
        }
    }

    /// Whether the extraction produced no usable fields: either the sentinel,
    /// or a well-formed but empty object.
    pub fn is_empty(&self) -> bool {
        match self {
            Extraction::Fields(map) => map.is_empty(),
            Extraction::Unparsed { .. } => true,
        }
    }
}

/// Call the gateway and parse its answer as a JSON object.
///
/// Provider failures propagate as errors; parse failures do not — they come
/// back as [`Extraction::Unparsed`].
pub async fn extract_structured(
    gateway: &dyn CompletionGateway,
    prompt: &str,
    temperature: f32,
) -> Result<Extraction, CompletionError> {
    let response = gateway
        .complete(prompt, temperature, EXTRACTION_MAX_TOKENS)
        .await?;
    let extraction = parse_structured(&response);
    if let Extraction::Unparsed { raw_response } = &extraction {
        tracing::warn!(
            response_len = raw_response.len(),
            "completion contained no parseable JSON object"
        );
    }
    Ok(extraction)
}

/// Parse a completion as a JSON object, trying progressively looser
/// strategies. Stops at the first success:
///
/// 1. The entire response is JSON.
/// 2. A fenced block explicitly tagged ```` ```json ````.
/// 3. Any fenced block whose trimmed contents look like `{...}`.
/// 4. The substring from the first `{` to the last `}`.
/// 5. The [`Extraction::Unparsed`] sentinel.
pub fn parse_structured(response: &str) -> Extraction {
    if let Some(map) = parse_object(response) {
        return Extraction::Fields(map);
    }

    if let Some(inner) = tagged_fence_contents(response) {
        if let Some(map) = parse_object(&inner) {
            return Extraction::Fields(map);
        }
    }

    for part in response.split("```") {
        let part = part.trim();
        if part.starts_with('{') && part.ends_with('}') {
            if let Some(map) = parse_object(part) {
                return Extraction::Fields(map);
            }
        }
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if end > start {
            if let Some(map) = parse_object(&response[start..=end]) {
                return Extraction::Fields(map);
            }
        }
    }

    Extraction::Unparsed {
        raw_response: response.to_string(),
    }
}

/// Parse a string as JSON and keep it only if it is an object.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Contents of the first ```` ```json ```` fence, if the response has one.
fn tagged_fence_contents(response: &str) -> Option<String> {
    let start = response.find("```json")? + "```json".len();
    let rest = &response[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
