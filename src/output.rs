//! Result types produced by the extraction and advice pipelines.
//!
//! [`ExtractionResult::from_model_response`] is where the model's JSON is
//! checked against the form schema. The completion service is told exactly
//! which keys to return, but models drift: keys go missing, extra keys appear,
//! field objects come back malformed. Validation policy:
//!
//! * missing schema key → filled with the [`NOT_FOUND`] sentinel and logged
//! * extra key → dropped and logged
//! * field not shaped `{value, confidence}` → [`TaxdocError::SchemaMismatch`]
//!
//! The result therefore always carries exactly the schema's key set.

use crate::error::TaxdocError;
use crate::schema::FormSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Literal marking a field the model could not find.
pub const NOT_FOUND: &str = "Not found";

/// Disclaimer inserted when the model omits one from its advice response.
pub const DEFAULT_DISCLAIMER: &str =
    "This is general advice. Consult a qualified tax professional for specific guidance.";

/// One extracted field: free-text value plus a 0.0–1.0 confidence.
///
/// Monetary values keep their currency symbols and thousands separators as
/// free text; nothing here is parsed into numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: String,
    pub confidence: f64,
}

impl ExtractedField {
    /// The sentinel field for an absent value.
    pub fn not_found() -> Self {
        Self {
            value: NOT_FOUND.to_string(),
            confidence: 0.0,
        }
    }

    /// Whether this field holds the absent-value sentinel.
    pub fn is_not_found(&self) -> bool {
        self.value == NOT_FOUND
    }
}

/// Mapping from schema-defined field name to [`ExtractedField`].
///
/// Produced fresh per extraction call; the key set always equals the
/// selected form schema's key set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    fields: BTreeMap<String, ExtractedField>,
}

impl ExtractionResult {
    /// Look up a field by schema key.
    pub fn get(&self, key: &str) -> Option<&ExtractedField> {
        self.fields.get(key)
    }

    /// Iterate over `(key, field)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtractedField)> {
        self.fields.iter()
    }

    /// Number of fields (equals the schema's field count).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite every field's confidence with `score(value)`.
    ///
    /// Used by the orchestration layer to replace model-reported confidences
    /// with evidence-grounded ones.
    pub(crate) fn rescore_with(&mut self, score: impl Fn(&str) -> f64) {
        for field in self.fields.values_mut() {
            field.confidence = score(&field.value);
        }
    }

    /// Build a result from raw parsed model JSON, validated against `schema`.
    ///
    /// See the module docs for the validation policy. The model is asked for
    /// string values but occasionally emits bare numbers for monetary fields;
    /// those are rendered back to strings rather than rejected.
    pub fn from_model_response(
        response: Value,
        schema: &FormSchema,
    ) -> Result<Self, TaxdocError> {
        let mut object = match response {
            Value::Object(map) => map,
            other => {
                return Err(TaxdocError::JsonParse {
                    detail: format!("expected a JSON object, got {}", json_type_name(&other)),
                })
            }
        };

        let mut fields = BTreeMap::new();
        for spec in schema.fields {
            match object.remove(spec.key) {
                Some(raw) => {
                    let field = parse_field(spec.key, raw)?;
                    fields.insert(spec.key.to_string(), field);
                }
                None => {
                    warn!("model response missing field '{}', using sentinel", spec.key);
                    fields.insert(spec.key.to_string(), ExtractedField::not_found());
                }
            }
        }

        for extra in object.keys() {
            warn!("dropping unrequested field '{extra}' from model response");
        }

        Ok(Self { fields })
    }

    #[cfg(test)]
    pub(crate) fn from_fields<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, ExtractedField)>,
    {
        Self {
            fields: pairs.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExtractionResult {
    type Item = (&'a String, &'a ExtractedField);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ExtractedField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Parse one `{value, confidence}` field object.
fn parse_field(key: &str, raw: Value) -> Result<ExtractedField, TaxdocError> {
    let obj = match raw {
        Value::Object(map) => map,
        other => {
            return Err(TaxdocError::SchemaMismatch {
                field: key.to_string(),
                detail: format!("expected an object, got {}", json_type_name(&other)),
            })
        }
    };

    let value = match obj.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(TaxdocError::SchemaMismatch {
                field: key.to_string(),
                detail: format!("'value' must be a string, got {}", json_type_name(other)),
            })
        }
        None => {
            return Err(TaxdocError::SchemaMismatch {
                field: key.to_string(),
                detail: "missing 'value' key".to_string(),
            })
        }
    };

    let confidence = match obj.get("confidence").and_then(Value::as_f64) {
        Some(c) => c.clamp(0.0, 1.0),
        None => {
            return Err(TaxdocError::SchemaMismatch {
                field: key.to_string(),
                detail: "missing or non-numeric 'confidence' key".to_string(),
            })
        }
    };

    Ok(ExtractedField { value, confidence })
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Structured tax advice as returned by the advisor pipeline.
///
/// The common sections are always present; `potential_deductions` appears for
/// W-2 responses and `business_expenses`/`quarterly_estimates` for 1099.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_deductions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_expenses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarterly_estimates: Option<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub estimated_tax_impact: String,
    #[serde(default)]
    pub disclaimer: String,
}

impl AdviceResult {
    /// Build advice from raw parsed model JSON.
    ///
    /// Missing sections default to empty; a missing `disclaimer` is filled
    /// with [`DEFAULT_DISCLAIMER`] since the disclaimer must always reach the
    /// end user, whatever the model returned.
    pub fn from_model_response(response: Value) -> Result<Self, TaxdocError> {
        let mut advice: AdviceResult =
            serde_json::from_value(response).map_err(|e| TaxdocError::JsonParse {
                detail: format!("advice response: {e}"),
            })?;
        if advice.disclaimer.trim().is_empty() {
            advice.disclaimer = DEFAULT_DISCLAIMER.to_string();
        }
        Ok(advice)
    }
}
