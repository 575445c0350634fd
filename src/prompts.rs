//! Prompt construction for structured extraction and tax advice.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON-shape templates are generated
//!    from the [`FormSchema`] field lists, so a schema change updates the
//!    prompt automatically and the two can never drift apart.
//!
//! 2. **Testability** — unit tests can build and inspect prompts directly
//!    without a completion service, making template regressions easy to catch.
//!
//! Everything here is a pure function of its inputs: no network, no I/O.

use crate::output::{ExtractionResult, NOT_FOUND};
use crate::schema::FormSchema;
use std::fmt::Write as _;

/// System-role instruction for the extraction call.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a tax form data extraction expert. \
     Extract structured data from OCR text and return only valid JSON.";

/// System-role instruction for the advice call.
pub const ADVICE_SYSTEM_PROMPT: &str = "You are a professional tax advisor with expertise \
     in personal and business taxation. Provide clear, actionable tax advice based on the \
     provided data.";

/// Build the field-extraction prompt for one form type.
///
/// Embeds the full recognized text, a literal JSON template listing every
/// schema field exactly once, and the formatting rules (missing-field
/// sentinel, monetary formatting, per-form ID formatting, confidence range,
/// "return only JSON").
pub fn extraction_prompt(schema: &FormSchema, recognized_text: &str) -> String {
    let mut prompt = format!(
        "Extract the following fields from this {} text. Return ONLY a valid JSON \
         object with the exact structure shown below.\n\n\
         OCR Text:\n{}\n\n\
         Extract these fields and return as JSON:\n{}\n\nRules:\n",
        schema.prompt_noun,
        recognized_text,
        extraction_template(schema),
    );

    let mut rule = 1;
    let mut push_rule = |prompt: &mut String, text: &str| {
        let _ = writeln!(prompt, "{rule}. {text}");
        rule += 1;
    };

    push_rule(
        &mut prompt,
        &format!("For missing fields, use \"value\": \"{NOT_FOUND}\" and \"confidence\": 0.0"),
    );
    push_rule(&mut prompt, "For monetary values, include dollar signs and commas");
    if let Some(id_rule) = schema.id_rule {
        push_rule(&mut prompt, id_rule);
    }
    push_rule(
        &mut prompt,
        "Confidence should reflect how certain you are about the extraction (0.0-1.0)",
    );
    push_rule(&mut prompt, "Return ONLY the JSON object, no additional text");

    prompt
}

/// The literal JSON-shape template for a form's extraction response.
fn extraction_template(schema: &FormSchema) -> String {
    let mut template = String::from("{\n");
    for (i, field) in schema.fields.iter().enumerate() {
        let comma = if i + 1 < schema.fields.len() { "," } else { "" };
        let _ = writeln!(
            template,
            "    \"{}\": {{\"value\": \"{}\", \"confidence\": 0.0-1.0}}{}",
            field.key, field.label, comma
        );
    }
    template.push('}');
    template
}

/// Build the tax-advice prompt from previously extracted fields.
///
/// Non-empty fields become a bullet summary (key title-cased, underscores
/// replaced with spaces); sentinel and empty values are skipped. The JSON
/// template includes the common advice sections plus any form-specific
/// extras, and the form's topical focus list when it has one.
pub fn advice_prompt(schema: &FormSchema, extracted: &ExtractionResult) -> String {
    let mut data_lines = Vec::new();
    for (key, field) in extracted {
        if field.value.is_empty() || field.is_not_found() {
            continue;
        }
        data_lines.push(format!("{}: {}", title_case(key), field.value));
    }
    let data_text = data_lines.join("\n");

    let mut prompt = format!(
        "You are a professional tax advisor. Based on the following {} data, provide \
         personalized tax advice.\n\n\
         {} Data:\n{}\n\n\
         Please provide tax advice in the following JSON format:\n{}\n",
        schema.prompt_noun,
        schema.name,
        data_text,
        advice_template(schema),
    );

    if !schema.advice_focus.is_empty() {
        prompt.push_str("\nFocus on:\n");
        for (i, topic) in schema.advice_focus.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, topic);
        }
    }

    prompt.push_str("\nReturn ONLY the JSON object, no additional text.");
    prompt
}

/// The literal JSON-shape template for a form's advice response.
fn advice_template(schema: &FormSchema) -> String {
    let n = schema.advice.list_examples;
    let mut t = String::from("{\n");
    t.push_str("    \"summary\": \"Brief overview of the tax situation\",\n");
    push_list_section(&mut t, "key_insights", "Important observation", n);
    push_list_section(&mut t, "recommendations", "Specific recommendation", n);
    for (key, label) in schema.advice.extra_list_sections {
        push_list_section(&mut t, key, label, 2);
    }
    for (key, label) in schema.advice.extra_string_sections {
        let _ = writeln!(t, "    \"{key}\": \"{label}\",");
    }
    push_list_section(&mut t, "next_steps", "Action item", n);
    t.push_str(
        "    \"estimated_tax_impact\": \"Brief description of potential tax savings or obligations\",\n",
    );
    let _ = write!(
        t,
        "    \"disclaimer\": \"{}\"\n}}",
        crate::output::DEFAULT_DISCLAIMER
    );
    t
}

fn push_list_section(template: &mut String, key: &str, label: &str, examples: usize) {
    let _ = writeln!(template, "    \"{key}\": [");
    for i in 1..=examples {
        let comma = if i < examples { "," } else { "" };
        let _ = writeln!(template, "        \"{label} {i}\"{comma}");
    }
    template.push_str("    ],\n");
}

/// `"federal_tax_withheld"` → `"Federal Tax Withheld"`.
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ExtractedField;
    use crate::schema::FormType;

    #[test]
    fn extraction_prompt_contains_every_field_exactly_once() {
        for form in FormType::ALL {
            let schema = form.schema();
            let prompt = extraction_prompt(schema, "sample text");
            for field in schema.fields {
                let needle = format!("\"{}\":", field.key);
                let count = prompt.matches(&needle).count();
                assert_eq!(count, 1, "field '{}' appears {count}× in {form} prompt", field.key);
            }
        }
    }

    #[test]
    fn extraction_prompt_embeds_recognized_text_and_rules() {
        let prompt = extraction_prompt(FormType::W2.schema(), "Employer: Acme Corp");
        assert!(prompt.contains("Employer: Acme Corp"));
        assert!(prompt.contains("Not found"));
        assert!(prompt.contains("dollar signs and commas"));
        assert!(prompt.contains("XXX-XX-XXXX"));
        assert!(prompt.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn generic_prompt_has_no_id_rule() {
        let prompt = extraction_prompt(FormType::Generic.schema(), "text");
        assert!(!prompt.contains("XXX-XX-XXXX"));
        assert!(!prompt.contains("TIN numbers"));
    }

    #[test]
    fn advice_prompt_summarises_non_empty_fields() {
        let extracted = ExtractionResult::from_fields([
            (
                "federal_tax_withheld".to_string(),
                ExtractedField { value: "$4,500".into(), confidence: 0.9 },
            ),
            ("state".to_string(), ExtractedField::not_found()),
            (
                "employer".to_string(),
                ExtractedField { value: "Acme Corp".into(), confidence: 0.8 },
            ),
        ]);

        let prompt = advice_prompt(FormType::W2.schema(), &extracted);
        assert!(prompt.contains("Federal Tax Withheld: $4,500"));
        assert!(prompt.contains("Employer: Acme Corp"));
        assert!(!prompt.contains("State:"), "sentinel fields must be skipped");
    }

    #[test]
    fn advice_prompt_shape_varies_by_form() {
        let empty = ExtractionResult::default();

        let w2 = advice_prompt(FormType::W2.schema(), &empty);
        assert!(w2.contains("\"potential_deductions\""));
        assert!(w2.contains("Filing status considerations"));

        let ten99 = advice_prompt(FormType::Ten99.schema(), &empty);
        assert!(ten99.contains("\"business_expenses\""));
        assert!(ten99.contains("\"quarterly_estimates\""));
        assert!(ten99.contains("Self-employment tax implications"));

        let generic = advice_prompt(FormType::Generic.schema(), &empty);
        assert!(!generic.contains("\"potential_deductions\""));
        assert!(!generic.contains("Focus on:"));
        assert!(generic.contains("\"disclaimer\""));
    }

    #[test]
    fn title_case_replaces_underscores() {
        assert_eq!(title_case("employee_ssn"), "Employee Ssn");
        assert_eq!(title_case("wages"), "Wages");
        assert_eq!(title_case("state_tax_withheld"), "State Tax Withheld");
    }
}
