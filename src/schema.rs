//! Form-type schemas: which fields each supported tax form carries.
//!
//! Each [`FormType`] selects a static [`FormSchema`] record describing its
//! field set and its advice shape. All form-specific knowledge lives in these
//! records — prompt builders and response validation iterate over them rather
//! than branching on form names, so adding a form type means adding one
//! schema, not editing every method that mentions one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One extractable field: its JSON key and the human-readable description
/// embedded in the extraction prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key in the extraction result, e.g. `"federal_tax_withheld"`.
    pub key: &'static str,
    /// Description shown to the model as the field's template value.
    pub label: &'static str,
}

/// Advice sections beyond the common set, present only for some form types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdviceShape {
    /// Extra list-of-string sections, e.g. `potential_deductions` for W-2.
    pub extra_list_sections: &'static [(&'static str, &'static str)],
    /// Extra string sections, e.g. `quarterly_estimates` for 1099.
    pub extra_string_sections: &'static [(&'static str, &'static str)],
    /// How many example bullets the template shows per common list section.
    pub list_examples: usize,
}

/// Static description of one supported form type.
#[derive(Debug, Clone, Copy)]
pub struct FormSchema {
    /// Display name, e.g. "W-2".
    pub name: &'static str,
    /// Noun phrase used in prompt text, e.g. "W-2 form".
    pub prompt_noun: &'static str,
    /// Extractable fields, in template order.
    pub fields: &'static [FieldSpec],
    /// Form-specific ID-number formatting rule for the extraction prompt.
    pub id_rule: Option<&'static str>,
    /// Shape of the advice response for this form.
    pub advice: AdviceShape,
    /// Topical focus list appended to the advice prompt.
    pub advice_focus: &'static [&'static str],
}

/// The closed set of supported tax form types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormType {
    /// IRS Form W-2 (wage and tax statement).
    W2,
    /// IRS Form 1099 (nonemployee compensation).
    Ten99,
    /// Any other form: a small set of common fields.
    Generic,
}

impl FormType {
    /// The schema record for this form type.
    pub fn schema(&self) -> &'static FormSchema {
        match self {
            FormType::W2 => &W2_SCHEMA,
            FormType::Ten99 => &TEN99_SCHEMA,
            FormType::Generic => &GENERIC_SCHEMA,
        }
    }

    /// All supported form types, for iteration in tests and CLI help.
    pub const ALL: [FormType; 3] = [FormType::W2, FormType::Ten99, FormType::Generic];
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().name)
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "W-2" | "W2" => Ok(FormType::W2),
            "1099" | "1099-NEC" | "1099-MISC" => Ok(FormType::Ten99),
            "GENERIC" | "OTHER" => Ok(FormType::Generic),
            _ => Err(format!(
                "unknown form type '{s}'. Valid options: w-2, 1099, generic"
            )),
        }
    }
}

// ── Schema records ───────────────────────────────────────────────────────

static W2_SCHEMA: FormSchema = FormSchema {
    name: "W-2",
    prompt_noun: "W-2 form",
    fields: &[
        FieldSpec { key: "employer", label: "employer name" },
        FieldSpec { key: "ein", label: "employer identification number" },
        FieldSpec { key: "employee_ssn", label: "employee social security number" },
        FieldSpec { key: "wages", label: "wages, tips, other compensation" },
        FieldSpec { key: "federal_tax_withheld", label: "federal income tax withheld" },
        FieldSpec { key: "social_security_wages", label: "social security wages" },
        FieldSpec { key: "social_security_tax_withheld", label: "social security tax withheld" },
        FieldSpec { key: "medicare_wages", label: "medicare wages and tips" },
        FieldSpec { key: "medicare_tax_withheld", label: "medicare tax withheld" },
        FieldSpec { key: "state", label: "state" },
        FieldSpec { key: "state_wages", label: "state wages, tips, etc." },
        FieldSpec { key: "state_tax_withheld", label: "state income tax withheld" },
    ],
    id_rule: Some("For SSN and EIN, format as XXX-XX-XXXX and XX-XXXXXXX respectively"),
    advice: AdviceShape {
        extra_list_sections: &[("potential_deductions", "Potential deduction")],
        extra_string_sections: &[],
        list_examples: 3,
    },
    advice_focus: &[
        "Tax optimization opportunities",
        "Potential deductions and credits",
        "Filing status considerations",
        "State tax implications",
        "Important deadlines and next steps",
    ],
};

static TEN99_SCHEMA: FormSchema = FormSchema {
    name: "1099",
    prompt_noun: "1099 form",
    fields: &[
        FieldSpec { key: "payer_name", label: "payer name" },
        FieldSpec { key: "payer_tin", label: "payer identification number" },
        FieldSpec { key: "recipient_name", label: "recipient name" },
        FieldSpec { key: "recipient_tin", label: "recipient identification number" },
        FieldSpec { key: "nonemployee_compensation", label: "nonemployee compensation" },
        FieldSpec { key: "federal_tax_withheld", label: "federal income tax withheld" },
        FieldSpec { key: "state", label: "state" },
        FieldSpec { key: "state_income", label: "state income" },
        FieldSpec { key: "state_tax_withheld", label: "state tax withheld" },
    ],
    id_rule: Some("For TIN numbers, format appropriately"),
    advice: AdviceShape {
        extra_list_sections: &[("business_expenses", "Potential business expense")],
        extra_string_sections: &[("quarterly_estimates", "Advice on quarterly tax payments")],
        list_examples: 3,
    },
    advice_focus: &[
        "Self-employment tax implications",
        "Business expense deductions",
        "Quarterly estimated tax payments",
        "Retirement plan contributions",
        "Health insurance deductions",
    ],
};

static GENERIC_SCHEMA: FormSchema = FormSchema {
    name: "Generic",
    prompt_noun: "tax form",
    fields: &[
        FieldSpec { key: "form_type", label: "detected form type" },
        FieldSpec { key: "payer_name", label: "payer/employer name" },
        FieldSpec { key: "recipient_name", label: "recipient/employee name" },
        FieldSpec { key: "identification_number", label: "EIN/SSN/TIN" },
        FieldSpec { key: "total_amount", label: "total amount" },
        FieldSpec { key: "tax_withheld", label: "tax withheld" },
    ],
    id_rule: None,
    advice: AdviceShape {
        extra_list_sections: &[],
        extra_string_sections: &[],
        list_examples: 2,
    },
    advice_focus: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_keys_are_unique() {
        for form in FormType::ALL {
            let schema = form.schema();
            let mut keys: Vec<_> = schema.fields.iter().map(|f| f.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(
                keys.len(),
                schema.fields.len(),
                "duplicate field key in {form} schema"
            );
        }
    }

    #[test]
    fn form_type_from_str_aliases() {
        assert_eq!("w-2".parse::<FormType>().unwrap(), FormType::W2);
        assert_eq!("W2".parse::<FormType>().unwrap(), FormType::W2);
        assert_eq!("1099".parse::<FormType>().unwrap(), FormType::Ten99);
        assert_eq!("1099-nec".parse::<FormType>().unwrap(), FormType::Ten99);
        assert_eq!("generic".parse::<FormType>().unwrap(), FormType::Generic);
        assert!("schedule-c".parse::<FormType>().is_err());
    }

    #[test]
    fn form_type_serde_round_trip() {
        for form in FormType::ALL {
            let json = serde_json::to_string(&form).unwrap();
            let back: FormType = serde_json::from_str(&json).unwrap();
            assert_eq!(form, back);
        }
    }

    #[test]
    fn w2_schema_field_count() {
        assert_eq!(FormType::W2.schema().fields.len(), 12);
        assert_eq!(FormType::Ten99.schema().fields.len(), 9);
        assert_eq!(FormType::Generic.schema().fields.len(), 6);
    }
}
