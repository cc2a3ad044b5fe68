use crate::funnel::steps::FieldSpec;
use crate::funnel::validation::ValidationError;
use crate::lead::{FieldValue, LeadFields};

/// One rendered form control, with the visitor's previous answer and any
/// error message attached.
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub options: Vec<&'static str>,
    pub value: String,
    pub checked: bool,
    pub error: String,
}

impl FormField {
    pub fn build(spec: &FieldSpec, values: &LeadFields, errors: Option<&ValidationError>) -> Self {
        let value = values.get(spec.name);
        Self {
            name: spec.name,
            label: spec.label,
            kind: spec.kind.as_str(),
            required: spec.required,
            options: spec.options.to_vec(),
            value: value.and_then(FieldValue::as_str).unwrap_or_default().to_string(),
            checked: value.and_then(FieldValue::as_bool).unwrap_or(false),
            error: errors
                .and_then(|e| e.message_for(spec.name))
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.value == option
    }
}

pub fn build_fields(
    specs: &[FieldSpec],
    values: &LeadFields,
    errors: Option<&ValidationError>,
) -> Vec<FormField> {
    specs
        .iter()
        .map(|spec| FormField::build(spec, values, errors))
        .collect()
}

pub struct HiddenInput {
    pub name: String,
    pub value: String,
}

impl HiddenInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Earlier answers carried forward as hidden inputs, skipping `except`
/// (the fields rendered visibly on this page).
pub fn carry_forward(values: &LeadFields, except: &[FieldSpec]) -> Vec<HiddenInput> {
    values
        .iter()
        .filter(|(name, _)| !except.iter().any(|s| s.name == name.as_str()))
        .filter_map(|(name, value)| match value {
            FieldValue::Text(s) => Some(HiddenInput::new(name.as_str(), s.as_str())),
            FieldValue::Bool(true) => Some(HiddenInput::new(name.as_str(), "on")),
            FieldValue::Bool(false) => None,
        })
        .collect()
}
