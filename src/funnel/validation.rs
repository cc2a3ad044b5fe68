use std::collections::BTreeMap;

use serde::Serialize;

use super::steps::{FieldKind, FieldSpec};
use crate::lead::{FieldValue, LeadFields};

pub type RawForm = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Sort posted form values into lead fields (those named in `specs`) and
/// extras (hidden controls such as the current step or page query).
/// Blank values are dropped; an unchecked consent box becomes `false`.
pub fn sort_fields(raw: &RawForm, specs: &[FieldSpec]) -> (LeadFields, RawForm) {
    let mut fields = LeadFields::new();
    let mut extras = RawForm::new();

    for (key, value) in raw {
        match specs.iter().find(|s| s.name == key) {
            Some(spec) if spec.kind == FieldKind::Consent => {
                fields.insert(key.clone(), FieldValue::Bool(parse_consent(value)));
            }
            Some(_) => {
                if !value.trim().is_empty() {
                    fields.insert(key.clone(), FieldValue::Text(value.trim().to_string()));
                }
            }
            None => {
                extras.insert(key.clone(), value.clone());
            }
        }
    }

    for spec in specs.iter().filter(|s| s.kind == FieldKind::Consent) {
        fields
            .entry(spec.name.to_string())
            .or_insert(FieldValue::Bool(false));
    }

    (fields, extras)
}

/// JSON clients may send consent as a string; coerce it to a boolean.
pub fn coerce_consent(fields: &mut LeadFields, specs: &[FieldSpec]) {
    for spec in specs.iter().filter(|s| s.kind == FieldKind::Consent) {
        if let Some(FieldValue::Text(s)) = fields.get(spec.name) {
            let accepted = parse_consent(s);
            fields.insert(spec.name.to_string(), FieldValue::Bool(accepted));
        }
    }
}

fn parse_consent(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Check `fields` against `specs`. Fields not named in `specs` are ignored.
pub fn validate_fields(fields: &LeadFields, specs: &[FieldSpec]) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    for spec in specs {
        let error = match fields.get(spec.name) {
            None => spec.required.then(|| format!("{} is required", spec.label)),
            Some(value) if value.is_blank() => {
                spec.required.then(|| format!("{} is required", spec.label))
            }
            Some(FieldValue::Bool(accepted)) => match spec.kind {
                FieldKind::Consent if spec.required && !accepted => {
                    Some("Please accept to continue".to_string())
                }
                FieldKind::Consent => None,
                _ => Some(format!("{} must be text", spec.label)),
            },
            Some(FieldValue::Text(s)) => match spec.kind {
                FieldKind::Email if !is_valid_email(s) => {
                    Some("Please enter a valid email address".to_string())
                }
                _ => None,
            },
        };

        if let Some(message) = error {
            errors.push(FieldError {
                field: spec.name.to_string(),
                message,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

/// Same rule the CRM form applies: an `@` after the first character, a dot
/// at least two characters after it, and at least two characters after the
/// last dot.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    let (Some(at), Some(dot)) = (value.find('@'), value.rfind('.')) else {
        return false;
    };
    at >= 1 && dot >= at + 2 && dot + 2 < value.len()
}

/// True if the honeypot input came back filled.
pub fn is_spam(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Text(s)) => !s.is_empty(),
        Some(FieldValue::Bool(_)) => true,
        None => false,
    }
}

pub fn is_spam_form(raw: &RawForm, honeypot_field: &str) -> bool {
    raw.get(honeypot_field).is_some_and(|v| !v.is_empty())
}
