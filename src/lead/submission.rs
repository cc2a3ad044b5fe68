use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Attribution, FunnelKind};

/// A single form answer. Checkbox-style fields carry booleans, everything
/// else is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

pub type LeadFields = BTreeMap<String, FieldValue>;

/// The unit of work handed to a lead endpoint. Built once with attribution
/// attached and never modified afterwards; it is either delivered or queued
/// as-is.
///
/// `id` is generated client-side and sent as the idempotency key on every
/// delivery attempt, including re-sends from the fallback queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadSubmission {
    id: Uuid,
    funnel: FunnelKind,
    submitted_at: DateTime<Utc>,
    fields: LeadFields,
    attribution: Attribution,
}

impl LeadSubmission {
    pub fn new(funnel: FunnelKind, fields: LeadFields, attribution: Attribution) -> Self {
        Self {
            id: Uuid::now_v7(),
            funnel,
            submitted_at: Utc::now(),
            fields,
            attribution,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn funnel(&self) -> FunnelKind {
        self.funnel
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn fields(&self) -> &LeadFields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn attribution(&self) -> &Attribution {
        &self.attribution
    }
}
