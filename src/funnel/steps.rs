use serde::Serialize;

use crate::lead::FunnelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    TextArea,
    Select,
    Consent,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::TextArea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Consent => "consent",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: &'static [&'static str],
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            label,
            kind,
            required,
            options: &[],
        }
    }

    const fn select(
        name: &'static str,
        label: &'static str,
        required: bool,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Select,
            required,
            options,
        }
    }
}

const COMPANY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("company_name", "Company", FieldKind::Text, true),
    FieldSpec::new("contact_name", "Your name", FieldKind::Text, false),
    FieldSpec::new("email", "Email", FieldKind::Email, false),
    FieldSpec::new("sector", "Sector", FieldKind::Text, true),
    FieldSpec::select("team_size", "Team size", true, &["1-10", "10-50", "50-200", "200+"]),
];

const CHALLENGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("pain_point", "Main pain point", FieldKind::TextArea, true),
    FieldSpec::new("objectives", "Objectives", FieldKind::TextArea, true),
];

const PLANNING_FIELDS: &[FieldSpec] = &[
    FieldSpec::select("timing", "Timing", true, &["now", "1-3 months", "3-6 months", "later"]),
    FieldSpec::select("budget", "Budget", true, &["<$5k", "$5k-$10k", "$10k", "$10k-$50k", "$50k+"]),
    FieldSpec::new("privacy_consent", "I have read and accept the privacy policy", FieldKind::Consent, true),
];

pub const EBOOK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("first_name", "First name", FieldKind::Text, true),
    FieldSpec::new("last_name", "Last name", FieldKind::Text, true),
    FieldSpec::new("email", "Email", FieldKind::Email, true),
    FieldSpec::new("company", "Company", FieldKind::Text, true),
    FieldSpec::new("phone", "Phone", FieldKind::Text, false),
    FieldSpec::select(
        "industry",
        "Industry",
        false,
        &["Technology", "Healthcare", "Finance", "Education", "Retail", "Manufacturing", "Other"],
    ),
    FieldSpec::new("description", "Additional information", FieldKind::TextArea, false),
    FieldSpec::new("ebook", "Ebook", FieldKind::Text, false),
    FieldSpec::new("privacy_consent", "I have read and accept the privacy policy", FieldKind::Consent, true),
];

/// Inputs of the CRM's own web-to-lead markup. Names are the CRM's field
/// names and go straight to the CRM, never through the lead controller.
pub const CRM_MARKUP_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Company", "Company", FieldKind::Text, true),
    FieldSpec::new("First Name", "First name", FieldKind::Text, false),
    FieldSpec::new("Last Name", "Last name", FieldKind::Text, true),
    FieldSpec::new("Email", "Email", FieldKind::Email, false),
    FieldSpec::new("Mobile", "Mobile", FieldKind::Text, false),
];

/// Steps of the consultation funnel, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStep {
    Company,
    Challenge,
    Planning,
}

impl ConsultationStep {
    pub const ALL: [ConsultationStep; 3] = [
        ConsultationStep::Company,
        ConsultationStep::Challenge,
        ConsultationStep::Planning,
    ];

    pub fn first() -> Self {
        ConsultationStep::Company
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "company" => Some(ConsultationStep::Company),
            "challenge" => Some(ConsultationStep::Challenge),
            "planning" => Some(ConsultationStep::Planning),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStep::Company => "company",
            ConsultationStep::Challenge => "challenge",
            ConsultationStep::Planning => "planning",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ConsultationStep::Company => "About your company",
            ConsultationStep::Challenge => "Your challenge",
            ConsultationStep::Planning => "Timing and budget",
        }
    }

    /// 1-based position, for "step 2 of 3" display.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).map_or(1, |i| i + 1)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            ConsultationStep::Company => COMPANY_FIELDS,
            ConsultationStep::Challenge => CHALLENGE_FIELDS,
            ConsultationStep::Planning => PLANNING_FIELDS,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            ConsultationStep::Company => Some(ConsultationStep::Challenge),
            ConsultationStep::Challenge => Some(ConsultationStep::Planning),
            ConsultationStep::Planning => None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.next().is_none()
    }

    /// Fields of this step and every step before it.
    pub fn fields_through(&self) -> Vec<FieldSpec> {
        Self::ALL
            .iter()
            .take(self.number())
            .flat_map(|s| s.fields().iter().copied())
            .collect()
    }
}

/// Every field of the consultation funnel.
pub fn consultation_fields() -> Vec<FieldSpec> {
    ConsultationStep::Planning.fields_through()
}

/// Field rules applied to a funnel's complete submission.
pub fn fields_for(funnel: FunnelKind) -> Vec<FieldSpec> {
    match funnel {
        FunnelKind::Consultation => consultation_fields(),
        FunnelKind::Ebook => EBOOK_FIELDS.to_vec(),
    }
}
