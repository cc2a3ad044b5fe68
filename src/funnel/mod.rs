pub mod metadata;
pub mod parser;
pub mod steps;
pub mod validation;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lead::Attribution;

pub const DEFAULT_EBOOK: &str = "ai-content-guide";

/// Hidden anti-bot input present on every lead form. Humans never fill it.
pub const HONEYPOT_FIELD: &str = "aG9uZXlwb3Q";

static WORD_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").unwrap());

/// How the ebook download form is delivered to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelVariant {
    /// The CRM's hosted form inside an iframe.
    Iframe,
    /// A plain form posting straight to the CRM's hosted form URL.
    HostedScript,
    /// The CRM's web-to-lead markup rendered inline.
    #[default]
    EmbeddedMarkup,
    /// Our own form, delivered through the lead controller.
    SelfHostedForm,
}

impl FunnelVariant {
    pub const ALL: [FunnelVariant; 4] = [
        FunnelVariant::Iframe,
        FunnelVariant::HostedScript,
        FunnelVariant::EmbeddedMarkup,
        FunnelVariant::SelfHostedForm,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "iframe" => Some(FunnelVariant::Iframe),
            "script" | "hosted-script" => Some(FunnelVariant::HostedScript),
            "markup" | "embedded-markup" => Some(FunnelVariant::EmbeddedMarkup),
            "form" | "self-hosted-form" => Some(FunnelVariant::SelfHostedForm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelVariant::Iframe => "iframe",
            FunnelVariant::HostedScript => "hosted-script",
            FunnelVariant::EmbeddedMarkup => "embedded-markup",
            FunnelVariant::SelfHostedForm => "self-hosted-form",
        }
    }
}

/// Hosted CRM web-to-lead form settings.
#[derive(Debug, Clone)]
pub struct CrmForm {
    pub action_url: String,
    pub content_type: String,
    pub thanks_url: String,
}

/// `crm-playbook` -> `Crm Playbook`.
pub fn ebook_display_name(slug: &str) -> String {
    let spaced = slug.replace('-', " ");
    WORD_START
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// CRM form URL prefilled with the ebook and whichever UTM parameters the
/// visitor arrived with.
pub fn crm_form_url(crm: &CrmForm, ebook_name: &str, attribution: &Attribution) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("Ebook_Name__c", ebook_name);
    query.append_pair("Content_Type__c", &crm.content_type);
    for (key, value) in attribution.utm_params() {
        query.append_pair(key, value);
    }
    format!("{}?{}", crm.action_url, query.finish())
}

pub fn thanks_url(base: &str, ebook_name: &str) -> String {
    if ebook_name.is_empty() {
        return base.to_string();
    }
    let encoded: String = form_urlencoded::byte_serialize(ebook_name.as_bytes()).collect();
    format!("{base}?ebook={encoded}")
}
