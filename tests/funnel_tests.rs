use std::net::IpAddr;
use std::time::Duration;

use axum::http::HeaderMap;

use leadfunnel::funnel::steps::{self, ConsultationStep, EBOOK_FIELDS};
use leadfunnel::funnel::validation::{self, RawForm};
use leadfunnel::funnel::{
    CrmForm, FunnelVariant, crm_form_url, ebook_display_name, metadata, parser, thanks_url,
};
use leadfunnel::lead::{FieldValue, FunnelKind, attribution};
use leadfunnel::rate_limit::LeadRateLimiter;

fn raw(pairs: &[(&str, &str)]) -> RawForm {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn crm() -> CrmForm {
    CrmForm {
        action_url: "https://crm.test/WebToLeadForm".to_string(),
        content_type: "eBook".to_string(),
        thanks_url: "https://site.test/thanks".to_string(),
    }
}

// ── Variants and URLs ───────────────────────────────────────────

#[test]
fn variant_names_and_aliases_parse() {
    assert_eq!(FunnelVariant::parse("iframe"), Some(FunnelVariant::Iframe));
    assert_eq!(FunnelVariant::parse("script"), Some(FunnelVariant::HostedScript));
    assert_eq!(FunnelVariant::parse("markup"), Some(FunnelVariant::EmbeddedMarkup));
    assert_eq!(FunnelVariant::parse("form"), Some(FunnelVariant::SelfHostedForm));
    assert_eq!(FunnelVariant::parse("popup"), None);
    for variant in FunnelVariant::ALL {
        assert_eq!(FunnelVariant::parse(variant.as_str()), Some(variant));
    }
    assert_eq!(FunnelVariant::default(), FunnelVariant::EmbeddedMarkup);
}

#[test]
fn ebook_slug_becomes_title_case() {
    assert_eq!(ebook_display_name("ai-content-guide"), "Ai Content Guide");
    assert_eq!(ebook_display_name("crm"), "Crm");
    assert_eq!(ebook_display_name(""), "");
}

#[test]
fn crm_url_carries_only_present_utm_parameters() {
    let attribution = attribution::extract("utm_source=newsletter&utm_term=", None, None);
    let url = crm_form_url(&crm(), "Ai Content Guide", &attribution);

    assert_eq!(
        url,
        "https://crm.test/WebToLeadForm?Ebook_Name__c=Ai+Content+Guide&Content_Type__c=eBook&utm_source=newsletter"
    );
}

#[test]
fn thanks_url_appends_ebook_when_known() {
    assert_eq!(
        thanks_url("https://site.test/thanks", "Ai Content Guide"),
        "https://site.test/thanks?ebook=Ai+Content+Guide"
    );
    assert_eq!(thanks_url("https://site.test/thanks", ""), "https://site.test/thanks");
}

// ── Steps ───────────────────────────────────────────────────────

#[test]
fn consultation_steps_run_in_order() {
    let first = ConsultationStep::first();
    assert_eq!(first, ConsultationStep::Company);
    assert_eq!(first.next(), Some(ConsultationStep::Challenge));
    assert_eq!(
        ConsultationStep::Challenge.next(),
        Some(ConsultationStep::Planning)
    );
    assert!(ConsultationStep::Planning.is_final());
    assert_eq!(ConsultationStep::Planning.number(), 3);
    assert_eq!(ConsultationStep::parse("challenge"), Some(ConsultationStep::Challenge));
    assert_eq!(ConsultationStep::parse("review"), None);
}

#[test]
fn fields_accumulate_across_steps() {
    let names: Vec<&str> = ConsultationStep::Challenge
        .fields_through()
        .iter()
        .map(|s| s.name)
        .collect();
    assert!(names.contains(&"company_name"));
    assert!(names.contains(&"objectives"));
    assert!(!names.contains(&"budget"));

    assert_eq!(
        steps::fields_for(FunnelKind::Consultation).len(),
        steps::consultation_fields().len()
    );
    assert_eq!(steps::fields_for(FunnelKind::Ebook).len(), EBOOK_FIELDS.len());
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn email_rule_matches_crm_form() {
    assert!(validation::is_valid_email("ada@engines.io"));
    assert!(validation::is_valid_email("a@bc.de"));
    assert!(!validation::is_valid_email("@engines.io"));
    assert!(!validation::is_valid_email("ada@.io"));
    assert!(!validation::is_valid_email("ada@engines.i"));
    assert!(!validation::is_valid_email("ada.engines"));
    assert!(!validation::is_valid_email(""));
}

#[test]
fn sort_fields_splits_known_fields_from_extras() {
    let form = raw(&[
        ("company_name", "  Acme  "),
        ("sector", ""),
        ("step", "company"),
        ("page_query", "utm_source=x"),
    ]);

    let (fields, extras) = validation::sort_fields(&form, &ConsultationStep::Company.fields_through());

    assert_eq!(fields.get("company_name"), Some(&FieldValue::from("Acme")));
    assert!(!fields.contains_key("sector"));
    assert_eq!(extras.get("step").map(String::as_str), Some("company"));
    assert_eq!(extras.get("page_query").map(String::as_str), Some("utm_source=x"));
}

#[test]
fn unchecked_consent_becomes_false() {
    let (fields, _) = validation::sort_fields(&raw(&[]), steps::consultation_fields().as_slice());
    assert_eq!(fields.get("privacy_consent"), Some(&FieldValue::Bool(false)));

    let (fields, _) = validation::sort_fields(
        &raw(&[("privacy_consent", "on")]),
        steps::consultation_fields().as_slice(),
    );
    assert_eq!(fields.get("privacy_consent"), Some(&FieldValue::Bool(true)));
}

#[test]
fn validation_collects_every_error() {
    let (fields, _) = validation::sort_fields(
        &raw(&[("first_name", "Ada"), ("email", "not-an-email")]),
        EBOOK_FIELDS,
    );

    let err = validation::validate_fields(&fields, EBOOK_FIELDS).unwrap_err();
    let failed: Vec<&str> = err.errors().iter().map(|e| e.field.as_str()).collect();

    assert_eq!(failed, vec!["last_name", "email", "company", "privacy_consent"]);
    assert_eq!(err.message_for("email"), Some("Please enter a valid email address"));
    assert_eq!(err.message_for("first_name"), None);
}

#[test]
fn string_consent_is_coerced_for_json_clients() {
    let specs = steps::consultation_fields();
    let mut fields = leadfunnel::lead::LeadFields::new();
    fields.insert("privacy_consent".to_string(), FieldValue::from("true"));

    validation::coerce_consent(&mut fields, &specs);
    assert_eq!(fields.get("privacy_consent"), Some(&FieldValue::Bool(true)));
}

#[test]
fn honeypot_detection() {
    assert!(validation::is_spam_form(&raw(&[("aG9uZXlwb3Q", "x")]), "aG9uZXlwb3Q"));
    assert!(!validation::is_spam_form(&raw(&[("aG9uZXlwb3Q", "")]), "aG9uZXlwb3Q"));
    assert!(!validation::is_spam(None));
    assert!(validation::is_spam(Some(&FieldValue::from("filled"))));
}

// ── Form parsing and client IP ──────────────────────────────────

#[test]
fn form_parser_keeps_first_occurrence() {
    let form = parser::parse_form(b"a=1&b=two+words&a=2").unwrap();
    assert_eq!(form.get("a").map(String::as_str), Some("1"));
    assert_eq!(form.get("b").map(String::as_str), Some("two words"));

    assert!(parser::parse_form(&[0xff, 0xfe]).is_err());
}

#[test]
fn forwarded_for_only_trusted_behind_proxy() {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.2".parse().unwrap());
    let proxy: IpAddr = "10.0.0.2".parse().unwrap();
    let trusted = vec!["10.0.0.0/8".parse().unwrap()];

    assert_eq!(
        metadata::client_ip(&headers, Some(proxy), &trusted),
        "203.0.113.9".parse::<IpAddr>().unwrap()
    );
    assert_eq!(metadata::client_ip(&headers, Some(proxy), &[]), proxy);
}

// ── Rate limiter ────────────────────────────────────────────────

#[test]
fn limiter_counts_per_funnel_and_ip() {
    let limiter = LeadRateLimiter::new();
    let ip: IpAddr = "198.51.100.4".parse().unwrap();
    let other: IpAddr = "198.51.100.5".parse().unwrap();

    assert!(limiter.check(FunnelKind::Ebook, ip, 2, 60).is_ok());
    assert!(limiter.check(FunnelKind::Ebook, ip, 2, 60).is_ok());
    let retry_after = limiter.check(FunnelKind::Ebook, ip, 2, 60).unwrap_err();
    assert!(retry_after <= 60);

    assert!(limiter.check(FunnelKind::Consultation, ip, 2, 60).is_ok());
    assert!(limiter.check(FunnelKind::Ebook, other, 2, 60).is_ok());
    assert_eq!(limiter.len(), 3);

    limiter.cleanup(Duration::ZERO);
    assert!(limiter.is_empty());
}
