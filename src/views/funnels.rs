use std::net::SocketAddr;

use askama::Template;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use super::forms::{FormField, HiddenInput, build_fields, carry_forward};
use super::pages::not_found_page;
use super::{Layout, render};
use crate::error::AppError;
use crate::funnel::steps::{CRM_MARKUP_FIELDS, ConsultationStep, EBOOK_FIELDS, FieldSpec};
use crate::funnel::validation::{self, RawForm, ValidationError};
use crate::funnel::{
    DEFAULT_EBOOK, FunnelVariant, HONEYPOT_FIELD, crm_form_url, ebook_display_name, parser,
    thanks_url,
};
use crate::lead::{Attribution, FieldValue, FunnelKind, LeadFields, SubmissionOutcome, attribution};
use crate::routes::leads::check_rate_limit;
use crate::state::SharedState;

const PAGE_QUERY: &str = "page_query";
const PAGE_REFERRER: &str = "page_referrer";

// --- Consultation ---

#[derive(Template)]
#[template(path = "consultation.html")]
struct ConsultationTemplate {
    layout: Layout,
    step: &'static str,
    step_title: &'static str,
    step_number: usize,
    step_count: usize,
    is_final: bool,
    fields: Vec<FormField>,
    hidden: Vec<HiddenInput>,
    honeypot: &'static str,
}

pub async fn consultation_page(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.leads.spawn_drain();

    let page = PageOrigin {
        query: query.unwrap_or_default(),
        referrer: attribution::referer_header(&headers)
            .unwrap_or_default()
            .to_string(),
    };
    render_step(
        &state,
        ConsultationStep::first(),
        &LeadFields::new(),
        None,
        &page,
        StatusCode::OK,
    )
    .await
}

pub async fn consultation_submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let raw = parser::parse_form(&body).map_err(AppError::BadRequest)?;

    if validation::is_spam_form(&raw, HONEYPOT_FIELD) {
        tracing::debug!("Honeypot filled on consultation form, dropping lead");
        return result_page(&state, StatusCode::OK, LeadResult::received()).await;
    }

    let step = raw
        .get("step")
        .and_then(|s| ConsultationStep::parse(s))
        .unwrap_or_else(ConsultationStep::first);
    let (fields, extras) = validation::sort_fields(&raw, &step.fields_through());
    let page = PageOrigin::from_extras(&extras);

    // Earlier steps are re-checked too; their answers arrive as hidden inputs
    for earlier in ConsultationStep::ALL.iter().take(step.number()) {
        if let Err(errors) = validation::validate_fields(&fields, earlier.fields()) {
            return render_step(
                &state,
                *earlier,
                &fields,
                Some(&errors),
                &page,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    }

    if let Some(next) = step.next() {
        return render_step(&state, next, &fields, None, &page, StatusCode::OK).await;
    }

    if let Err(e) = check_rate_limit(&state, FunnelKind::Consultation, &headers, addr) {
        tracing::warn!("Consultation form: {e}");
        return result_page(&state, StatusCode::TOO_MANY_REQUESTS, LeadResult::rate_limited())
            .await;
    }

    let outcome = state
        .leads
        .get(FunnelKind::Consultation)
        .submit(fields, page.attribution(&headers))
        .await;
    let (status, result) = LeadResult::from_outcome(&outcome);
    result_page(&state, status, result).await
}

async fn render_step(
    state: &SharedState,
    step: ConsultationStep,
    values: &LeadFields,
    errors: Option<&ValidationError>,
    page: &PageOrigin,
    status: StatusCode,
) -> Result<Response, AppError> {
    let mut hidden = page.hidden_inputs();
    hidden.extend(carry_forward(values, step.fields()));

    let template = ConsultationTemplate {
        layout: Layout::load(state, "Book a consultation", "").await,
        step: step.as_str(),
        step_title: step.title(),
        step_number: step.number(),
        step_count: ConsultationStep::ALL.len(),
        is_final: step.is_final(),
        fields: build_fields(step.fields(), values, errors),
        hidden,
        honeypot: HONEYPOT_FIELD,
    };
    render(status, &template)
}

// --- Ebook ---

#[derive(Template)]
#[template(path = "ebook.html")]
struct EbookTemplate {
    layout: Layout,
    variant: &'static str,
    ebook_name: String,
    iframe_url: String,
    action_url: String,
    hidden: Vec<HiddenInput>,
    fields: Vec<FormField>,
    honeypot: &'static str,
}

pub async fn ebook_page(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let variant = state.config.ebook_variant;
    render_ebook(&state, variant, query.unwrap_or_default(), &headers).await
}

pub async fn ebook_variant_page(
    State(state): State<SharedState>,
    Path(variant): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(variant) = FunnelVariant::parse(&variant) else {
        return not_found_page(&state).await;
    };
    render_ebook(&state, variant, query.unwrap_or_default(), &headers).await
}

async fn render_ebook(
    state: &SharedState,
    variant: FunnelVariant,
    query: String,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    state.leads.spawn_drain();

    let slug = query_param(&query, "ebook").unwrap_or_else(|| DEFAULT_EBOOK.to_string());
    let ebook_name = ebook_display_name(&slug);
    let attribution = attribution::from_headers(&query, None, headers);
    let crm = &state.config.crm;

    let mut template = EbookTemplate {
        layout: Layout::load(state, format!("Download {ebook_name}"), "").await,
        variant: variant.as_str(),
        ebook_name: ebook_name.clone(),
        iframe_url: String::new(),
        action_url: crm.action_url.clone(),
        hidden: Vec::new(),
        fields: Vec::new(),
        honeypot: HONEYPOT_FIELD,
    };

    match variant {
        FunnelVariant::Iframe => {
            template.iframe_url = crm_form_url(crm, &ebook_name, &attribution);
        }
        FunnelVariant::HostedScript => {
            template.hidden = crm_hidden_inputs(&ebook_name, &crm.content_type, &attribution);
            template.fields = build_fields(CRM_MARKUP_FIELDS, &LeadFields::new(), None);
        }
        FunnelVariant::EmbeddedMarkup => {
            template.hidden = vec![HiddenInput::new(
                "returnURL",
                thanks_url(&crm.thanks_url, &ebook_name),
            )];
            // The CRM's custom fields for the ebook name and content type
            template.hidden.push(HiddenInput::new("LEADCF24", ebook_name.as_str()));
            template.hidden.push(HiddenInput::new("LEADCF25", crm.content_type.as_str()));
            template
                .hidden
                .extend(crm_hidden_inputs(&ebook_name, &crm.content_type, &attribution));
            template.fields = build_fields(CRM_MARKUP_FIELDS, &LeadFields::new(), None);
        }
        FunnelVariant::SelfHostedForm => {
            let page = PageOrigin {
                query,
                referrer: attribution.referrer.clone(),
            };
            let mut values = LeadFields::new();
            values.insert("ebook".to_string(), FieldValue::from(ebook_name.as_str()));
            let (fields, hidden) = self_hosted_form(&values, None, &page);
            template.action_url = "/ebook".to_string();
            template.fields = fields;
            template.hidden = hidden;
        }
    }

    render(StatusCode::OK, &template)
}

/// Self-hosted ebook form. Goes through the lead controller like the
/// consultation funnel.
pub async fn ebook_submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let raw = parser::parse_form(&body).map_err(AppError::BadRequest)?;
    let ebook_name = raw
        .get("ebook")
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| ebook_display_name(DEFAULT_EBOOK));

    if validation::is_spam_form(&raw, HONEYPOT_FIELD) {
        tracing::debug!("Honeypot filled on ebook form, dropping lead");
        return Ok(Redirect::to(&thanks_url("/thanks", &ebook_name)).into_response());
    }

    let (mut fields, extras) = validation::sort_fields(&raw, EBOOK_FIELDS);
    fields.insert("ebook".to_string(), FieldValue::from(ebook_name.as_str()));
    let page = PageOrigin::from_extras(&extras);

    if let Err(errors) = validation::validate_fields(&fields, EBOOK_FIELDS) {
        let (form_fields, hidden) = self_hosted_form(&fields, Some(&errors), &page);
        let template = EbookTemplate {
            layout: Layout::load(&state, format!("Download {ebook_name}"), "").await,
            variant: FunnelVariant::SelfHostedForm.as_str(),
            ebook_name,
            iframe_url: String::new(),
            action_url: "/ebook".to_string(),
            hidden,
            fields: form_fields,
            honeypot: HONEYPOT_FIELD,
        };
        return render(StatusCode::UNPROCESSABLE_ENTITY, &template);
    }

    if let Err(e) = check_rate_limit(&state, FunnelKind::Ebook, &headers, addr) {
        tracing::warn!("Ebook form: {e}");
        return result_page(&state, StatusCode::TOO_MANY_REQUESTS, LeadResult::rate_limited())
            .await;
    }

    let outcome = state
        .leads
        .get(FunnelKind::Ebook)
        .submit(fields, page.attribution(&headers))
        .await;

    if outcome.is_delivered() {
        return Ok(Redirect::to(&thanks_url("/thanks", &ebook_name)).into_response());
    }
    let (status, result) = LeadResult::from_outcome(&outcome);
    result_page(&state, status, result).await
}

fn self_hosted_form(
    values: &LeadFields,
    errors: Option<&ValidationError>,
    page: &PageOrigin,
) -> (Vec<FormField>, Vec<HiddenInput>) {
    let visible: Vec<FieldSpec> = EBOOK_FIELDS
        .iter()
        .filter(|s| s.name != "ebook")
        .copied()
        .collect();
    let mut hidden = page.hidden_inputs();
    hidden.extend(carry_forward(values, &visible));
    (build_fields(&visible, values, errors), hidden)
}

/// Ebook name, content type and UTM parameters as the CRM expects them.
fn crm_hidden_inputs(
    ebook_name: &str,
    content_type: &str,
    attribution: &Attribution,
) -> Vec<HiddenInput> {
    let mut hidden = vec![
        HiddenInput::new("Ebook_Name__c", ebook_name),
        HiddenInput::new("Content_Type__c", content_type),
    ];
    hidden.extend(
        attribution
            .utm_params()
            .into_iter()
            .map(|(key, value)| HiddenInput::new(key, value)),
    );
    hidden
}

fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Where the visitor came from, carried through multi-page forms as hidden
/// inputs so attribution survives the POSTs.
struct PageOrigin {
    query: String,
    referrer: String,
}

impl PageOrigin {
    fn from_extras(extras: &RawForm) -> Self {
        Self {
            query: extras.get(PAGE_QUERY).cloned().unwrap_or_default(),
            referrer: extras.get(PAGE_REFERRER).cloned().unwrap_or_default(),
        }
    }

    fn hidden_inputs(&self) -> Vec<HiddenInput> {
        vec![
            HiddenInput::new(PAGE_QUERY, self.query.as_str()),
            HiddenInput::new(PAGE_REFERRER, self.referrer.as_str()),
        ]
    }

    /// The POST's own Referer is our form page, so it is never used here.
    fn attribution(&self, headers: &HeaderMap) -> Attribution {
        attribution::from_headers(&self.query, Some(&self.referrer), headers)
    }
}

// --- Result page ---

#[derive(Template)]
#[template(path = "lead_result.html")]
struct LeadResultTemplate {
    layout: Layout,
    heading: &'static str,
    message: &'static str,
    lead_id: String,
    booking_url: String,
}

struct LeadResult {
    heading: &'static str,
    message: &'static str,
    lead_id: String,
    booking_url: String,
}

impl LeadResult {
    fn new(heading: &'static str, message: &'static str) -> Self {
        Self {
            heading,
            message,
            lead_id: String::new(),
            booking_url: String::new(),
        }
    }

    fn received() -> Self {
        Self::new("Thank you", "We received your request and will be in touch shortly.")
    }

    fn rate_limited() -> Self {
        Self::new(
            "Too many requests",
            "You have sent several requests in a short time. Please try again in a minute.",
        )
    }

    fn from_outcome(outcome: &SubmissionOutcome) -> (StatusCode, Self) {
        match outcome {
            SubmissionOutcome::Delivered {
                lead_id,
                booking_url,
                ..
            } => {
                let mut result = Self::received();
                result.lead_id = lead_id.as_ref().map(|id| id.to_string()).unwrap_or_default();
                result.booking_url = booking_url.clone().unwrap_or_default();
                (StatusCode::OK, result)
            }
            SubmissionOutcome::SavedOffline {
                persisted: true, ..
            } => (
                StatusCode::ACCEPTED,
                Self::new(
                    "Request saved",
                    "Our systems are busy right now. Your request has been saved and we will send it again automatically.",
                ),
            ),
            SubmissionOutcome::SavedOffline {
                persisted: false, ..
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Self::new(
                    "Something went wrong",
                    "We could not save your request. Please try again later.",
                ),
            ),
        }
    }
}

async fn result_page(
    state: &SharedState,
    status: StatusCode,
    result: LeadResult,
) -> Result<Response, AppError> {
    let template = LeadResultTemplate {
        layout: Layout::load(state, result.heading, "").await,
        heading: result.heading,
        message: result.message,
        lead_id: result.lead_id,
        booking_url: result.booking_url,
    };
    render(status, &template)
}
