use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

pub const UTM_KEYS: [&str; 5] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
];

/// First-party analytics cookie carrying the client identifier.
pub const GA_COOKIE: &str = "_ga";

/// Marketing-origin signals attached to a lead. Absent `utm_*` parameters
/// are omitted from the serialized form rather than sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub client_id: String,
}

impl Attribution {
    pub fn utm(&self, key: &str) -> Option<&str> {
        match key {
            "utm_source" => self.utm_source.as_deref(),
            "utm_medium" => self.utm_medium.as_deref(),
            "utm_campaign" => self.utm_campaign.as_deref(),
            "utm_term" => self.utm_term.as_deref(),
            "utm_content" => self.utm_content.as_deref(),
            _ => None,
        }
    }

    /// Present UTM parameters in canonical order.
    pub fn utm_params(&self) -> Vec<(&'static str, &str)> {
        UTM_KEYS
            .iter()
            .filter_map(|key| self.utm(key).map(|value| (*key, value)))
            .collect()
    }

    fn utm_slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "utm_source" => Some(&mut self.utm_source),
            "utm_medium" => Some(&mut self.utm_medium),
            "utm_campaign" => Some(&mut self.utm_campaign),
            "utm_term" => Some(&mut self.utm_term),
            "utm_content" => Some(&mut self.utm_content),
            _ => None,
        }
    }
}

/// Build attribution from the page query string, the document referrer and
/// the raw analytics cookie value. Never fails: anything unparseable ends up
/// as an empty field.
pub fn extract(page_query: &str, referrer: Option<&str>, ga_cookie: Option<&str>) -> Attribution {
    let query = page_query.strip_prefix('?').unwrap_or(page_query);
    let mut attribution = Attribution::default();
    let mut ref_param: Option<String> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        if key == "ref" {
            if ref_param.is_none() {
                ref_param = Some(value.into_owned());
            }
            continue;
        }
        if let Some(slot) = attribution.utm_slot(&key) {
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
    }

    attribution.referrer = referrer
        .filter(|r| !r.trim().is_empty())
        .map(str::to_string)
        .or(ref_param)
        .unwrap_or_default();
    attribution.client_id = ga_cookie.map(client_id_from_cookie).unwrap_or_default();

    attribution
}

/// `GA1.2.123456789.987654321` -> `123456789.987654321`. Values with fewer
/// than four dot-separated segments come back unchanged.
pub fn client_id_from_cookie(value: &str) -> String {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() >= 4 {
        format!("{}.{}", parts[2], parts[3])
    } else {
        value.to_string()
    }
}

/// Attribution for a request carrying the page query and referrer explicitly
/// (hidden form inputs or JSON body); the analytics cookie is read from the
/// request headers.
pub fn from_headers(page_query: &str, referrer: Option<&str>, headers: &HeaderMap) -> Attribution {
    let jar = CookieJar::from_headers(headers);
    let ga = jar.get(GA_COOKIE).map(|c| c.value().to_string());
    let referrer = referrer.or_else(|| referer_header(headers));
    extract(page_query, referrer, ga.as_deref())
}

pub fn referer_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
