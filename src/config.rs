use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;

use crate::funnel::{CrmForm, FunnelVariant};
use crate::lead::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Public site URL, used for sitemap entries.
    pub base_url: String,
    pub content_api_url: String,
    pub content_timeout: Duration,
    pub leads: LeadConfig,
    pub crm: CrmForm,
    pub ebook_variant: FunnelVariant,
    /// Directory for the fallback queues. `None` keeps them in memory.
    pub store_dir: Option<PathBuf>,
    pub rate_limit: u32,
    pub rate_limit_window_secs: u64,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct LeadConfig {
    pub consultation_endpoint: String,
    pub ebook_endpoint: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("LEADFUNNEL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LEADFUNNEL_HOST: {e}"))?;

        let port: u16 = env_or("LEADFUNNEL_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid LEADFUNNEL_PORT: {e}"))?;

        let base_url = env_or("LEADFUNNEL_BASE_URL", &format!("http://localhost:{port}"));

        let content_api_url = env_or("LEADFUNNEL_CONTENT_API_URL", "http://127.0.0.1:8000");
        let content_timeout = Duration::from_millis(parse_env("LEADFUNNEL_CONTENT_TIMEOUT_MS", 10_000)?);

        let lead_api_url = env_or("LEADFUNNEL_LEAD_API_URL", &content_api_url);
        let lead_api_url = lead_api_url.trim_end_matches('/');

        let retry = RetryPolicy {
            max_attempts: parse_env("LEADFUNNEL_LEAD_MAX_ATTEMPTS", 3)?,
            backoff_step: Duration::from_millis(parse_env("LEADFUNNEL_LEAD_BACKOFF_MS", 500)?),
        };
        if retry.max_attempts == 0 {
            return Err("LEADFUNNEL_LEAD_MAX_ATTEMPTS must be at least 1".to_string());
        }

        let leads = LeadConfig {
            consultation_endpoint: env_or(
                "LEADFUNNEL_CONSULTATION_ENDPOINT",
                &format!("{lead_api_url}/api/consultation-leads/"),
            ),
            ebook_endpoint: env_or(
                "LEADFUNNEL_EBOOK_ENDPOINT",
                &format!("{lead_api_url}/api/ebook-leads/"),
            ),
            timeout: Duration::from_millis(parse_env("LEADFUNNEL_LEAD_TIMEOUT_MS", 10_000)?),
            retry,
        };

        let crm = CrmForm {
            action_url: env_or("LEADFUNNEL_CRM_FORM_URL", "https://crm.zoho.eu/crm/WebToLeadForm"),
            content_type: env_or("LEADFUNNEL_CRM_CONTENT_TYPE", "eBook"),
            thanks_url: env_or("LEADFUNNEL_THANKS_URL", &format!("{base_url}/thanks")),
        };

        let variant_str = env_or("LEADFUNNEL_EBOOK_VARIANT", "embedded-markup");
        let ebook_variant = FunnelVariant::parse(&variant_str)
            .ok_or_else(|| format!("Invalid LEADFUNNEL_EBOOK_VARIANT: {variant_str}"))?;

        let store_dir = std::env::var("LEADFUNNEL_STORE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let rate_limit = parse_env("LEADFUNNEL_RATE_LIMIT", 10)?;
        let rate_limit_window_secs = parse_env("LEADFUNNEL_RATE_LIMIT_WINDOW_SECS", 60)?;

        let max_body_size: usize = parse_env("LEADFUNNEL_MAX_BODY_SIZE", 65_536)?;

        let trusted_proxies: Vec<IpNet> = env_or("LEADFUNNEL_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid LEADFUNNEL_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("LEADFUNNEL_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            base_url,
            content_api_url,
            content_timeout,
            leads,
            crm,
            ebook_variant,
            store_dir,
            rate_limit,
            rate_limit_window_secs,
            max_body_size,
            trusted_proxies,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| format!("Invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
