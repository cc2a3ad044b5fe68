use std::sync::Arc;

use crate::config::Config;
use crate::content::ContentClient;
use crate::lead::LeadChannels;
use crate::rate_limit::LeadRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub content: ContentClient,
    pub leads: LeadChannels,
    pub lead_limiter: LeadRateLimiter,
}
