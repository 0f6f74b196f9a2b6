use std::sync::Arc;
use std::time::Duration;

use crate::{config::AppConfig, rate_limit::RateLimiter, store::Storage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Storage>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Storage>) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self {
            config: Arc::new(config),
            store,
            rate_limiter,
        }
    }
}
