use std::sync::Arc;

use axum::extract::FromRef;
use portal_auth::{AuthState, SessionVerifier};
use portal_cache::{CacheTtl, TtlCache};
use portal_notifications::NotificationService;
use portal_ratelimit::RateLimiters;
use portal_storage::DynStorage;
use serde_json::Value;

use crate::audit::AuditService;
use crate::config::{AppConfig, UploadConfig};

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    /// Cached public listings, stored as response JSON.
    pub cache: Arc<TtlCache<Value>>,
    pub cache_ttl: CacheTtl,
    pub limiters: Arc<RateLimiters>,
    pub auth: AuthState,
    pub notifications: Arc<NotificationService>,
    pub audit: AuditService,
    pub uploads: UploadConfig,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(
        cfg: &AppConfig,
        storage: DynStorage,
        notifications: Arc<NotificationService>,
    ) -> Self {
        let verifier = Arc::new(SessionVerifier::new(&cfg.auth.session_secret));
        let auth = AuthState::new(verifier)
            .with_cookie_name(cfg.auth.cookie_name.clone())
            .with_admin_roles(cfg.auth.admin_roles.clone());

        Self {
            audit: AuditService::new(storage.clone()),
            storage,
            cache: Arc::new(TtlCache::new()),
            cache_ttl: cfg.cache.ttl,
            limiters: Arc::new(RateLimiters::new(&cfg.rate_limit)),
            auth,
            notifications,
            uploads: cfg.uploads.clone(),
            body_limit_bytes: cfg.server.body_limit_bytes,
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
