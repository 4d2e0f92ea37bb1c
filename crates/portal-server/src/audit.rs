//! Audit trail of administrative actions.
//!
//! Recording is best effort: a failed append is logged and never fails the
//! action being audited.

use axum::http::HeaderMap;
use portal_core::{AuditAction, AuditLogEntry, parse_rfc3339};
use portal_storage::{DynStorage, EntityKind, QueryBuilder, QueryPage};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_AUDIT_LIMIT: usize = 50;
pub const MAX_AUDIT_LIMIT: usize = 1000;

/// The acting admin.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };
        Self {
            user_id: user_id.into(),
            email: email.into(),
            ip_address: header("x-forwarded-for")
                .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string())),
            user_agent: header("user-agent"),
        }
    }
}

/// Filters accepted by the audit query endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub user_id: Option<String>,
    pub entity: Option<String>,
    pub action: Option<String>,
    /// RFC 3339 lower bound on `createdAt`.
    pub since: Option<String>,
    /// RFC 3339 upper bound on `createdAt`.
    pub until: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone)]
pub struct AuditService {
    storage: DynStorage,
}

impl AuditService {
    pub fn new(storage: DynStorage) -> Self {
        Self { storage }
    }

    pub async fn record(
        &self,
        actor: &Actor,
        action: AuditAction,
        entity: &str,
        entity_id: Option<&str>,
        details: Option<Value>,
    ) {
        let mut entry = AuditLogEntry::new(&actor.user_id, &actor.email, action, entity)
            .with_source(actor.ip_address.clone(), actor.user_agent.clone());
        if let Some(id) = entity_id {
            entry = entry.with_entity_id(id);
        }
        if let Some(details) = details {
            entry = entry.with_details(details);
        }

        if let Err(e) = self.storage.append_audit(entry).await {
            tracing::error!(
                error = %e,
                action = %action,
                entity = %entity,
                user_id = %actor.user_id,
                "failed to write audit entry"
            );
        }
    }

    pub async fn record_export(
        &self,
        actor: &Actor,
        kind: EntityKind,
        count: usize,
        filters: &Value,
    ) {
        let entity = kind.as_str().to_ascii_uppercase();
        self.record(
            actor,
            AuditAction::Export,
            &entity,
            None,
            Some(json!({ "count": count, "filters": filters })),
        )
        .await;
    }

    /// Entries matching `query`, newest first.
    pub async fn query(&self, query: &AuditQuery) -> ApiResult<QueryPage<AuditLogEntry>> {
        let since = parse_bound("since", query.since.as_deref())?;
        let until = parse_bound("until", query.until.as_deref())?;

        let mut builder = QueryBuilder::new(EntityKind::Audit);
        for (field, value) in [
            ("userId", &query.user_id),
            ("entity", &query.entity),
            ("action", &query.action),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                builder = builder.filter(field, &Value::String(value.to_string()))?;
            }
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT);
        let query = builder
            .created_between(since, until)
            .offset(query.offset.unwrap_or(0))
            .limit(limit)
            .build();

        Ok(self.storage.search_audit(&query).await?)
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> ApiResult<Option<time::OffsetDateTime>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse_rfc3339(v).map_err(|_| {
                ApiError::validation(format!("'{name}' must be an RFC 3339 timestamp"))
            })
        })
        .transpose()
}
