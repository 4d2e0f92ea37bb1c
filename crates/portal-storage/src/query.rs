//! Typed query builder for admin search, export and audit queries.
//!
//! Every field a caller can filter on comes from a per-entity allow-list;
//! anything else is rejected with [`StorageError::InvalidQuery`]. Filters are
//! evaluated against the camelCase JSON form of a record.

use std::fmt;
use std::str::FromStr;

use portal_core::{AuditAction, RecordStatus, parse_rfc3339};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Resource kinds reachable through the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Collaborators,
    Innovators,
    Audit,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Collaborators, Self::Innovators, Self::Audit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collaborators => "collaborators",
            Self::Innovators => "innovators",
            Self::Audit => "audit",
        }
    }

    /// Fields matched by free-text search.
    pub fn text_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Collaborators => &[
                "companyName",
                "email",
                "primaryPhoneNumber",
                "specialization",
            ],
            Self::Innovators => &["name", "email", "phone", "projectTitle"],
            Self::Audit => &["userEmail", "action", "entity"],
        }
    }

    /// Fields accepted in caller-supplied filter objects.
    pub fn filter_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Collaborators => &[
                "status",
                "isVisible",
                "companyName",
                "email",
                "primaryPhoneNumber",
                "industrialSector",
                "specialization",
                "location",
            ],
            Self::Innovators => &[
                "status",
                "isVisible",
                "name",
                "email",
                "phone",
                "projectTitle",
                "field",
            ],
            Self::Audit => &["userId", "userEmail", "action", "entity", "entityId"],
        }
    }

    /// Audit entries have no review status.
    pub fn has_status(&self) -> bool {
        !matches!(self, Self::Audit)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StorageError::unknown_entity(s))
    }
}

/// A single predicate over a record's JSON form.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Case-insensitive substring match against any of `fields`.
    Contains {
        fields: &'static [&'static str],
        value: String,
    },
    /// Exact match of a scalar field.
    Exact { field: &'static str, value: String },
    /// Boolean field match.
    Boolean { field: &'static str, value: bool },
    /// Inclusive timestamp range.
    DateRange {
        field: &'static str,
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
    },
}

impl QueryFilter {
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            QueryFilter::Contains { fields, value } => fields.iter().any(|field| {
                record
                    .get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(value.as_str()))
            }),
            QueryFilter::Exact { field, value } => match record.get(*field) {
                Some(Value::String(s)) => s == value,
                Some(Value::Number(n)) => n.to_string() == *value,
                Some(Value::Bool(b)) => b.to_string() == *value,
                _ => false,
            },
            QueryFilter::Boolean { field, value } => {
                record.get(*field).and_then(Value::as_bool) == Some(*value)
            }
            QueryFilter::DateRange { field, start, end } => {
                let Some(at) = record
                    .get(*field)
                    .and_then(Value::as_str)
                    .and_then(|s| parse_rfc3339(s).ok())
                else {
                    return false;
                };
                start.is_none_or(|start| at >= start) && end.is_none_or(|end| at <= end)
            }
        }
    }
}

/// A built query: all filters are AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    pub kind: EntityKind,
    pub filters: Vec<QueryFilter>,
    pub offset: usize,
    /// `None` returns every matching row.
    pub limit: Option<usize>,
}

impl EntityQuery {
    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }
}

/// Rows of one page plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> QueryPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Builds an [`EntityQuery`] while enforcing the entity's allow-lists.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    kind: EntityKind,
    filters: Vec<QueryFilter>,
    offset: usize,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Adds a free-text search over the entity's text fields. Blank terms
    /// are ignored.
    #[must_use]
    pub fn search(mut self, term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            self.filters.push(QueryFilter::Contains {
                fields: self.kind.text_fields(),
                value: term.to_lowercase(),
            });
        }
        self
    }

    /// Restricts by review status. `all` or a blank value applies no filter,
    /// and entities without a status ignore it.
    pub fn status(mut self, status: Option<&str>) -> Result<Self, StorageError> {
        let Some(status) = status.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self);
        };
        if status.eq_ignore_ascii_case("all") || !self.kind.has_status() {
            return Ok(self);
        }

        let status: RecordStatus = status
            .parse()
            .map_err(|_| StorageError::invalid_query(format!("Invalid status '{status}'")))?;
        self.filters.push(QueryFilter::Exact {
            field: "status",
            value: status.as_str().to_string(),
        });
        Ok(self)
    }

    /// Adds an equality filter on an allow-listed field.
    pub fn filter(mut self, field: &str, value: &Value) -> Result<Self, StorageError> {
        let Some(field) = self
            .kind
            .filter_fields()
            .iter()
            .copied()
            .find(|allowed| *allowed == field)
        else {
            return Err(StorageError::invalid_query(format!(
                "Unknown filter field '{field}' for {}",
                self.kind
            )));
        };

        let filter = match value {
            Value::Bool(b) => QueryFilter::Boolean { field, value: *b },
            Value::Number(n) => QueryFilter::Exact {
                field,
                value: n.to_string(),
            },
            Value::String(s) => QueryFilter::Exact {
                field,
                value: normalize_value(field, s)?,
            },
            _ => {
                return Err(StorageError::invalid_query(format!(
                    "Filter '{field}' must be a string, number or boolean"
                )));
            }
        };
        self.filters.push(filter);
        Ok(self)
    }

    /// Adds every entry of a caller-supplied filter object.
    pub fn filters(self, filters: &Map<String, Value>) -> Result<Self, StorageError> {
        filters
            .iter()
            .try_fold(self, |builder, (field, value)| builder.filter(field, value))
    }

    /// Restricts `createdAt` to an inclusive range.
    #[must_use]
    pub fn created_between(
        mut self,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Self {
        if since.is_some() || until.is_some() {
            self.filters.push(QueryFilter::DateRange {
                field: "createdAt",
                start: since,
                end: until,
            });
        }
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> EntityQuery {
        EntityQuery {
            kind: self.kind,
            filters: self.filters,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

fn normalize_value(field: &str, value: &str) -> Result<String, StorageError> {
    match field {
        "status" => value
            .parse::<RecordStatus>()
            .map(|s| s.as_str().to_string())
            .map_err(|_| StorageError::invalid_query(format!("Invalid status '{value}'"))),
        "action" => value
            .parse::<AuditAction>()
            .map(|a| a.as_str().to_string())
            .map_err(|_| StorageError::invalid_query(format!("Invalid action '{value}'"))),
        _ => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn collaborator(name: &str, status: &str) -> Value {
        json!({
            "companyName": name,
            "email": format!("{}@example.ly", name.to_lowercase()),
            "primaryPhoneNumber": "0910000000",
            "specialization": "Welding",
            "status": status,
            "isVisible": status == "APPROVED",
            "createdAt": "2024-05-01T10:00:00Z",
        })
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!(
            "collaborators".parse::<EntityKind>().unwrap(),
            EntityKind::Collaborators
        );
        let err = "news".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, StorageError::UnknownEntity { .. }));
    }

    #[test]
    fn test_search_is_case_insensitive_or_match() {
        let query = QueryBuilder::new(EntityKind::Collaborators)
            .search(Some("ACME"))
            .build();
        assert!(query.matches(&collaborator("Acme Steel", "PENDING")));
        assert!(!query.matches(&collaborator("Libya Tools", "PENDING")));

        // Matches through another allow-listed field.
        let query = QueryBuilder::new(EntityKind::Collaborators)
            .search(Some("weld"))
            .build();
        assert!(query.matches(&collaborator("Libya Tools", "PENDING")));
    }

    #[test]
    fn test_status_all_omits_filter() {
        let query = QueryBuilder::new(EntityKind::Collaborators)
            .status(Some("all"))
            .unwrap()
            .search(Some("   "))
            .build();
        assert!(query.filters.is_empty());

        let query = QueryBuilder::new(EntityKind::Collaborators)
            .status(Some("APPROVED"))
            .unwrap()
            .build();
        assert!(query.matches(&collaborator("A", "APPROVED")));
        assert!(!query.matches(&collaborator("B", "PENDING")));
    }

    #[test]
    fn test_status_ignored_for_audit() {
        let query = QueryBuilder::new(EntityKind::Audit)
            .status(Some("APPROVED"))
            .unwrap()
            .build();
        assert!(query.filters.is_empty());

        assert!(
            QueryBuilder::new(EntityKind::Innovators)
                .status(Some("ARCHIVED"))
                .is_err()
        );
    }

    #[test]
    fn test_unknown_filter_field_rejected() {
        let filters = json!({"status": "approved", "password": "x"});
        let err = QueryBuilder::new(EntityKind::Collaborators)
            .filters(filters.as_object().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("Unknown filter field 'password'"));
    }

    #[test]
    fn test_typed_filters() {
        let filters = json!({"status": "approved", "isVisible": true});
        let query = QueryBuilder::new(EntityKind::Collaborators)
            .filters(filters.as_object().unwrap())
            .unwrap()
            .build();
        assert!(query.matches(&collaborator("A", "APPROVED")));
        assert!(!query.matches(&collaborator("A", "REJECTED")));

        let err = QueryBuilder::new(EntityKind::Audit)
            .filter("entity", &json!(["a"]))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery { .. }));
    }

    #[test]
    fn test_created_between() {
        let query = QueryBuilder::new(EntityKind::Audit)
            .created_between(Some(datetime!(2024-05-01 00:00 UTC)), None)
            .build();
        assert!(query.matches(&json!({"createdAt": "2024-05-01T10:00:00Z"})));
        assert!(!query.matches(&json!({"createdAt": "2024-04-30T23:59:59Z"})));
        assert!(!query.matches(&json!({"createdAt": "not a date"})));

        let query = QueryBuilder::new(EntityKind::Audit)
            .created_between(None, Some(datetime!(2024-05-01 00:00 UTC)))
            .build();
        assert!(query.matches(&json!({"createdAt": "2024-05-01T00:00:00Z"})));
    }
}
