//! Admin data export as JSON or CSV.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use portal_core::{MediaGroup, format_rfc3339, now_utc};
use portal_storage::{DynStorage, EntityKind, QueryBuilder};
use serde_json::{Map, Value, json};

use crate::error::{ApiError, ApiResult};

/// Audit exports never return more rows than this.
pub const AUDIT_EXPORT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// Parses the requested format. Absent means JSON.
    pub fn parse(format: Option<&str>) -> ApiResult<Self> {
        match format.map(str::trim) {
            None | Some("") => Ok(Self::Json),
            Some(f) if f.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(f) if f.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(other) => Err(ApiError::validation(format!(
                "Unsupported export format '{other}'"
            ))),
        }
    }
}

/// Loads every row of `kind` matching `filters`, newest first.
///
/// Collaborator rows carry their experience and machinery media links.
pub async fn collect_rows(
    storage: &DynStorage,
    kind: EntityKind,
    filters: &Map<String, Value>,
) -> ApiResult<Vec<Value>> {
    let mut builder = QueryBuilder::new(kind).filters(filters)?;
    if kind == EntityKind::Audit {
        builder = builder.limit(AUDIT_EXPORT_LIMIT);
    }
    let query = builder.build();

    let rows = match kind {
        EntityKind::Collaborators => {
            let page = storage.search_collaborators(&query).await?;
            let mut rows = Vec::with_capacity(page.items.len());
            for collaborator in page.items {
                let media = storage.media_links(&collaborator.id).await?;
                let mut row = to_object(&collaborator)?;
                row.insert(
                    "experienceProvidedMedia".into(),
                    serde_json::to_value(media.group(MediaGroup::Experience))
                        .map_err(|e| ApiError::internal(e.to_string()))?,
                );
                row.insert(
                    "machineryAndEquipmentMedia".into(),
                    serde_json::to_value(media.group(MediaGroup::Machinery))
                        .map_err(|e| ApiError::internal(e.to_string()))?,
                );
                rows.push(Value::Object(row));
            }
            rows
        }
        EntityKind::Innovators => to_values(storage.search_innovators(&query).await?.items)?,
        EntityKind::Audit => to_values(storage.search_audit(&query).await?.items)?,
    };
    Ok(rows)
}

fn to_object<T: serde::Serialize>(record: &T) -> ApiResult<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::internal("record did not serialize to an object")),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

pub(crate) fn to_values<T: serde::Serialize>(records: Vec<T>) -> ApiResult<Vec<Value>> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(|e| ApiError::internal(e.to_string())))
        .collect()
}

/// Renders rows as CSV.
///
/// The header is the key set of the first row. Missing and null values are
/// empty, nested values are JSON-encoded, and fields holding a comma, quote
/// or newline are quoted with inner quotes doubled. No trailing newline.
pub fn to_csv(rows: &[Value]) -> ApiResult<String> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(&headers)?);
    for row in rows {
        let record: Vec<String> = headers.iter().map(|h| csv_field(row.get(h))).collect();
        lines.push(csv_line(&record)?);
    }
    Ok(lines.join("\n"))
}

/// Encodes one record without its terminator.
fn csv_line(fields: &[String]) -> ApiResult<String> {
    // The csv writer renders a lone empty field as `""`.
    if fields.iter().all(String::is_empty) {
        return Ok(",".repeat(fields.len().saturating_sub(1)));
    }

    let csv_err = |e: String| ApiError::internal(format!("csv encoding failed: {e}"));
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields).map_err(|e| csv_err(e.to_string()))?;

    let bytes = writer.into_inner().map_err(|e| csv_err(e.to_string()))?;
    let mut line = String::from_utf8(bytes).map_err(|e| csv_err(e.to_string()))?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

fn csv_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Builds the export response in the requested format.
pub fn export_response(
    kind: EntityKind,
    format: ExportFormat,
    rows: Vec<Value>,
    exported_by: &str,
) -> ApiResult<Response> {
    let exported_at = format_rfc3339(&now_utc());
    match format {
        ExportFormat::Json => Ok(Json(json!({
            "count": rows.len(),
            "data": rows,
            "exportedAt": exported_at,
            "exportedBy": exported_by,
        }))
        .into_response()),
        ExportFormat::Csv => {
            let body = to_csv(&rows)?;
            let disposition = format!(
                "attachment; filename=\"{}_export_{}.csv\"",
                kind.as_str(),
                exported_at
            );
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition).map_err(|e| ApiError::internal(e.to_string()))?,
            );
            Ok((headers, body).into_response())
        }
    }
}
