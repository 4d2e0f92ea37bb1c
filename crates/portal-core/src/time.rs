use crate::error::{CoreError, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp as RFC 3339, falling back to the unix timestamp if the
/// value is outside the representable range.
pub fn format_rfc3339(datetime: &OffsetDateTime) -> String {
    datetime
        .format(&Rfc3339)
        .unwrap_or_else(|_| datetime.unix_timestamp().to_string())
}

pub fn parse_rfc3339(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("Failed to parse '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_format_and_parse() {
        let dt = datetime!(2024-03-01 12:30:00 UTC);
        let formatted = format_rfc3339(&dt);
        assert_eq!(formatted, "2024-03-01T12:30:00Z");
        assert_eq!(parse_rfc3339(&formatted).unwrap(), dt);
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse_rfc3339("yesterday").unwrap_err();
        assert!(matches!(err, CoreError::InvalidDateTime(_)));
    }
}
