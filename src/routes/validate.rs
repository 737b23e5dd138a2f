// Field checks for request bodies, reported as 400 validation errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{ApiError, ApiResult};

// Lets partial updates tell an explicit `null` (Some(None)) apart from an
// absent field (None). Pair with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn length(field: &str, value: &str, min: usize, max: usize) -> ApiResult<()> {
    let count = value.chars().count();
    if count < min || count > max {
        return Err(ApiError::Validation(if min == 0 {
            format!("Validation error: {field} must be at most {max} characters")
        } else {
            format!("Validation error: {field} must be between {min} and {max} characters")
        }));
    }
    Ok(())
}

pub fn min_length(field: &str, value: &str, min: usize) -> ApiResult<()> {
    if value.chars().count() < min {
        return Err(ApiError::Validation(format!(
            "Validation error: {field} must be at least {min} characters"
        )));
    }
    Ok(())
}

pub fn optional_length(field: &str, value: Option<&str>, max: usize) -> ApiResult<()> {
    match value {
        Some(value) => length(field, value, 0, max),
        None => Ok(()),
    }
}

pub fn required(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!(
            "Validation error: {field} is required"
        )));
    }
    Ok(())
}

// A single `@` with a non-empty local part and a dotted domain.
pub fn email(value: &str) -> ApiResult<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Validation error: email is not a valid email address".into(),
        ))
    }
}

// RFC 3339 timestamps, or naive `YYYY-MM-DDTHH:MM[:SS]` / `YYYY-MM-DD`
// values taken as UTC.
pub fn datetime(field: &str, value: &str) -> ApiResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(ApiError::Validation(format!(
        "Validation error: {field} is not a valid datetime"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("john@example.com", true)]
    #[case("a.b+c@mail.example.org", true)]
    #[case("john@localhost", false)]
    #[case("@example.com", false)]
    #[case("john@@example.com", false)]
    #[case("john doe@example.com", false)]
    #[case("john.example.com", false)]
    fn checks_email_shape(#[case] value: &str, #[case] ok: bool) {
        assert_eq!(email(value).is_ok(), ok);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(length("username", "émé", 3, 80).is_ok());
        assert!(length("username", "ab", 3, 80).is_err());
        assert!(length("name", &"x".repeat(201), 1, 200).is_err());
    }

    #[rstest]
    #[case("2024-12-31T23:59:59Z", "2024-12-31T23:59:59+00:00")]
    #[case("2024-12-31T23:59:59", "2024-12-31T23:59:59+00:00")]
    #[case("2024-12-31T20:00:00-02:00", "2024-12-31T22:00:00+00:00")]
    #[case("2024-12-31T08:30", "2024-12-31T08:30:00+00:00")]
    #[case("2024-12-31", "2024-12-31T00:00:00+00:00")]
    fn parses_due_dates(#[case] raw: &str, #[case] expected: &str) {
        let parsed = datetime("due_date", raw).expect("datetime");
        assert_eq!(parsed.to_rfc3339(), expected);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(datetime("due_date", "next tuesday").is_err());
        assert!(datetime("due_date", "2024-13-01").is_err());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        assigned_to: Option<Option<i64>>,
    }

    #[test]
    fn nullable_separates_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").expect("absent");
        let cleared: Patch = serde_json::from_str(r#"{"assigned_to":null}"#).expect("null");
        let set: Patch = serde_json::from_str(r#"{"assigned_to":4}"#).expect("set");
        assert_eq!(absent.assigned_to, None);
        assert_eq!(cleared.assigned_to, Some(None));
        assert_eq!(set.assigned_to, Some(Some(4)));
    }

    #[test]
    fn optional_values_only_check_the_upper_bound() {
        assert!(optional_length("description", None, 10).is_ok());
        assert!(optional_length("description", Some(""), 10).is_ok());
        assert!(optional_length("description", Some("eleven char"), 10).is_err());
    }
}
