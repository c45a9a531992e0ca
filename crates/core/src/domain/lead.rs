use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Email,
    Platform,
}

impl LeadField {
    pub const ALL: [LeadField; 3] = [Self::Name, Self::Email, Self::Platform];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Platform => "platform",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LeadValidationError {
    #[error("Name is required. Please enter your name.")]
    MissingName,
    #[error("Email is required. Please enter your email.")]
    MissingEmail,
    #[error("Please enter a valid email address (e.g., user@example.com)")]
    InvalidEmail,
    #[error("Platform is required. Please specify your platform.")]
    MissingPlatform,
}

impl LeadValidationError {
    pub fn field(&self) -> LeadField {
        match self {
            Self::MissingName => LeadField::Name,
            Self::MissingEmail | Self::InvalidEmail => LeadField::Email,
            Self::MissingPlatform => LeadField::Platform,
        }
    }
}

/// A captured prospect. Only constructible from fields that passed validation,
/// including when read back from storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LeadRecord")]
pub struct Lead {
    #[serde(with = "timestamp_format")]
    timestamp: NaiveDateTime,
    name: String,
    email: String,
    platform: String,
}

impl Lead {
    pub fn new(
        name: &str,
        email: &str,
        platform: &str,
        timestamp: NaiveDateTime,
    ) -> Result<Self, LeadValidationError> {
        Ok(Self {
            timestamp,
            name: validate_field(LeadField::Name, name)?,
            email: validate_field(LeadField::Email, email)?,
            platform: validate_field(LeadField::Platform, platform)?,
        })
    }

    /// Validates and stamps the lead with the current local time, to the second.
    pub fn capture(name: &str, email: &str, platform: &str) -> Result<Self, LeadValidationError> {
        let now = Local::now().naive_local();
        Self::new(name, email, platform, now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

/// Wire shape of a stored lead before validation.
#[derive(Deserialize)]
struct LeadRecord {
    #[serde(with = "timestamp_format")]
    timestamp: NaiveDateTime,
    name: String,
    email: String,
    platform: String,
}

impl TryFrom<LeadRecord> for Lead {
    type Error = LeadValidationError;

    fn try_from(record: LeadRecord) -> Result<Self, Self::Error> {
        Lead::new(&record.name, &record.email, &record.platform, record.timestamp)
    }
}

/// Trims the raw input and applies the per-field rule.
pub fn validate_field(field: LeadField, raw: &str) -> Result<String, LeadValidationError> {
    let value = raw.trim();
    match field {
        LeadField::Name if value.is_empty() => Err(LeadValidationError::MissingName),
        LeadField::Email if value.is_empty() => Err(LeadValidationError::MissingEmail),
        LeadField::Email if !is_valid_email(value) => Err(LeadValidationError::InvalidEmail),
        LeadField::Platform if value.is_empty() => Err(LeadValidationError::MissingPlatform),
        _ => Ok(value.to_string()),
    }
}

/// An `@` must be present and the segment after it must contain a `.`.
pub fn is_valid_email(email: &str) -> bool {
    email.split('@').nth(1).is_some_and(|domain| domain.contains('.'))
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{is_valid_email, validate_field, Lead, LeadField, LeadValidationError};

    fn fixed_timestamp() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 0))
            .expect("valid fixture timestamp")
    }

    #[test]
    fn email_requires_at_sign_and_dot_in_domain() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("user.example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("first.last@localhost"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn lead_requires_all_three_fields() {
        let timestamp = fixed_timestamp();
        assert_eq!(
            Lead::new("  ", "user@example.com", "YouTube", timestamp),
            Err(LeadValidationError::MissingName)
        );
        assert_eq!(
            Lead::new("Ada", "", "YouTube", timestamp),
            Err(LeadValidationError::MissingEmail)
        );
        assert_eq!(
            Lead::new("Ada", "ada-at-example", "YouTube", timestamp),
            Err(LeadValidationError::InvalidEmail)
        );
        assert_eq!(
            Lead::new("Ada", "ada@example.com", "\t", timestamp),
            Err(LeadValidationError::MissingPlatform)
        );
    }

    #[test]
    fn valid_lead_is_trimmed() {
        let lead = Lead::new(" Ada ", " ada@example.com", "YouTube ", fixed_timestamp())
            .expect("lead should validate");
        assert_eq!(lead.name(), "Ada");
        assert_eq!(lead.email(), "ada@example.com");
        assert_eq!(lead.platform(), "YouTube");
        assert_eq!(lead.formatted_timestamp(), "2024-03-09 14:05:00");
    }

    #[test]
    fn validation_errors_point_at_their_field() {
        let error = validate_field(LeadField::Email, "nope").map_err(|error| error.field());
        assert_eq!(error, Err(LeadField::Email));
        assert_eq!(LeadValidationError::MissingPlatform.field(), LeadField::Platform);
    }

    #[test]
    fn timestamp_serializes_in_csv_format() {
        let lead = Lead::new("Ada", "ada@example.com", "Twitch", fixed_timestamp())
            .expect("lead should validate");
        let encoded = serde_json::to_value(&lead).expect("serialize lead");
        assert_eq!(encoded["timestamp"], "2024-03-09 14:05:00");

        let decoded: Lead = serde_json::from_value(encoded).expect("deserialize lead");
        assert_eq!(decoded, lead);
    }

    #[test]
    fn deserializing_revalidates_fields() {
        let raw = r#"{"timestamp": "2024-03-09 14:05:00", "name": " ", "email": "ada@example.com", "platform": "YouTube"}"#;
        let error = serde_json::from_str::<Lead>(raw).expect_err("blank name must not load");
        assert!(error.to_string().contains("Name is required"));
    }
}
