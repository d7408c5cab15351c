use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Session token payload.
///
/// A self-contained assertion of "who" (`sub`) and "until when" (`exp`).
/// Nothing about the session is stored server-side, validity is decided
/// from the signature and the expiry alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Create claims for a subject expiring `ttl` after now.
    ///
    /// Returns `None` when the expiry is not a representable instant.
    pub fn for_subject(subject: impl ToString, ttl: Duration) -> Option<Self> {
        Self::issued_at(subject, Utc::now(), ttl)
    }

    /// Create claims for a subject issued at a given instant.
    ///
    /// # Arguments
    /// * `subject` - Identifier the token is bound to
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Lifetime added to `issued_at` to form the expiry
    ///
    /// # Returns
    /// Claims with sub, exp and iat set, or `None` if `issued_at + ttl` overflows
    pub fn issued_at(
        subject: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;

        Some(Self {
            sub: Some(subject.to_string()),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        })
    }

    /// Subject, if present and non-blank.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_issued_at_sets_absolute_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = Claims::issued_at(42, now, Duration::minutes(30)).unwrap();

        assert_eq!(claims.sub, Some("42".to_string()));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_subject_ignores_blank_values() {
        let mut claims = Claims::for_subject("7", Duration::hours(1)).unwrap();
        assert_eq!(claims.subject(), Some("7"));

        claims.sub = Some("  ".to_string());
        assert_eq!(claims.subject(), None);

        claims.sub = None;
        assert_eq!(claims.subject(), None);
    }

    #[test]
    fn test_unrepresentable_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ttl = Duration::try_days(365 * 1_000_000).unwrap();

        assert_eq!(Claims::issued_at(42, now, ttl), None);
    }

    #[test]
    fn test_missing_subject_is_omitted_from_payload() {
        let claims = Claims {
            sub: None,
            exp: 10,
            iat: 5,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("sub").is_none());
        assert_eq!(json["exp"], 10);
    }
}
