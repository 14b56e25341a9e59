//! URL record entity representing a short code mapping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A short code bound to an original URL.
///
/// `click_count` is kept under its own counter key and is therefore not
/// part of the serialized form; it is filled in when the record is read
/// together with its counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub click_count: u64,
}

impl UrlRecord {
    /// Creates a fresh record with zero clicks.
    ///
    /// `ttl_seconds == 0` produces a record that never expires. Returns `None`
    /// when the expiry would fall outside the representable date range.
    pub fn new(
        short_code: String,
        original_url: String,
        created_at: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Option<Self> {
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            let ttl = i64::try_from(ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)?;
            Some(created_at.checked_add_signed(ttl)?)
        };

        Some(Self {
            short_code,
            original_url,
            created_at,
            expires_at,
            click_count: 0,
        })
    }

    /// Returns true if the record is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, measured from `now`.
    ///
    /// `None` means the record never expires. An expired record yields a
    /// zero duration.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        self.expires_at
            .map(|e| (e - now).to_std().unwrap_or(std::time::Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let now = Utc::now();
        let record = UrlRecord::new(
            "abc1234".to_string(),
            "https://example.com".to_string(),
            now,
            2_592_000,
        )
        .unwrap();

        assert_eq!(record.short_code, "abc1234");
        assert_eq!(record.original_url, "https://example.com");
        assert_eq!(record.created_at, now);
        assert_eq!(record.expires_at, Some(now + Duration::seconds(2_592_000)));
        assert_eq!(record.click_count, 0);
        assert!(!record.is_expired());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let record = UrlRecord::new(
            "forever".to_string(),
            "https://example.com".to_string(),
            Utc::now(),
            0,
        )
        .unwrap();

        assert!(record.expires_at.is_none());
        assert!(!record.is_expired_at(Utc::now() + Duration::days(3650)));
        assert!(record.remaining_ttl(Utc::now()).is_none());
    }

    #[test]
    fn test_record_is_expired() {
        let created = Utc::now() - Duration::seconds(10);
        let record = UrlRecord::new(
            "old".to_string(),
            "https://example.com".to_string(),
            created,
            5,
        )
        .unwrap();

        assert!(record.is_expired());
        assert_eq!(
            record.remaining_ttl(Utc::now()),
            Some(std::time::Duration::ZERO)
        );
    }

    #[test]
    fn test_unrepresentable_expiry_is_rejected() {
        let record = UrlRecord::new(
            "abc".to_string(),
            "https://example.com".to_string(),
            Utc::now(),
            1_000_000_000_000_000,
        );

        assert!(record.is_none());
    }

    #[test]
    fn test_click_count_is_not_serialized() {
        let mut record = UrlRecord::new(
            "abc".to_string(),
            "https://example.com".to_string(),
            Utc::now(),
            60,
        )
        .unwrap();
        record.click_count = 9;

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("click_count").is_none());

        let decoded: UrlRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.click_count, 0);
        assert_eq!(decoded.original_url, record.original_url);
    }
}
