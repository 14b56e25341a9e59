//! Short URL creation, lookup, statistics and deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::UrlRecord;
use crate::domain::repositories::{KvStore, SetOutcome, clicks_key, record_key};
use crate::error::AppError;
use crate::utils::code_generator::{Alphabet, CodeGenerator, is_well_formed, validate_custom_code};
use crate::utils::url_validator::validate_url;

/// Longest per-request TTL a client may ask for (one year).
pub const MAX_REQUEST_TTL_SECONDS: u64 = 31_536_000;

/// Tunables of the registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub short_code_length: usize,
    pub alphabet: Alphabet,
    /// Default record lifetime; `0` disables expiry.
    pub url_ttl_seconds: u64,
    pub custom_code_min_length: usize,
    pub custom_code_max_length: usize,
    /// Extra candidates tried after the first one collides.
    pub max_collision_retries: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            short_code_length: 7,
            alphabet: Alphabet::Alphanumeric,
            url_ttl_seconds: 2_592_000,
            custom_code_min_length: 4,
            custom_code_max_length: 20,
            max_collision_retries: 5,
        }
    }
}

/// What a stored key turned out to hold.
enum Lookup {
    Live(UrlRecord),
    /// Logically expired; holds the stored bytes as they were read.
    Expired(Vec<u8>),
    Missing,
}

/// Result of trying to bind a code to a URL.
enum Claim {
    Created(UrlRecord),
    /// The code already maps to the same URL.
    Existing(UrlRecord),
    /// The code maps to a different live URL.
    Taken,
    /// The code is held by a logically expired record, or was freed
    /// between the write and the read.
    Stale(Option<Vec<u8>>),
}

/// The single source of truth for short URL records.
///
/// Owns the collision-retry loop and the custom code rules. All state lives
/// in the [`KvStore`]; the registry itself is stateless and can be shared
/// freely between request handlers and service instances.
pub struct UrlRegistry {
    store: Arc<dyn KvStore>,
    generator: CodeGenerator,
    settings: RegistrySettings,
}

impl UrlRegistry {
    /// Creates a new registry on top of `store`.
    pub fn new(store: Arc<dyn KvStore>, settings: RegistrySettings) -> Self {
        let generator = CodeGenerator::new(settings.short_code_length, settings.alphabet);
        Self {
            store,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Creates a short code for `original_url`.
    ///
    /// # Arguments
    ///
    /// - `original_url` - Absolute `http`/`https` URL, stored unchanged
    /// - `custom_code` - Optional code chosen by the client
    /// - `ttl_seconds` - Optional lifetime overriding the configured default
    ///
    /// # Idempotency
    ///
    /// When the requested (or generated) code is already bound to the same
    /// URL, the existing record is returned as is. Its expiry is not
    /// refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidUrl`], [`AppError::InvalidCode`] or
    /// [`AppError::Validation`] before touching the store.
    /// Returns [`AppError::CodeAlreadyExists`] if a custom code is bound to another URL.
    /// Returns [`AppError::CodeSpaceExhausted`] if every generated candidate collided.
    /// Returns [`AppError::StorageUnavailable`] if the store cannot be reached.
    pub async fn shorten(
        &self,
        original_url: String,
        custom_code: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> Result<UrlRecord, AppError> {
        validate_url(&original_url).map_err(|e| {
            AppError::invalid_url("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let ttl_seconds = self.effective_ttl(ttl_seconds)?;

        if let Some(code) = &custom_code {
            validate_custom_code(
                code,
                self.settings.custom_code_min_length,
                self.settings.custom_code_max_length,
            )?;
        }

        let now = Utc::now();

        let record = match custom_code {
            Some(code) => self.shorten_custom(code, original_url, now, ttl_seconds).await?,
            None => self.shorten_generated(original_url, now, ttl_seconds).await?,
        };

        metrics::counter!("urls_created_total").increment(1);
        Ok(record)
    }

    /// Returns the original URL for `short_code` and counts the click.
    ///
    /// The click counter is incremented by the store in a single atomic
    /// operation, so concurrent redirects never lose updates.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or expired.
    pub async fn resolve(&self, short_code: &str) -> Result<String, AppError> {
        let record = self.find_live(short_code).await?;

        let ttl = record.remaining_ttl(Utc::now());
        let counter = self.store.increment(&clicks_key(short_code), ttl).await?;

        debug!("Resolved {} (clicks: {})", short_code, counter.value);
        metrics::counter!("urls_redirected_total").increment(1);

        Ok(record.original_url)
    }

    /// Returns the record for `short_code` with its current click count.
    ///
    /// Read-only: the click counter is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or expired.
    pub async fn stats(&self, short_code: &str) -> Result<UrlRecord, AppError> {
        let record = self.find_live(short_code).await?;
        self.with_clicks(record).await
    }

    /// Removes `short_code` and its click counter. Not reversible.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown, expired or was
    /// deleted concurrently.
    pub async fn delete(&self, short_code: &str) -> Result<(), AppError> {
        self.find_live(short_code).await?;

        let removed = self
            .store
            .delete(&[record_key(short_code), clicks_key(short_code)])
            .await?;

        if removed == 0 {
            return Err(not_found(short_code));
        }

        info!("Deleted short code {}", short_code);
        Ok(())
    }

    fn effective_ttl(&self, requested: Option<u64>) -> Result<u64, AppError> {
        match requested {
            None => Ok(self.settings.url_ttl_seconds),
            Some(ttl) if (1..=MAX_REQUEST_TTL_SECONDS).contains(&ttl) => Ok(ttl),
            Some(ttl) => Err(AppError::bad_request(
                format!("ttl must be between 1 and {} seconds", MAX_REQUEST_TTL_SECONDS),
                json!({ "ttl": ttl }),
            )),
        }
    }

    async fn shorten_custom(
        &self,
        code: String,
        original_url: String,
        now: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Result<UrlRecord, AppError> {
        // A second pass is only needed after purging a logically expired record.
        for _ in 0..2 {
            let record = new_record(&code, &original_url, now, ttl_seconds)?;

            match self.claim(record).await? {
                Claim::Created(record) => {
                    info!("Created custom short code {}", record.short_code);
                    return Ok(record);
                }
                Claim::Existing(record) => {
                    debug!("Custom code {} already maps to this URL", code);
                    return Ok(record);
                }
                Claim::Taken => break,
                Claim::Stale(observed) => self.purge(&code, observed).await?,
            }
        }

        Err(AppError::CodeAlreadyExists { code })
    }

    async fn shorten_generated(
        &self,
        original_url: String,
        now: DateTime<Utc>,
        ttl_seconds: u64,
    ) -> Result<UrlRecord, AppError> {
        let attempts = self.settings.max_collision_retries.saturating_add(1);
        let base_salt = now.timestamp().unsigned_abs();

        for attempt in 0..attempts {
            let code = self
                .generator
                .generate(&original_url, base_salt.wrapping_add(u64::from(attempt)));
            let record = new_record(&code, &original_url, now, ttl_seconds)?;

            match self.claim(record).await? {
                Claim::Created(record) => {
                    info!("Created short code {}", record.short_code);
                    return Ok(record);
                }
                Claim::Existing(record) => {
                    debug!("Generated code {} already maps to this URL", code);
                    return Ok(record);
                }
                Claim::Taken => {
                    warn!("Short code collision on {} (attempt {})", code, attempt + 1);
                }
                Claim::Stale(observed) => {
                    warn!("Short code {} held by an expired record", code);
                    self.purge(&code, observed).await?;
                }
            }
        }

        warn!("Gave up generating a short code after {} attempts", attempts);
        Err(AppError::CodeSpaceExhausted { attempts })
    }

    /// Writes `record` if its code is free, otherwise reports who holds it.
    async fn claim(&self, record: UrlRecord) -> Result<Claim, AppError> {
        let code = record.short_code.clone();
        let value = serde_json::to_vec(&record).map_err(|e| {
            AppError::internal("Failed to encode URL record", json!({ "reason": e.to_string() }))
        })?;
        let ttl = record.remaining_ttl(record.created_at);

        let outcome = self
            .store
            .create_record(&record_key(&code), &value, &clicks_key(&code), ttl)
            .await?;

        if outcome == SetOutcome::Stored {
            return Ok(Claim::Created(record));
        }

        match self.lookup(&code).await? {
            Lookup::Live(existing) if existing.original_url == record.original_url => {
                Ok(Claim::Existing(self.with_clicks(existing).await?))
            }
            Lookup::Live(_) => Ok(Claim::Taken),
            Lookup::Expired(raw) => Ok(Claim::Stale(Some(raw))),
            Lookup::Missing => Ok(Claim::Stale(None)),
        }
    }

    /// Clears the expired record that was `observed` under `code`.
    ///
    /// Nothing is removed if the key no longer holds those exact bytes, so a
    /// record written by a concurrent creator is never dropped.
    async fn purge(&self, code: &str, observed: Option<Vec<u8>>) -> Result<(), AppError> {
        let Some(observed) = observed else {
            return Ok(());
        };

        let key = record_key(code);
        let removed = self
            .store
            .delete_if_value(&key, &observed, &[key.clone(), clicks_key(code)])
            .await?;

        if !removed {
            debug!("Expired record for {} was replaced concurrently", code);
        }
        Ok(())
    }

    async fn lookup(&self, code: &str) -> Result<Lookup, AppError> {
        let Some(raw) = self.store.get(&record_key(code)).await? else {
            return Ok(Lookup::Missing);
        };

        let record: UrlRecord = serde_json::from_slice(&raw).map_err(|e| {
            AppError::internal(
                "Corrupt URL record",
                json!({ "code": code, "reason": e.to_string() }),
            )
        })?;

        if record.is_expired() {
            Ok(Lookup::Expired(raw))
        } else {
            Ok(Lookup::Live(record))
        }
    }

    /// Loads a live record, treating malformed codes as unknown.
    async fn find_live(&self, code: &str) -> Result<UrlRecord, AppError> {
        if !is_well_formed(code) {
            return Err(not_found(code));
        }

        match self.lookup(code).await? {
            Lookup::Live(record) => Ok(record),
            Lookup::Expired(_) | Lookup::Missing => {
                metrics::counter!("urls_not_found_total").increment(1);
                Err(not_found(code))
            }
        }
    }

    /// Joins the click counter into `record`. A missing counter counts as zero.
    async fn with_clicks(&self, mut record: UrlRecord) -> Result<UrlRecord, AppError> {
        record.click_count = match self.store.get(&clicks_key(&record.short_code)).await? {
            None => 0,
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| {
                    AppError::internal(
                        "Corrupt click counter",
                        json!({ "code": record.short_code }),
                    )
                })?,
        };

        Ok(record)
    }
}

fn new_record(
    code: &str,
    original_url: &str,
    now: DateTime<Utc>,
    ttl_seconds: u64,
) -> Result<UrlRecord, AppError> {
    UrlRecord::new(code.to_string(), original_url.to_string(), now, ttl_seconds).ok_or_else(|| {
        AppError::bad_request(
            "ttl puts the expiry out of range",
            json!({ "ttl": ttl_seconds }),
        )
    })
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "short_code": code }))
}
