//! Stock keys: pre-loaded license keys handed out on approval.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystall_core::credentials::{MAX_FIELD_LENGTH, MAX_NOTE_LENGTH};
use keystall_core::{OrderId, ProductId, StockKeyId, StockKeyStatus, ValidationErrors, VariantId};

/// Largest batch accepted by one import.
pub const MAX_IMPORT_BATCH: usize = 1000;

/// Visible trailing characters of a masked secret.
const SECRET_HINT_CHARS: usize = 4;

/// A stock key as listed to admins. The secret itself is never listed.
#[derive(Debug, Clone, Serialize)]
pub struct StockKey {
    pub id: StockKeyId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    /// Last characters of the secret, e.g. `****7QXZ`.
    pub secret_hint: String,
    pub note: Option<String>,
    pub status: StockKeyStatus,
    pub order_id: Option<OrderId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Mask all but the last few characters of a secret.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= SECRET_HINT_CHARS {
        return "*".repeat(count.max(SECRET_HINT_CHARS));
    }
    let tail: String = secret.chars().skip(count - SECRET_HINT_CHARS).collect();
    format!("****{tail}")
}

/// `POST /api/products/{id}/stock-keys` body.
#[derive(Debug, Clone, Deserialize)]
pub struct StockKeyImport {
    /// Restrict the keys to one variant; `None` serves any variant.
    pub variant_id: Option<VariantId>,
    /// One key per line.
    pub keys: String,
    pub note: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A validated import batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch {
    pub variant_id: Option<VariantId>,
    pub secrets: Vec<String>,
    pub note: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Lines dropped because they repeat an earlier line of the batch.
    pub repeated: usize,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportResult {
    pub inserted: u64,
    /// Keys skipped because they repeat each other or already exist.
    pub skipped: u64,
}

impl StockKeyImport {
    /// Split the pasted text into unique, trimmed secrets.
    ///
    /// # Errors
    ///
    /// Returns validation errors for an empty or oversized batch, overlong
    /// keys, or an expiry in the past.
    pub fn into_batch(self, now: DateTime<Utc>) -> Result<ImportBatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        let mut secrets = Vec::new();
        let mut repeated = 0;

        for line in self.keys.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.chars().count() > MAX_FIELD_LENGTH {
                errors.push(
                    "keys",
                    format!("keys must be at most {MAX_FIELD_LENGTH} characters"),
                );
                break;
            }
            if seen.insert(line) {
                secrets.push(line.to_owned());
            } else {
                repeated += 1;
            }
        }

        if secrets.is_empty() && errors.is_empty() {
            errors.push("keys", "paste at least one key");
        }
        if secrets.len() > MAX_IMPORT_BATCH {
            errors.push("keys", format!("at most {MAX_IMPORT_BATCH} keys per import"));
        }

        let note = self
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        if let Some(note) = &note {
            errors.max_len("note", note, MAX_NOTE_LENGTH);
        }
        if self.expires_at.is_some_and(|at| at <= now) {
            errors.push("expires_at", "must be in the future");
        }

        errors.into_result()?;
        Ok(ImportBatch {
            variant_id: self.variant_id,
            secrets,
            note,
            expires_at: self.expires_at,
            repeated,
        })
    }
}

/// Available key counts for one product or variant.
#[derive(Debug, Clone, Serialize)]
pub struct StockCountRow {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub available: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn import(keys: &str) -> StockKeyImport {
        StockKeyImport {
            variant_id: None,
            keys: keys.to_owned(),
            note: Some("  batch 12 ".to_owned()),
            expires_at: None,
        }
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("AAAA-BBBB-7QXZ"), "****7QXZ");
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn test_batch_trims_and_dedupes() {
        let batch = import("KEY-1\n  KEY-2  \n\nKEY-1\r\nKEY-3")
            .into_batch(Utc::now())
            .unwrap();
        assert_eq!(batch.secrets, vec!["KEY-1", "KEY-2", "KEY-3"]);
        assert_eq!(batch.repeated, 1);
        assert_eq!(batch.note.as_deref(), Some("batch 12"));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let errors = import(" \n \n").into_batch(Utc::now()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["keys"]);
    }

    #[test]
    fn test_past_expiry_rejected() {
        let now = Utc::now();
        let mut past = import("KEY-1");
        past.expires_at = Some(now - Duration::minutes(1));
        let errors = past.into_batch(now).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["expires_at"]);
    }
}
