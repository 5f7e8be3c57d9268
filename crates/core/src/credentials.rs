//! Account credentials exchanged between customers and the store.
//!
//! Two directions:
//! - [`AccountCredentials`] are supplied by the customer at checkout for
//!   manual-activation products (their existing account to activate on).
//! - [`DeliveredCredentials`] are written by an admin when approving an
//!   order, in the shape the order's [`DeliveryType`] calls for.
//!
//! The admin-side [`CredentialsForm`] is a flat bag of optional fields; it is
//! checked against the delivery type before anything is written.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DeliveryType;
use crate::validation::ValidationErrors;

/// Maximum length of any single credential field.
pub const MAX_FIELD_LENGTH: usize = 512;

/// Maximum length of free-text notes and coupon instructions.
pub const MAX_NOTE_LENGTH: usize = 2000;

/// Errors building credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// One or more fields are missing or invalid.
    #[error("invalid credentials: {0}")]
    Invalid(ValidationErrors),
}

/// The customer's own account, collected for manual activation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    /// Login identifier (email, username or phone) of the customer's account.
    pub identifier: String,
    /// Password of the customer's account.
    pub password: String,
    /// Extra instructions (e.g. 2FA backup code, region).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AccountCredentials {
    /// Validate and normalize customer-supplied account credentials.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Invalid` listing every failing field.
    pub fn new(
        identifier: &str,
        password: &str,
        note: Option<&str>,
    ) -> Result<Self, CredentialsError> {
        let mut errors = ValidationErrors::new();
        let identifier = identifier.trim();
        errors.require("account_identifier", identifier);
        errors.max_len("account_identifier", identifier, MAX_FIELD_LENGTH);
        errors.require("account_password", password);
        errors.max_len("account_password", password, MAX_FIELD_LENGTH);

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        if let Some(note) = note {
            errors.max_len("account_note", note, MAX_NOTE_LENGTH);
        }
        errors.into_result().map_err(CredentialsError::Invalid)?;

        Ok(Self {
            identifier: identifier.to_owned(),
            password: password.to_owned(),
            note: note.map(str::to_owned),
        })
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .field("note", &self.note)
            .finish()
    }
}

/// What the customer receives for a completed order.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveredCredentials {
    /// A login pair for a seller-provided account.
    Login {
        /// Username or email.
        username: String,
        /// Password.
        password: String,
        /// Optional usage notes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// A coupon or license code as free text.
    Coupon {
        /// The code itself.
        code: String,
        /// Optional redemption instructions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    /// Confirmation that the customer's own account was activated.
    Activation {
        /// Status text shown to the customer (e.g. "Activated until 2026-12-31").
        status: String,
    },
    /// A license key, typed by the admin or taken from stock.
    LicenseKey {
        /// The key.
        key: String,
    },
}

impl DeliveredCredentials {
    /// The delivery type this payload belongs to.
    #[must_use]
    pub const fn delivery_type(&self) -> DeliveryType {
        match self {
            Self::Login { .. } => DeliveryType::Credentials,
            Self::Coupon { .. } => DeliveryType::Coupon,
            Self::Activation { .. } => DeliveryType::ManualActivation,
            Self::LicenseKey { .. } => DeliveryType::InstantKey,
        }
    }
}

impl fmt::Debug for DeliveredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the kind; every variant carries a secret
        write!(f, "DeliveredCredentials::{}", self.delivery_type())
    }
}

/// Admin approval form; which fields matter depends on the delivery type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsForm {
    /// Login username (credentials delivery).
    pub username: Option<String>,
    /// Login password (credentials delivery).
    pub password: Option<String>,
    /// Notes for login delivery.
    pub notes: Option<String>,
    /// Coupon or license text (coupon delivery).
    pub code: Option<String>,
    /// Coupon redemption instructions.
    pub instructions: Option<String>,
    /// Activation status text (manual activation).
    pub activation_status: Option<String>,
    /// License key (instant key delivery); empty means "take one from stock".
    pub license_key: Option<String>,
}

/// Outcome of checking a [`CredentialsForm`] against a delivery type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Deliver exactly these credentials.
    Ready(DeliveredCredentials),
    /// Instant-key order with no key typed in: use the stock key assigned
    /// during approval.
    FromStock,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CredentialsForm {
    /// Turn the form into a delivery plan for the given delivery type.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Invalid` when a field the delivery type
    /// needs is missing or too long.
    pub fn plan(&self, delivery_type: DeliveryType) -> Result<DeliveryPlan, CredentialsError> {
        let mut errors = ValidationErrors::new();

        let plan = match delivery_type {
            DeliveryType::Credentials => {
                let username = non_empty(self.username.as_ref()).unwrap_or_default();
                // Passwords keep surrounding whitespace
                let password = self.password.clone().unwrap_or_default();
                let notes = non_empty(self.notes.as_ref());
                errors.require("username", &username);
                errors.max_len("username", &username, MAX_FIELD_LENGTH);
                errors.require("password", &password);
                errors.max_len("password", &password, MAX_FIELD_LENGTH);
                if let Some(notes) = &notes {
                    errors.max_len("notes", notes, MAX_NOTE_LENGTH);
                }
                DeliveryPlan::Ready(DeliveredCredentials::Login {
                    username,
                    password,
                    notes,
                })
            }
            DeliveryType::Coupon => {
                let code = non_empty(self.code.as_ref()).unwrap_or_default();
                let instructions = non_empty(self.instructions.as_ref());
                errors.require("code", &code);
                errors.max_len("code", &code, MAX_NOTE_LENGTH);
                if let Some(instructions) = &instructions {
                    errors.max_len("instructions", instructions, MAX_NOTE_LENGTH);
                }
                DeliveryPlan::Ready(DeliveredCredentials::Coupon { code, instructions })
            }
            DeliveryType::ManualActivation => {
                let status = non_empty(self.activation_status.as_ref()).unwrap_or_default();
                errors.require("activation_status", &status);
                errors.max_len("activation_status", &status, MAX_NOTE_LENGTH);
                DeliveryPlan::Ready(DeliveredCredentials::Activation { status })
            }
            DeliveryType::InstantKey => match non_empty(self.license_key.as_ref()) {
                Some(key) => {
                    errors.max_len("license_key", &key, MAX_FIELD_LENGTH);
                    DeliveryPlan::Ready(DeliveredCredentials::LicenseKey { key })
                }
                None => DeliveryPlan::FromStock,
            },
        };

        errors.into_result().map_err(CredentialsError::Invalid)?;
        Ok(plan)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field_names(err: CredentialsError) -> Vec<String> {
        let CredentialsError::Invalid(errors) = err;
        errors.fields().map(str::to_owned).collect()
    }

    #[test]
    fn test_login_requires_username_and_password() {
        let form = CredentialsForm {
            username: Some("  ".to_owned()),
            ..Default::default()
        };
        let err = form.plan(DeliveryType::Credentials).unwrap_err();
        assert_eq!(field_names(err), vec!["username", "password"]);
    }

    #[test]
    fn test_login_trims_username_keeps_password() {
        let form = CredentialsForm {
            username: Some(" user@stream.tv ".to_owned()),
            password: Some(" p4ss ".to_owned()),
            ..Default::default()
        };
        let plan = form.plan(DeliveryType::Credentials).unwrap();
        assert_eq!(
            plan,
            DeliveryPlan::Ready(DeliveredCredentials::Login {
                username: "user@stream.tv".to_owned(),
                password: " p4ss ".to_owned(),
                notes: None,
            })
        );
    }

    #[test]
    fn test_fields_for_other_types_are_ignored() {
        let form = CredentialsForm {
            code: Some("SAVE-2026".to_owned()),
            username: Some("ignored".to_owned()),
            ..Default::default()
        };
        let plan = form.plan(DeliveryType::Coupon).unwrap();
        assert_eq!(
            plan,
            DeliveryPlan::Ready(DeliveredCredentials::Coupon {
                code: "SAVE-2026".to_owned(),
                instructions: None,
            })
        );
    }

    #[test]
    fn test_activation_requires_status() {
        let err = CredentialsForm::default()
            .plan(DeliveryType::ManualActivation)
            .unwrap_err();
        assert_eq!(field_names(err), vec!["activation_status"]);
    }

    #[test]
    fn test_instant_key_falls_back_to_stock() {
        let plan = CredentialsForm::default()
            .plan(DeliveryType::InstantKey)
            .unwrap();
        assert_eq!(plan, DeliveryPlan::FromStock);

        let typed = CredentialsForm {
            license_key: Some("AAAA-BBBB".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            typed.plan(DeliveryType::InstantKey).unwrap(),
            DeliveryPlan::Ready(DeliveredCredentials::LicenseKey {
                key: "AAAA-BBBB".to_owned()
            })
        );
    }

    #[test]
    fn test_delivered_credentials_json_is_tagged() {
        let creds = DeliveredCredentials::LicenseKey {
            key: "K-1".to_owned(),
        };
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["kind"], "license_key");
        assert_eq!(json["key"], "K-1");
        assert_eq!(creds.delivery_type(), DeliveryType::InstantKey);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let delivered = DeliveredCredentials::Login {
            username: "visible-user".to_owned(),
            password: "hunter2".to_owned(),
            notes: None,
        };
        assert!(!format!("{delivered:?}").contains("hunter2"));

        let account = AccountCredentials::new("me@mail.com", "s3cret!", None).unwrap();
        let debug = format!("{account:?}");
        assert!(debug.contains("me@mail.com"));
        assert!(!debug.contains("s3cret!"));
    }

    #[test]
    fn test_account_credentials_validation() {
        let err = AccountCredentials::new(" ", "", Some("   ")).unwrap_err();
        assert_eq!(
            field_names(err),
            vec!["account_identifier", "account_password"]
        );

        let ok = AccountCredentials::new(" me@mail.com ", "pw", Some("  ")).unwrap();
        assert_eq!(ok.identifier, "me@mail.com");
        assert_eq!(ok.note, None);
    }
}
