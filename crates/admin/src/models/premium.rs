//! Premium memberships, product rules and members-only content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystall_core::{
    Email, MembershipId, PremiumAccess, PremiumContentId, PremiumRule, ProductId, ProfileId,
    ValidationErrors,
};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_BODY_LENGTH: usize = 50_000;

/// A membership with the member's email.
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub id: MembershipId,
    pub profile_id: ProfileId,
    pub email: Email,
    pub starts_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub granted_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
}

/// `POST /api/premium/memberships` body.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantMembershipInput {
    pub email: String,
    /// `None` grants a membership that never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl GrantMembershipInput {
    /// Parse the email and check the expiry.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a bad email or a past expiry.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.check("email", Email::parse(&self.email));
        if self.expires_at.is_some_and(|at| at <= now) {
            errors.push("expires_at", "must be in the future");
        }
        errors.into_result()?;
        email.ok_or_else(|| ValidationErrors::single("email", "is required"))
    }
}

/// Premium rule attached to a product.
#[derive(Debug, Clone, Serialize)]
pub struct PremiumProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub access: PremiumAccess,
    pub discount_percent: Option<u8>,
    pub updated_at: DateTime<Utc>,
}

/// `PUT /api/premium/products/{product_id}` body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PremiumRuleInput {
    pub access: PremiumAccess,
    pub discount_percent: Option<u8>,
}

impl PremiumRuleInput {
    /// Only discount rules carry a percentage, which must be 1 to 100.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a missing or out-of-range percentage.
    pub fn validate(self) -> Result<PremiumRule, ValidationErrors> {
        let discount_percent = match (self.access, self.discount_percent) {
            (PremiumAccess::Discount, Some(p)) if (1..=100).contains(&p) => Some(p),
            (PremiumAccess::Discount, _) => {
                return Err(ValidationErrors::single(
                    "discount_percent",
                    "must be between 1 and 100",
                ));
            }
            _ => None,
        };
        Ok(PremiumRule {
            access: self.access,
            discount_percent,
        })
    }
}

/// Members-only content, drafts included.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PremiumContent {
    pub id: PremiumContentId,
    pub title: String,
    pub body: String,
    pub product_id: Option<ProductId>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update body for premium content.
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumContentInput {
    pub title: String,
    pub body: String,
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub is_published: bool,
}

impl PremiumContentInput {
    /// Check and normalize the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.title = self.title.trim().to_owned();
        errors.require("title", &self.title);
        errors.max_len("title", &self.title, MAX_TITLE_LENGTH);
        errors.require("body", self.body.trim());
        errors.max_len("body", &self.body, MAX_BODY_LENGTH);
        errors.into_result()?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_discount_rule_needs_percent() {
        let missing = PremiumRuleInput {
            access: PremiumAccess::Discount,
            discount_percent: None,
        };
        assert!(missing.validate().is_err());

        let zero = PremiumRuleInput {
            access: PremiumAccess::Discount,
            discount_percent: Some(0),
        };
        assert!(zero.validate().is_err());

        let ok = PremiumRuleInput {
            access: PremiumAccess::Discount,
            discount_percent: Some(15),
        };
        assert_eq!(ok.validate().unwrap().discount_percent, Some(15));
    }

    #[test]
    fn test_non_discount_rules_drop_percent() {
        let rule = PremiumRuleInput {
            access: PremiumAccess::Exclusive,
            discount_percent: Some(30),
        }
        .validate()
        .unwrap();
        assert_eq!(rule.discount_percent, None);
    }

    #[test]
    fn test_grant_membership_validation() {
        let now = Utc::now();
        let input = GrantMembershipInput {
            email: " Member@Example.com ".to_owned(),
            expires_at: Some(now + Duration::days(30)),
        };
        assert_eq!(input.validate(now).unwrap().as_str(), "member@example.com");

        let bad = GrantMembershipInput {
            email: "nope".to_owned(),
            expires_at: Some(now - Duration::days(1)),
        };
        let errors = bad.validate(now).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "expires_at"]
        );
    }

    #[test]
    fn test_content_requires_body() {
        let input = PremiumContentInput {
            title: "Setup guide".to_owned(),
            body: "   ".to_owned(),
            product_id: None,
            is_published: true,
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["body"]);
    }
}
