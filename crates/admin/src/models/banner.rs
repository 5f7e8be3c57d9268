//! Promotional banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use keystall_core::{BannerId, ValidationErrors};

const MAX_TITLE_LENGTH: usize = 120;
const MAX_SUBTITLE_LENGTH: usize = 240;
const MAX_STYLE_LENGTH: usize = 200;

/// A banner with its schedule.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub gradient: String,
    pub icon: String,
    pub link_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update body for a banner.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub gradient: String,
    pub icon: String,
    pub link_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// `PUT /api/banners/order` body: banner IDs in display order.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerOrder {
    pub ids: Vec<BannerId>,
}

impl BannerInput {
    /// Check and normalize the form.
    ///
    /// Links must be absolute `http(s)` URLs or site-relative paths.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.title = self.title.trim().to_owned();
        self.gradient = self.gradient.trim().to_owned();
        self.icon = self.icon.trim().to_owned();
        self.subtitle = self
            .subtitle
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self.link_url = self
            .link_url
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        errors.require("title", &self.title);
        errors.max_len("title", &self.title, MAX_TITLE_LENGTH);
        if let Some(subtitle) = &self.subtitle {
            errors.max_len("subtitle", subtitle, MAX_SUBTITLE_LENGTH);
        }
        errors.require("gradient", &self.gradient);
        errors.max_len("gradient", &self.gradient, MAX_STYLE_LENGTH);
        errors.require("icon", &self.icon);
        errors.max_len("icon", &self.icon, MAX_STYLE_LENGTH);

        if let Some(link) = &self.link_url
            && !is_valid_link(link)
        {
            errors.push("link_url", "must be an http(s) URL or a path starting with /");
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends <= starts
        {
            errors.push("ends_at", "must be after the start");
        }

        errors.into_result()?;
        Ok(self)
    }
}

fn is_valid_link(link: &str) -> bool {
    if link.starts_with('/') {
        return !link.starts_with("//");
    }
    Url::parse(link).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn input() -> BannerInput {
        BannerInput {
            title: " Weekend sale ".to_owned(),
            subtitle: Some(String::new()),
            gradient: "from-pink-500 to-orange-400".to_owned(),
            icon: "sparkles".to_owned(),
            link_url: Some("/products/streamflix-premium".to_owned()),
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_banner_normalizes() {
        let banner = input().validate().unwrap();
        assert_eq!(banner.title, "Weekend sale");
        assert_eq!(banner.subtitle, None);
    }

    #[test]
    fn test_link_rules() {
        assert!(is_valid_link("/products/x"));
        assert!(is_valid_link("https://keystall.example/deals"));
        assert!(!is_valid_link("//evil.example"));
        assert!(!is_valid_link("javascript:alert(1)"));
        assert!(!is_valid_link("deals"));
    }

    #[test]
    fn test_date_range() {
        let now = Utc::now();
        let mut banner = input();
        banner.starts_at = Some(now);
        banner.ends_at = Some(now - Duration::hours(1));
        let errors = banner.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["ends_at"]);
    }
}
