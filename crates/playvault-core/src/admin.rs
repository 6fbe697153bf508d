// ABOUTME: The admin configuration object assembled by the store from several tables.
// ABOUTME: Holds site settings with deployment-time defaults plus the admin-owned collections.

use serde::{Deserialize, Serialize};

use crate::source::{Category, ContentSource, LiveSource};
use crate::user::{UserGroup, UserRecord};

/// Remote config subscription: where the config file is pulled from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSubscription {
    pub url: String,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
}

/// Site-wide settings editable from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub site_name: String,
    pub announcement: String,
    /// Upper bound on result pages fetched from each source per search.
    pub search_downstream_max_page: u32,
    /// Seconds API responses may be cached.
    pub site_interface_cache_time: u64,
    pub douban_proxy_type: String,
    pub douban_proxy: String,
    pub douban_image_proxy_type: String,
    pub douban_image_proxy: String,
    pub disable_yellow_filter: bool,
    pub fluid_search: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "PlayVault".to_string(),
            announcement: "This site only aggregates third-party search results. \
                           All content is provided by the respective sources."
                .to_string(),
            search_downstream_max_page: 5,
            site_interface_cache_time: 7200,
            douban_proxy_type: "direct".to_string(),
            douban_proxy: String::new(),
            douban_image_proxy_type: "direct".to_string(),
            douban_image_proxy: String::new(),
            disable_yellow_filter: false,
            fluid_search: true,
        }
    }
}

impl SiteConfig {
    /// Build the default site settings, overridden by deployment environment variables.
    ///
    /// Environment variables:
    /// - SITE_NAME, ANNOUNCEMENT
    /// - SEARCH_MAX_PAGE (default: 5)
    /// - SITE_CACHE_TIME in seconds (default: 7200)
    /// - DOUBAN_PROXY_TYPE, DOUBAN_PROXY, DOUBAN_IMAGE_PROXY_TYPE, DOUBAN_IMAGE_PROXY
    /// - DISABLE_YELLOW_FILTER (default: false), FLUID_SEARCH (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reading values through `lookup`. Unparseable
    /// numbers and booleans fall back to the built-in default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, fallback: bool| {
            match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
                Some("true" | "1" | "yes" | "on") => true,
                Some("false" | "0" | "no" | "off") => false,
                _ => fallback,
            }
        };

        Self {
            site_name: lookup("SITE_NAME").unwrap_or(defaults.site_name),
            announcement: lookup("ANNOUNCEMENT").unwrap_or(defaults.announcement),
            search_downstream_max_page: lookup("SEARCH_MAX_PAGE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.search_downstream_max_page),
            site_interface_cache_time: lookup("SITE_CACHE_TIME")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.site_interface_cache_time),
            douban_proxy_type: lookup("DOUBAN_PROXY_TYPE").unwrap_or(defaults.douban_proxy_type),
            douban_proxy: lookup("DOUBAN_PROXY").unwrap_or(defaults.douban_proxy),
            douban_image_proxy_type: lookup("DOUBAN_IMAGE_PROXY_TYPE")
                .unwrap_or(defaults.douban_image_proxy_type),
            douban_image_proxy: lookup("DOUBAN_IMAGE_PROXY").unwrap_or(defaults.douban_image_proxy),
            disable_yellow_filter: flag("DISABLE_YELLOW_FILTER", defaults.disable_yellow_filter),
            fluid_search: flag("FLUID_SEARCH", defaults.fluid_search),
        }
    }
}

/// The full admin configuration.
///
/// `config_file`, `config_subscription` and `site_config` live in the
/// key-value settings table; the five collections are always read from and
/// written to their own tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    /// Raw config file text as uploaded or fetched. Empty means "not set".
    #[serde(default)]
    pub config_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_subscription: Option<ConfigSubscription>,
    #[serde(default)]
    pub site_config: SiteConfig,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub tags: Vec<UserGroup>,
    #[serde(default)]
    pub sources: Vec<ContentSource>,
    #[serde(default)]
    pub live_sources: Vec<LiveSource>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl AdminConfig {
    /// An empty config carrying the given site settings.
    pub fn with_site(site_config: SiteConfig) -> Self {
        Self {
            site_config,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn from_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SITE_NAME", "My Vault"),
            ("SEARCH_MAX_PAGE", "9"),
            ("FLUID_SEARCH", "false"),
            ("SITE_CACHE_TIME", "not-a-number"),
        ]);

        let site = SiteConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(site.site_name, "My Vault");
        assert_eq!(site.search_downstream_max_page, 9);
        assert!(!site.fluid_search);
        // Unparseable values keep the built-in default
        assert_eq!(site.site_interface_cache_time, 7200);
        assert_eq!(site.douban_proxy_type, "direct");
    }

    #[test]
    fn flags_ignore_case_and_keep_default_when_unrecognized() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DISABLE_YELLOW_FILTER", "TRUE"),
            ("FLUID_SEARCH", "maybe"),
        ]);

        let site = SiteConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert!(site.disable_yellow_filter);
        assert!(site.fluid_search);

        let off = SiteConfig::from_lookup(|k| (k == "FLUID_SEARCH").then(|| " No ".to_string()));
        assert!(!off.fluid_search);
    }

    #[test]
    fn site_config_decodes_partial_documents() {
        let site: SiteConfig = serde_json::from_str(r#"{"siteName":"Old"}"#).unwrap();
        assert_eq!(site.site_name, "Old");
        assert_eq!(site.search_downstream_max_page, 5);
    }
}
