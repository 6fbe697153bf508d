// ABOUTME: Admin-owned collections: API content sources, live channel sources and category filters.
// ABOUTME: Each entry records whether it came from the deployment config file or was added by an admin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Provenance of a source or category entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Config,
    Custom,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Config => "config",
            Origin::Custom => "custom",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config" => Ok(Origin::Config),
            "custom" => Ok(Origin::Custom),
            other => Err(CoreError::UnknownOrigin(other.to_string())),
        }
    }
}

/// Kind of listing a category query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Movie,
    Tv,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Movie => "movie",
            CategoryType::Tv => "tv",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(CategoryType::Movie),
            "tv" => Ok(CategoryType::Tv),
            other => Err(CoreError::UnknownCategoryType(other.to_string())),
        }
    }
}

/// A searchable API source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSource {
    pub key: String,
    pub name: String,
    pub api: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub from: Origin,
    #[serde(default)]
    pub disabled: bool,
}

/// A live channel list (M3U) with optional EPG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSource {
    pub key: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epg: Option<String>,
    #[serde(default)]
    pub from: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_number: Option<i64>,
    #[serde(default)]
    pub disabled: bool,
}

/// A custom category shown on the browse page, unique by `(query, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub query: String,
    #[serde(default)]
    pub from: Origin,
    #[serde(default)]
    pub disabled: bool,
}
