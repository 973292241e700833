use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{non_empty, not_blank};

/// Screenshot hosted on the image CDN. The URL and the CDN id only ever
/// exist together on a project.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScreenshotAsset {
    #[serde(rename = "screenshotUrl")]
    pub url: String,
    #[serde(rename = "screenshotCloudinaryId")]
    pub public_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub year: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(flatten)]
    pub screenshot: Option<ScreenshotAsset>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub results: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn from_input(input: ProjectInput, now: DateTime<Utc>) -> Self {
        let input = input.normalized();
        Self {
            id: String::new(),
            title: input.title,
            year: input.year,
            category: input.category,
            tags: input.tags,
            live_url: input.live_url,
            screenshot: None,
            tech_stack: input.tech_stack,
            overview: input.overview,
            challenge: input.challenge,
            process: input.process,
            key_features: input.key_features,
            implementation: input.implementation,
            results: input.results,
            metrics: input.metrics,
            is_published: input.is_published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full replace of the form fields. Identity, creation time and the
    /// screenshot pair are carried over from `self`.
    pub fn replaced_with(&self, input: ProjectInput, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            screenshot: self.screenshot.clone(),
            created_at: self.created_at,
            ..Self::from_input(input, now)
        }
    }

    pub fn live_url(&self) -> Option<&str> {
        self.live_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    pub fn screenshot_public_id(&self) -> Option<&str> {
        self.screenshot.as_ref().map(|asset| asset.public_id.as_str())
    }
}

/// Complete admin form state for a project. Absent fields take their
/// defaults, so an update must resend every field.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInput {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub year: String,
    #[validate(custom(function = "not_blank"))]
    pub category: String,
    pub tags: Vec<String>,
    pub live_url: Option<String>,
    pub tech_stack: Vec<String>,
    pub overview: String,
    pub challenge: String,
    pub process: String,
    pub key_features: Vec<String>,
    pub implementation: String,
    pub results: String,
    pub metrics: Vec<String>,
    pub is_published: bool,
}

impl Default for ProjectInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            year: String::new(),
            category: String::new(),
            tags: Vec::new(),
            live_url: None,
            tech_stack: Vec::new(),
            overview: String::new(),
            challenge: String::new(),
            process: String::new(),
            key_features: Vec::new(),
            implementation: String::new(),
            results: String::new(),
            metrics: Vec::new(),
            is_published: true,
        }
    }
}

impl ProjectInput {
    fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.year = self.year.trim().to_string();
        self.category = self.category.trim().to_string();
        self.live_url = non_empty(self.live_url);
        // tags behave as a set: trimmed, blank entries dropped, first occurrence wins
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.into_iter().map(|t| t.trim().to_string()) {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.tags = tags;
        self
    }
}
