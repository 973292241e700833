use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{non_empty, not_blank};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Inline SVG markup or an image URL.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub certificate_image: String,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    pub fn from_input(input: SkillInput, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            icon: input.icon,
            certificate_image: input.certificate_image.trim().to_string(),
            certificate_url: non_empty(input.certificate_url),
            order: input.order,
            published: input.published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn replaced_with(&self, input: SkillInput, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            created_at: self.created_at,
            ..Self::from_input(input, now)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillInput {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    pub icon: String,
    pub certificate_image: String,
    pub certificate_url: Option<String>,
    pub order: i64,
    pub published: bool,
}

impl Default for SkillInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            icon: String::new(),
            certificate_image: String::new(),
            certificate_url: None,
            order: 0,
            published: true,
        }
    }
}
