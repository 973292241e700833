use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

pub const DEFAULT_GRADIENT: &str = "from-blue-500 to-cyan-500";
pub const DEFAULT_BG_COLOR: &str = "bg-blue-500/10";
pub const DEFAULT_TEXT_COLOR: &str = "text-blue-400";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub id: String,
    pub company: String,
    pub role: String,
    pub period: String,
    pub gradient: String,
    pub bg_color: String,
    pub text_color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_achievements: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experience {
    pub fn from_input(input: ExperienceInput, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            company: input.company.trim().to_string(),
            role: input.role.trim().to_string(),
            period: input.period.trim().to_string(),
            gradient: input.gradient,
            bg_color: input.bg_color,
            text_color: input.text_color,
            description: input.description,
            key_achievements: input.key_achievements,
            technologies: input.technologies,
            order_index: input.order_index,
            is_published: input.is_published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn replaced_with(&self, input: ExperienceInput, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            created_at: self.created_at,
            ..Self::from_input(input, now)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceInput {
    #[validate(custom(function = "not_blank"))]
    pub company: String,
    #[validate(custom(function = "not_blank"))]
    pub role: String,
    #[validate(custom(function = "not_blank"))]
    pub period: String,
    pub gradient: String,
    pub bg_color: String,
    pub text_color: String,
    pub description: String,
    pub key_achievements: Vec<String>,
    pub technologies: Vec<String>,
    pub order_index: i64,
    pub is_published: bool,
}

impl Default for ExperienceInput {
    fn default() -> Self {
        Self {
            company: String::new(),
            role: String::new(),
            period: String::new(),
            gradient: DEFAULT_GRADIENT.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            description: String::new(),
            key_achievements: Vec::new(),
            technologies: Vec::new(),
            order_index: 0,
            is_published: true,
        }
    }
}
