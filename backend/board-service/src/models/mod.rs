/// Data models for board-service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

pub mod command;

pub use command::{AuthorSelection, ChartKind, Operation, ParsedCommand, PostFields};

/// A stored board entry. Only `numeric_value` feeds charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub content: Option<String>,
    pub numeric_value: Option<f64>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 50))]
    pub author: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

impl NewPost {
    pub fn new(author: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Trim text fields, drop blank optionals and validate lengths.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.author = self.author.trim().to_string();
        self.title = self.title.trim().to_string();
        self.content = blank_to_none(self.content);
        self.category = blank_to_none(self.category);
        check_finite(self.numeric_value)?;
        self.validate().map_err(|e| describe_validation(&e))?;
        Ok(self)
    }
}

/// Partial replacement of a post. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PostPatch {
    #[serde(default)]
    #[validate(length(min = 1, max = 50))]
    pub author: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.numeric_value.is_none()
            && self.category.is_none()
    }

    pub fn normalized(mut self) -> Result<Self, String> {
        self.author = self.author.map(|a| a.trim().to_string());
        self.title = self.title.map(|t| t.trim().to_string());
        self.content = blank_to_none(self.content);
        self.category = blank_to_none(self.category);
        check_finite(self.numeric_value)?;
        self.validate().map_err(|e| describe_validation(&e))?;
        Ok(self)
    }

    /// Apply the patch onto an existing post in place.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(author) = &self.author {
            post.author = author.clone();
        }
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = Some(content.clone());
        }
        if let Some(value) = self.numeric_value {
            post.numeric_value = Some(value);
        }
        if let Some(category) = &self.category {
            post.category = Some(category.clone());
        }
    }
}

/// Which posts a delete removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Id(i64),
    Author(String),
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_finite(value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() => Err("numeric_value must be a finite number".to_string()),
        _ => Ok(()),
    }
}

/// Render validator output as "invalid author, title".
pub fn describe_validation(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();
    format!("invalid {}", fields.join(", "))
}
