/// Structured intent produced by the command interpreters.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{NewPost, PostPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    List,
    Chart,
    #[default]
    Unknown,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
            Operation::Chart => "chart",
            Operation::Unknown => "unknown",
        }
    }

    /// Lenient parse used for remote replies; anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "create" | "add" => Operation::Create,
            "update" | "edit" => Operation::Update,
            "delete" | "remove" => Operation::Delete,
            "list" => Operation::List,
            "chart" | "visualize" => Operation::Chart,
            _ => Operation::Unknown,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart kinds understood by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "doughnut", alias = "donut")]
    Donut,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Donut,
    ];

    /// Wire name used by Chart.js.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Donut => "doughnut",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "막대 그래프 (bar)",
            ChartKind::Line => "선 그래프 (line)",
            ChartKind::Pie => "원 그래프 (pie)",
            ChartKind::Donut => "도넛 그래프 (doughnut)",
        }
    }

    /// Bar and line charts are drawn on x/y axes.
    pub fn has_axes(&self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Line)
    }

    /// Map a loose kind name onto a chart kind. Unknown names become `Bar`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "line" | "lines" | "linear" => ChartKind::Line,
            "pie" | "circle" => ChartKind::Pie,
            "donut" | "doughnut" => ChartKind::Donut,
            _ => ChartKind::Bar,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author(s) a command refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "names", rename_all = "lowercase")]
pub enum AuthorSelection {
    #[default]
    None,
    Single(String),
    Many(Vec<String>),
    /// Every author that has numeric data.
    All,
}

impl AuthorSelection {
    /// Collapse a cleaned name list; duplicates must already be removed.
    pub fn from_names(mut names: Vec<String>) -> Self {
        match names.len() {
            0 => AuthorSelection::None,
            1 => AuthorSelection::Single(names.remove(0)),
            _ => AuthorSelection::Many(names),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, AuthorSelection::Many(_) | AuthorSelection::All)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AuthorSelection::None)
    }

    pub fn single(&self) -> Option<&str> {
        match self {
            AuthorSelection::Single(name) => Some(name),
            _ => None,
        }
    }
}

/// Field values carried by create/update commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFields {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl PostFields {
    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.numeric_value.is_none()
            && self.category.is_none()
    }

    pub fn into_patch(self) -> PostPatch {
        PostPatch {
            author: self.author,
            title: self.title,
            content: self.content,
            numeric_value: self.numeric_value,
            category: self.category,
        }
    }

    /// Build a new post, using `fallback_author` when no author field was given.
    pub fn into_new_post(self, fallback_author: Option<&str>) -> Option<NewPost> {
        let author = self.author.or_else(|| fallback_author.map(str::to_string))?;
        Some(NewPost {
            author,
            title: self.title?,
            content: self.content,
            numeric_value: self.numeric_value,
            category: self.category,
        })
    }
}

/// The structured result of interpreting one command string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommand {
    pub operation: Operation,
    pub authors: AuthorSelection,
    pub chart_kind: ChartKind,
    pub post_id: Option<i64>,
    pub fields: PostFields,
    pub valid: bool,
    pub reason: Option<String>,
    pub confidence: f32,
    pub original: String,
}

impl ParsedCommand {
    pub fn new(original: &str, operation: Operation) -> Self {
        Self {
            operation,
            authors: AuthorSelection::None,
            chart_kind: ChartKind::Bar,
            post_id: None,
            fields: PostFields::default(),
            valid: true,
            reason: None,
            confidence: 0.0,
            original: original.to_string(),
        }
    }

    /// An unusable command. The operation is left as `Unknown`.
    pub fn invalid(original: &str, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            ..Self::new(original, Operation::Unknown)
        }
    }

    pub fn is_multi_author(&self) -> bool {
        self.authors.is_multi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chart_kinds_coerce_to_bar() {
        assert_eq!(ChartKind::coerce("scatter"), ChartKind::Bar);
        assert_eq!(ChartKind::coerce(""), ChartKind::Bar);
        assert_eq!(ChartKind::coerce(" Doughnut "), ChartKind::Donut);
        assert_eq!(ChartKind::coerce("donut"), ChartKind::Donut);
        assert_eq!(ChartKind::coerce("LINE"), ChartKind::Line);
        assert_eq!(ChartKind::coerce("circle"), ChartKind::Pie);
    }

    #[test]
    fn donut_uses_chartjs_wire_name() {
        assert_eq!(
            serde_json::to_value(ChartKind::Donut).unwrap(),
            serde_json::json!("doughnut")
        );
        let parsed: ChartKind = serde_json::from_str("\"donut\"").unwrap();
        assert_eq!(parsed, ChartKind::Donut);
    }

    #[test]
    fn selection_from_names() {
        assert_eq!(AuthorSelection::from_names(vec![]), AuthorSelection::None);
        assert_eq!(
            AuthorSelection::from_names(vec!["hong".into()]),
            AuthorSelection::Single("hong".into())
        );
        let many = AuthorSelection::from_names(vec!["hong".into(), "kim".into()]);
        assert!(many.is_multi());
        assert!(AuthorSelection::All.is_multi());
        assert!(!AuthorSelection::Single("hong".into()).is_multi());
    }

    #[test]
    fn invalid_command_leaves_operation_unknown() {
        let cmd = ParsedCommand::invalid("show me a chart", "missing author");
        assert!(!cmd.valid);
        assert_eq!(cmd.operation, Operation::Unknown);
        assert_eq!(cmd.reason.as_deref(), Some("missing author"));
    }

    #[test]
    fn new_post_needs_title_and_some_author() {
        let fields = PostFields {
            title: Some("Q3".into()),
            numeric_value: Some(3.0),
            ..Default::default()
        };
        assert!(fields.clone().into_new_post(None).is_none());
        let post = fields.into_new_post(Some("hong")).unwrap();
        assert_eq!(post.author, "hong");
        assert_eq!(post.numeric_value, Some(3.0));
    }
}
