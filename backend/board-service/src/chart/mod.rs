/// Declarative chart assembly.
///
/// `assemble` turns per-author numeric series into a `ChartSpec` that
/// serialises to a Chart.js configuration object. Nothing here produces code;
/// the rendering surface reads the structure directly.
use serde::{Deserialize, Serialize};

use crate::models::{ChartKind, Post};

pub mod summary;

pub use summary::{AuthorStats, ChartSummary, SeriesStats};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChartError {
    #[error("no numeric data to chart")]
    EmptyDataset,
}

/// Fixed palette as (r, g, b). Series colour is chosen by input position.
const PALETTE: [(u8, u8, u8); 8] = [
    (255, 99, 132),
    (54, 162, 235),
    (255, 205, 86),
    (75, 192, 192),
    (153, 102, 255),
    (255, 159, 64),
    (199, 199, 199),
    (83, 102, 255),
];

fn rgba(index: usize, alpha: f32) -> String {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    format!("rgba({}, {}, {}, {})", r, g, b, alpha)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: Option<String>,
    pub value: f64,
}

impl DataPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }

    pub fn unlabeled(value: f64) -> Self {
        Self { label: None, value }
    }
}

/// One author's numeric values, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSeries {
    pub author: String,
    pub points: Vec<DataPoint>,
}

impl AuthorSeries {
    pub fn new(author: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            author: author.into(),
            points,
        }
    }

    /// Keep only posts carrying a numeric value; titles become labels.
    pub fn from_posts(author: impl Into<String>, posts: &[Post]) -> Self {
        let points = posts
            .iter()
            .filter_map(|post| {
                post.numeric_value
                    .map(|value| DataPoint::new(post.title.clone(), value))
            })
            .collect();
        Self::new(author, points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// A colour for the whole dataset, or one per point (pie slices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: ColorSpec,
    pub border_color: ColorSpec,
    pub border_width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleOptions {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendOptions {
    pub display: bool,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugins {
    pub title: TitleOptions,
    pub legend: LegendOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at_zero: Option<bool>,
    pub title: TitleOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub x: Axis,
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scales: Option<Scales>,
}

/// Chart.js-shaped chart description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartSpec {
    /// Values across every dataset.
    pub fn data_point_count(&self) -> usize {
        self.data.datasets.iter().map(|d| d.data.len()).sum()
    }
}

/// Build a chart for the given series. Empty series are skipped but keep
/// their palette slot, so colours depend only on input position.
pub fn assemble(series: &[AuthorSeries], kind: ChartKind) -> Result<ChartSpec, ChartError> {
    let present: Vec<(usize, &AuthorSeries)> = series
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .collect();

    if present.is_empty() {
        return Err(ChartError::EmptyDataset);
    }

    let multi = present.len() > 1;
    let (labels, datasets) = match (multi, kind.has_axes()) {
        (false, _) => single_series(present[0], kind),
        (true, true) => axis_series(&present, kind),
        (true, false) => author_totals(&present),
    };

    let names: Vec<&str> = present.iter().map(|(_, s)| s.author.as_str()).collect();
    Ok(ChartSpec {
        kind,
        data: ChartData { labels, datasets },
        options: options_for(kind, &names.join(", "), multi),
    })
}

fn fallback_label(index: usize) -> String {
    format!("post {}", index + 1)
}

fn single_series(
    (position, series): (usize, &AuthorSeries),
    kind: ChartKind,
) -> (Vec<String>, Vec<Dataset>) {
    let labels = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            p.label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| fallback_label(i))
        })
        .collect();

    let dataset = if kind.has_axes() {
        axis_dataset(position, &series.author, series.values(), kind)
    } else {
        let count = series.points.len();
        Dataset {
            label: series.author.clone(),
            data: series.values(),
            background_color: ColorSpec::PerPoint((0..count).map(|i| rgba(i, 0.8)).collect()),
            border_color: ColorSpec::PerPoint((0..count).map(|i| rgba(i, 1.0)).collect()),
            border_width: 1,
            fill: None,
            tension: None,
        }
    };

    (labels, vec![dataset])
}

fn axis_series(present: &[(usize, &AuthorSeries)], kind: ChartKind) -> (Vec<String>, Vec<Dataset>) {
    let longest = present
        .iter()
        .map(|(_, s)| s.points.len())
        .max()
        .unwrap_or(0);
    let labels = (0..longest).map(fallback_label).collect();

    let datasets = present
        .iter()
        .map(|(position, s)| axis_dataset(*position, &s.author, s.values(), kind))
        .collect();

    (labels, datasets)
}

fn author_totals(present: &[(usize, &AuthorSeries)]) -> (Vec<String>, Vec<Dataset>) {
    let labels = present.iter().map(|(_, s)| s.author.clone()).collect();
    let totals = present
        .iter()
        .map(|(_, s)| s.points.iter().map(|p| p.value).sum())
        .collect();

    let dataset = Dataset {
        label: "total".to_string(),
        data: totals,
        background_color: ColorSpec::PerPoint(present.iter().map(|(i, _)| rgba(*i, 0.8)).collect()),
        border_color: ColorSpec::PerPoint(present.iter().map(|(i, _)| rgba(*i, 1.0)).collect()),
        border_width: 1,
        fill: None,
        tension: None,
    };
    (labels, vec![dataset])
}

fn axis_dataset(position: usize, author: &str, data: Vec<f64>, kind: ChartKind) -> Dataset {
    match kind {
        ChartKind::Line => Dataset {
            label: author.to_string(),
            data,
            background_color: ColorSpec::Single(rgba(position, 0.2)),
            border_color: ColorSpec::Single(rgba(position, 1.0)),
            border_width: 2,
            fill: Some(false),
            tension: Some(0.1),
        },
        _ => Dataset {
            label: author.to_string(),
            data,
            background_color: ColorSpec::Single(rgba(position, 0.8)),
            border_color: ColorSpec::Single(rgba(position, 1.0)),
            border_width: 1,
            fill: None,
            tension: None,
        },
    }
}

fn axis_title(text: &str) -> TitleOptions {
    TitleOptions {
        display: true,
        text: text.to_string(),
    }
}

fn options_for(kind: ChartKind, authors: &str, multi: bool) -> ChartOptions {
    let scales = kind.has_axes().then(|| Scales {
        x: Axis {
            begin_at_zero: None,
            title: axis_title("post"),
        },
        y: Axis {
            begin_at_zero: Some(true),
            title: axis_title("value"),
        },
    });

    ChartOptions {
        responsive: true,
        plugins: Plugins {
            title: TitleOptions {
                display: true,
                text: format!("{} data", authors),
            },
            legend: LegendOptions {
                display: multi,
                position: "top".to_string(),
            },
        },
        scales,
    }
}
