/// Descriptive statistics shown next to a chart.
use serde::Serialize;

use super::AuthorSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: values.len(),
            total: round2(total),
            average: round2(total / values.len() as f64),
            min: round2(min),
            max: round2(max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorStats {
    pub author: String,
    #[serde(flatten)]
    pub stats: SeriesStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub total_points: usize,
    pub overall: SeriesStats,
    pub by_author: Vec<AuthorStats>,
}

impl ChartSummary {
    pub fn from_series(series: &[AuthorSeries]) -> Option<Self> {
        let all: Vec<f64> = series.iter().flat_map(|s| s.values()).collect();
        let overall = SeriesStats::from_values(&all)?;

        let by_author = series
            .iter()
            .filter_map(|s| {
                SeriesStats::from_values(&s.values()).map(|stats| AuthorStats {
                    author: s.author.clone(),
                    stats,
                })
            })
            .collect();

        Some(Self {
            total_points: all.len(),
            overall,
            by_author,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
