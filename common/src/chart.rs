use std::{fmt, str::FromStr};

use crate::feed::{Metric, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Line, ChartKind::Bar, ChartKind::Scatter];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Bar",
            ChartKind::Scatter => "Scatter",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown chart type `{0}`")]
pub struct ParseChartKindError(pub String);

impl FromStr for ChartKind {
    type Err = ParseChartKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            _ => Err(ParseChartKindError(s.to_owned())),
        }
    }
}

impl Metric {
    /// Chart and card heading, unit included.
    pub fn label(self) -> String {
        match self.unit() {
            "" => self.name().to_owned(),
            unit => format!("{} ({unit})", self.name()),
        }
    }

    /// Stroke/fill color of the metric's chart.
    pub fn color(self) -> &'static str {
        match self {
            Metric::Temperature => "#ef4444",
            Metric::Humidity => "#3b82f6",
            Metric::WindSpeed => "#10b981",
            Metric::Rainfall => "#6366f1",
            Metric::Pressure => "#f59e0b",
            Metric::UvIndex => "#a855f7",
        }
    }
}

/// Everything a renderer needs to draw one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSeries {
    pub kind: ChartKind,
    pub metric: Metric,
    pub label: String,
    pub color: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    NoData,
    Render(RenderSeries),
}

impl Projection {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Projection::NoData)
    }
}

/// Maps a metric series onto a chart of the requested kind. All kinds share
/// the same (time, value) pairs, an empty series yields [`Projection::NoData`].
pub fn project(series: &Series, kind: ChartKind) -> Projection {
    if series.is_empty() {
        return Projection::NoData;
    }

    let (x, y): (Vec<String>, Vec<f64>) = series
        .points
        .iter()
        .map(|p| (p.time.clone(), p.value))
        .unzip();

    Projection::Render(RenderSeries {
        kind,
        metric: series.metric,
        label: series.metric.label(),
        color: series.metric.color(),
        x,
        y,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub latest: f64,
}

impl SeriesStats {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

pub trait Stats {
    fn stats(&self) -> Option<SeriesStats>;
}

impl Stats for Series {
    fn stats(&self) -> Option<SeriesStats> {
        let latest = self.points.last()?.value;
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for p in &self.points {
            min = min.min(p.value);
            max = max.max(p.value);
        }

        Some(SeriesStats { min, max, latest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SeriesPoint;

    fn series(values: &[(&str, f64)]) -> Series {
        Series {
            metric: Metric::Rainfall,
            points: values
                .iter()
                .map(|(time, value)| SeriesPoint {
                    timestamp: format!("2024-03-01T{time}Z"),
                    time: time.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_series_is_no_data_for_every_kind() {
        let empty = Series::empty(Metric::Humidity);
        for kind in ChartKind::ALL {
            assert!(project(&empty, kind).is_no_data());
        }
    }

    #[test]
    fn kinds_share_the_same_points() {
        let s = series(&[("10:00:00", 0.2), ("11:00:00", 1.4)]);

        for kind in ChartKind::ALL {
            match project(&s, kind) {
                Projection::Render(r) => {
                    assert_eq!(r.kind, kind);
                    assert_eq!(r.x, ["10:00:00", "11:00:00"]);
                    assert_eq!(r.y, [0.2, 1.4]);
                    assert_eq!(r.label, "Rainfall (mm)");
                    assert_eq!(r.color, "#6366f1");
                }
                Projection::NoData => panic!("expected a renderable series"),
            }
        }
    }

    #[test]
    fn parse_chart_kind() {
        assert_eq!("bar".parse::<ChartKind>(), Ok(ChartKind::Bar));
        assert_eq!(" Scatter".parse::<ChartKind>(), Ok(ChartKind::Scatter));
        assert!("pie".parse::<ChartKind>().is_err());
        assert_eq!(ChartKind::default(), ChartKind::Line);
    }

    #[test]
    fn labels() {
        assert_eq!(Metric::Temperature.label(), "Temperature (°C)");
        assert_eq!(Metric::UvIndex.label(), "UV Index");
    }

    #[test]
    fn stats() {
        assert_eq!(Series::empty(Metric::Pressure).stats(), None);

        let s = series(&[("10:00:00", 3.0), ("11:00:00", -1.0), ("12:00:00", 2.0)]);
        let stats = s.stats().unwrap();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.latest, 2.0);
        assert_eq!(stats.range(), 4.0);
    }
}
