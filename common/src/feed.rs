//! Station feed records and their normalization into weather metrics.
//!
//! The provider delivers up to six generic fields per record. [`normalize`]
//! keeps the records of one calendar day, takes the last one as the current
//! snapshot and builds one ordered series per metric.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Humidity,
    WindSpeed,
    Rainfall,
    Pressure,
    UvIndex,
}

impl Metric {
    /// Display order of the dashboard.
    pub const ALL: [Metric; 6] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::WindSpeed,
        Metric::Rainfall,
        Metric::Pressure,
        Metric::UvIndex,
    ];

    /// Number of the provider field carrying this metric (`field1`..`field6`).
    pub fn field(self) -> u8 {
        match self {
            Metric::Temperature => 1,
            Metric::Humidity => 2,
            Metric::Pressure => 3,
            Metric::WindSpeed => 4,
            Metric::Rainfall => 5,
            Metric::UvIndex => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::WindSpeed => "Wind Speed",
            Metric::Rainfall => "Rainfall",
            Metric::Pressure => "Pressure",
            Metric::UvIndex => "UV Index",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::WindSpeed => "km/h",
            Metric::Rainfall => "mm",
            Metric::Pressure => "hPa",
            Metric::UvIndex => "",
        }
    }
}

/// A loosely typed number: the provider sends numeric strings, some clients
/// send plain JSON numbers. Any other JSON value is kept as `Other` so that
/// one odd field never fails the whole feed.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
    #[serde(deserialize_with = "ignore_value")]
    Other,
}

fn ignore_value<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<(), D::Error> {
    <serde::de::IgnoredAny as serde::Deserialize>::deserialize(deserializer).map(|_| ())
}

impl LooseNumber {
    /// Base-10 value, `None` for empty, non-numeric or non-finite input.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(v) => *v,
            LooseNumber::Text(s) => s.trim().parse::<f64>().ok()?,
            LooseNumber::Other => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for LooseNumber {
    fn from(v: f64) -> Self {
        LooseNumber::Number(v)
    }
}

impl From<&str> for LooseNumber {
    fn from(s: &str) -> Self {
        LooseNumber::Text(s.to_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RawFeedRecord {
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<LooseNumber>,
    #[serde(default)]
    pub field2: Option<LooseNumber>,
    #[serde(default)]
    pub field3: Option<LooseNumber>,
    #[serde(default)]
    pub field4: Option<LooseNumber>,
    #[serde(default)]
    pub field5: Option<LooseNumber>,
    #[serde(default)]
    pub field6: Option<LooseNumber>,
}

impl RawFeedRecord {
    pub fn field(&self, metric: Metric) -> Option<&LooseNumber> {
        match metric.field() {
            1 => self.field1.as_ref(),
            2 => self.field2.as_ref(),
            3 => self.field3.as_ref(),
            4 => self.field4.as_ref(),
            5 => self.field5.as_ref(),
            _ => self.field6.as_ref(),
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.field(metric).and_then(LooseNumber::as_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `GET /channels/{id}/feeds.json`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub channel: Option<ChannelInfo>,
    #[serde(default)]
    pub feeds: Vec<RawFeedRecord>,
}

/// One record remapped to named metrics, `None` marks a missing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rainfall: Option<f64>,
    pub pressure: Option<f64>,
    pub uv_index: Option<f64>,
}

impl NormalizedReading {
    pub fn from_record(record: &RawFeedRecord) -> Self {
        Self {
            temperature: record.value(Metric::Temperature),
            humidity: record.value(Metric::Humidity),
            wind_speed: record.value(Metric::WindSpeed),
            rainfall: record.value(Metric::Rainfall),
            pressure: record.value(Metric::Pressure),
            uv_index: record.value(Metric::UvIndex),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::WindSpeed => self.wind_speed,
            Metric::Rainfall => self.rainfall,
            Metric::Pressure => self.pressure,
            Metric::UvIndex => self.uv_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SeriesPoint {
    /// Provider timestamp, untouched.
    pub timestamp: String,
    /// `HH:MM:SS` label for the chart axis.
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Series {
    pub metric: Metric,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn empty(metric: Metric) -> Self {
        Self {
            metric,
            points: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub type Dataset = BTreeMap<Metric, Series>;

/// A dataset holding an empty series for every metric.
pub fn empty_dataset() -> Dataset {
    Metric::ALL
        .iter()
        .map(|m| (*m, Series::empty(*m)))
        .collect()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid date `{0}`, expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

/// Calendar day used to select feed records by timestamp prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter(NaiveDate);

impl DateFilter {
    pub fn parse(date: &str) -> Result<Self, InvalidDate> {
        let date = date.trim();
        if date.len() != 10 {
            return Err(InvalidDate(date.to_owned()));
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| InvalidDate(date.to_owned()))
    }

    pub fn day(&self) -> NaiveDate {
        self.0
    }

    pub fn matches(&self, record: &RawFeedRecord) -> bool {
        record.created_at.starts_with(&self.to_string())
    }
}

impl From<NaiveDate> for DateFilter {
    fn from(day: NaiveDate) -> Self {
        Self(day)
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Normalized view of one day of a station feed.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub date: String,
    pub record_count: usize,
    pub latest_timestamp: Option<String>,
    pub snapshot: NormalizedReading,
    pub series: Dataset,
}

impl FeedReport {
    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.series.get(&metric)
    }
}

fn display_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(ts) => ts.format("%H:%M:%S").to_string(),
        Err(_) => timestamp
            .split_once('T')
            .map(|(_, time)| time.trim_end_matches('Z').to_owned())
            .unwrap_or_else(|| timestamp.to_owned()),
    }
}

/// Keeps the records of `date` and reshapes them into a snapshot and one
/// series per metric. Provider order is assumed chronological and kept.
pub fn normalize(records: &[RawFeedRecord], date: &DateFilter) -> FeedReport {
    let day: Vec<&RawFeedRecord> = records.iter().filter(|r| date.matches(r)).collect();

    let mut series = empty_dataset();
    for record in &day {
        let time = display_time(&record.created_at);
        for metric in Metric::ALL {
            if let Some(value) = record.value(metric) {
                series
                    .entry(metric)
                    .or_insert_with(|| Series::empty(metric))
                    .points
                    .push(SeriesPoint {
                        timestamp: record.created_at.clone(),
                        time: time.clone(),
                        value,
                    });
            }
        }
    }

    let latest = day.last();
    FeedReport {
        date: date.to_string(),
        record_count: day.len(),
        latest_timestamp: latest.map(|r| r.created_at.clone()),
        snapshot: latest
            .map(|r| NormalizedReading::from_record(r))
            .unwrap_or_default(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(created_at: &str, fields: [Option<&str>; 6]) -> RawFeedRecord {
        let f = |i: usize| fields[i].map(LooseNumber::from);
        RawFeedRecord {
            created_at: created_at.to_owned(),
            entry_id: None,
            field1: f(0),
            field2: f(1),
            field3: f(2),
            field4: f(3),
            field5: f(4),
            field6: f(5),
        }
    }

    fn full(created_at: &str) -> RawFeedRecord {
        record(
            created_at,
            [
                Some("21.5"),
                Some("60"),
                Some("1013.2"),
                Some("4.1"),
                Some("0"),
                Some("3"),
            ],
        )
    }

    fn date(s: &str) -> DateFilter {
        DateFilter::parse(s).unwrap()
    }

    #[test]
    fn date_filter_is_exact_prefix_match() {
        let records = vec![full("2024-03-01T10:00:00Z")];

        let report = normalize(&records, &date("2024-03-01"));
        assert_eq!(report.record_count, 1);

        let report = normalize(&records, &date("2024-03-02"));
        assert_eq!(report.record_count, 0);
    }

    #[test]
    fn empty_partition_yields_empty_state() {
        let records = vec![full("2024-03-01T10:00:00Z")];
        let report = normalize(&records, &date("2024-02-29"));

        assert!(report.snapshot.is_empty());
        assert_eq!(report.latest_timestamp, None);
        assert_eq!(report.series.len(), Metric::ALL.len());
        for metric in Metric::ALL {
            assert!(report.series(metric).unwrap().is_empty());
        }

        let report = normalize(&[], &date("2024-02-29"));
        assert_eq!(report.series.len(), Metric::ALL.len());
    }

    #[test]
    fn snapshot_is_last_record_of_the_day() {
        let mut late = full("2024-03-01T23:00:00Z");
        late.field1 = Some("18.0".into());
        let records = vec![
            full("2024-03-01T10:00:00Z"),
            late,
            full("2024-03-02T00:10:00Z"),
        ];

        let report = normalize(&records, &date("2024-03-01"));
        assert_eq!(report.snapshot.temperature, Some(18.0));
        assert_eq!(report.snapshot.pressure, Some(1013.2));
        assert_eq!(
            report.latest_timestamp.as_deref(),
            Some("2024-03-01T23:00:00Z")
        );
    }

    #[test]
    fn missing_field_only_affects_its_metric() {
        let mut gap = full("2024-03-01T11:00:00Z");
        gap.field3 = None;
        let records = vec![full("2024-03-01T10:00:00Z"), gap];

        let report = normalize(&records, &date("2024-03-01"));
        assert_eq!(report.series(Metric::Pressure).unwrap().points.len(), 1);
        for metric in Metric::ALL.iter().filter(|m| **m != Metric::Pressure) {
            assert_eq!(report.series(*metric).unwrap().points.len(), 2);
        }
    }

    #[test]
    fn unparseable_values_are_absent() {
        let records = vec![record(
            "2024-03-01T10:00:00Z",
            [Some("abc"), Some(""), Some("NaN"), Some(" 7.5 "), None, Some("-")],
        )];

        let report = normalize(&records, &date("2024-03-01"));
        assert_eq!(report.snapshot.temperature, None);
        assert_eq!(report.snapshot.humidity, None);
        assert_eq!(report.snapshot.pressure, None);
        assert_eq!(report.snapshot.wind_speed, Some(7.5));
        assert_eq!(report.snapshot.uv_index, None);
        assert_eq!(report.series(Metric::WindSpeed).unwrap().points.len(), 1);
        assert!(report.series(Metric::Temperature).unwrap().is_empty());
    }

    #[test]
    fn field_mapping() {
        let records = vec![record(
            "2024-03-01T10:00:00Z",
            [Some("1"), Some("2"), Some("3"), Some("4"), Some("5"), Some("6")],
        )];
        let snapshot = normalize(&records, &date("2024-03-01")).snapshot;

        assert_eq!(snapshot.temperature, Some(1.0));
        assert_eq!(snapshot.humidity, Some(2.0));
        assert_eq!(snapshot.pressure, Some(3.0));
        assert_eq!(snapshot.wind_speed, Some(4.0));
        assert_eq!(snapshot.rainfall, Some(5.0));
        assert_eq!(snapshot.uv_index, Some(6.0));
    }

    #[test]
    fn series_keep_provider_order() {
        let records = vec![
            full("2024-03-01T12:00:00Z"),
            full("2024-03-01T09:30:15Z"),
        ];
        let report = normalize(&records, &date("2024-03-01"));
        let times: Vec<_> = report
            .series(Metric::Humidity)
            .unwrap()
            .points
            .iter()
            .map(|p| p.time.as_str())
            .collect();
        assert_eq!(times, ["12:00:00", "09:30:15"]);
    }

    #[test]
    fn feed_response_accepts_loose_fields() {
        let body = r#"{
            "channel": {"id": 2929062, "name": "Roof"},
            "feeds": [
                {"created_at": "2024-03-01T10:00:00Z", "entry_id": 1,
                 "field1": "20.1", "field2": 55, "field3": null}
            ]
        }"#;
        let resp: FeedResponse = serde_json::from_str(body).unwrap();
        let rec = &resp.feeds[0];

        assert_eq!(rec.value(Metric::Temperature), Some(20.1));
        assert_eq!(rec.value(Metric::Humidity), Some(55.0));
        assert_eq!(rec.value(Metric::Pressure), None);
        assert_eq!(rec.value(Metric::UvIndex), None);
    }

    #[test]
    fn odd_field_types_only_blank_their_metric() {
        let body = r#"{"feeds": [
            {"created_at": "2024-03-01T10:00:00Z", "field1": "20.1", "field2": true,
             "field3": {"hPa": 1012}, "field4": [3.5]}
        ]}"#;
        let resp: FeedResponse = serde_json::from_str(body).unwrap();
        let rec = &resp.feeds[0];

        assert_eq!(rec.field2, Some(LooseNumber::Other));
        assert_eq!(rec.value(Metric::Temperature), Some(20.1));
        assert_eq!(rec.value(Metric::Humidity), None);
        assert_eq!(rec.value(Metric::Pressure), None);
        assert_eq!(rec.value(Metric::WindSpeed), None);

        let report = normalize(&resp.feeds, &date("2024-03-01"));
        assert_eq!(report.record_count, 1);
        assert_eq!(report.series(Metric::Temperature).unwrap().points.len(), 1);
        assert!(report.series(Metric::Humidity).unwrap().is_empty());
    }

    #[test]
    fn date_filter_rejects_malformed_dates() {
        assert!(DateFilter::parse("2024-3-1").is_err());
        assert!(DateFilter::parse("2024-02-30").is_err());
        assert!(DateFilter::parse("yesterday").is_err());
        assert_eq!(date("2024-02-29").to_string(), "2024-02-29");
    }

    #[test]
    fn report_serializes_metric_keys() {
        let report = normalize(&[full("2024-03-01T10:00:00Z")], &date("2024-03-01"));
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["series"]["windSpeed"]["points"].is_array());
        assert_eq!(json["snapshot"]["uvIndex"], 3.0);
        assert_eq!(json["recordCount"], 1);
    }
}
