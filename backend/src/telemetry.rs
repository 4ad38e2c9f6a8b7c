//! Client for the channel based feed provider and the table of stations it
//! serves. Provider keys never leave the backend.

use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use common::feed::{FeedResponse, RawFeedRecord};
use log::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);
pub const DEFAULT_RESULTS: u32 = 100;
pub const MAX_RESULTS: u32 = 8000;

#[derive(Clone, PartialEq, Eq)]
pub struct Station {
    pub channel_id: String,
    pub api_key: Option<String>,
}

impl Station {
    pub fn new(channel_id: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            channel_id: channel_id.into(),
            api_key: api_key.map(str::to_owned),
        }
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("channel_id", &self.channel_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StationParseError {
    #[error("station entry `{0}` is not of the form location=channel[:key]")]
    Malformed(String),
    #[error("station `{0}` is listed twice")]
    Duplicate(String),
}

/// Location selector to station mapping.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    stations: BTreeMap<String, Station>,
}

impl StationTable {
    pub fn insert(&mut self, location: impl Into<String>, station: Station) -> Option<Station> {
        self.stations.insert(location.into(), station)
    }

    pub fn get(&self, location: &str) -> Option<&Station> {
        self.stations.get(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl FromStr for StationTable {
    type Err = StationParseError;

    /// Parses `location1=2929062:KEY,location2=3013318`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = StationTable::default();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let malformed = || StationParseError::Malformed(entry.to_owned());
            let (location, channel) = entry.split_once('=').ok_or_else(malformed)?;
            let (channel, key) = match channel.split_once(':') {
                Some((channel, key)) => (channel.trim(), Some(key.trim()).filter(|k| !k.is_empty())),
                None => (channel.trim(), None),
            };
            let location = location.trim();
            if location.is_empty() || channel.is_empty() {
                return Err(malformed());
            }
            if table.insert(location, Station::new(channel, key)).is_some() {
                return Err(StationParseError::Duplicate(location.to_owned()));
            }
        }

        Ok(table)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("provider rejected the request with status {status}")]
    Rejected { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unreadable provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct TelemetryClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl TelemetryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Network(e.without_url()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    fn feeds_url(&self, station: &Station) -> String {
        format!("{}/channels/{}/feeds.json", self.base_url, station.channel_id)
    }

    // the request url carries the api key, it is dropped before the error is kept
    fn classify(&self, e: reqwest::Error) -> TelemetryError {
        if e.is_timeout() {
            TelemetryError::Timeout(self.timeout)
        } else {
            TelemetryError::Network(e.without_url())
        }
    }

    /// Fetches the newest `results` records of a station, unmodified. Never
    /// retries.
    pub async fn fetch_feeds(
        &self,
        station: &Station,
        results: u32,
    ) -> Result<Vec<RawFeedRecord>, TelemetryError> {
        let mut query = vec![("results", results.to_string())];
        if let Some(key) = &station.api_key {
            query.push(("api_key", key.clone()));
        }

        debug!("fetching {results} records of channel {}", station.channel_id);
        let response = self
            .client
            .get(self.feeds_url(station))
            .query(&query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "channel {} rejected feed request: {status} {body}",
                station.channel_id
            );
            return Err(TelemetryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let feed = response.json::<FeedResponse>().await.map_err(|e| {
            if e.is_timeout() {
                TelemetryError::Timeout(self.timeout)
            } else {
                TelemetryError::Decode(e.without_url().to_string())
            }
        })?;
        debug!(
            "channel {} returned {} records",
            station.channel_id,
            feed.feeds.len()
        );

        Ok(feed.feeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::feed::Metric;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn station() -> Station {
        Station::new("2929062", Some("KEY"))
    }

    #[test]
    fn parse_station_table() {
        let table: StationTable = "location1=2929062:KEY1, location2=3013318".parse().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("location1"), Some(&Station::new("2929062", Some("KEY1"))));
        assert_eq!(table.get("location2"), Some(&Station::new("3013318", None)));
        assert_eq!(table.locations().collect::<Vec<_>>(), ["location1", "location2"]);
        assert!(table.get("location3").is_none());
    }

    #[test]
    fn parse_station_table_errors() {
        assert_eq!(
            "location1".parse::<StationTable>().unwrap_err(),
            StationParseError::Malformed("location1".to_owned())
        );
        assert_eq!(
            "a=1,a=2".parse::<StationTable>().unwrap_err(),
            StationParseError::Duplicate("a".to_owned())
        );
        assert!("".parse::<StationTable>().unwrap().is_empty());
    }

    #[test]
    fn station_debug_hides_key() {
        assert!(!format!("{:?}", station()).contains("KEY"));
    }

    #[tokio::test]
    async fn fetch_feeds_returns_records_unmodified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/channels/2929062/feeds.json"))
            .and(query_param("api_key", "KEY"))
            .and(query_param("results", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "channel": {"id": 2929062, "name": "Roof"},
                "feeds": [
                    {"created_at": "2024-03-01T10:00:00Z", "entry_id": 1, "field1": "21.5"},
                    {"created_at": "2024-03-01T10:15:00Z", "entry_id": 2, "field1": "oops"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = TelemetryClient::new(&mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let records = client.fetch_feeds(&station(), 100).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value(Metric::Temperature), Some(21.5));
        assert_eq!(records[1].entry_id, Some(2));
    }

    #[tokio::test]
    async fn rejection_keeps_the_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/channels/2929062/feeds.json"))
            .respond_with(ResponseTemplate::new(400).set_body_string("-1"))
            .mount(&mock_server)
            .await;

        let client = TelemetryClient::new(&mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let result = client.fetch_feeds(&station(), 10).await;

        match result {
            Err(TelemetryError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "-1");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"feeds": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = TelemetryClient::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
        let result = client.fetch_feeds(&station(), 10).await;

        assert!(matches!(result, Err(TelemetryError::Timeout(_))));
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = TelemetryClient::new(&mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let result = client.fetch_feeds(&station(), 10).await;

        assert!(matches!(result, Err(TelemetryError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_network_error() {
        let client = TelemetryClient::new("http://127.0.0.1:1", DEFAULT_TIMEOUT).unwrap();
        let result = client.fetch_feeds(&station(), 10).await;

        assert!(matches!(result, Err(TelemetryError::Network(_))));
    }

    #[tokio::test]
    async fn errors_do_not_reveal_the_api_key() {
        let station = Station::new("2929062", Some("SECRETKEY"));

        let client = TelemetryClient::new("http://127.0.0.1:1", DEFAULT_TIMEOUT).unwrap();
        let err = client.fetch_feeds(&station, 10).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Network(_)));
        assert!(!err.to_string().contains("SECRETKEY"), "{err}");
        assert!(!format!("{err:?}").contains("SECRETKEY"), "{err:?}");

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = TelemetryClient::new(&mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let err = client.fetch_feeds(&station, 10).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Decode(_)));
        assert!(!err.to_string().contains("SECRETKEY"), "{err}");
    }
}
