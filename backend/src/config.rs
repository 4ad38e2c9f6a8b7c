use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::telemetry::{Station, StationTable, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8081";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://127.0.0.1:8080";
const DEFAULT_CHANNEL: &str = "2929062";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub frontend_origin: String,
    pub telemetry_base_url: String,
    pub telemetry_timeout: Duration,
    pub stations: StationTable,
    pub session_ttl: chrono::Duration,
}

impl Config {
    /// Reads the process environment, `.env` included.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let telemetry_timeout = match var("TELEMETRY_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .context("TELEMETRY_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        let stations = match var("TELEMETRY_STATIONS") {
            Some(list) => list.parse::<StationTable>()?,
            None => {
                let mut table = StationTable::default();
                let channel = var("TELEMETRY_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_owned());
                let key = var("TELEMETRY_API_KEY");
                table.insert("location1", Station::new(channel, key.as_deref()));
                table
            }
        };
        if stations.is_empty() {
            return Err(anyhow!("TELEMETRY_STATIONS lists no station"));
        }

        let session_ttl = match var("SESSION_TTL_DAYS") {
            Some(days) => {
                let days: i64 = days
                    .trim()
                    .parse()
                    .context("SESSION_TTL_DAYS must be a whole number of days")?;
                if days <= 0 {
                    return Err(anyhow!("SESSION_TTL_DAYS must be greater than 0"));
                }
                chrono::Duration::try_days(days)
                    .ok_or_else(|| anyhow!("SESSION_TTL_DAYS {days} is out of range"))?
            }
            None => common::session::session_ttl(),
        };

        Ok(Self {
            database_url,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            frontend_origin: var("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_owned()),
            telemetry_base_url: var("TELEMETRY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            telemetry_timeout,
            stations,
            session_ttl,
        })
    }
}
