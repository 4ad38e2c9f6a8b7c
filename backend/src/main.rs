use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use log::{error, info};
use tokio::signal;

mod api;
mod auth;
mod config;
mod db;
mod error;
mod schema;
mod telemetry;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env()?;
    info!(
        "serving {} station(s) on {}",
        config.stations.len(),
        config.bind_addr
    );

    let db = Arc::new(Mutex::new(db::Db::connect(&config.database_url)?));
    let web_db = db.clone();

    let state = api::AppState {
        telemetry: telemetry::TelemetryClient::new(
            &config.telemetry_base_url,
            config.telemetry_timeout,
        )?,
        stations: config.stations,
        session_ttl: config.session_ttl,
    };

    // expired sessions are already rejected on use, this only keeps the table small
    let task = actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = chrono::Utc::now().timestamp();
                    match db.lock() {
                        Ok(mut db) => match db.purge_expired_sessions(now) {
                            Ok(0) => {}
                            Ok(n) => info!("purged {n} expired session(s)"),
                            Err(e) => error!("purging sessions failed: {e:#}"),
                        },
                        Err(_) => error!("database lock poisoned"),
                    }
                }
                Ok(()) = signal::ctrl_c() => { break; }
            }
        }
    });

    let (server, _) = tokio::join!(
        api::new_http_server(web_db, state, &config.bind_addr, &config.frontend_origin),
        task
    );
    server?;

    Ok(())
}
