use std::sync::{Arc, Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::{
    get,
    http::header,
    middleware, post,
    web::{self, Data},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{
    feed::{self, DateFilter, LooseNumber},
    req::{
        FeedQuery, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SessionInfo,
        StationFeed, StationInfo,
    },
    validate::{normalize_email, required},
};
use log::{debug, info};

use crate::{
    auth,
    db::{Db, NewSession, NewUser, User},
    error::ApiError,
    telemetry::{StationTable, TelemetryClient, DEFAULT_RESULTS, MAX_RESULTS},
};

type SharedDb = web::Data<Arc<Mutex<Db>>>;

pub struct AppState {
    pub telemetry: TelemetryClient,
    pub stations: StationTable,
    pub session_ttl: Duration,
}

fn lock(db: &Mutex<Db>) -> Result<MutexGuard<'_, Db>, ApiError> {
    db.lock()
        .map_err(|_| ApiError::Internal(anyhow!("database lock poisoned")))
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| ApiError::Internal(anyhow!("timestamp {secs} out of range")))
}

struct Authenticated {
    user: User,
    expires_at: i64,
}

/// Runs CPU heavy work (password hashing) off the actix worker.
async fn blocking<F, R>(f: F) -> Result<R, ApiError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow!("blocking task failed: {e}")))
}

/// Validates the bearer token of a protected request.
fn authenticate(req: &HttpRequest, db: &Mutex<Db>) -> Result<Authenticated, ApiError> {
    let token = auth::bearer_token(req).ok_or(ApiError::Unauthorized)?;
    let token_hash = auth::token_hash(token);
    let (session, user) = lock(db)?
        .session_user(&token_hash, Utc::now().timestamp())?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Authenticated {
        user,
        expires_at: session.expires_at,
    })
}

#[post("/register")]
async fn register(
    body: web::Json<RegisterRequest>,
    db: SharedDb,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();
    let email = required(form.school_email.as_deref()).map(normalize_email);
    let password = form.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::BadRequest("Required fields missing".to_owned()));
    };

    if lock(&db)?.user_by_email(&email)?.is_some() {
        return Err(ApiError::Duplicate);
    }

    let password = password.to_owned();
    let password_hash = blocking(move || auth::hash_password(&password)).await??;

    let new_user = NewUser {
        email,
        user_name: required(form.user_name.as_deref()).map(str::to_owned),
        password_hash,
        phone_number: required(form.phone_number.as_deref()).map(str::to_owned),
        address: required(form.address.as_deref()).map(str::to_owned),
        lat: form.lat.as_ref().and_then(LooseNumber::as_number),
        lon: form.lon.as_ref().and_then(LooseNumber::as_number),
        created_at: Utc::now().timestamp(),
    };

    // a concurrent registration may have won the race, the unique index decides
    let user = lock(&db)?.insert_user(&new_user)?.ok_or(ApiError::Duplicate)?;
    info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(MessageResponse::new("User registered successfully")))
}

#[post("/login")]
async fn login(
    body: web::Json<LoginRequest>,
    db: SharedDb,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_id = required(body.user_id.as_deref());
    let password = body.password.as_deref().filter(|p| !p.is_empty());
    let (Some(user_id), Some(password)) = (user_id, password) else {
        return Err(ApiError::BadRequest("Email and Password required".to_owned()));
    };

    let user = lock(&db)?
        .user_by_email(&normalize_email(user_id))?
        .ok_or(ApiError::UserNotFound)?;

    let verified = {
        let password = password.to_owned();
        let stored_hash = user.password_hash.clone();
        blocking(move || auth::verify_password(&password, &stored_hash)).await?
    };
    if !verified {
        debug!("password mismatch for user {}", user.id);
        return Err(ApiError::InvalidCredentials);
    }

    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(state.session_ttl)
        .ok_or_else(|| ApiError::Internal(anyhow!("session lifetime out of range")))?;
    let expires_at = from_unix(expires_at.timestamp())?;
    let token = auth::new_token();
    lock(&db)?.insert_session(&NewSession {
        token_hash: auth::token_hash(&token),
        user_id: user.id,
        created_at: now.timestamp(),
        expires_at: expires_at.timestamp(),
    })?;
    info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_owned(),
        token,
        expires_at,
        user: user.info(),
    }))
}

#[post("/logout")]
async fn logout(req: HttpRequest, db: SharedDb) -> Result<HttpResponse, ApiError> {
    if let Some(token) = auth::bearer_token(&req) {
        lock(&db)?.delete_session(&auth::token_hash(token))?;
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out")))
}

#[get("/api/session")]
async fn api_session(req: HttpRequest, db: SharedDb) -> Result<impl Responder, ApiError> {
    let session = authenticate(&req, &db)?;
    debug!("session of user {} is valid", session.user.id);

    Ok(web::Json(SessionInfo {
        user: session.user.info(),
        expires_at: from_unix(session.expires_at)?,
    }))
}

#[get("/api/stations")]
async fn api_stations(state: web::Data<AppState>) -> impl Responder {
    let stations: Vec<StationInfo> = state
        .stations
        .locations()
        .map(|location| StationInfo {
            location: location.to_owned(),
        })
        .collect();

    web::Json(stations)
}

#[get("/api/feeds")]
async fn api_feeds(
    req: HttpRequest,
    query: web::Query<FeedQuery>,
    db: SharedDb,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    // the db lock is released before the provider round trip
    authenticate(&req, &db)?;

    let date = DateFilter::parse(&query.date).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let station = state
        .stations
        .get(&query.location)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown location `{}`", query.location)))?;
    let results = query.results.unwrap_or(DEFAULT_RESULTS).clamp(1, MAX_RESULTS);

    let records = state.telemetry.fetch_feeds(station, results).await?;
    let report = feed::normalize(&records, &date);
    debug!(
        "{}: {} of {} records on {date}",
        query.location,
        report.record_count,
        records.len()
    );

    Ok(web::Json(StationFeed {
        location: query.location.clone(),
        report,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(register)
    .service(login)
    .service(logout)
    .service(api_session)
    .service(api_stations)
    .service(api_feeds);
}

pub async fn new_http_server(
    db: Arc<Mutex<Db>>,
    state: AppState,
    bind_addr: &str,
    frontend_origin: &str,
) -> std::io::Result<()> {
    let state = Data::new(state);
    let frontend_origin = frontend_origin.to_owned();

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(state.clone())
            .configure(configure)
            .wrap(
                Cors::default()
                    .allowed_origin(&frontend_origin)
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT])
                    .allowed_header(header::CONTENT_TYPE)
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
    })
    .bind(bind_addr)?
    .run()
    .await
}
