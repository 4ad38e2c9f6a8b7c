//! Session marker persistence in the `wb_session` cookie.

use chrono::Utc;
use common::session::{self, SessionMarker, SessionState};
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

fn html_document() -> Option<HtmlDocument> {
    web_sys::window()?
        .document()?
        .dyn_into::<HtmlDocument>()
        .ok()
}

fn set_cookie(cookie: &str) {
    match html_document() {
        Some(doc) => {
            if doc.set_cookie(cookie).is_err() {
                warn!("could not write session cookie");
            }
        }
        None => warn!("no document to hold the session cookie"),
    }
}

pub fn load() -> Option<SessionMarker> {
    let cookies = html_document()?.cookie().ok()?;
    SessionMarker::from_cookies(&cookies)
}

pub fn store(marker: &SessionMarker) {
    set_cookie(&marker.to_cookie(Utc::now()));
}

pub fn clear() {
    set_cookie(&session::clear_cookie());
}

/// Guard state of the browser right now.
pub fn current() -> SessionState {
    session::guard(load(), Utc::now())
}
