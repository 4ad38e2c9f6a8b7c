use std::collections::BTreeMap;

use chrono::NaiveDate;
use common::{
    chart::{self, ChartKind},
    feed::{DateFilter, Metric},
    req::{FeedQuery, StationFeed, StationInfo, UserInfo},
};
use log::{debug, info, warn};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        chart_menu::{ChartKindSelect, ChartMenu},
        chart_plotly::ChartPlotly,
        summary::Summary,
    },
    request, session, utils, Route,
};

const DEFAULT_LOCATION: &str = "location1";

type ChartKinds = BTreeMap<Metric, ChartKind>;

/// Keeps the current selection when the backend serves it, else the first
/// configured station.
fn pick_location(current: &str, stations: &[StationInfo]) -> Option<String> {
    if stations.iter().any(|s| s.location == current) {
        return None;
    }
    stations.first().map(|s| s.location.clone())
}

fn leave(navigator: &Option<Navigator>) {
    session::clear();
    if let Some(navigator) = navigator {
        navigator.replace(&Route::Login);
    }
}

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let navigator = use_navigator();
    let marker = use_memo((), |_| session::current().marker().cloned());

    let user = use_state(|| None::<UserInfo>);
    let stations = use_state(Vec::<StationInfo>::new);
    // no feed is requested before the station list settled the location
    let stations_loaded = use_state_eq(|| false);
    let date = use_state_eq(utils::today);
    let location = use_state_eq(|| DEFAULT_LOCATION.to_owned());
    let feed = use_state(|| None::<StationFeed>);
    let chart_kinds = use_state(ChartKinds::new);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);
    // only the newest feed request may update the view
    let generation = use_mut_ref(|| 0_u64);

    // guard, then the session owner and the station list
    {
        let navigator = navigator.clone();
        let marker = marker.clone();
        let user = user.clone();
        let stations = stations.clone();
        let stations_loaded = stations_loaded.clone();
        let location = location.clone();
        use_effect_with((), move |_| {
            match (*marker).clone() {
                None => {
                    info!("no session, redirecting to login");
                    leave(&navigator);
                }
                Some(marker) => wasm_bindgen_futures::spawn_local(async move {
                    match request::session(&marker).await {
                        Ok(info) => user.set(Some(info.user)),
                        Err(e) if e.is_unauthorized() => {
                            info!("session rejected by the server");
                            leave(&navigator);
                            return;
                        }
                        Err(e) => warn!("session check failed: {e}"),
                    }

                    match request::stations().await {
                        Ok(list) => {
                            if let Some(first) = pick_location(&location, &list) {
                                location.set(first);
                            }
                            stations.set(list);
                        }
                        Err(e) => warn!("loading stations failed: {e}"),
                    }
                    stations_loaded.set(true);
                }),
            }
        });
    }

    // fetch on every date or location change
    {
        let navigator = navigator.clone();
        let marker = marker.clone();
        let feed = feed.clone();
        let error = error.clone();
        let loading = loading.clone();
        let generation = generation.clone();
        use_effect_with(
            (*date, (*location).clone(), *stations_loaded),
            move |(date, location, loaded): &(NaiveDate, String, bool)| {
                if !*loaded {
                    return;
                }
                if let Some(marker) = (*marker).clone() {
                    let this = {
                        let mut generation = generation.borrow_mut();
                        *generation += 1;
                        *generation
                    };
                    let query = FeedQuery {
                        location: location.clone(),
                        date: DateFilter::from(*date).to_string(),
                        results: None,
                    };
                    loading.set(true);

                    wasm_bindgen_futures::spawn_local(async move {
                        let result = request::feeds(&marker, &query).await;
                        if *generation.borrow() != this {
                            debug!("dropping stale feed of {} {}", query.location, query.date);
                            return;
                        }
                        loading.set(false);

                        match result {
                            Ok(station_feed) => {
                                error.set(None);
                                feed.set(Some(station_feed));
                            }
                            Err(e) if e.is_unauthorized() => leave(&navigator),
                            Err(e) => {
                                warn!("feed request failed: {e}");
                                error.set(Some(e.to_string()));
                                feed.set(None);
                            }
                        }
                    });
                }
            },
        );
    }

    let on_date_changed = {
        let date = date.clone();
        Callback::from(move |d: NaiveDate| date.set(d))
    };
    let on_location_changed = {
        let location = location.clone();
        Callback::from(move |l: String| location.set(l))
    };
    let on_kind_changed = {
        let chart_kinds = chart_kinds.clone();
        Callback::from(move |(metric, kind): (Metric, ChartKind)| {
            let mut kinds = (*chart_kinds).clone();
            kinds.insert(metric, kind);
            chart_kinds.set(kinds);
        })
    };
    let on_logout = {
        let navigator = navigator.clone();
        let marker = marker.clone();
        Callback::from(move |_: ()| {
            let navigator = navigator.clone();
            let marker = (*marker).clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(marker) = marker {
                    // the local marker goes regardless of the server's answer
                    if let Err(e) = request::logout(&marker).await {
                        warn!("logout request failed: {e}");
                    }
                }
                info!("logged out");
                leave(&navigator);
            });
        })
    };
    let on_dismiss = {
        let error = error.clone();
        Callback::from(move |_: MouseEvent| error.set(None))
    };

    if marker.is_none() {
        return html! {};
    }

    let report = (*feed).as_ref().map(|f| f.report.clone());
    let panels = Metric::ALL.iter().map(|metric| {
        let kind = chart_kinds.get(metric).copied().unwrap_or_default();
        let projection = match report.as_ref().and_then(|r| r.series(*metric)) {
            Some(series) => chart::project(series, kind),
            None => chart::Projection::NoData,
        };

        html! {
            <div class="col-lg-6 col-md-12">
                <div class="panel panel-default">
                    <div class="panel-heading">
                        <div class="row">
                            <div class="col-xs-8">
                                <h3 class="panel-title">{metric.label()}</h3>
                            </div>
                            <div class="col-xs-4">
                                <ChartKindSelect metric={*metric} {kind}
                                    on_kind_changed={on_kind_changed.clone()} />
                            </div>
                        </div>
                    </div>
                    <div class="panel-body">
                        <ChartPlotly id={format!("chart-{}", metric.field())} {projection} />
                    </div>
                </div>
            </div>
        }
    });

    html! {
        <>
            <ChartMenu date={*date} {on_date_changed}
                stations={(*stations).clone()} location={(*location).clone()} {on_location_changed}
                {on_logout}
            />
            if let Some(user) = (*user).clone() {
                <p class="text-muted">
                    {format!("Signed in as {}", user.user_name.unwrap_or(user.school_email))}
                </p>
            }
            if let Some(message) = (*error).clone() {
                <div class="alert alert-warning alert-dismissible" role="alert">
                    <button type="button" class="close" onclick={on_dismiss}>{"×"}</button>
                    {message}
                </div>
            }
            if *loading {
                <p class="text-muted">{"Loading…"}</p>
            }
            <Summary report={report.clone()} />
            <div class="row">
                { for panels }
            </div>
        </>
    }
}
