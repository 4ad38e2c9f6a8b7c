use chrono::NaiveDate;
use common::{
    chart::ChartKind,
    feed::{DateFilter, Metric},
    req::StationInfo,
};
use log::warn;
use yew::prelude::*;

use crate::utils;

#[derive(Properties, PartialEq)]
pub struct Props {
    // dates
    pub date: NaiveDate,
    pub on_date_changed: Callback<NaiveDate>,

    // stations
    pub stations: Vec<StationInfo>,
    pub location: String,
    pub on_location_changed: Callback<String>,

    pub on_logout: Callback<()>,
}

/// Date and station selection plus the logout button.
#[function_component(ChartMenu)]
pub fn chart_menu(props: &Props) -> Html {
    let on_date = {
        let cb = props.on_date_changed.clone();
        Callback::from(move |e: Event| {
            let Some(value) = utils::changed_input_value(&e) else {
                return;
            };
            match DateFilter::parse(&value) {
                Ok(date) => cb.emit(date.day()),
                // cleared or partially typed input
                Err(e) => warn!("{e}"),
            }
        })
    };

    let on_location = {
        let cb = props.on_location_changed.clone();
        Callback::from(move |e: Event| {
            if let Some(location) = utils::select_value(&e) {
                cb.emit(location);
            }
        })
    };

    let on_logout = {
        let cb = props.on_logout.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };

    let options: Html = props
        .stations
        .iter()
        .map(|station| {
            html! {
                <option value={station.location.clone()}
                    selected={station.location == props.location}>
                    {station.location.clone()}
                </option>
            }
        })
        .collect();

    html! {
        <nav class="navbar navbar-default">
            <div class="container-fluid">
                <span class="navbar-brand">{"Weather Station"}</span>
                <form class="navbar-form navbar-left" onsubmit={Callback::from(|e: SubmitEvent| e.prevent_default())}>
                    <div class="input-group">
                        <span class="input-group-addon">{"Date"}</span>
                        <input type="date" class="form-control" onchange={on_date}
                            value={props.date.format("%Y-%m-%d").to_string()}
                            max={utils::today().format("%Y-%m-%d").to_string()}
                        />
                    </div>
                    {" "}
                    <div class="input-group">
                        <span class="input-group-addon">{"Location"}</span>
                        <select class="form-control" onchange={on_location}>
                            {options}
                        </select>
                    </div>
                </form>
                <button class="btn btn-default navbar-btn navbar-right" onclick={on_logout}>
                    {"Logout"}
                </button>
            </div>
        </nav>
    }
}

#[derive(Properties, PartialEq)]
pub struct KindProps {
    pub metric: Metric,
    pub kind: ChartKind,
    pub on_kind_changed: Callback<(Metric, ChartKind)>,
}

/// Chart kind selector of one metric panel.
#[function_component(ChartKindSelect)]
pub fn chart_kind_select(props: &KindProps) -> Html {
    let onchange = {
        let cb = props.on_kind_changed.clone();
        let metric = props.metric;
        Callback::from(move |e: Event| {
            let Some(value) = utils::select_value(&e) else {
                return;
            };
            match value.parse::<ChartKind>() {
                Ok(kind) => cb.emit((metric, kind)),
                Err(e) => warn!("{e}"),
            }
        })
    };

    html! {
        <select class="form-control input-sm" {onchange}>
            { for ChartKind::ALL.iter().map(|kind| html! {
                <option value={kind.as_str()} selected={*kind == props.kind}>
                    {kind.title()}
                </option>
            }) }
        </select>
    }
}
