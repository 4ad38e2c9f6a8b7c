use common::{
    chart::{SeriesStats, Stats},
    feed::{FeedReport, Metric},
};
use yew::prelude::*;

use crate::utils::{self, NOT_AVAILABLE};

#[derive(Properties, PartialEq)]
pub struct Props {
    pub report: Option<FeedReport>,
}

/// `min / max (spread)` of a day, N/A without readings.
fn stats_line(stats: Option<SeriesStats>) -> String {
    stats.map_or(NOT_AVAILABLE.to_string(), |s| {
        format!("{:.1} / {:.1} (spread {:.1})", s.min, s.max, s.range())
    })
}

/// Latest value of every metric for the selected day.
#[function_component(Summary)]
pub fn summary(props: &Props) -> Html {
    let cards = Metric::ALL.iter().map(|metric| {
        let latest = props.report.as_ref().and_then(|r| r.snapshot.get(*metric));
        let stats = props
            .report
            .as_ref()
            .and_then(|r| r.series(*metric))
            .and_then(|s| s.stats());
        let range_str = stats_line(stats);

        html! {
            <div class="col-lg-2 col-md-4 col-sm-6 col-xs-12">
                <div class="panel panel-default">
                    <div class="panel-heading">
                        <h3 class="panel-title">{metric.name()}</h3>
                    </div>
                    <div class="panel-body">
                        <h2 style={format!("color: {}", metric.color())}>
                            {utils::format_reading(latest, metric.unit())}
                        </h2>
                        <small class="text-muted">{"min / max "}{range_str}</small>
                    </div>
                </div>
            </div>
        }
    });

    let footer = match &props.report {
        Some(report) if report.record_count > 0 => format!(
            "{} readings, last at {}",
            report.record_count,
            report.latest_timestamp.as_deref().unwrap_or(NOT_AVAILABLE)
        ),
        _ => "No readings for this day".to_owned(),
    };

    html! {
        <>
            <div class="row">
                { for cards }
            </div>
            <p class="text-muted">{footer}</p>
        </>
    }
}
