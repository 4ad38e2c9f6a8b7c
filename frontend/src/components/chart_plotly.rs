use common::chart::{ChartKind, Projection, RenderSeries};
use plotly::{
    common::{Line, Marker, Mode},
    layout::Margin,
    Bar, Configuration, Layout, Plot, Scatter,
};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub id: String,
    pub projection: Projection,
}

#[function_component(ChartPlotly)]
pub fn chart_plotly(props: &Props) -> Html {
    match &props.projection {
        Projection::NoData => html! {
            <p class="text-center text-muted">{"No data"}</p>
        },
        Projection::Render(series) => html! {
            <PlotlyTrace id={props.id.clone()} series={series.clone()} />
        },
    }
}

#[derive(Properties, PartialEq)]
struct TraceProps {
    id: String,
    series: RenderSeries,
}

fn build_plot(series: &RenderSeries) -> Plot {
    let mut plot = Plot::new();
    let (x, y) = (series.x.clone(), series.y.clone());
    let name = series.label.as_str();

    match series.kind {
        ChartKind::Line => plot.add_trace(
            Scatter::new(x, y)
                .mode(Mode::Lines)
                .name(name)
                .line(Line::new().color(series.color).width(2.0)),
        ),
        ChartKind::Bar => plot.add_trace(
            Bar::new(x, y)
                .name(name)
                .marker(Marker::new().color(series.color)),
        ),
        ChartKind::Scatter => plot.add_trace(
            Scatter::new(x, y)
                .mode(Mode::Markers)
                .name(name)
                .marker(Marker::new().color(series.color)),
        ),
    }

    plot.set_configuration(
        Configuration::default()
            .display_logo(false)
            .editable(false)
            .display_mode_bar(plotly::configuration::DisplayModeBar::Hover),
    );
    plot.set_layout(
        Layout::default()
            .hover_mode(plotly::layout::HoverMode::XUnified)
            .auto_size(true)
            .height(220)
            .margin(Margin::default().top(20).bottom(40).left(40).right(20)),
    );

    plot
}

#[function_component(PlotlyTrace)]
fn plotly_trace(props: &TraceProps) -> Html {
    let id = props.id.clone();
    let p = yew_hooks::use_async::<_, _, ()>({
        let plot = build_plot(&props.series);
        async move {
            plotly::bindings::new_plot(&id, &plot).await;
            Ok(())
        }
    });

    use_effect_with(
        // replot whenever the data or the chart kind changes
        props.series.clone(),
        move |_| {
            p.run();
            || ()
        },
    );

    html! {
        <div class="chart" id={props.id.clone()}></div>
    }
}
