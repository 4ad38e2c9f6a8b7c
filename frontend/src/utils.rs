use chrono::{Local, NaiveDate};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

pub const NOT_AVAILABLE: &str = "N/A";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn input_value(e: &InputEvent) -> String {
    e.target_unchecked_into::<HtmlInputElement>().value()
}

pub fn changed_input_value(e: &Event) -> Option<String> {
    e.target_dyn_into::<HtmlInputElement>().map(|input| input.value())
}

pub fn select_value(e: &Event) -> Option<String> {
    e.target_dyn_into::<HtmlSelectElement>().map(|select| select.value())
}

/// `21.5 °C`, or N/A for a missing reading.
pub fn format_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => format!("{v:.1}"),
        Some(v) => format!("{v:.1} {unit}"),
        None => NOT_AVAILABLE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings() {
        assert_eq!(format_reading(Some(21.46), "°C"), "21.5 °C");
        assert_eq!(format_reading(Some(3.0), ""), "3.0");
        assert_eq!(format_reading(None, "%"), "N/A");
    }
}
