pub mod chart_menu;
pub mod chart_plotly;
pub mod dashboard;
pub mod login;
pub mod register;
pub mod summary;
