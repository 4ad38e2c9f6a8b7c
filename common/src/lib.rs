//! Types and pure logic shared by the backend and the frontend.

pub mod chart;
pub mod feed;
pub mod req;
pub mod session;
pub mod validate;
