//! Output surfaces for an aligned trace: chart images and JSON.

pub mod chart;
pub mod json;

pub use chart::render_chart;
pub use json::render_json;
