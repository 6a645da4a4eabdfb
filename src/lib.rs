pub mod analytics;
pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod models;
pub mod redirect;
pub mod service;
pub mod shortcode;
pub mod storage;
pub mod telemetry;

pub use app::create_app;
