//! Web dashboard for Canadian weather stations.
//!
//! Serves a single page with a province and station picker, a station map,
//! the latest observation and an optional daily climate history, plus the
//! JSON endpoints behind those widgets.

pub mod error;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod state;
pub mod view;

pub use error::ApiError;
pub use render::Renderer;
pub use routes::create_router;
pub use state::AppState;
