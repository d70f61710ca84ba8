// Library exports for murmur-server
// The admin CLI and the integration tests build on these modules

pub mod api;
pub mod app;
pub mod config;
pub mod content_filter;
pub mod cors;
pub mod db;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod state;

pub use app::router;
pub use state::AppState;
