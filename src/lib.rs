pub mod aggregate;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod fetch;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod refresh;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::{Config, Source};
pub use fetch::SheetFetcher;
pub use refresh::{Refresher, Scheduler};
pub use state::AppState;
