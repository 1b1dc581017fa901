use crate::refresh::Refresher;
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
    /// How often the page polls for a new dashboard.
    pub refresh_interval: Duration,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>, refresh_interval: Duration) -> Self {
        Self {
            refresher,
            refresh_interval,
        }
    }
}
