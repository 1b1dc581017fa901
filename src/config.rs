use crate::errors::ConfigError;
use std::{env, net::SocketAddr, time::Duration};

pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RANGE: &str = "Sheet1";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_STATIC_PATH: &str = "charts.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Published sheet queried through the visualization endpoint.
    Gviz { url: String },
    /// Sheets values API, one label column and one value column.
    Values {
        base_url: String,
        sheet_id: String,
        api_key: String,
        range: String,
    },
    /// Pre-aggregated document, either an http(s) URL or a local file.
    Static { location: String },
}

impl Source {
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Gviz { .. } => "gviz",
            Source::Values { .. } => "values",
            Source::Static { .. } => "static",
        }
    }

    pub fn gviz_for_sheet(sheet_id: &str) -> Self {
        Source::Gviz {
            url: format!("https://docs.google.com/spreadsheets/d/{sheet_id}/gviz/tq?tqx=out:json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub source: Source,
    pub refresh_interval: Duration,
    /// `None` leaves requests without a deadline.
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let kind = get("DASHBOARD_SOURCE").unwrap_or_else(|| "gviz".to_string());
        let source = match kind.to_ascii_lowercase().as_str() {
            "gviz" => match (get("DASHBOARD_SHEET_URL"), get("DASHBOARD_SHEET_ID")) {
                (Some(url), _) => Source::Gviz { url },
                (None, Some(id)) => Source::gviz_for_sheet(&id),
                (None, None) => return Err(ConfigError::Missing("DASHBOARD_SHEET_URL or DASHBOARD_SHEET_ID")),
            },
            "values" => Source::Values {
                base_url: get("DASHBOARD_API_BASE")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                sheet_id: get("DASHBOARD_SHEET_ID").ok_or(ConfigError::Missing("DASHBOARD_SHEET_ID"))?,
                api_key: get("DASHBOARD_API_KEY").ok_or(ConfigError::Missing("DASHBOARD_API_KEY"))?,
                range: get("DASHBOARD_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            },
            "static" => Source::Static {
                location: get("DASHBOARD_STATIC_PATH").unwrap_or_else(|| DEFAULT_STATIC_PATH.to_string()),
            },
            _ => return Err(ConfigError::UnknownSource(kind)),
        };

        let refresh_secs = parse_secs(get("DASHBOARD_REFRESH_SECS"), "DASHBOARD_REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        if refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "DASHBOARD_REFRESH_SECS",
                value: "0".to_string(),
            });
        }
        let timeout_secs = parse_secs(get("DASHBOARD_TIMEOUT_SECS"), "DASHBOARD_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            source,
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }
}

fn parse_secs(value: Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
