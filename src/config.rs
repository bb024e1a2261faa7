use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::series::Category;

const JHU_BASE: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series";
const POPULATION_URL: &str = "https://restcountries.eu/rest/v2/all";

/// Upstream locations and fetch tuning. Defaults are compiled in; every
/// field can be overridden through a `COVIZ_*` environment variable.
#[derive(Debug, Clone)]
pub struct Config {
    pub confirmed_url: String,
    pub recovered_url: String,
    pub deaths_url: String,
    pub population_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    /// When set, fetched bodies are reused within the same day instead of
    /// re-downloading. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confirmed_url: format!("{JHU_BASE}/time_series_covid19_confirmed_global.csv"),
            recovered_url: format!("{JHU_BASE}/time_series_covid19_recovered_global.csv"),
            deaths_url: format!("{JHU_BASE}/time_series_covid19_deaths_global.csv"),
            population_url: POPULATION_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff_ms: 500,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("COVIZ_CONFIRMED_URL") {
            cfg.confirmed_url = v;
        }
        if let Ok(v) = env::var("COVIZ_RECOVERED_URL") {
            cfg.recovered_url = v;
        }
        if let Ok(v) = env::var("COVIZ_DEATHS_URL") {
            cfg.deaths_url = v;
        }
        if let Ok(v) = env::var("COVIZ_POPULATION_URL") {
            cfg.population_url = v;
        }
        if let Some(secs) = env::var("COVIZ_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env::var("COVIZ_MAX_RETRIES").ok().and_then(|v| v.parse().ok()) {
            cfg.max_retries = n;
        }
        if let Some(ms) = env::var("COVIZ_BACKOFF_MS").ok().and_then(|v| v.parse().ok()) {
            cfg.initial_backoff_ms = ms;
        }
        if let Ok(dir) = env::var("COVIZ_CACHE_DIR") {
            cfg.cache_dir = Some(PathBuf::from(dir));
        }
        cfg
    }

    /// The three sourced categories paired with their upstream CSVs, in
    /// registry order.
    pub fn category_sources(&self) -> Vec<(Category, String)> {
        vec![
            (Category::Confirmed, self.confirmed_url.clone()),
            (Category::Recovered, self.recovered_url.clone()),
            (Category::Deaths, self.deaths_url.clone()),
        ]
    }
}
