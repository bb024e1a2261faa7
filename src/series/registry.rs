use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{self, FetchCache};

use super::derive::{derive_infected, derive_views};
use super::table::{RawCaseTable, SeriesTable};
use super::{Category, Evaluation, TIME_UNIT};

/// One derived table plus its display metadata.
#[derive(Debug, Clone)]
pub struct EvaluationView {
    pub table: SeriesTable,
    pub unit: &'static str,
    pub tooltip: Option<&'static str>,
}

/// All Category x Evaluation views, built once at startup and read-only
/// afterwards. Handlers share it by reference; reads need no locking.
#[derive(Debug)]
pub struct DatasetRegistry {
    dates: Arc<Vec<NaiveDate>>,
    countries: Vec<String>,
    views: HashMap<Category, HashMap<Evaluation, EvaluationView>>,
}

impl DatasetRegistry {
    /// Fetch every source and assemble the registry. Category fetches run
    /// concurrently; they are independent until the alignment check. A
    /// failed population fetch is logged and downgraded to an empty map so
    /// the normalized views come out all-zero instead of killing startup.
    pub async fn fetch(
        client: &Client,
        config: &Config,
        cache: Option<&FetchCache>,
    ) -> Result<Self> {
        let population = match fetch::population::load_population(client, config, cache).await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "population source unavailable, normalized views will be zero");
                HashMap::new()
            }
        };

        let sources = config.category_sources();
        let (confirmed, recovered, deaths) = tokio::try_join!(
            fetch::cases::fetch_cases(client, config, cache, sources[0].0, &sources[0].1),
            fetch::cases::fetch_cases(client, config, cache, sources[1].0, &sources[1].1),
            fetch::cases::fetch_cases(client, config, cache, sources[2].0, &sources[2].1),
        )?;

        Self::from_tables(confirmed, recovered, deaths, &population)
    }

    /// Assemble the registry from already-parsed raw tables. Split out from
    /// [`fetch`](Self::fetch) so the derivation path is testable without a
    /// network.
    pub fn from_tables(
        mut confirmed: RawCaseTable,
        mut recovered: RawCaseTable,
        mut deaths: RawCaseTable,
        population: &HashMap<String, u64>,
    ) -> Result<Self> {
        for table in [&mut confirmed, &mut recovered, &mut deaths] {
            table.canonicalize_us();
            table.append_world();
        }

        // `infected` is element-wise across all three tables; any shape
        // drift would silently misalign data, so abort instead.
        confirmed.check_same_shape(&recovered)?;
        confirmed.check_same_shape(&deaths)?;

        let dates = Arc::new(confirmed.dates().to_vec());
        let countries: Vec<String> = confirmed.countries().map(str::to_string).collect();

        let confirmed_views = derive_views(&confirmed, &dates, population);
        let recovered_views = derive_views(&recovered, &dates, population);
        let deaths_views = derive_views(&deaths, &dates, population);
        let infected_views =
            derive_infected(&dates, &confirmed_views, &recovered_views, &deaths_views)?;

        let mut views = HashMap::new();
        views.insert(Category::Confirmed, attach_metadata(confirmed_views));
        views.insert(Category::Infected, attach_metadata(infected_views));
        views.insert(Category::Recovered, attach_metadata(recovered_views));
        views.insert(Category::Deaths, attach_metadata(deaths_views));

        info!(
            rows = dates.len(),
            countries = countries.len(),
            "dataset registry built"
        );

        Ok(Self {
            dates,
            countries,
            views,
        })
    }

    /// Shared ascending date index; also the `time` pseudo-category's
    /// lookup table, whatever evaluation key it is asked under.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Country columns in their stable display order.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    /// The view for a data-backed category. `None` for [`Category::Time`],
    /// which is answered from [`dates`](Self::dates) instead.
    pub fn view(&self, category: Category, evaluation: Evaluation) -> Option<&EvaluationView> {
        self.views.get(&category)?.get(&evaluation)
    }

    /// Display unit for an axis selection.
    pub fn unit(&self, category: Category, evaluation: Evaluation) -> &'static str {
        match category {
            Category::Time => TIME_UNIT,
            _ => evaluation.unit(),
        }
    }
}

fn attach_metadata(
    tables: HashMap<Evaluation, SeriesTable>,
) -> HashMap<Evaluation, EvaluationView> {
    tables
        .into_iter()
        .map(|(eval, table)| {
            (
                eval,
                EvaluationView {
                    table,
                    unit: eval.unit(),
                    tooltip: Some(eval.tooltip()),
                },
            )
        })
        .collect()
}
