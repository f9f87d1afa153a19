use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    feed::{self, FeedDocument, NormalizedRecord},
    sources::{HttpClient, PageSource},
};

pub mod cve;

pub const SOURCE_NAME: &str = "NIST";
pub const API_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
pub const OUTPUT_PATH: &str = "data/latest-cves.json";
pub const MAX_ITEMS: usize = 6;
pub const WINDOW_DAYS: u32 = 7;
pub const TIMEOUT_SECS: u64 = 30;

/// Upper bounds enforced by the API on a single query.
pub const MAX_WINDOW_DAYS: u32 = 120;
pub const MAX_RESULTS_PER_PAGE: usize = 2000;

#[derive(Deserialize, Clone, Debug)]
pub struct FeedSettings {
    pub api_url: String,
    pub output: PathBuf,
    pub max_items: usize,
    pub window_days: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            api_url: API_URL.into(),
            output: OUTPUT_PATH.into(),
            max_items: MAX_ITEMS,
            window_days: WINDOW_DAYS,
            timeout_secs: TIMEOUT_SECS,
            user_agent: format!(
                "cvefeed/{} (+https://github.com/exein-io/cvefeed)",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl FeedSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_RESULTS_PER_PAGE).contains(&self.max_items) {
            bail!(
                "max_items must be between 1 and {}, got {}",
                MAX_RESULTS_PER_PAGE,
                self.max_items
            );
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            bail!(
                "window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS,
                self.window_days
            );
        }
        Ok(())
    }
}

/// Publication date range sent to the API, both ends formatted the way the
/// API expects them (`2024-06-07T00:00:00.000`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    /// From midnight `days` ago up to `now`, truncated to seconds.
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let start = now - chrono::Duration::days(days.into());
        Self {
            start: start.format("%Y-%m-%dT00:00:00.000").to_string(),
            end: now.format("%Y-%m-%dT%H:%M:%S.000").to_string(),
        }
    }

    pub fn page_url(&self, api_url: &str, results_per_page: usize, start_index: u64) -> String {
        format!(
            "{}?pubStartDate={}&pubEndDate={}&noRejected&resultsPerPage={}&startIndex={}",
            api_url, self.start, self.end, results_per_page, start_index
        )
    }
}

/// Offset of the last page: results come sorted by publication date,
/// oldest first, so the newest ones sit at the tail.
pub fn tail_start_index(total_results: u64, max_items: usize) -> u64 {
    total_results.saturating_sub(max_items as u64)
}

/// Most recently published CVEs of the window, newest first.
///
/// The API can't sort descending, so a one-result probe learns the window
/// size and a second request jumps straight to the tail page. Records
/// published between the two requests may shift the page, that is not
/// corrected.
pub fn fetch_latest<S: PageSource>(
    source: &S,
    settings: &FeedSettings,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedRecord>> {
    settings.validate()?;

    let window = Window::ending_at(now, settings.window_days);

    log::info!(
        "looking for CVEs published between {} and {} ...",
        window.start,
        window.end
    );

    let probe = source
        .fetch(&window.page_url(&settings.api_url, 1, 0))
        .context("probe request failed")?;

    if probe.total_results == 0 {
        log::info!("no CVEs published in the last {} days", settings.window_days);
        return Ok(vec![]);
    }

    let start_index = tail_start_index(probe.total_results, settings.max_items);

    log::info!(
        "{} CVEs in window, fetching from index {}",
        probe.total_results,
        start_index
    );

    let page = source
        .fetch(&window.page_url(&settings.api_url, settings.max_items, start_index))
        .context("page request failed")?;

    let received = page.vulnerabilities.len();

    let mut records: Vec<NormalizedRecord> =
        page.vulnerabilities.iter().filter_map(cve::normalize).collect();

    let rejected = received - records.len();
    if rejected > 0 {
        log::warn!("dropped {} of {} malformed records", rejected, received);
    }

    records.sort_by(|a, b| b.published.cmp(&a.published));
    records.truncate(settings.max_items);

    Ok(records)
}

/// Fetches the latest CVEs and overwrites the feed file with them.
pub fn update(settings: &FeedSettings) -> Result<FeedDocument> {
    let client = HttpClient::new(
        &settings.user_agent,
        Duration::from_secs(settings.timeout_secs),
    )?;

    let items = fetch_latest(&client, settings, Utc::now())?;

    for item in &items {
        log::debug!(
            "{} {} ({}) published {}",
            SOURCE_NAME,
            item.id,
            item.severity(),
            item.published
        );
    }

    feed::write_feed(&settings.output, &settings.api_url, items)
}
