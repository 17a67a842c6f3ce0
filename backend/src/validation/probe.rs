//! URL reachability probing.
//!
//! Each probe is a single HEAD request with a timeout and no retries. Only
//! an HTTP 200 counts as reachable; every other status, network error or
//! timeout is recorded as E06 on the row.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};

use crate::config::ProbeOptions;
use crate::models::Row;

/// Issues HEAD requests against redirect targets.
#[derive(Debug, Clone)]
pub struct UrlProber {
    client: Client,
    timeout: Duration,
}

impl UrlProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub fn from_options(options: &ProbeOptions) -> Self {
        Self::new(options.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `true` only when the target answers exactly 200.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }
}

impl Default for UrlProber {
    fn default() -> Self {
        Self::from_options(&ProbeOptions::default())
    }
}

/// Probe every row with at most `concurrency` requests in flight.
///
/// `on_row` sees each row once: rows that cannot be probed (E04) first, in
/// reading order, then probed rows in completion order. Dropping the
/// returned future cancels outstanding probes. Returns the number of
/// probes issued.
pub async fn check_urls<F>(
    rows: &mut [Row],
    prober: &UrlProber,
    concurrency: usize,
    mut on_row: F,
) -> usize
where
    F: FnMut(&Row),
{
    let mut targets = Vec::new();
    for (pos, row) in rows.iter().enumerate() {
        if row.needs_probe() {
            targets.push((pos, row.url().to_string()));
        } else {
            on_row(row);
        }
    }
    let issued = targets.len();

    let mut results = stream::iter(targets)
        .map(|(pos, url)| async move { (pos, prober.probe(&url).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((pos, working)) = results.next().await {
        rows[pos].record_probe(working);
        on_row(&rows[pos]);
    }

    issued
}
