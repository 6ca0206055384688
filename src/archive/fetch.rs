//! Bounded concurrent workbook downloads.
//!
//! Every item runs under its own deadline and at most `max_concurrent`
//! downloads are in flight. A failed item is logged and reported back; it
//! never aborts the batch.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::time::timeout;

use crate::archive::selection::DownloadItem;
use crate::config::DownloadConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub max_concurrent: usize,
    pub item_timeout: Duration,
}

impl From<&DownloadConfig> for FetchLimits {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            item_timeout: Duration::from_secs(config.item_timeout_secs),
        }
    }
}

#[derive(Debug)]
pub struct FetchedWorkbook {
    pub item: DownloadItem,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub struct FailedWorkbook {
    pub item: DownloadItem,
    pub reason: String,
}

/// Result of one batch, both lists in request order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub fetched: Vec<FetchedWorkbook>,
    pub failed: Vec<FailedWorkbook>,
}

/// Download every item through `fetch`, tolerating individual failures.
pub async fn fetch_all<F, Fut, E>(items: Vec<DownloadItem>, limits: FetchLimits, fetch: F) -> BatchOutcome
where
    F: Fn(&DownloadItem) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, E>>,
    E: Display,
{
    let mut results: Vec<(usize, DownloadItem, Result<Vec<u8>, String>)> = stream::iter(
        items.into_iter().enumerate(),
    )
    .map(|(index, item)| {
        let download = fetch(&item);
        async move {
            let result = match timeout(limits.item_timeout, download).await {
                Ok(Ok(content)) => Ok(content),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {:?}", limits.item_timeout)),
            };
            (index, item, result)
        }
    })
    .buffer_unordered(limits.max_concurrent.max(1))
    .collect()
    .await;

    results.sort_by_key(|(index, _, _)| *index);

    let mut outcome = BatchOutcome::default();
    for (_, item, result) in results {
        match result {
            Ok(content) => {
                tracing::debug!(workbook = %item.name, bytes = content.len(), "Workbook downloaded");
                metrics::record_workbook_download(true);
                outcome.fetched.push(FetchedWorkbook { item, content });
            }
            Err(reason) => {
                tracing::warn!(workbook = %item.name, reason = %reason, "Failed to download workbook");
                metrics::record_workbook_download(false);
                outcome.failed.push(FailedWorkbook { item, reason });
            }
        }
    }

    if !outcome.failed.is_empty() {
        let names: Vec<&str> = outcome.failed.iter().map(|f| f.item.name.as_str()).collect();
        tracing::warn!(
            failed = outcome.failed.len(),
            succeeded = outcome.fetched.len(),
            workbooks = %names.join(", "),
            "Some workbooks failed to download"
        );
    }

    outcome
}
